//! # Umra FAQ Telegram Bot
//!
//! A Telegram bot that answers a fixed catalog of Umra and Ziyarat questions
//! in Latin or Cyrillic Uzbek. Navigation happens by editing a single message
//! (menu ⇄ answer), topics are reachable through `/start` deep links, and
//! plain-text questions in groups are moved to a private chat with the author.

pub mod bot;
pub mod circuit_breaker;
pub mod completion;
pub mod config;
pub mod content;
pub mod db;
pub mod deep_link;
pub mod errors;
pub mod locale;
pub mod locale_store;
pub mod localization;
pub mod navigation;
pub mod pager;
pub mod token;
