//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: `/start` deep links, group relay and private free text
//! - `callback_handler`: inline keyboard navigation (edits in place)
//! - `relay`: group-to-private moderation relay
//! - `gateway`: send/edit/delete primitives with per-call timeouts
//! - `ui_builder`: converts screens into inline keyboards
//! - `state`: shared handler state

pub mod callback_handler;
pub mod gateway;
pub mod message_handler;
pub mod relay;
pub mod state;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

pub use gateway::{ChatGateway, RenderTarget, TelegramGateway};
pub use state::BotState;
