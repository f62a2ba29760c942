//! # Bot Configuration Module
//!
//! This module defines configuration structures for the bot, loaded from
//! environment variables (and a `.env` file via `dotenv` in `main`).

use std::path::PathBuf;
use std::time::Duration;

use crate::errors::BotError;

// Constants for bot configuration
pub const DEFAULT_PAGE_SIZE: usize = 8;
pub const DEFAULT_LOCALE_STORE_PATH: &str = "user_locales.json";
pub const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";

/// Settings for the optional free-text completion API
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    /// Chat-completions endpoint (OpenAI-compatible)
    pub api_url: String,
    /// Bearer token, if the endpoint needs one
    pub api_key: Option<String>,
    pub model: String,
    /// Timeout for a completion request in seconds
    pub timeout_secs: u64,
    /// Circuit breaker failure threshold
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl CompletionConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: None,
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            timeout_secs: 30,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60, // 1 minute
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration structure for the bot process
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub bot_token: String,
    /// Username without `@`; looked up with `getMe` when absent
    pub bot_username: Option<String>,
    /// Restricts the group relay to a single group
    pub allowed_chat_id: Option<i64>,
    /// Topics per menu page
    pub page_size: usize,
    pub locale_store_path: PathBuf,
    /// Use PostgreSQL for locale preferences instead of the JSON file
    pub database_url: Option<String>,
    /// Topic catalog file; the embedded catalog is used when absent
    pub catalog_path: Option<PathBuf>,
    /// Timeout for every Telegram API call in seconds
    pub outbound_timeout_secs: u64,
    pub completion: Option<CompletionConfig>,
}

impl BotConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, BotError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bot_token = var("TELEGRAM_BOT_TOKEN")
            .or_else(|| var("BOT_TOKEN"))
            .ok_or_else(|| BotError::Config("TELEGRAM_BOT_TOKEN must be set".to_string()))?;

        let page_size = parse_or("PAGE_SIZE", var("PAGE_SIZE"), DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(BotError::Config("PAGE_SIZE must be at least 1".to_string()));
        }

        let completion = match var("COMPLETION_API_URL") {
            Some(api_url) => {
                let defaults = CompletionConfig::new(api_url);
                Some(CompletionConfig {
                    api_key: var("COMPLETION_API_KEY"),
                    model: var("COMPLETION_MODEL").unwrap_or(defaults.model.clone()),
                    timeout_secs: parse_or(
                        "COMPLETION_TIMEOUT_SECS",
                        var("COMPLETION_TIMEOUT_SECS"),
                        defaults.timeout_secs,
                    )?,
                    circuit_breaker_threshold: parse_or(
                        "COMPLETION_FAILURE_THRESHOLD",
                        var("COMPLETION_FAILURE_THRESHOLD"),
                        defaults.circuit_breaker_threshold,
                    )?,
                    circuit_breaker_reset_secs: parse_or(
                        "COMPLETION_RESET_SECS",
                        var("COMPLETION_RESET_SECS"),
                        defaults.circuit_breaker_reset_secs,
                    )?,
                    ..defaults
                })
            }
            None => None,
        };

        Ok(Self {
            bot_token,
            bot_username: var("BOT_USERNAME").map(|name| name.trim_start_matches('@').to_string()),
            allowed_chat_id: var("ALLOWED_CHAT_ID")
                .map(|raw| parse_value("ALLOWED_CHAT_ID", &raw))
                .transpose()?,
            page_size,
            locale_store_path: var("LOCALE_STORE_PATH")
                .unwrap_or_else(|| DEFAULT_LOCALE_STORE_PATH.to_string())
                .into(),
            database_url: var("DATABASE_URL"),
            catalog_path: var("FAQ_CATALOG_PATH").map(PathBuf::from),
            outbound_timeout_secs: parse_or(
                "OUTBOUND_TIMEOUT_SECS",
                var("OUTBOUND_TIMEOUT_SECS"),
                DEFAULT_OUTBOUND_TIMEOUT_SECS,
            )?,
            completion,
        })
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(self.outbound_timeout_secs)
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, BotError> {
    raw.parse()
        .map_err(|_| BotError::Config(format!("{name} has an invalid value: '{raw}'")))
}

fn parse_or<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T, BotError> {
    match raw {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<BotConfig, BotError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("TELEGRAM_BOT_TOKEN", "123:abc")]).unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.locale_store_path, PathBuf::from(DEFAULT_LOCALE_STORE_PATH));
        assert_eq!(config.outbound_timeout(), Duration::from_secs(15));
        assert!(config.bot_username.is_none());
        assert!(config.completion.is_none());
        assert!(config.allowed_chat_id.is_none());
    }

    #[test]
    fn test_legacy_token_variable() {
        let config = load(&[("BOT_TOKEN", "legacy")]).unwrap();
        assert_eq!(config.bot_token, "legacy");
    }

    #[test]
    fn test_missing_token_is_an_error() {
        assert!(matches!(load(&[]), Err(BotError::Config(_))));
        assert!(matches!(load(&[("TELEGRAM_BOT_TOKEN", "  ")]), Err(BotError::Config(_))));
    }

    #[test]
    fn test_page_size_validation() {
        assert!(load(&[("TELEGRAM_BOT_TOKEN", "t"), ("PAGE_SIZE", "0")]).is_err());
        assert!(load(&[("TELEGRAM_BOT_TOKEN", "t"), ("PAGE_SIZE", "eight")]).is_err());
        let config = load(&[("TELEGRAM_BOT_TOKEN", "t"), ("PAGE_SIZE", "5")]).unwrap();
        assert_eq!(config.page_size, 5);
    }

    #[test]
    fn test_allowed_chat_and_username() {
        let config = load(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("ALLOWED_CHAT_ID", "-1001234"),
            ("BOT_USERNAME", "@umra_faq_bot"),
        ])
        .unwrap();
        assert_eq!(config.allowed_chat_id, Some(-1001234));
        assert_eq!(config.bot_username.as_deref(), Some("umra_faq_bot"));

        assert!(load(&[("TELEGRAM_BOT_TOKEN", "t"), ("ALLOWED_CHAT_ID", "abc")]).is_err());
    }

    #[test]
    fn test_completion_settings() {
        let config = load(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("COMPLETION_API_URL", "https://api.example.com/v1/chat/completions"),
            ("COMPLETION_API_KEY", "sk-test"),
            ("COMPLETION_FAILURE_THRESHOLD", "2"),
        ])
        .unwrap();
        let completion = config.completion.unwrap();
        assert_eq!(completion.api_key.as_deref(), Some("sk-test"));
        assert_eq!(completion.model, DEFAULT_COMPLETION_MODEL);
        assert_eq!(completion.circuit_breaker_threshold, 2);
        assert_eq!(completion.circuit_breaker_reset_secs, 60);
    }
}
