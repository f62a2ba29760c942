//! # Error Types Module
//!
//! This module defines the error taxonomy shared by the navigation engine,
//! the locale stores and the chat gateway.

use thiserror::Error;

/// Errors produced while handling a single inbound event.
///
/// None of these are fatal to the process: handlers log them and move on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BotError {
    /// Unknown topic key
    #[error("Topic not found: {0}")]
    NotFound(String),
    /// Undecodable navigation token
    #[error("Malformed navigation token: {0}")]
    Malformed(String),
    /// The platform refused a delete or a send (blocked bot, missing rights, no private chat)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Platform or completion API failure, including timeouts
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    /// An edit produced the exact same message
    #[error("Message not modified")]
    Unchanged,
    /// Locale store read or write failure
    #[error("Storage error: {0}")]
    Storage(String),
    /// Invalid topic catalog definition
    #[error("Catalog error: {0}")]
    Catalog(String),
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for BotError {
    fn from(err: sqlx::Error) -> Self {
        BotError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        BotError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        BotError::UpstreamUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_formatting() {
        let err = BotError::NotFound("nonexistent_key".to_string());
        assert_eq!(err.to_string(), "Topic not found: nonexistent_key");

        let err = BotError::Malformed("faq:".to_string());
        assert_eq!(err.to_string(), "Malformed navigation token: faq:");
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        assert!(matches!(BotError::from(io), BotError::Storage(_)));
    }
}
