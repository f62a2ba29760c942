//! Shared state injected into every handler.

use std::sync::Arc;
use std::time::Duration;

use crate::completion::CompletionClient;
use crate::config::DEFAULT_OUTBOUND_TIMEOUT_SECS;
use crate::navigation::Navigator;

use super::gateway::ChatGateway;

pub struct BotState {
    pub navigator: Navigator,
    pub gateway: Arc<dyn ChatGateway>,
    pub completion: Option<CompletionClient>,
    /// Restricts the group relay to one group
    pub allowed_chat_id: Option<i64>,
    /// Bound for Telegram calls made outside the gateway (callback acks)
    pub outbound_timeout: Duration,
}

impl BotState {
    pub fn new(navigator: Navigator, gateway: Arc<dyn ChatGateway>) -> Self {
        Self {
            navigator,
            gateway,
            completion: None,
            allowed_chat_id: None,
            outbound_timeout: Duration::from_secs(DEFAULT_OUTBOUND_TIMEOUT_SECS),
        }
    }

    pub fn with_completion(mut self, completion: CompletionClient) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn with_allowed_chat_id(mut self, chat_id: Option<i64>) -> Self {
        self.allowed_chat_id = chat_id;
        self
    }

    pub fn with_outbound_timeout(mut self, timeout: Duration) -> Self {
        self.outbound_timeout = timeout;
        self
    }

    pub fn relay_enabled_in(&self, chat_id: i64) -> bool {
        self.allowed_chat_id.map_or(true, |allowed| allowed == chat_id)
    }
}
