//! # Completion Client Module
//!
//! Optional free-text answering for questions typed in a private chat. The
//! question is forwarded to an OpenAI-compatible chat-completions endpoint
//! together with the topic catalog in the user's locale.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::CompletionConfig;
use crate::content::ContentStore;
use crate::errors::BotError;
use crate::locale::Locale;

/// Longest question forwarded upstream, in characters.
pub const MAX_QUESTION_CHARS: usize = 1000;

/// Longest answer sent back to the chat. Telegram rejects texts over 4096.
pub const MAX_ANSWER_CHARS: usize = 4000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Catalog rendered as plain text for the system prompt.
pub fn catalog_context(content: &ContentStore, locale: Locale) -> String {
    content
        .topics()
        .filter_map(|topic| content.lookup(&topic.key, locale).ok())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

pub fn build_request(model: &str, instructions: &str, context: &str, question: &str) -> ChatRequest {
    let question: String = question.trim().chars().take(MAX_QUESTION_CHARS).collect();
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: format!("{instructions}\n\n{context}"),
            },
            ChatMessage {
                role: "user".to_string(),
                content: question,
            },
        ],
        temperature: 0.2,
    }
}

/// First non-empty choice of a completion response, cut to [`MAX_ANSWER_CHARS`].
pub fn extract_answer(response: ChatResponse) -> Result<String, BotError> {
    response
        .choices
        .into_iter()
        .filter_map(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
        .map(truncate_answer)
        .ok_or_else(|| BotError::UpstreamUnavailable("completion returned no content".to_string()))
}

fn truncate_answer(answer: String) -> String {
    if answer.chars().count() <= MAX_ANSWER_CHARS {
        return answer;
    }
    let mut cut: String = answer.chars().take(MAX_ANSWER_CHARS - 1).collect();
    cut.push('…');
    cut
}

/// HTTP client for the completion endpoint, guarded by a circuit breaker.
pub struct CompletionClient {
    http: reqwest::Client,
    config: CompletionConfig,
    breaker: CircuitBreaker,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self, BotError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BotError::Config(format!("cannot build completion client: {e}")))?;
        let breaker = CircuitBreaker::new(&config);
        info!(api_url = %config.api_url, model = %config.model, "Completion client configured");
        Ok(Self {
            http,
            config,
            breaker,
        })
    }

    /// Ask the completion API. Never retried; every failure counts against the breaker.
    pub async fn complete(&self, instructions: &str, context: &str, question: &str) -> Result<String, BotError> {
        if self.breaker.is_open() {
            warn!("Completion circuit is open, failing fast");
            return Err(BotError::UpstreamUnavailable("circuit open".to_string()));
        }

        let request = build_request(&self.config.model, instructions, context, question);
        match self.send(&request).await {
            Ok(answer) => {
                self.breaker.record_success();
                debug!(answer_length = answer.len(), "Completion succeeded");
                Ok(answer)
            }
            Err(e) => {
                self.breaker.record_failure();
                warn!(error = %e, "Completion request failed");
                Err(e)
            }
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, BotError> {
        let mut builder = self.http.post(&self.config.api_url).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?.error_for_status()?;
        let body: ChatResponse = response.json().await?;
        extract_answer(body)
    }
}
