//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use teloxide::types::{ChatId, MessageId};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use umra_faq_bot::bot::{BotState, ChatGateway};
use umra_faq_bot::content::ContentStore;
use umra_faq_bot::errors::BotError;
use umra_faq_bot::locale_store::{JsonFileLocaleStore, LocaleResolver};
use umra_faq_bot::localization::LocalizationManager;
use umra_faq_bot::navigation::{Navigator, Screen};

pub const BOT_USERNAME: &str = "umra_faq_bot";

/// A call made through the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send { chat_id: ChatId, screen: Screen },
    Edit { chat_id: ChatId, message_id: MessageId, screen: Screen },
    Delete { chat_id: ChatId, message_id: MessageId },
}

/// Gateway that records every call and can simulate platform refusals.
#[derive(Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<Call>>,
    next_message_id: AtomicI32,
    /// Chats that refuse new messages (user never started the bot)
    pub blocked_chats: Mutex<HashSet<ChatId>>,
    /// Deleting fails as if the bot were not an admin
    pub deny_delete: Mutex<bool>,
    /// Every edit reports "message is not modified"
    pub edits_unchanged: Mutex<bool>,
    /// Texts longer than this are rejected like Telegram's "message is too long"
    pub max_text_chars: Mutex<Option<usize>>,
}

impl RecordingGateway {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn block_chat(&self, chat_id: ChatId) {
        self.blocked_chats.lock().unwrap().insert(chat_id);
    }

    pub fn deny_delete(&self) {
        *self.deny_delete.lock().unwrap() = true;
    }

    pub fn report_unchanged_edits(&self) {
        *self.edits_unchanged.lock().unwrap() = true;
    }

    pub fn reject_longer_than(&self, chars: usize) {
        *self.max_text_chars.lock().unwrap() = Some(chars);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatGateway for RecordingGateway {
    async fn send_screen(&self, chat_id: ChatId, screen: &Screen) -> Result<MessageId, BotError> {
        if self.blocked_chats.lock().unwrap().contains(&chat_id) {
            return Err(BotError::PermissionDenied(
                "Forbidden: bot can't initiate conversation with a user".to_string(),
            ));
        }
        if let Some(limit) = *self.max_text_chars.lock().unwrap() {
            if screen.text.chars().count() > limit {
                return Err(BotError::UpstreamUnavailable(
                    "Bad Request: message is too long".to_string(),
                ));
            }
        }
        self.record(Call::Send {
            chat_id,
            screen: screen.clone(),
        });
        Ok(MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1000))
    }

    async fn edit_screen(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        screen: &Screen,
    ) -> Result<(), BotError> {
        self.record(Call::Edit {
            chat_id,
            message_id,
            screen: screen.clone(),
        });
        if *self.edits_unchanged.lock().unwrap() {
            return Err(BotError::Unchanged);
        }
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), BotError> {
        if *self.deny_delete.lock().unwrap() {
            return Err(BotError::PermissionDenied(
                "Bad Request: message can't be deleted".to_string(),
            ));
        }
        self.record(Call::Delete {
            chat_id,
            message_id,
        });
        Ok(())
    }
}

/// Bot state over the embedded catalog, a temp-dir locale store and a recording gateway.
pub struct Harness {
    pub state: BotState,
    pub gateway: Arc<RecordingGateway>,
    pub dir: TempDir,
}

pub fn harness() -> Harness {
    harness_with(|state| state)
}

pub fn harness_with(configure: impl FnOnce(BotState) -> BotState) -> Harness {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonFileLocaleStore::open(dir.path().join("user_locales.json")));
    let navigator = Navigator::new(
        Arc::new(ContentStore::embedded().unwrap()),
        Arc::new(LocalizationManager::new().unwrap()),
        Arc::new(LocaleResolver::new(store)),
        8,
    )
    .with_bot_username(BOT_USERNAME);

    let gateway = Arc::new(RecordingGateway::default());
    let state = configure(BotState::new(navigator, gateway.clone()));
    Harness {
        state,
        gateway,
        dir,
    }
}

/// Serve one OpenAI-style completion with `answer` per connection.
///
/// Returns the endpoint URL.
pub async fn completion_stub(answer: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": answer}}]
    })
    .to_string();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}/v1/chat/completions")
}

/// Read headers and the declared body so the client sees a complete exchange.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= header_end + 4 + content_length {
            return;
        }
    }
}
