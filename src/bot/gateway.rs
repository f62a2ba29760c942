//! Chat gateway: the send/edit/delete primitives the handlers render through.
//!
//! Handlers only see the [`ChatGateway`] trait, so the same render code can
//! either edit the message a button was pressed on or send a fresh message.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::requests::Request;
use teloxide::types::{LinkPreviewOptions, MessageId};
use teloxide::{ApiError, RequestError};
use tracing::debug;

use crate::errors::BotError;
use crate::navigation::Screen;

use super::ui_builder::create_screen_keyboard;

/// Where a rendered screen goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// Replace the text and keyboard of an existing message
    Edit { chat_id: ChatId, message_id: MessageId },
    /// Post a new message
    New { chat_id: ChatId },
}

#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn send_screen(&self, chat_id: ChatId, screen: &Screen) -> Result<MessageId, BotError>;

    async fn edit_screen(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        screen: &Screen,
    ) -> Result<(), BotError>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), BotError>;

    /// Write `screen` to `target`. An edit that changes nothing counts as success.
    async fn render(&self, target: RenderTarget, screen: &Screen) -> Result<(), BotError> {
        match target {
            RenderTarget::Edit { chat_id, message_id } => {
                match self.edit_screen(chat_id, message_id, screen).await {
                    Err(BotError::Unchanged) => Ok(()),
                    other => other,
                }
            }
            RenderTarget::New { chat_id } => self.send_screen(chat_id, screen).await.map(|_| ()),
        }
    }
}

/// Classify a Telegram failure into the bot's error taxonomy.
pub fn classify_request_error(err: &RequestError) -> BotError {
    match err {
        RequestError::Api(ApiError::MessageNotModified) => BotError::Unchanged,
        RequestError::Api(
            ApiError::BotBlocked
            | ApiError::BotKicked
            | ApiError::CantInitiateConversation
            | ApiError::MessageCantBeDeleted
            | ApiError::MessageToDeleteNotFound
            | ApiError::ChatNotFound
            | ApiError::UserDeactivated,
        ) => BotError::PermissionDenied(err.to_string()),
        RequestError::Api(ApiError::Unknown(msg))
            if msg.contains("Forbidden") || msg.contains("not enough rights") =>
        {
            BotError::PermissionDenied(msg.clone())
        }
        other => BotError::UpstreamUnavailable(other.to_string()),
    }
}

/// Answers and menus carry `t.me` links that must not expand into cards.
pub fn no_link_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

/// [`ChatGateway`] backed by the Telegram Bot API.
///
/// Every call is bounded by `timeout`; a timed-out call is abandoned.
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
    timeout: Duration,
}

impl TelegramGateway {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self { bot, timeout }
    }

    async fn call<F, T>(&self, what: &'static str, request: F) -> Result<T, BotError>
    where
        F: Future<Output = Result<T, RequestError>> + Send,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                debug!(operation = what, error = %e, "Telegram request failed");
                Err(classify_request_error(&e))
            }
            Err(_) => Err(BotError::UpstreamUnavailable(format!(
                "{what} timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl ChatGateway for TelegramGateway {
    async fn send_screen(&self, chat_id: ChatId, screen: &Screen) -> Result<MessageId, BotError> {
        let mut request = self
            .bot
            .send_message(chat_id, screen.text.clone())
            .link_preview_options(no_link_preview());
        if !screen.rows.is_empty() {
            request = request.reply_markup(create_screen_keyboard(screen));
        }
        let message = self.call("sendMessage", request.send()).await?;
        Ok(message.id)
    }

    async fn edit_screen(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        screen: &Screen,
    ) -> Result<(), BotError> {
        let request = self
            .bot
            .edit_message_text(chat_id, message_id, screen.text.clone())
            .link_preview_options(no_link_preview())
            .reply_markup(create_screen_keyboard(screen));
        self.call("editMessageText", request.send()).await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), BotError> {
        self.call("deleteMessage", self.bot.delete_message(chat_id, message_id).send())
            .await?;
        Ok(())
    }
}
