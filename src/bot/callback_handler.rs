//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::requests::Request;
use teloxide::types::MessageId;
use tracing::{debug, warn};

use crate::navigation::NavState;
use crate::token::NavigationToken;

use super::gateway::RenderTarget;
use super::state::BotState;

/// A button press, stripped of Telegram specifics.
#[derive(Debug, Clone)]
pub struct CallbackEvent {
    pub user: UserId,
    /// Chat and message the pressed button belongs to
    pub origin: Option<(ChatId, MessageId)>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The originating message now shows this state
    Rendered(NavState),
    /// Malformed token or no message to edit; nothing changed
    Ignored,
    /// The screen was computed but the edit failed
    RenderFailed(NavState),
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, state: Arc<BotState>) -> Result<()> {
    debug!(user_id = %q.from.id, "Received callback query from user");

    // Answer the callback query first to remove the loading state
    let ack = bot.answer_callback_query(q.id.clone()).send();
    match tokio::time::timeout(state.outbound_timeout, ack).await {
        Ok(Ok(_)) => (),
        Ok(Err(e)) => warn!(user_id = %q.from.id, error = %e, "Failed to answer callback query"),
        Err(_) => warn!(user_id = %q.from.id, "Answering callback query timed out"),
    }

    let event = CallbackEvent {
        user: q.from.id,
        origin: q.message.as_ref().map(|msg| (msg.chat().id, msg.id())),
        data: q.data.clone(),
    };
    handle_callback(&state, event).await;

    Ok(())
}

/// Decode the token, apply it, and edit the originating message in place.
pub async fn handle_callback(state: &BotState, event: CallbackEvent) -> CallbackOutcome {
    let data = event.data.as_deref().unwrap_or("");
    let token = match NavigationToken::decode(data) {
        Ok(token) => token,
        Err(e) => {
            debug!(user_id = %event.user, error = %e, "Ignoring callback with malformed token");
            return CallbackOutcome::Ignored;
        }
    };

    let Some((chat_id, message_id)) = event.origin else {
        debug!(user_id = %event.user, "Callback has no accessible message to edit");
        return CallbackOutcome::Ignored;
    };

    let rendered = state.navigator.apply(event.user, &token).await;
    match state
        .gateway
        .render(RenderTarget::Edit { chat_id, message_id }, &rendered.screen)
        .await
    {
        Ok(()) => CallbackOutcome::Rendered(rendered.state),
        Err(e) => {
            warn!(user_id = %event.user, chat_id = %chat_id, error = %e, "Failed to edit message for navigation");
            CallbackOutcome::RenderFailed(rendered.state)
        }
    }
}
