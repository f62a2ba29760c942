//! Message Handler module for processing incoming Telegram text messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{debug, info, warn};

use crate::completion::catalog_context;
use crate::deep_link;
use crate::navigation::{NavState, Screen};

use super::gateway::RenderTarget;
use super::relay::{relay_group_message, RelayOutcome};
use super::state::BotState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Other,
}

/// A text message, stripped of Telegram specifics.
#[derive(Debug, Clone)]
pub struct InboundText {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub message_id: MessageId,
    pub author: Option<UserId>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOutcome {
    /// `/start` rendered this state as a new message
    Started(NavState),
    Relayed(RelayOutcome),
    /// Free-text question answered by the completion API
    Answered,
    /// Completion or answer delivery failed and the user got an apology
    Apologized,
    /// No completion client, the entry menu was sent instead
    MenuSent,
    Ignored,
    /// A reply could not be delivered
    SendFailed,
}

/// Payload of a `/start` command (`/start`, `/start payload`, `/start@bot payload`).
pub fn parse_start_command(text: &str) -> Option<&str> {
    let text = text.trim();
    let (command, rest) = match text.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (text, ""),
    };
    let command = command.split('@').next().unwrap_or(command);
    (command == "/start").then_some(rest)
}

fn is_command(text: &str) -> bool {
    text.trim_start().starts_with('/')
}

/// Handle incoming messages; only text messages are of interest
pub async fn message_handler(msg: Message, state: Arc<BotState>) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat_kind = if msg.chat.is_private() {
        ChatKind::Private
    } else if msg.chat.is_group() || msg.chat.is_supergroup() {
        ChatKind::Group
    } else {
        ChatKind::Other
    };

    let inbound = InboundText {
        chat_id: msg.chat.id,
        chat_kind,
        message_id: msg.id,
        author: msg.from.as_ref().map(|user| user.id),
        text: text.to_string(),
    };
    let outcome = handle_text(&state, inbound).await;
    debug!(chat_id = %msg.chat.id, outcome = ?outcome, "Handled text message");

    Ok(())
}

/// Route a text message: `/start`, group relay, or private free text.
pub async fn handle_text(state: &BotState, inbound: InboundText) -> TextOutcome {
    let Some(author) = inbound.author else {
        return TextOutcome::Ignored;
    };

    if let Some(payload) = parse_start_command(&inbound.text) {
        return handle_start(state, inbound.chat_id, author, payload).await;
    }
    if is_command(&inbound.text) {
        return TextOutcome::Ignored;
    }

    match inbound.chat_kind {
        ChatKind::Group if state.relay_enabled_in(inbound.chat_id.0) => TextOutcome::Relayed(
            relay_group_message(state, inbound.chat_id, inbound.message_id, author).await,
        ),
        ChatKind::Private => handle_free_text(state, inbound.chat_id, author, &inbound.text).await,
        _ => TextOutcome::Ignored,
    }
}

/// `/start [payload]`: render the deep-linked screen as a new message.
pub async fn handle_start(state: &BotState, chat_id: ChatId, user: UserId, payload: &str) -> TextOutcome {
    let locale = state.navigator.resolver().get(user).await;
    let token = deep_link::resolve(payload, locale);
    info!(user_id = %user, payload = %payload, token = %token, "Start command received");

    let rendered = state.navigator.apply(user, &token).await;
    match state
        .gateway
        .render(RenderTarget::New { chat_id }, &rendered.screen)
        .await
    {
        Ok(()) => TextOutcome::Started(rendered.state),
        Err(e) => {
            warn!(user_id = %user, error = %e, "Failed to send start screen");
            TextOutcome::SendFailed
        }
    }
}

async fn handle_free_text(state: &BotState, chat_id: ChatId, user: UserId, question: &str) -> TextOutcome {
    let locale = state.navigator.resolver().get(user).await;
    let localization = state.navigator.localization();

    let Some(client) = &state.completion else {
        let menu = state.navigator.menu(0, locale).screen;
        return match state.gateway.render(RenderTarget::New { chat_id }, &menu).await {
            Ok(()) => TextOutcome::MenuSent,
            Err(e) => {
                warn!(user_id = %user, error = %e, "Failed to send menu for free-text message");
                TextOutcome::SendFailed
            }
        };
    };

    let instructions = localization.get_message("completion-instructions", locale);
    let context = catalog_context(state.navigator.content(), locale);
    match client.complete(&instructions, &context, question).await {
        Ok(answer) => {
            let delivered = state
                .gateway
                .render(RenderTarget::New { chat_id }, &Screen::text_only(answer))
                .await;
            match delivered {
                Ok(()) => return TextOutcome::Answered,
                Err(e) => warn!(user_id = %user, error = %e, "Failed to deliver free-text answer"),
            }
        }
        Err(e) => warn!(user_id = %user, error = %e, "Free-text answer unavailable"),
    }

    let apology = Screen::text_only(localization.get_message("upstream-apology", locale));
    match state.gateway.render(RenderTarget::New { chat_id }, &apology).await {
        Ok(()) => TextOutcome::Apologized,
        Err(e) => {
            warn!(user_id = %user, error = %e, "Failed to send apology");
            TextOutcome::SendFailed
        }
    }
}
