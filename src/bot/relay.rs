//! Moderation relay: moves group questions into a private chat with the author.

use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{info, warn};

use crate::deep_link::{self, MENU_PAYLOAD};
use crate::navigation::{Control, Screen};

use super::gateway::RenderTarget;
use super::state::BotState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The author received the menu privately
    Private,
    /// Private send failed; a start-the-bot button was posted in the group
    Fallback,
    /// Neither the private menu nor the fallback could be delivered
    Failed,
}

/// Private chat id of a user.
pub fn private_chat(user: UserId) -> ChatId {
    ChatId(user.0 as i64)
}

/// Delete a group message (best-effort), then continue with its author privately.
pub async fn relay_group_message(
    state: &BotState,
    group: ChatId,
    message_id: MessageId,
    author: UserId,
) -> RelayOutcome {
    if let Err(e) = state.gateway.delete_message(group, message_id).await {
        warn!(chat_id = %group, user_id = %author, error = %e, "Could not delete group message");
    }

    let locale = state.navigator.resolver().get(author).await;
    let menu = state.navigator.menu(0, locale);

    let private_error = match state
        .gateway
        .render(RenderTarget::New { chat_id: private_chat(author) }, &menu.screen)
        .await
    {
        Ok(()) => {
            info!(chat_id = %group, user_id = %author, "Relayed group question to private chat");
            return RelayOutcome::Private;
        }
        Err(e) => e,
    };

    warn!(user_id = %author, error = %private_error, "Private relay failed, posting fallback in group");

    let Some(bot_username) = state.navigator.bot_username() else {
        warn!(chat_id = %group, "Bot username unknown, cannot build fallback link");
        return RelayOutcome::Failed;
    };

    let localization = state.navigator.localization();
    let fallback = Screen {
        text: localization.get_message("relay-fallback", locale),
        rows: vec![vec![Control::url(
            localization.get_message("relay-fallback-button", locale),
            deep_link::start_link(bot_username, MENU_PAYLOAD),
        )]],
    };

    match state
        .gateway
        .render(RenderTarget::New { chat_id: group }, &fallback)
        .await
    {
        Ok(()) => RelayOutcome::Fallback,
        Err(e) => {
            warn!(chat_id = %group, error = %e, "Failed to post relay fallback");
            RelayOutcome::Failed
        }
    }
}
