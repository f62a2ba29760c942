//! UI Builder module for turning screens into Telegram inline keyboards

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::warn;

use crate::navigation::{Control, ControlAction, Screen};

fn button_for(control: &Control) -> Option<InlineKeyboardButton> {
    match &control.action {
        ControlAction::Navigate(token) => Some(InlineKeyboardButton::callback(
            control.label.clone(),
            token.encode(),
        )),
        ControlAction::Url(raw) => match raw.parse::<reqwest::Url>() {
            Ok(url) => Some(InlineKeyboardButton::url(control.label.clone(), url)),
            Err(e) => {
                warn!(url = %raw, error = %e, "Skipping button with invalid URL");
                None
            }
        },
    }
}

/// Create the inline keyboard for a screen, one keyboard row per screen row
pub fn create_screen_keyboard(screen: &Screen) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = screen
        .rows
        .iter()
        .map(|row| row.iter().filter_map(button_for).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();

    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;
    use crate::token::NavigationToken;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_callback_buttons_carry_encoded_tokens() {
        let screen = Screen {
            text: "menu".to_string(),
            rows: vec![vec![
                Control::navigate("◀", NavigationToken::ShowPage { page: 0, locale: Locale::UzLatin }),
                Control::navigate("▶", NavigationToken::ShowPage { page: 2, locale: Locale::UzLatin }),
            ]],
        };

        let keyboard = create_screen_keyboard(&screen);
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert_eq!(keyboard.inline_keyboard[0].len(), 2);
        assert_eq!(keyboard.inline_keyboard[0][1].text, "▶");
        assert!(matches!(
            &keyboard.inline_keyboard[0][1].kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == "page:2:uz"
        ));
    }

    #[test]
    fn test_url_buttons() {
        let screen = Screen {
            text: "relay".to_string(),
            rows: vec![
                vec![Control::url("Open", "https://t.me/umra_faq_bot?start=menu")],
                vec![Control::url("Broken", "not a url")],
            ],
        };

        let keyboard = create_screen_keyboard(&screen);
        // The invalid URL row is dropped entirely
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert!(matches!(
            &keyboard.inline_keyboard[0][0].kind,
            InlineKeyboardButtonKind::Url(url) if url.as_str() == "https://t.me/umra_faq_bot?start=menu"
        ));
    }

    #[test]
    fn test_text_only_screen_has_empty_keyboard() {
        let keyboard = create_screen_keyboard(&Screen::text_only("hello"));
        assert!(keyboard.inline_keyboard.is_empty());
    }
}
