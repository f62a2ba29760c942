//! Deep-link dispatcher for `/start <payload>`.
//!
//! `https://t.me/<bot>?start=topic_miqot` opens the bot with payload
//! `topic_miqot`. Payloads map onto the same tokens the buttons carry, and an
//! unrecognized payload degrades to the plain entry menu.

use crate::content::TopicKey;
use crate::locale::Locale;
use crate::token::NavigationToken;

pub const TOPIC_PREFIX: &str = "topic_";
/// Prefix used by links shared before `topic_` existed.
pub const LEGACY_TOPIC_PREFIX: &str = "faq_";
pub const MENU_PAYLOAD: &str = "menu";

/// Map a start payload to a navigation token, rendering in `locale`.
pub fn resolve(payload: &str, locale: Locale) -> NavigationToken {
    let payload = payload.trim();
    let entry = NavigationToken::ShowPage { page: 0, locale };

    if payload == MENU_PAYLOAD {
        return entry;
    }

    let key = payload
        .strip_prefix(TOPIC_PREFIX)
        .or_else(|| payload.strip_prefix(LEGACY_TOPIC_PREFIX))
        .and_then(|raw| TopicKey::new(raw).ok());

    match key {
        Some(key) => NavigationToken::ShowAnswer {
            key,
            locale,
            page: 0,
        },
        None => entry,
    }
}

/// Payload that opens a topic directly.
pub fn topic_payload(key: &TopicKey) -> String {
    format!("{TOPIC_PREFIX}{key}")
}

/// `t.me` link that starts the bot with `payload`.
pub fn start_link(bot_username: &str, payload: &str) -> String {
    format!(
        "https://t.me/{}?start={payload}",
        bot_username.trim_start_matches('@')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> TopicKey {
        TopicKey::new(s).unwrap()
    }

    #[test]
    fn test_topic_payload() {
        assert_eq!(
            resolve("topic_miqot", Locale::PRIMARY),
            NavigationToken::ShowAnswer {
                key: key("miqot"),
                locale: Locale::PRIMARY,
                page: 0
            }
        );
    }

    #[test]
    fn test_legacy_faq_payload() {
        assert_eq!(
            resolve("faq_madina_3kun", Locale::UzCyrillic),
            NavigationToken::ShowAnswer {
                key: key("madina_3kun"),
                locale: Locale::UzCyrillic,
                page: 0
            }
        );
    }

    #[test]
    fn test_menu_and_unrecognized_payloads_open_menu() {
        let entry = NavigationToken::ShowPage {
            page: 0,
            locale: Locale::PRIMARY,
        };
        for payload in ["menu", "", "   ", "hello", "topic_", "topic_Bad-Key", "menu2"] {
            assert_eq!(resolve(payload, Locale::PRIMARY), entry, "payload {payload:?}");
        }
    }

    #[test]
    fn test_unknown_but_well_formed_key_still_resolves_to_answer() {
        // The navigator renders the not-found screen for it.
        assert!(matches!(
            resolve("topic_nonexistent_key", Locale::PRIMARY),
            NavigationToken::ShowAnswer { .. }
        ));
    }

    #[test]
    fn test_start_link() {
        assert_eq!(
            start_link("@umra_faq_bot", MENU_PAYLOAD),
            "https://t.me/umra_faq_bot?start=menu"
        );
        assert_eq!(
            start_link("umra_faq_bot", &topic_payload(&key("qubo"))),
            "https://t.me/umra_faq_bot?start=topic_qubo"
        );
    }
}
