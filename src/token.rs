//! # Navigation Token Codec
//!
//! Every inline button carries a compact `action:field:...` string describing
//! the next screen. Telegram keeps no session for us, so the token is the only
//! state that travels with a button press.
//!
//! | Token          | Wire form                    |
//! |----------------|------------------------------|
//! | `ShowPage`     | `page:<page>:<locale>`       |
//! | `SwitchLocale` | `lang:<locale>:<page>`       |
//! | `ShowAnswer`   | `faq:<key>:<locale>:<page>`  |
//! | `GoBack`       | `back:<locale>:<page>`       |

use std::fmt;

use crate::content::TopicKey;
use crate::errors::BotError;
use crate::locale::Locale;

/// Telegram's limit for `callback_data`, in bytes.
pub const MAX_TOKEN_LEN: usize = 64;

const DELIMITER: char = ':';

/// What to render when a control is pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationToken {
    ShowPage { page: u32, locale: Locale },
    SwitchLocale { locale: Locale, page: u32 },
    ShowAnswer { key: TopicKey, locale: Locale, page: u32 },
    GoBack { locale: Locale, page: u32 },
}

impl NavigationToken {
    pub fn encode(&self) -> String {
        match self {
            NavigationToken::ShowPage { page, locale } => format!("page:{page}:{locale}"),
            NavigationToken::SwitchLocale { locale, page } => format!("lang:{locale}:{page}"),
            NavigationToken::ShowAnswer { key, locale, page } => {
                format!("faq:{key}:{locale}:{page}")
            }
            NavigationToken::GoBack { locale, page } => format!("back:{locale}:{page}"),
        }
    }

    /// Parse a token. Anything `encode` cannot produce is `Malformed`.
    pub fn decode(raw: &str) -> Result<Self, BotError> {
        let malformed = || BotError::Malformed(raw.chars().take(MAX_TOKEN_LEN).collect());

        if raw.is_empty() || raw.len() > MAX_TOKEN_LEN {
            return Err(malformed());
        }

        let fields: Vec<&str> = raw.split(DELIMITER).collect();
        let token = match fields.as_slice() {
            ["page", page, locale] => NavigationToken::ShowPage {
                page: parse_page(page).ok_or_else(malformed)?,
                locale: Locale::from_code(locale).ok_or_else(malformed)?,
            },
            ["lang", locale, page] => NavigationToken::SwitchLocale {
                locale: Locale::from_code(locale).ok_or_else(malformed)?,
                page: parse_page(page).ok_or_else(malformed)?,
            },
            ["faq", key, locale, page] => NavigationToken::ShowAnswer {
                key: TopicKey::new(*key).map_err(|_| malformed())?,
                locale: Locale::from_code(locale).ok_or_else(malformed)?,
                page: parse_page(page).ok_or_else(malformed)?,
            },
            ["back", locale, page] => NavigationToken::GoBack {
                locale: Locale::from_code(locale).ok_or_else(malformed)?,
                page: parse_page(page).ok_or_else(malformed)?,
            },
            _ => return Err(malformed()),
        };

        Ok(token)
    }

    pub fn locale(&self) -> Locale {
        match self {
            NavigationToken::ShowPage { locale, .. }
            | NavigationToken::SwitchLocale { locale, .. }
            | NavigationToken::ShowAnswer { locale, .. }
            | NavigationToken::GoBack { locale, .. } => *locale,
        }
    }
}

impl fmt::Display for NavigationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Only canonical decimal numbers, so `decode` accepts exactly what `encode` writes.
fn parse_page(raw: &str) -> Option<u32> {
    let canonical = !raw.is_empty()
        && raw.bytes().all(|b| b.is_ascii_digit())
        && (raw == "0" || !raw.starts_with('0'));
    if canonical {
        raw.parse().ok()
    } else {
        None
    }
}
