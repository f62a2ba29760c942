//! Display languages supported by the bot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::BotError;

/// A selectable display language.
///
/// The set is closed and small enough to render as a single button row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    /// Uzbek in Latin script, the default for every new user
    #[default]
    #[serde(rename = "uz")]
    UzLatin,
    /// Uzbek in Cyrillic script
    #[serde(rename = "kr")]
    UzCyrillic,
}

impl Locale {
    /// Locale used on first contact and as the content fallback.
    pub const PRIMARY: Locale = Locale::UzLatin;

    /// Every supported locale, in locale-row order.
    pub const ALL: [Locale; 2] = [Locale::UzLatin, Locale::UzCyrillic];

    /// Short code used in navigation tokens, the catalog and the locale store.
    pub fn code(self) -> &'static str {
        match self {
            Locale::UzLatin => "uz",
            Locale::UzCyrillic => "kr",
        }
    }

    /// Label shown on the locale-switch button.
    pub fn label(self) -> &'static str {
        match self {
            Locale::UzLatin => "UZB",
            Locale::UzCyrillic => "КРИЛ",
        }
    }

    /// BCP 47 identifier used to build the Fluent bundle.
    pub fn language_tag(self) -> &'static str {
        match self {
            Locale::UzLatin => "uz-Latn",
            Locale::UzCyrillic => "uz-Cyrl",
        }
    }

    pub fn from_code(code: &str) -> Option<Locale> {
        Locale::ALL.into_iter().find(|locale| locale.code() == code)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::from_code(s).ok_or_else(|| BotError::Malformed(format!("unknown locale '{s}'")))
    }
}
