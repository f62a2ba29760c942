//! # Content Store Module
//!
//! Immutable catalog of help topics. The catalog is a JSON document loaded
//! once at startup, either the one embedded in the binary or a file named by
//! the configuration.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use crate::errors::BotError;
use crate::locale::Locale;

/// Longest topic key accepted by the catalog.
///
/// Keeps `faq:<key>:<locale>:<page>` under the 64-byte callback limit for any page number.
pub const MAX_TOPIC_KEY_LEN: usize = 32;

const EMBEDDED_CATALOG: &str = include_str!("../content/faq.json");

lazy_static! {
    static ref TOPIC_KEY_PATTERN: Regex =
        Regex::new(r"^[a-z0-9_]+$").expect("Topic key pattern should be valid");
}

/// Stable identifier of a topic, restricted to `[a-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicKey(String);

impl TopicKey {
    pub fn new(key: impl Into<String>) -> Result<Self, BotError> {
        let key = key.into();
        if key.is_empty() || key.len() > MAX_TOPIC_KEY_LEN || !TOPIC_KEY_PATTERN.is_match(&key) {
            return Err(BotError::Malformed(format!("invalid topic key '{key}'")));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single question/answer pair.
#[derive(Debug, Clone)]
pub struct TopicEntry {
    pub key: TopicKey,
    title: HashMap<Locale, String>,
    body: HashMap<Locale, String>,
    /// Append the catalog promo block to this answer
    pub promo: bool,
}

impl TopicEntry {
    fn body_in(&self, locale: Locale) -> &str {
        self.body
            .get(&locale)
            .or_else(|| self.body.get(&Locale::PRIMARY))
            .map(String::as_str)
            .unwrap_or_default()
    }

    fn title_in(&self, locale: Locale) -> String {
        if let Some(title) = self.title.get(&locale) {
            return title.clone();
        }
        // Falling back to the body keeps the button in the requested script.
        if self.body.contains_key(&locale) {
            return first_line(self.body_in(locale));
        }
        match self.title.get(&Locale::PRIMARY) {
            Some(title) => title.clone(),
            None => first_line(self.body_in(Locale::PRIMARY)),
        }
    }
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[derive(Debug, Deserialize)]
struct CatalogDefinition {
    #[serde(default)]
    promo: BTreeMap<String, String>,
    topics: Vec<TopicDefinition>,
}

#[derive(Debug, Deserialize)]
struct TopicDefinition {
    key: String,
    #[serde(default)]
    title: BTreeMap<String, String>,
    body: BTreeMap<String, String>,
    #[serde(default)]
    promo: bool,
}

fn localized(field: &str, key: &str, raw: BTreeMap<String, String>) -> Result<HashMap<Locale, String>, BotError> {
    raw.into_iter()
        .map(|(code, text)| {
            let locale = Locale::from_code(&code).ok_or_else(|| {
                BotError::Catalog(format!("topic '{key}' has {field} in unknown locale '{code}'"))
            })?;
            Ok((locale, text.trim().to_string()))
        })
        .collect()
}

/// Read-only topic catalog.
#[derive(Debug, Clone)]
pub struct ContentStore {
    topics: Vec<TopicEntry>,
    index: HashMap<TopicKey, usize>,
    promo: HashMap<Locale, String>,
}

impl ContentStore {
    /// Catalog compiled into the binary.
    pub fn embedded() -> Result<Self, BotError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BotError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BotError::Catalog(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    /// Parse and validate a catalog definition.
    pub fn from_json(raw: &str) -> Result<Self, BotError> {
        let definition: CatalogDefinition =
            serde_json::from_str(raw).map_err(|e| BotError::Catalog(e.to_string()))?;

        if definition.topics.is_empty() {
            return Err(BotError::Catalog("catalog has no topics".to_string()));
        }

        let promo = localized("promo", "*", definition.promo)?;
        let mut topics = Vec::with_capacity(definition.topics.len());
        let mut index = HashMap::new();

        for topic in definition.topics {
            let key = TopicKey::new(topic.key.as_str())
                .map_err(|_| BotError::Catalog(format!("invalid topic key '{}'", topic.key)))?;
            let body = localized("body", key.as_str(), topic.body)?;
            if body.get(&Locale::PRIMARY).map_or(true, |text| text.is_empty()) {
                return Err(BotError::Catalog(format!(
                    "topic '{key}' has no body in the primary locale"
                )));
            }
            let title = localized("title", key.as_str(), topic.title)?;

            if index.insert(key.clone(), topics.len()).is_some() {
                return Err(BotError::Catalog(format!("duplicate topic key '{key}'")));
            }
            topics.push(TopicEntry {
                key,
                title,
                body,
                promo: topic.promo,
            });
        }

        Ok(Self {
            topics,
            index,
            promo,
        })
    }

    fn entry(&self, key: &TopicKey) -> Result<&TopicEntry, BotError> {
        self.index
            .get(key)
            .map(|&i| &self.topics[i])
            .ok_or_else(|| BotError::NotFound(key.to_string()))
    }

    /// Body of a topic, falling back to the primary locale.
    pub fn lookup(&self, key: &TopicKey, locale: Locale) -> Result<&str, BotError> {
        Ok(self.entry(key)?.body_in(locale))
    }

    /// Stored title, or the first line of the body.
    pub fn title_of(&self, key: &TopicKey, locale: Locale) -> Result<String, BotError> {
        Ok(self.entry(key)?.title_in(locale))
    }

    /// Full answer text: the body plus the promo block for promoted topics.
    pub fn answer_text(&self, key: &TopicKey, locale: Locale) -> Result<String, BotError> {
        let entry = self.entry(key)?;
        let body = entry.body_in(locale);
        let promo = self
            .promo
            .get(&locale)
            .or_else(|| self.promo.get(&Locale::PRIMARY));

        match promo {
            Some(block) if entry.promo && !block.is_empty() => Ok(format!("{body}\n\n{block}")),
            _ => Ok(body.to_string()),
        }
    }

    pub fn contains(&self, key: &TopicKey) -> bool {
        self.index.contains_key(key)
    }

    /// Topic keys in catalog order.
    pub fn ordered_keys(&self) -> Vec<TopicKey> {
        self.topics.iter().map(|t| t.key.clone()).collect()
    }

    pub fn topics(&self) -> impl Iterator<Item = &TopicEntry> {
        self.topics.iter()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
