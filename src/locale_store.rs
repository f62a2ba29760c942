//! # Locale Resolver Module
//!
//! Per-user locale preferences. The resolver sits in front of a durable
//! [`LocaleStore`] and serializes writes for the same user, so two racing
//! locale switches cannot lose an update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use teloxide::types::UserId;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::BotError;
use crate::locale::Locale;

/// Durable `user_id -> locale` mapping.
#[async_trait]
pub trait LocaleStore: Send + Sync {
    async fn load(&self, user: UserId) -> Result<Option<Locale>, BotError>;
    async fn save(&self, user: UserId, locale: Locale) -> Result<(), BotError>;
}

/// Record persisted for each user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocaleRecord {
    pub locale: Locale,
    pub updated_at: DateTime<Utc>,
}

/// Locale store backed by a single JSON file.
///
/// The whole map is kept in memory and the file is rewritten atomically
/// (temporary file in the same directory, then rename) on every change.
pub struct JsonFileLocaleStore {
    path: PathBuf,
    records: Mutex<HashMap<String, LocaleRecord>>,
}

impl JsonFileLocaleStore {
    /// Open the store. A missing, unreadable or corrupt file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, LocaleRecord>>(&raw) {
                Ok(records) => {
                    info!(path = %path.display(), users = records.len(), "Loaded locale preferences");
                    records
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Locale store is corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No locale store yet, starting empty");
                HashMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read locale store, starting empty");
                HashMap::new()
            }
        };

        Self {
            path,
            records: Mutex::new(records),
        }
    }

    /// Rewrite the file on the blocking pool; the caller holds the records lock,
    /// so snapshots land in the order they were taken.
    async fn write_snapshot(&self, records: &HashMap<String, LocaleRecord>) -> Result<(), BotError> {
        let json = serde_json::to_vec_pretty(records).map_err(|e| BotError::Storage(e.to_string()))?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &json))
            .await
            .map_err(|e| BotError::Storage(format!("locale store writer panicked: {e}")))?
    }
}

fn write_atomically(path: &Path, json: &[u8]) -> Result<(), BotError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| BotError::Storage(e.to_string()))?;
    Ok(())
}

#[async_trait]
impl LocaleStore for JsonFileLocaleStore {
    async fn load(&self, user: UserId) -> Result<Option<Locale>, BotError> {
        let records = self.records.lock().await;
        Ok(records.get(&user.0.to_string()).map(|r| r.locale))
    }

    async fn save(&self, user: UserId, locale: Locale) -> Result<(), BotError> {
        let mut records = self.records.lock().await;
        let previous = records.insert(
            user.0.to_string(),
            LocaleRecord {
                locale,
                updated_at: Utc::now(),
            },
        );

        if let Err(e) = self.write_snapshot(&records).await {
            // Keep memory consistent with what is on disk.
            match previous {
                Some(record) => records.insert(user.0.to_string(), record),
                None => records.remove(&user.0.to_string()),
            };
            return Err(e);
        }
        Ok(())
    }
}

/// Resolves and updates the display locale of each user.
pub struct LocaleResolver {
    store: Arc<dyn LocaleStore>,
    user_locks: StdMutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl LocaleResolver {
    pub fn new(store: Arc<dyn LocaleStore>) -> Self {
        Self {
            store,
            user_locks: StdMutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, user: UserId) -> Arc<Mutex<()>> {
        let mut locks = match self.user_locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(locks.entry(user).or_default())
    }

    /// Persisted preference, or the primary locale for unseen users.
    ///
    /// Store failures degrade to the primary locale.
    pub async fn get(&self, user: UserId) -> Locale {
        match self.store.load(user).await {
            Ok(Some(locale)) => locale,
            Ok(None) => Locale::PRIMARY,
            Err(e) => {
                warn!(user_id = %user, error = %e, "Failed to read locale preference, using default");
                Locale::PRIMARY
            }
        }
    }

    /// Drop the user's lock entry once nobody but the map and `lock` holds it.
    fn release(&self, user: UserId, lock: Arc<Mutex<()>>) {
        let mut locks = match self.user_locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if locks
            .get(&user)
            .is_some_and(|entry| Arc::ptr_eq(entry, &lock) && Arc::strong_count(entry) == 2)
        {
            locks.remove(&user);
        }
    }

    /// Persist a preference. Writes for the same user are applied in call order.
    pub async fn set(&self, user: UserId, locale: Locale) -> Result<(), BotError> {
        let lock = self.lock_for(user);
        let result = {
            let _guard = lock.lock().await;
            self.store.save(user, locale).await
        };
        self.release(user, lock);

        result?;
        debug!(user_id = %user, locale = %locale, "Locale preference saved");
        Ok(())
    }
}
