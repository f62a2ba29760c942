//! PostgreSQL locale store, used when `DATABASE_URL` is configured.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use teloxide::types::UserId;
use tracing::{debug, info, warn};

use crate::errors::BotError;
use crate::locale::Locale;
use crate::locale_store::LocaleStore;

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_locales (
            telegram_id BIGINT PRIMARY KEY,
            locale TEXT NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create user_locales table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Locale preferences stored in the `user_locales` table.
pub struct PgLocaleStore {
    pool: PgPool,
}

impl PgLocaleStore {
    /// Connect and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        init_database_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn telegram_id(user: UserId) -> Result<i64, BotError> {
    i64::try_from(user.0).map_err(|_| BotError::Storage(format!("user id {user} out of range")))
}

#[async_trait]
impl LocaleStore for PgLocaleStore {
    async fn load(&self, user: UserId) -> Result<Option<Locale>, BotError> {
        let row = sqlx::query("SELECT locale FROM user_locales WHERE telegram_id = $1")
            .bind(telegram_id(user)?)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let code: String = row.try_get("locale")?;
        match Locale::from_code(&code) {
            Some(locale) => Ok(Some(locale)),
            None => {
                warn!(user_id = %user, locale = %code, "Ignoring unknown stored locale");
                Ok(None)
            }
        }
    }

    async fn save(&self, user: UserId, locale: Locale) -> Result<(), BotError> {
        sqlx::query(
            "INSERT INTO user_locales (telegram_id, locale, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (telegram_id) DO UPDATE SET locale = EXCLUDED.locale, updated_at = NOW()",
        )
        .bind(telegram_id(user)?)
        .bind(locale.code())
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user, locale = %locale, "Stored locale preference");
        Ok(())
    }
}
