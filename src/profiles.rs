//! User profile persistence
//!
//! Profiles are stored one row per user with the structured fields as JSON
//! columns. The store trait exists so tests and future backends can swap the
//! implementation; the engine keeps auto-create logic for itself and the
//! store stays a plain CRUD surface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::{ConnectOptions, Row};
use std::str::FromStr;
use tracing::info;

use crate::error::{AttuneError, Result};
use crate::types::UserProfile;

/// Profile CRUD surface
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile; `ProfileNotFound` if the user has none
    async fn get(&self, user_id: &str) -> Result<UserProfile>;

    /// Insert or replace a profile
    async fn put(&self, profile: &UserProfile) -> Result<()>;

    /// Delete a profile; `ProfileNotFound` if the user has none
    async fn delete(&self, user_id: &str) -> Result<()>;

    /// All stored user ids
    async fn list(&self) -> Result<Vec<String>>;
}

/// SQLite-backed profile store
pub struct SqliteProfileStore {
    pool: SqlitePool,
}

impl SqliteProfileStore {
    /// Open (or create) the backing database and prepare the schema
    pub async fn new(database_url: &str) -> Result<Self> {
        info!("Connecting to profile database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(30))
            .disable_statement_logging();

        let pool = SqlitePool::connect_with(options).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS user_profiles (
                user_id TEXT PRIMARY KEY,
                tone_preferences TEXT NOT NULL,
                communication_style TEXT NOT NULL,
                interaction_history TEXT NOT NULL,
                context_preferences TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    fn row_to_profile(row: &SqliteRow) -> Result<UserProfile> {
        let tone: String = row.try_get("tone_preferences")?;
        let style: String = row.try_get("communication_style")?;
        let history: String = row.try_get("interaction_history")?;
        let context: Option<String> = row.try_get("context_preferences")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(UserProfile {
            user_id: row.try_get("user_id")?,
            tone_preferences: serde_json::from_str(&tone)?,
            communication_style: serde_json::from_str(&style)?,
            interaction_history: serde_json::from_str(&history)?,
            context_preferences: context.map(|c| serde_json::from_str(&c)).transpose()?,
            created_at: parse_stamp(&created_at)?,
            updated_at: parse_stamp(&updated_at)?,
        })
    }
}

fn parse_stamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AttuneError::Other(format!("bad timestamp {s:?}: {e}")))
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn get(&self, user_id: &str) -> Result<UserProfile> {
        let row = sqlx::query("SELECT * FROM user_profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::row_to_profile(&row),
            None => Err(AttuneError::ProfileNotFound(user_id.to_string())),
        }
    }

    async fn put(&self, profile: &UserProfile) -> Result<()> {
        let context = profile
            .context_preferences
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            "INSERT OR REPLACE INTO user_profiles
             (user_id, tone_preferences, communication_style, interaction_history,
              context_preferences, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&profile.user_id)
        .bind(serde_json::to_string(&profile.tone_preferences)?)
        .bind(serde_json::to_string(&profile.communication_style)?)
        .bind(serde_json::to_string(&profile.interaction_history)?)
        .bind(context)
        .bind(profile.created_at.to_rfc3339())
        .bind(profile.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM user_profiles WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AttuneError::ProfileNotFound(user_id.to_string()));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT user_id FROM user_profiles ORDER BY user_id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("user_id").map_err(Into::into))
            .collect()
    }
}
