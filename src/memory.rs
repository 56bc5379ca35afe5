//! Dual-tier conversation memory
//!
//! Short-term memory is a per-user ring buffer of recent exchanges held in
//! process. Long-term memory is a single SQLite row per user holding an
//! arbitrary JSON learning blob, size-capped with oldest-first eviction and
//! exponential decay applied to numeric leaves at read time.

use chrono::Utc;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::{ConnectOptions, Row};
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::Result;
use crate::types::ConversationExchange;

/// Tuning knobs for the memory store
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Ring buffer capacity per user
    pub short_term_capacity: usize,
    /// Long-term blob budget per user, in KiB
    pub long_term_cap_kib: usize,
    /// Half-life of numeric values in the long-term blob, in days
    pub decay_half_life_days: f64,
    /// Decay never drops a value below this fraction of its stored magnitude
    pub decay_floor: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            short_term_capacity: 10,
            long_term_cap_kib: 50,
            decay_half_life_days: 30.0,
            decay_floor: 0.1,
        }
    }
}

/// Decay multiplier for a value `age_days` old
pub fn decay_factor(age_days: f64, half_life_days: f64, floor: f64) -> f64 {
    (0.5_f64).powf(age_days / half_life_days).max(floor)
}

/// Summary of both memory tiers for one user
#[derive(Debug, Clone, serde::Serialize)]
pub struct MemorySummary {
    pub short_term_count: usize,
    pub long_term_size_kb: f64,
    pub max_short_term: usize,
    pub max_long_term_kb: usize,
    pub short_term_memory: Vec<ConversationExchange>,
    pub long_term_memory: Option<Value>,
}

/// Read-only analytics projection over both tiers
#[derive(Debug, Clone, serde::Serialize)]
pub struct MemoryAnalytics {
    pub user_id: String,
    pub memory_usage: Value,
    pub conversation_patterns: Value,
    pub learning_metrics: Value,
}

/// Dual-tier memory store shared across request handlers
pub struct MemoryStore {
    config: MemoryConfig,
    short_term: Arc<RwLock<HashMap<String, VecDeque<ConversationExchange>>>>,
    pool: SqlitePool,
}

impl MemoryStore {
    /// Open (or create) the backing database and prepare the schema
    pub async fn new(database_url: &str, config: MemoryConfig) -> Result<Self> {
        info!("Connecting to memory database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(30))
            .disable_statement_logging();

        let pool = SqlitePool::connect_with(options).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS long_term_memory (
                user_id TEXT PRIMARY KEY,
                memory_data TEXT,
                last_updated REAL,
                size_bytes INTEGER
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            config,
            short_term: Arc::new(RwLock::new(HashMap::new())),
            pool,
        })
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Append one exchange to the user's ring buffer, evicting the oldest
    /// entry once the buffer is full
    pub async fn append_short_term(&self, user_id: &str, exchange: ConversationExchange) {
        let mut buffers = self.short_term.write().await;
        let buffer = buffers.entry(user_id.to_string()).or_default();
        if buffer.len() >= self.config.short_term_capacity {
            buffer.pop_front();
        }
        buffer.push_back(exchange);
    }

    /// Snapshot of the user's short-term buffer, oldest first
    pub async fn read_short_term(&self, user_id: &str) -> Vec<ConversationExchange> {
        let buffers = self.short_term.read().await;
        buffers
            .get(user_id)
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Replace the user's long-term blob, evicting other stale rows if the
    /// store would exceed its size budget
    ///
    /// Merging new data into the existing blob is the caller's job; the store
    /// only replaces.
    pub async fn write_long_term(&self, user_id: &str, data: &Value) -> Result<()> {
        self.write_long_term_at(user_id, data, Utc::now().timestamp() as f64)
            .await
    }

    /// Same as `write_long_term` with an explicit wall-clock stamp
    pub async fn write_long_term_at(
        &self,
        user_id: &str,
        data: &Value,
        stamp_secs: f64,
    ) -> Result<()> {
        let serialized = serde_json::to_string(data)?;
        let new_size = serialized.len() as i64;
        let cap = (self.config.long_term_cap_kib * 1024) as i64;

        let mut tx = self.pool.begin().await?;

        let current: i64 =
            sqlx::query("SELECT COALESCE(SUM(size_bytes), 0) AS total FROM long_term_memory")
                .fetch_one(&mut *tx)
                .await?
                .try_get("total")?;

        let existing: i64 = sqlx::query(
            "SELECT COALESCE(size_bytes, 0) AS size FROM long_term_memory WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| row.try_get("size"))
        .transpose()?
        .unwrap_or(0);

        let mut projected = current - existing + new_size;
        while projected > cap {
            let oldest: Option<(String, i64)> = sqlx::query(
                "SELECT user_id, size_bytes FROM long_term_memory
                 WHERE user_id != ? ORDER BY last_updated ASC LIMIT 1",
            )
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .map(|row| {
                Ok::<_, sqlx::Error>((row.try_get("user_id")?, row.try_get("size_bytes")?))
            })
            .transpose()?;

            let Some((victim, size)) = oldest else {
                break;
            };
            debug!("Evicting long-term memory for {} ({} bytes)", victim, size);
            sqlx::query("DELETE FROM long_term_memory WHERE user_id = ?")
                .bind(&victim)
                .execute(&mut *tx)
                .await?;
            projected -= size;
        }

        sqlx::query(
            "INSERT OR REPLACE INTO long_term_memory (user_id, memory_data, last_updated, size_bytes)
             VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&serialized)
        .bind(stamp_secs)
        .bind(new_size)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Read the user's long-term blob with time decay applied to numeric
    /// leaves. Returns `None` for users with no stored blob.
    pub async fn read_long_term(&self, user_id: &str) -> Result<Option<Value>> {
        let row = sqlx::query(
            "SELECT memory_data, last_updated FROM long_term_memory WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let data: String = row.try_get("memory_data")?;
        let last_updated: f64 = row.try_get("last_updated")?;
        let value: Value = serde_json::from_str(&data)?;

        let age_days = (Utc::now().timestamp() as f64 - last_updated) / 86_400.0;
        let factor = decay_factor(
            age_days.max(0.0),
            self.config.decay_half_life_days,
            self.config.decay_floor,
        );

        Ok(Some(apply_decay(value, factor)))
    }

    /// Raw stored size of the user's long-term blob, in bytes
    pub async fn long_term_size(&self, user_id: &str) -> Result<i64> {
        let size = sqlx::query(
            "SELECT COALESCE(size_bytes, 0) AS size FROM long_term_memory WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| row.try_get("size"))
        .transpose()?
        .unwrap_or(0);
        Ok(size)
    }

    /// Drop both tiers for a user. Safe to call for unknown users.
    pub async fn clear(&self, user_id: &str) -> Result<()> {
        self.short_term.write().await.remove(user_id);
        sqlx::query("DELETE FROM long_term_memory WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Combined view of both tiers for a user
    pub async fn summary(&self, user_id: &str) -> Result<MemorySummary> {
        let short_term = self.read_short_term(user_id).await;
        let long_term = self.read_long_term(user_id).await?;
        let size = self.long_term_size(user_id).await?;

        Ok(MemorySummary {
            short_term_count: short_term.len(),
            long_term_size_kb: size as f64 / 1024.0,
            max_short_term: self.config.short_term_capacity,
            max_long_term_kb: self.config.long_term_cap_kib,
            short_term_memory: short_term,
            long_term_memory: long_term,
        })
    }

    /// Analytics projection: usage, context/tone distributions over the
    /// short-term window, and the learning blob's metrics
    pub async fn analytics(&self, user_id: &str) -> Result<MemoryAnalytics> {
        let summary = self.summary(user_id).await?;

        let mut context_distribution: HashMap<String, u64> = HashMap::new();
        let mut tone_distribution: HashMap<String, HashMap<String, u64>> = HashMap::new();
        for exchange in &summary.short_term_memory {
            *context_distribution
                .entry(exchange.context.to_string())
                .or_insert(0) += 1;

            let tone = serde_json::to_value(exchange.applied_tone)?;
            if let Value::Object(map) = tone {
                for (axis, level) in map {
                    let level = level.as_str().unwrap_or_default().to_string();
                    *tone_distribution
                        .entry(axis)
                        .or_default()
                        .entry(level)
                        .or_insert(0) += 1;
                }
            }
        }

        let (context_preferences, tone_effectiveness) = match &summary.long_term_memory {
            Some(blob) => (
                blob.get("context_preferences").cloned().unwrap_or(json!({})),
                blob.get("tone_effectiveness").cloned().unwrap_or(json!({})),
            ),
            None => (json!({}), json!({})),
        };

        Ok(MemoryAnalytics {
            user_id: user_id.to_string(),
            memory_usage: json!({
                "short_term_count": summary.short_term_count,
                "long_term_size_kb": summary.long_term_size_kb,
                "utilization_percentage":
                    (summary.long_term_size_kb / summary.max_long_term_kb as f64) * 100.0,
            }),
            conversation_patterns: json!({
                "total_exchanges": summary.short_term_count,
                "context_distribution": context_distribution,
                "tone_distribution": tone_distribution,
            }),
            learning_metrics: json!({
                "context_preferences": context_preferences,
                "tone_effectiveness": tone_effectiveness,
            }),
        })
    }
}

/// Recursively scale numeric leaves; objects and arrays recurse, everything
/// else passes through untouched
fn apply_decay(value: Value, factor: f64) -> Value {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) => json!(f * factor),
            None => Value::Number(n),
        },
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, apply_decay(v, factor)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| apply_decay(v, factor)).collect())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_factor_half_life() {
        assert!((decay_factor(0.0, 30.0, 0.1) - 1.0).abs() < 1e-9);
        assert!((decay_factor(30.0, 30.0, 0.1) - 0.5).abs() < 1e-9);
        assert!((decay_factor(60.0, 30.0, 0.1) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_decay_factor_floor() {
        // 2^(-300/30) = ~0.001, clamped to the floor
        assert!((decay_factor(300.0, 30.0, 0.1) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_apply_decay_recurses_objects() {
        let blob = json!({
            "tone_effectiveness": {"formality": 1.0, "humor": 0.5},
            "label": "unchanged",
            "nested": {"deep": {"count": 4.0}}
        });
        let decayed = apply_decay(blob, 0.5);
        assert_eq!(decayed["tone_effectiveness"]["formality"], json!(0.5));
        assert_eq!(decayed["tone_effectiveness"]["humor"], json!(0.25));
        assert_eq!(decayed["label"], json!("unchanged"));
        assert_eq!(decayed["nested"]["deep"]["count"], json!(2.0));
    }
}
