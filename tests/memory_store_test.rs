//! Memory store behavior against a real SQLite file
//!
//! Covers ring-buffer eviction, the long-term size budget with oldest-first
//! eviction, read-time decay, and the analytics projection.

use attune::{Context, ConversationExchange, MemoryConfig, MemoryStore, TonePreferences};
use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;

async fn store_in(dir: &TempDir, config: MemoryConfig) -> MemoryStore {
    let url = format!("sqlite://{}/memory.db", dir.path().display());
    MemoryStore::new(&url, config).await.expect("memory store")
}

fn exchange(message: &str, context: Context) -> ConversationExchange {
    ConversationExchange {
        user_message: message.to_string(),
        ai_response: "ok".to_string(),
        context,
        applied_tone: TonePreferences::default(),
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn test_short_term_ring_evicts_oldest() {
    let dir = TempDir::new().expect("tempdir");
    let config = MemoryConfig {
        short_term_capacity: 3,
        ..Default::default()
    };
    let store = store_in(&dir, config).await;

    for i in 0..5 {
        store
            .append_short_term("u", exchange(&format!("m{i}"), Context::Unknown))
            .await;
    }

    let buffer = store.read_short_term("u").await;
    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer[0].user_message, "m2");
    assert_eq!(buffer[2].user_message, "m4");
}

#[tokio::test]
async fn test_short_term_buffers_are_per_user() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir, MemoryConfig::default()).await;

    store.append_short_term("a", exchange("hi", Context::Unknown)).await;
    assert_eq!(store.read_short_term("a").await.len(), 1);
    assert!(store.read_short_term("b").await.is_empty());
}

#[tokio::test]
async fn test_long_term_budget_evicts_oldest_user() {
    let dir = TempDir::new().expect("tempdir");
    let config = MemoryConfig {
        long_term_cap_kib: 1,
        ..Default::default()
    };
    let store = store_in(&dir, config).await;

    // Each blob serializes to 710 bytes; two exceed the 1 KiB budget
    let blob = json!({ "pad": "x".repeat(700) });
    store.write_long_term_at("old", &blob, 1_000.0).await.expect("write old");
    store.write_long_term_at("new", &blob, 2_000.0).await.expect("write new");

    assert!(store.read_long_term("old").await.expect("read").is_none());
    assert!(store.read_long_term("new").await.expect("read").is_some());
    assert_eq!(store.long_term_size("old").await.expect("size"), 0);
    assert_eq!(store.long_term_size("new").await.expect("size"), 710);
}

#[tokio::test]
async fn test_rewriting_own_blob_does_not_self_evict() {
    let dir = TempDir::new().expect("tempdir");
    let config = MemoryConfig {
        long_term_cap_kib: 1,
        ..Default::default()
    };
    let store = store_in(&dir, config).await;

    // A single user may exceed the budget; eviction only targets others
    let oversized = json!({ "pad": "y".repeat(2_000) });
    store.write_long_term("solo", &oversized).await.expect("write");
    assert!(store.read_long_term("solo").await.expect("read").is_some());
    assert_eq!(store.long_term_size("solo").await.expect("size"), 2_010);
}

#[tokio::test]
async fn test_read_applies_half_life_decay() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir, MemoryConfig::default()).await;

    let thirty_days_ago = Utc::now().timestamp() as f64 - 30.0 * 86_400.0;
    store
        .write_long_term_at("u", &json!({ "score": 1.0 }), thirty_days_ago)
        .await
        .expect("write");

    let blob = store.read_long_term("u").await.expect("read").expect("blob");
    let score = blob["score"].as_f64().expect("score");
    assert!((score - 0.5).abs() < 0.01);
}

#[tokio::test]
async fn test_decay_bottoms_out_at_floor() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir, MemoryConfig::default()).await;

    let long_ago = Utc::now().timestamp() as f64 - 300.0 * 86_400.0;
    store
        .write_long_term_at("u", &json!({ "score": 1.0 }), long_ago)
        .await
        .expect("write");

    let blob = store.read_long_term("u").await.expect("read").expect("blob");
    let score = blob["score"].as_f64().expect("score");
    assert!((score - 0.1).abs() < 1e-9);
}

#[tokio::test]
async fn test_clear_drops_both_tiers_and_tolerates_unknown_users() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir, MemoryConfig::default()).await;

    store.clear("ghost").await.expect("clear unknown");

    store.append_short_term("u", exchange("hi", Context::Unknown)).await;
    store.write_long_term("u", &json!({ "k": 1.0 })).await.expect("write");
    store.clear("u").await.expect("clear");

    assert!(store.read_short_term("u").await.is_empty());
    assert!(store.read_long_term("u").await.expect("read").is_none());
}

#[tokio::test]
async fn test_analytics_projects_context_distribution() {
    let dir = TempDir::new().expect("tempdir");
    let store = store_in(&dir, MemoryConfig::default()).await;

    store.append_short_term("u", exchange("standup notes", Context::Work)).await;
    store.append_short_term("u", exchange("sprint recap", Context::Work)).await;
    store.append_short_term("u", exchange("dinner plans", Context::Personal)).await;
    store
        .write_long_term("u", &json!({ "tone_effectiveness": { "humor": 0.8 } }))
        .await
        .expect("write");

    let analytics = store.analytics("u").await.expect("analytics");
    assert_eq!(analytics.user_id, "u");
    assert_eq!(analytics.memory_usage["short_term_count"], json!(3));
    assert_eq!(
        analytics.conversation_patterns["context_distribution"]["work"],
        json!(2)
    );
    assert_eq!(
        analytics.conversation_patterns["context_distribution"]["personal"],
        json!(1)
    );
    assert!(analytics.learning_metrics["tone_effectiveness"]["humor"]
        .as_f64()
        .is_some());
}
