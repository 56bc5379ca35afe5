//! End-to-end chat flow over a real SQLite backing store
//!
//! Exercises the engine facade the way the HTTP handlers do: profile
//! auto-creation, short-term recording, long-term learning accumulation,
//! inline feedback, and full user forgetting.

use std::sync::Arc;

use attune::{
    AttuneError, Context, FeedbackPayload, MemoryConfig, MemoryStore, SqliteProfileStore,
    ToneEngine,
};
use tempfile::TempDir;

async fn engine_in(dir: &TempDir) -> ToneEngine {
    let url = format!("sqlite://{}/attune.db", dir.path().display());
    let memory = Arc::new(
        MemoryStore::new(&url, MemoryConfig::default())
            .await
            .expect("memory store"),
    );
    let profiles = Arc::new(SqliteProfileStore::new(&url).await.expect("profile store"));
    ToneEngine::with_seed(memory, profiles, 42)
}

fn rating(value: f64, context: &str) -> FeedbackPayload {
    FeedbackPayload {
        kind: "rating".to_string(),
        value: Some(value),
        corrections: None,
        preferences: None,
        context: Some(context.to_string()),
    }
}

#[tokio::test]
async fn test_first_message_creates_default_profile() {
    let dir = TempDir::new().expect("tempdir");
    let engine = engine_in(&dir).await;

    assert!(matches!(
        engine.profiles().get("alice").await,
        Err(AttuneError::ProfileNotFound(_))
    ));

    let outcome = engine
        .handle_message("alice", "I have a meeting with the client tomorrow", None, None)
        .await
        .expect("chat");

    assert_eq!(outcome.context, Context::Work);
    assert!(!outcome.response.is_empty());
    assert_eq!(outcome.memory_summary.short_term_count, 1);

    let profile = engine.profiles().get("alice").await.expect("profile");
    assert_eq!(profile.user_id, "alice");
}

#[tokio::test]
async fn test_context_hint_overrides_detection() {
    let dir = TempDir::new().expect("tempdir");
    let engine = engine_in(&dir).await;

    let outcome = engine
        .handle_message(
            "bob",
            "I'm going to a party this weekend!",
            Some(Context::Work),
            None,
        )
        .await
        .expect("chat");

    assert_eq!(outcome.context, Context::Work);
    // Detection still ran; the hint only overrides the label
    assert!(outcome.context_confidence.personal > 0.0);
}

#[tokio::test]
async fn test_long_term_learning_accumulates_across_messages() {
    let dir = TempDir::new().expect("tempdir");
    let engine = engine_in(&dir).await;

    for _ in 0..2 {
        engine
            .handle_message("carol", "the project deadline is near", Some(Context::Work), None)
            .await
            .expect("chat");
    }

    let blob = engine
        .memory()
        .read_long_term("carol")
        .await
        .expect("read")
        .expect("blob present");

    // Two merges; the count only loses a sliver to read-time decay
    let count = blob["context_preferences"]["work"]["count"]
        .as_f64()
        .expect("count");
    assert!(count > 1.9 && count <= 2.0);

    let effectiveness = blob["tone_effectiveness"]["formality"]
        .as_f64()
        .expect("effectiveness");
    assert!(effectiveness > 0.9 && effectiveness <= 1.0);
}

#[tokio::test]
async fn test_inline_feedback_updates_profile_stats() {
    let dir = TempDir::new().expect("tempdir");
    let engine = engine_in(&dir).await;

    // First contact establishes the profile
    engine
        .handle_message("dave", "hello", None, None)
        .await
        .expect("chat");

    engine
        .handle_message("dave", "thanks for the help", None, Some(&rating(5.0, "general")))
        .await
        .expect("chat with feedback");

    let profile = engine.profiles().get("dave").await.expect("profile");
    assert_eq!(profile.interaction_history.total_interactions, 1);
    assert_eq!(profile.interaction_history.successful_tone_matches, 1);
    assert!((profile.interaction_history.feedback_score - 5.0).abs() < 1e-9);

    let summary = engine.ledger().summary("dave").await;
    assert_eq!(summary.total_feedback, 1);
}

#[tokio::test]
async fn test_standalone_feedback_requires_existing_profile() {
    let dir = TempDir::new().expect("tempdir");
    let engine = engine_in(&dir).await;

    let result = engine.handle_feedback("nobody", &rating(4.0, "general")).await;
    assert!(matches!(result, Err(AttuneError::ProfileNotFound(_))));
}

#[tokio::test]
async fn test_forget_user_clears_all_adaptation_state() {
    let dir = TempDir::new().expect("tempdir");
    let engine = engine_in(&dir).await;

    engine
        .handle_message(
            "erin",
            "team meeting about the quarterly report",
            None,
            Some(&rating(4.5, "work")),
        )
        .await
        .expect("chat");

    engine.forget_user("erin").await.expect("forget");

    let summary = engine.memory().summary("erin").await.expect("summary");
    assert_eq!(summary.short_term_count, 0);
    assert!(summary.long_term_memory.is_none());
    assert_eq!(summary.long_term_size_kb, 0.0);

    assert_eq!(engine.ledger().summary("erin").await.total_feedback, 0);

    // The profile itself survives; only adaptation state is dropped
    assert!(engine.profiles().get("erin").await.is_ok());
}

#[tokio::test]
async fn test_short_term_buffer_caps_at_capacity() {
    let dir = TempDir::new().expect("tempdir");
    let engine = engine_in(&dir).await;

    for i in 0..12 {
        engine
            .handle_message("frank", &format!("message number {i}"), None, None)
            .await
            .expect("chat");
    }

    let exchanges = engine.memory().read_short_term("frank").await;
    assert_eq!(exchanges.len(), 10);
    assert_eq!(exchanges[0].user_message, "message number 2");
    assert_eq!(exchanges[9].user_message, "message number 11");
}
