//! Attune - Personalized Tone Adaptation Service
//!
//! A service that styles its responses to each user: it classifies the
//! conversation context of every message, resolves a tone preference vector
//! through a four-stage pipeline (profile baseline, conversation flow,
//! feedback learning, context switching), renders the response through
//! probabilistic phrase-bank transformations, and learns across sessions via
//! a dual-tier memory store.
//!
//! # Architecture
//!
//! - **Types**: tone-axis scales, profiles, exchanges, feedback payloads
//! - **Context**: keyword/pattern context classification
//! - **Memory**: short-term ring buffers + SQLite long-term store with decay
//! - **Engine**: resolver, renderer, responder, and the `ToneEngine` facade
//! - **Feedback**: rating/correction/preference processing and the log
//! - **Api**: axum HTTP surface
//!
//! # Example
//!
//! ```ignore
//! use attune::{MemoryConfig, MemoryStore, SqliteProfileStore, ToneEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let memory = Arc::new(MemoryStore::new("sqlite://attune.db", MemoryConfig::default()).await?);
//!     let profiles = Arc::new(SqliteProfileStore::new("sqlite://attune.db").await?);
//!     let engine = ToneEngine::new(memory, profiles);
//!
//!     let outcome = engine
//!         .handle_message("alice", "I have a meeting with the client tomorrow", None, None)
//!         .await?;
//!     println!("{}", outcome.response);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod context;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod memory;
pub mod profiles;
pub mod types;

// Re-export commonly used types
pub use api::{ApiServer, ApiServerConfig};
pub use config::Settings;
pub use context::{Classification, Confidence, Context, ContextClassifier, Evidence};
pub use emotion::{detect_emotion, Emotion, EmotionReading, Intensity};
pub use engine::{ChatOutcome, PreferenceResolver, StyleRenderer, ToneEngine};
pub use error::{AttuneError, Result};
pub use feedback::{FeedbackLedger, FeedbackSummary};
pub use memory::{MemoryConfig, MemoryStore, MemorySummary};
pub use profiles::{ProfileStore, SqliteProfileStore};
pub use types::{
    CommunicationStyle, ContextPreferences, ConversationExchange, Empathy, Enthusiasm,
    FeedbackEntry, FeedbackKind, FeedbackPayload, Formality, Humor, InteractionHistory,
    TonePreferences, ToneAxis, UserProfile, Verbosity,
};
