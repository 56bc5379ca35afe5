//! Tone adaptation engine
//!
//! Wires the classifier, the four-stage preference resolver, the base
//! responder, and the style renderer into a single entry point for chat
//! traffic, and owns the learning side effects: short-term exchange
//! recording, long-term blob merging, and feedback-driven profile updates.

pub mod renderer;
pub mod resolver;
pub mod responder;
pub mod text_analysis;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::context::{Classification, Confidence, Context, ContextClassifier, Evidence};
use crate::emotion::{detect_emotion, EmotionReading};
use crate::error::{AttuneError, Result};
use crate::feedback::FeedbackLedger;
use crate::memory::{MemoryStore, MemorySummary};
use crate::profiles::ProfileStore;
use crate::types::{ConversationExchange, FeedbackPayload, TonePreferences, ToneAxis, UserProfile};

pub use renderer::StyleRenderer;
pub use resolver::PreferenceResolver;

/// Everything the chat surface reports for one message
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChatOutcome {
    pub response: String,
    pub base_response: String,
    pub context: Context,
    pub context_confidence: Confidence,
    pub context_indicators: Evidence,
    pub applied_tone: TonePreferences,
    pub emotion: EmotionReading,
    pub memory_summary: MemorySummary,
}

/// The engine facade shared by all request handlers
pub struct ToneEngine {
    classifier: ContextClassifier,
    resolver: PreferenceResolver,
    renderer: StyleRenderer,
    memory: Arc<MemoryStore>,
    profiles: Arc<dyn ProfileStore>,
    ledger: Arc<FeedbackLedger>,
    rng: Mutex<StdRng>,
}

impl ToneEngine {
    pub fn new(memory: Arc<MemoryStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            classifier: ContextClassifier::new(),
            resolver: PreferenceResolver::new(),
            renderer: StyleRenderer::new(),
            memory,
            profiles,
            ledger: Arc::new(FeedbackLedger::new()),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Same engine with a fixed rendering seed, for deterministic tests
    pub fn with_seed(memory: Arc<MemoryStore>, profiles: Arc<dyn ProfileStore>, seed: u64) -> Self {
        let mut engine = Self::new(memory, profiles);
        engine.rng = Mutex::new(StdRng::seed_from_u64(seed));
        engine
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn profiles(&self) -> &dyn ProfileStore {
        self.profiles.as_ref()
    }

    pub fn ledger(&self) -> &FeedbackLedger {
        &self.ledger
    }

    /// Process one chat message end to end
    ///
    /// Unknown users get a default profile created on the spot. An attached
    /// feedback payload updates the profile before the pipeline runs and
    /// also feeds the resolver's learning stage.
    pub async fn handle_message(
        &self,
        user_id: &str,
        message: &str,
        context_hint: Option<Context>,
        feedback: Option<&FeedbackPayload>,
    ) -> Result<ChatOutcome> {
        let mut profile = match self.profiles.get(user_id).await {
            Ok(profile) => profile,
            Err(AttuneError::ProfileNotFound(_)) => {
                info!("Creating default profile for new user {}", user_id);
                let profile = UserProfile::new(user_id);
                self.profiles.put(&profile).await?;
                profile
            }
            Err(e) => return Err(e),
        };

        let history = self.memory.read_short_term(user_id).await;

        if let Some(payload) = feedback {
            profile = self.ledger.record(user_id, payload, &profile).await?;
            self.profiles.put(&profile).await?;
        }

        let Classification {
            context: detected,
            confidence,
            evidence,
        } = self.classifier.classify(message, Some(&history));
        let context = context_hint.unwrap_or(detected);
        debug!("Context for {}: {} (detected {})", user_id, context, detected);

        let applied_tone = self
            .resolver
            .resolve(user_id, &profile, context, &history, feedback)
            .await;

        let base_response = responder::generate(message, context);
        let response = {
            let mut rng = self.rng.lock().await;
            self.renderer.render(&base_response, &applied_tone, &mut *rng)
        };

        let exchange = ConversationExchange {
            user_message: message.to_string(),
            ai_response: response.clone(),
            context,
            applied_tone,
            timestamp: chrono::Utc::now(),
        };
        self.memory.append_short_term(user_id, exchange).await;

        let existing = self.memory.read_long_term(user_id).await?;
        let merged = merge_learning(existing, context);
        self.memory.write_long_term(user_id, &merged).await?;

        let memory_summary = self.memory.summary(user_id).await?;

        Ok(ChatOutcome {
            response,
            base_response,
            context,
            context_confidence: confidence,
            context_indicators: evidence,
            applied_tone,
            emotion: detect_emotion(message),
            memory_summary,
        })
    }

    /// Process standalone feedback for an existing user
    ///
    /// Unlike `handle_message`, a missing profile is an error here.
    pub async fn handle_feedback(
        &self,
        user_id: &str,
        payload: &FeedbackPayload,
    ) -> Result<UserProfile> {
        let profile = self.profiles.get(user_id).await?;
        let updated = self.ledger.record(user_id, payload, &profile).await?;
        self.profiles.put(&updated).await?;
        Ok(updated)
    }

    /// Clear all of a user's adaptation state: memory tiers, feedback log,
    /// and the resolver's flow/transition state
    pub async fn forget_user(&self, user_id: &str) -> Result<()> {
        self.memory.clear(user_id).await?;
        self.ledger.clear(user_id).await;
        self.resolver.forget_user(user_id).await;
        Ok(())
    }
}

/// Fold one exchange into the long-term learning blob
///
/// Context usage counts accumulate; per-axis effectiveness is blended as the
/// mean of the stored (already decayed) value and a fresh 1.0 observation.
fn merge_learning(existing: Option<Value>, context: Context) -> Value {
    let now = chrono::Utc::now().timestamp() as f64;
    let mut blob = existing.unwrap_or_else(|| json!({}));
    if !blob.is_object() {
        blob = json!({});
    }

    let prefs = blob
        .as_object_mut()
        .and_then(|map| {
            map.entry("context_preferences")
                .or_insert_with(|| json!({}))
                .as_object_mut()
        });
    if let Some(prefs) = prefs {
        let entry = prefs.entry(context.to_string()).or_insert_with(|| json!({}));
        let count = entry.get("count").and_then(Value::as_f64).unwrap_or(0.0);
        entry["count"] = json!(count + 1.0);
        entry["last_used"] = json!(now);
    }

    let effectiveness = blob
        .as_object_mut()
        .and_then(|map| {
            map.entry("tone_effectiveness")
                .or_insert_with(|| json!({}))
                .as_object_mut()
        });
    if let Some(effectiveness) = effectiveness {
        for axis in ToneAxis::ALL {
            let key = axis.to_string();
            let blended = match effectiveness.get(&key).and_then(Value::as_f64) {
                Some(stored) => (stored + 1.0) / 2.0,
                None => 1.0,
            };
            effectiveness.insert(key, json!(blended));
        }
    }

    blob
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_learning_seeds_fresh_blob() {
        let blob = merge_learning(None, Context::Work);
        assert_eq!(blob["context_preferences"]["work"]["count"], json!(1.0));
        assert_eq!(blob["tone_effectiveness"]["formality"], json!(1.0));
        assert_eq!(blob["tone_effectiveness"]["humor"], json!(1.0));
    }

    #[test]
    fn test_merge_learning_accumulates() {
        let first = merge_learning(None, Context::Work);
        let second = merge_learning(Some(first), Context::Work);
        assert_eq!(second["context_preferences"]["work"]["count"], json!(2.0));
    }

    #[test]
    fn test_merge_learning_blends_effectiveness() {
        let stored = json!({
            "context_preferences": {"personal": {"count": 3.0, "last_used": 0.0}},
            "tone_effectiveness": {"formality": 0.5}
        });
        let merged = merge_learning(Some(stored), Context::Personal);
        assert_eq!(merged["context_preferences"]["personal"]["count"], json!(4.0));
        assert_eq!(merged["tone_effectiveness"]["formality"], json!(0.75));
        // Axes absent from the stored blob are seeded at 1.0
        assert_eq!(merged["tone_effectiveness"]["enthusiasm"], json!(1.0));
    }

    #[test]
    fn test_merge_learning_replaces_non_object_blob() {
        let merged = merge_learning(Some(json!("corrupt")), Context::Academic);
        assert_eq!(merged["context_preferences"]["academic"]["count"], json!(1.0));
    }
}
