//! Feedback processing and the per-user feedback log
//!
//! Three feedback kinds mutate the profile: ratings update the running
//! interaction statistics, corrections nudge tone axes by a numeric delta,
//! preferences set axes to an absolute value. Every processed entry is
//! appended to an in-process per-user log. Unknown kinds are ignored without
//! error.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AttuneError, Result};
use crate::types::{FeedbackEntry, FeedbackKind, FeedbackPayload, ToneAxis, UserProfile};

const SUCCESS_RATING_THRESHOLD: f64 = 4.0;
const RECENT_WINDOW: usize = 10;

/// Summary of a user's feedback history
#[derive(Debug, Clone, serde::Serialize)]
pub struct FeedbackSummary {
    pub total_feedback: usize,
    pub feedback_types: HashMap<String, usize>,
    /// Last entries, newest first
    pub recent_feedback: Vec<FeedbackEntry>,
}

/// Validates and applies feedback, keeping an append-only per-user log
pub struct FeedbackLedger {
    logs: Arc<RwLock<HashMap<String, Vec<FeedbackEntry>>>>,
}

impl Default for FeedbackLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackLedger {
    pub fn new() -> Self {
        Self {
            logs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Apply one payload to a profile and log it
    ///
    /// Returns the updated profile. An unrecognized `type` leaves the
    /// profile untouched and logs nothing.
    pub async fn record(
        &self,
        user_id: &str,
        payload: &FeedbackPayload,
        profile: &UserProfile,
    ) -> Result<UserProfile> {
        let kind = match payload.kind.as_str() {
            "rating" => FeedbackKind::Rating,
            "correction" => FeedbackKind::Correction,
            "preference" => FeedbackKind::Preference,
            other => {
                debug!("Ignoring feedback with unknown type {:?} from {}", other, user_id);
                return Ok(profile.clone());
            }
        };

        let mut updated = profile.clone();
        match kind {
            FeedbackKind::Rating => apply_rating(&mut updated, payload)?,
            FeedbackKind::Correction => apply_corrections(&mut updated, payload)?,
            FeedbackKind::Preference => apply_preferences(&mut updated, payload)?,
        }

        updated.interaction_history.total_interactions += 1;
        updated.interaction_history.last_interaction = Some(Utc::now());
        updated.updated_at = Utc::now();

        let entry = FeedbackEntry {
            id: uuid::Uuid::new_v4(),
            kind,
            value: payload.value,
            corrections: payload.corrections.clone(),
            preferences: payload.preferences.clone(),
            context: payload.context.clone().unwrap_or_else(|| "general".to_string()),
            timestamp: Utc::now(),
        };
        self.logs
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(entry);

        Ok(updated)
    }

    /// Counts by kind plus the most recent entries, newest first
    pub async fn summary(&self, user_id: &str) -> FeedbackSummary {
        let logs = self.logs.read().await;
        let entries = logs.get(user_id).map(Vec::as_slice).unwrap_or(&[]);

        let mut feedback_types: HashMap<String, usize> = HashMap::new();
        for entry in entries {
            *feedback_types.entry(entry.kind.to_string()).or_insert(0) += 1;
        }

        let recent_feedback: Vec<FeedbackEntry> =
            entries.iter().rev().take(RECENT_WINDOW).cloned().collect();

        FeedbackSummary {
            total_feedback: entries.len(),
            feedback_types,
            recent_feedback,
        }
    }

    /// Drop a user's feedback log
    pub async fn clear(&self, user_id: &str) {
        self.logs.write().await.remove(user_id);
    }
}

/// Fold a rating into the running mean and success counter
fn apply_rating(profile: &mut UserProfile, payload: &FeedbackPayload) -> Result<()> {
    let value = payload
        .value
        .ok_or_else(|| AttuneError::InvalidFeedback("rating requires a value".to_string()))?;
    if !(0.0..=5.0).contains(&value) {
        return Err(AttuneError::InvalidFeedback(format!(
            "rating value {} outside [0, 5]",
            value
        )));
    }

    let history = &mut profile.interaction_history;
    if value >= SUCCESS_RATING_THRESHOLD {
        history.successful_tone_matches += 1;
    }
    let n = (history.total_interactions + 1) as f64;
    history.feedback_score = (history.feedback_score * (n - 1.0) + value) / n;
    Ok(())
}

/// Shift each named axis by its delta on the numeric scale, clamped
fn apply_corrections(profile: &mut UserProfile, payload: &FeedbackPayload) -> Result<()> {
    let corrections = payload
        .corrections
        .as_ref()
        .filter(|map| !map.is_empty())
        .ok_or_else(|| {
            AttuneError::InvalidFeedback("correction requires a non-empty corrections map".to_string())
        })?;

    for (name, delta) in corrections {
        let Some(axis) = ToneAxis::parse(name) else {
            continue;
        };
        let current = profile.tone_preferences.numeric(axis);
        profile.tone_preferences.set_numeric(axis, current + delta);
    }
    Ok(())
}

/// Set each named axis to an absolute numeric target, clamped
fn apply_preferences(profile: &mut UserProfile, payload: &FeedbackPayload) -> Result<()> {
    let preferences = payload
        .preferences
        .as_ref()
        .filter(|map| !map.is_empty())
        .ok_or_else(|| {
            AttuneError::InvalidFeedback("preference requires a non-empty preferences map".to_string())
        })?;

    for (name, target) in preferences {
        let Some(axis) = ToneAxis::parse(name) else {
            continue;
        };
        profile.tone_preferences.set_numeric(axis, *target);
    }
    Ok(())
}
