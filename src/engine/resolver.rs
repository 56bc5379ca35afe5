//! Four-stage tone preference resolution
//!
//! Stage 1 reads the profile baseline for the detected context. Stage 2
//! adjusts for conversation flow over the recent exchange window. Stage 3
//! softens axes whose recent feedback ratings run low. Stage 4 reacts to
//! context switches recorded in a per-user transition log.
//!
//! Stages 3 and 4 are stateful; `resolve` holds the per-user state lock for
//! the whole pipeline so each call records feedback and the context exactly
//! once.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::context::Context;
use crate::types::{
    ConversationExchange, Empathy, FeedbackPayload, Formality, TonePreferences, ToneAxis,
    UserProfile, Verbosity,
};

const FLOW_WINDOW: usize = 5;
const FEEDBACK_WINDOW: usize = 10;
const LOW_RATING_THRESHOLD: f64 = 3.0;

/// Message length trend over the flow window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthTrend {
    Stable,
    Increasing,
    Decreasing,
}

/// Coarse level used for engagement and topic consistency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowLevel {
    Low,
    Medium,
    High,
}

/// Flow signals extracted from the recent exchange window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowAnalysis {
    pub length_trend: LengthTrend,
    pub topic_consistency: FlowLevel,
    pub engagement: FlowLevel,
}

impl Default for FlowAnalysis {
    fn default() -> Self {
        Self {
            length_trend: LengthTrend::Stable,
            topic_consistency: FlowLevel::High,
            engagement: FlowLevel::Medium,
        }
    }
}

/// One logged feedback observation kept for stage 3
///
/// Every feedback kind is logged; only entries carrying a rating contribute
/// to learning, but the others still age ratings out of the window.
#[derive(Debug, Clone)]
struct FeedbackObservation {
    rating: Option<f64>,
    context: String,
    active_tone: TonePreferences,
}

/// One entry in the per-user context transition log
#[derive(Debug, Clone)]
struct ContextLogEntry {
    context: Context,
}

/// Detected transition between consecutive contexts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    WorkToPersonal,
    PersonalToWork,
    AcademicToOther,
    OtherToAcademic,
    General,
}

#[derive(Debug, Default)]
struct UserAdaptState {
    feedback_log: Vec<FeedbackObservation>,
    context_log: Vec<ContextLogEntry>,
}

/// Resolves the tone preference vector for each message
pub struct PreferenceResolver {
    states: Arc<Mutex<HashMap<String, UserAdaptState>>>,
}

impl Default for PreferenceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceResolver {
    pub fn new() -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run all four stages and return the final preference vector
    pub async fn resolve(
        &self,
        user_id: &str,
        profile: &UserProfile,
        context: Context,
        history: &[ConversationExchange],
        feedback: Option<&FeedbackPayload>,
    ) -> TonePreferences {
        let baseline = Self::resolve_baseline(profile, context);
        let adjusted = Self::adjust_for_flow(baseline, history);

        let mut states = self.states.lock().await;
        let state = states.entry(user_id.to_string()).or_default();

        if let Some(payload) = feedback {
            record_feedback(state, payload, adjusted);
        }
        let learned = apply_learning_with(state, adjusted);
        let transition = detect_transition(state, context);
        let resolved = adapt_to_transition(learned, transition);

        debug!(
            "Resolved tone for {}: {:?} (transition {:?})",
            user_id, resolved, transition
        );
        resolved
    }

    /// Stage 1: profile preferences, with the per-context override when set
    pub fn resolve_baseline(profile: &UserProfile, context: Context) -> TonePreferences {
        let Some(ctx_prefs) = &profile.context_preferences else {
            return profile.tone_preferences;
        };
        let overridden = match context {
            Context::Work => ctx_prefs.work,
            Context::Personal => ctx_prefs.personal,
            Context::Academic => ctx_prefs.academic,
            Context::Unknown => None,
        };
        overridden.unwrap_or(profile.tone_preferences)
    }

    /// Stage 2: shift preferences toward the observed conversation flow
    pub fn adjust_for_flow(
        baseline: TonePreferences,
        history: &[ConversationExchange],
    ) -> TonePreferences {
        let flow = Self::analyze_flow(history);
        let mut prefs = baseline;

        match flow.length_trend {
            LengthTrend::Increasing => prefs.verbosity = prefs.verbosity.step_up(),
            LengthTrend::Decreasing => prefs.verbosity = prefs.verbosity.step_down(),
            LengthTrend::Stable => {}
        }

        match flow.engagement {
            FlowLevel::High => prefs.enthusiasm = prefs.enthusiasm.step_up(),
            FlowLevel::Low => prefs.empathy_level = prefs.empathy_level.step_up(),
            FlowLevel::Medium => {}
        }

        if flow.topic_consistency == FlowLevel::Low && prefs.formality == Formality::Casual {
            prefs.formality = Formality::Professional;
        }

        prefs
    }

    /// Flow signals over the last `FLOW_WINDOW` exchanges
    pub fn analyze_flow(history: &[ConversationExchange]) -> FlowAnalysis {
        if history.is_empty() {
            return FlowAnalysis::default();
        }

        let start = history.len().saturating_sub(FLOW_WINDOW);
        let window = &history[start..];

        let lengths: Vec<usize> =
            window.iter().map(|e| e.user_message.chars().count()).collect();

        let length_trend = if lengths.len() >= 2 {
            let last = lengths[lengths.len() - 1] as f64;
            let prev = lengths[lengths.len() - 2] as f64;
            if last > prev * 1.5 {
                LengthTrend::Increasing
            } else if last < prev * 0.7 {
                LengthTrend::Decreasing
            } else {
                LengthTrend::Stable
            }
        } else {
            LengthTrend::Stable
        };

        let mut contexts: Vec<Context> = window.iter().map(|e| e.context).collect();
        contexts.sort_by_key(|c| c.as_str());
        contexts.dedup();
        let topic_consistency = match contexts.len() {
            0..=2 => FlowLevel::High,
            3 => FlowLevel::Medium,
            _ => FlowLevel::Low,
        };

        let avg = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
        let engagement = if avg > 100.0 {
            FlowLevel::High
        } else if avg > 50.0 {
            FlowLevel::Medium
        } else {
            FlowLevel::Low
        };

        FlowAnalysis {
            length_trend,
            topic_consistency,
            engagement,
        }
    }

    /// Stage 3 entry point for callers outside `resolve`
    pub async fn apply_learning(
        &self,
        user_id: &str,
        prefs: TonePreferences,
        feedback: Option<&FeedbackPayload>,
    ) -> TonePreferences {
        let mut states = self.states.lock().await;
        let state = states.entry(user_id.to_string()).or_default();
        if let Some(payload) = feedback {
            record_feedback(state, payload, prefs);
        }
        apply_learning_with(state, prefs)
    }

    /// Stage 4 entry point for callers outside `resolve`; appends to the
    /// transition log
    pub async fn adapt_to_transition(
        &self,
        user_id: &str,
        prefs: TonePreferences,
        context: Context,
    ) -> TonePreferences {
        let mut states = self.states.lock().await;
        let state = states.entry(user_id.to_string()).or_default();
        let transition = detect_transition(state, context);
        adapt_to_transition(prefs, transition)
    }

    /// Drop all per-user adaptation state
    pub async fn forget_user(&self, user_id: &str) {
        self.states.lock().await.remove(user_id);
    }
}

/// Append one feedback payload to the log, tagged with the tone in effect
fn record_feedback(
    state: &mut UserAdaptState,
    payload: &FeedbackPayload,
    active_tone: TonePreferences,
) {
    let rating = if payload.kind == "rating" {
        payload.value
    } else {
        None
    };
    let entry = FeedbackObservation {
        rating,
        context: payload.context.clone().unwrap_or_else(|| "general".to_string()),
        active_tone,
    };
    debug!(
        "Logged {:?} feedback in {:?} context under tone {:?}",
        entry.rating, entry.context, entry.active_tone
    );
    state.feedback_log.push(entry);
}

/// Which axes a rating in a given context speaks to
fn axes_for_context(context: &str) -> &'static [ToneAxis] {
    match context {
        "work" => &[ToneAxis::Formality],
        "personal" => &[ToneAxis::Enthusiasm, ToneAxis::EmpathyLevel],
        _ => &ToneAxis::ALL,
    }
}

fn apply_learning_with(state: &UserAdaptState, prefs: TonePreferences) -> TonePreferences {
    if state.feedback_log.is_empty() {
        return prefs;
    }

    let start = state.feedback_log.len().saturating_sub(FEEDBACK_WINDOW);
    let recent = &state.feedback_log[start..];

    let mut scores: HashMap<ToneAxis, Vec<f64>> = HashMap::new();
    for entry in recent {
        let Some(rating) = entry.rating else {
            continue;
        };
        for &axis in axes_for_context(&entry.context) {
            scores.entry(axis).or_default().push(rating);
        }
    }

    let mut learned = prefs;
    for (axis, ratings) in scores {
        let avg = ratings.iter().sum::<f64>() / ratings.len() as f64;
        if avg < LOW_RATING_THRESHOLD {
            learned.step_axis_down(axis);
        }
    }
    learned
}

/// Classify the switch from the last logged context and append the current
/// one to the log
fn detect_transition(state: &mut UserAdaptState, current: Context) -> Transition {
    let previous = state.context_log.last().map(|e| e.context);
    state.context_log.push(ContextLogEntry { context: current });

    let Some(previous) = previous else {
        return Transition::None;
    };
    if previous == current {
        return Transition::None;
    }

    match (previous, current) {
        (Context::Work, Context::Personal) => Transition::WorkToPersonal,
        (Context::Personal, Context::Work) => Transition::PersonalToWork,
        (Context::Academic, Context::Work | Context::Personal) => Transition::AcademicToOther,
        (_, Context::Academic) => Transition::OtherToAcademic,
        _ => Transition::General,
    }
}

fn adapt_to_transition(prefs: TonePreferences, transition: Transition) -> TonePreferences {
    let mut adapted = prefs;
    match transition {
        Transition::WorkToPersonal => {
            adapted.formality = adapted.formality.step_down();
            adapted.enthusiasm = adapted.enthusiasm.step_up();
        }
        Transition::PersonalToWork => {
            adapted.formality = adapted.formality.step_up();
            adapted.enthusiasm = adapted.enthusiasm.step_down();
        }
        Transition::AcademicToOther => {
            if adapted.verbosity == Verbosity::Detailed {
                adapted.verbosity = Verbosity::Balanced;
            }
            if adapted.empathy_level == Empathy::Low {
                adapted.empathy_level = Empathy::Medium;
            }
        }
        Transition::OtherToAcademic => {
            adapted.verbosity = adapted.verbosity.step_up();
            if adapted.formality == Formality::Casual {
                adapted.formality = Formality::Professional;
            }
        }
        Transition::None | Transition::General => {}
    }
    adapted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContextPreferences, Enthusiasm, Humor};
    use chrono::Utc;

    fn exchange(message: &str, context: Context) -> ConversationExchange {
        ConversationExchange {
            user_message: message.to_string(),
            ai_response: String::new(),
            context,
            applied_tone: TonePreferences::default(),
            timestamp: Utc::now(),
        }
    }

    fn rating_payload(value: f64, context: &str) -> FeedbackPayload {
        FeedbackPayload {
            kind: "rating".to_string(),
            value: Some(value),
            corrections: None,
            preferences: None,
            context: Some(context.to_string()),
        }
    }

    #[test]
    fn test_baseline_uses_context_override() {
        let mut profile = UserProfile::new("u");
        let mut work_prefs = TonePreferences::default();
        work_prefs.formality = Formality::Formal;
        profile.context_preferences = Some(ContextPreferences {
            work: Some(work_prefs),
            ..Default::default()
        });

        let resolved = PreferenceResolver::resolve_baseline(&profile, Context::Work);
        assert_eq!(resolved.formality, Formality::Formal);

        // No personal override, falls back to the general vector
        let fallback = PreferenceResolver::resolve_baseline(&profile, Context::Personal);
        assert_eq!(fallback, profile.tone_preferences);
    }

    #[test]
    fn test_baseline_unknown_context_falls_back() {
        let mut profile = UserProfile::new("u");
        profile.context_preferences = Some(ContextPreferences::default());
        let resolved = PreferenceResolver::resolve_baseline(&profile, Context::Unknown);
        assert_eq!(resolved, profile.tone_preferences);
    }

    #[test]
    fn test_flow_increasing_length_raises_verbosity() {
        let history = vec![
            exchange("short", Context::Work),
            exchange(&"a".repeat(40), Context::Work),
        ];
        let prefs = PreferenceResolver::adjust_for_flow(TonePreferences::default(), &history);
        assert_eq!(prefs.verbosity, Verbosity::Detailed);
    }

    #[test]
    fn test_flow_decreasing_length_lowers_verbosity() {
        let history = vec![
            exchange(&"a".repeat(120), Context::Work),
            exchange("ok then", Context::Work),
        ];
        let prefs = PreferenceResolver::adjust_for_flow(TonePreferences::default(), &history);
        assert_eq!(prefs.verbosity, Verbosity::Concise);
    }

    #[test]
    fn test_flow_empty_history_is_neutral() {
        let prefs = PreferenceResolver::adjust_for_flow(TonePreferences::default(), &[]);
        assert_eq!(prefs, TonePreferences::default());
    }

    #[test]
    fn test_flow_single_entry_history_has_no_trend() {
        // One stored exchange gives nothing to compare; trend stays stable
        let history = vec![exchange(&"a".repeat(100), Context::Work)];
        let prefs = PreferenceResolver::adjust_for_flow(TonePreferences::default(), &history);
        assert_eq!(prefs.verbosity, Verbosity::Balanced);
    }

    #[test]
    fn test_flow_high_engagement_raises_enthusiasm() {
        let history: Vec<_> =
            (0..3).map(|_| exchange(&"x".repeat(150), Context::Work)).collect();
        let prefs = PreferenceResolver::adjust_for_flow(TonePreferences::default(), &history);
        assert_eq!(prefs.enthusiasm, Enthusiasm::High);
        assert_eq!(prefs.verbosity, Verbosity::Balanced);
    }

    #[test]
    fn test_flow_low_engagement_raises_empathy() {
        let history = vec![exchange("hi", Context::Work), exchange("ok", Context::Work)];
        let prefs = PreferenceResolver::adjust_for_flow(TonePreferences::default(), &history);
        assert_eq!(prefs.empathy_level, Empathy::High);
    }

    #[tokio::test]
    async fn test_low_ratings_soften_context_axes() {
        let resolver = PreferenceResolver::new();
        let profile = UserProfile::new("u");

        // Two poor work ratings; only formality should soften
        for _ in 0..2 {
            resolver
                .resolve(
                    "u",
                    &profile,
                    Context::Work,
                    &[],
                    Some(&rating_payload(1.0, "work")),
                )
                .await;
        }

        let prefs = resolver
            .apply_learning("u", TonePreferences::default(), None)
            .await;
        assert_eq!(prefs.formality, Formality::Casual);
        assert_eq!(prefs.enthusiasm, Enthusiasm::Medium);
    }

    #[tokio::test]
    async fn test_good_ratings_leave_preferences_alone() {
        let resolver = PreferenceResolver::new();
        let prefs = resolver
            .apply_learning(
                "u",
                TonePreferences::default(),
                Some(&rating_payload(4.5, "work")),
            )
            .await;
        assert_eq!(prefs, TonePreferences::default());
    }

    #[tokio::test]
    async fn test_general_rating_touches_all_axes() {
        let resolver = PreferenceResolver::new();
        let prefs = resolver
            .apply_learning(
                "u",
                TonePreferences::default(),
                Some(&rating_payload(1.0, "general")),
            )
            .await;
        assert_eq!(prefs.formality, Formality::Casual);
        assert_eq!(prefs.enthusiasm, Enthusiasm::Low);
        assert_eq!(prefs.verbosity, Verbosity::Concise);
        assert_eq!(prefs.empathy_level, Empathy::Low);
        assert_eq!(prefs.humor, Humor::None);
    }

    #[tokio::test]
    async fn test_non_rating_feedback_ages_ratings_out_of_window() {
        let resolver = PreferenceResolver::new();
        let correction = FeedbackPayload {
            kind: "correction".to_string(),
            value: None,
            corrections: Some(HashMap::from([("humor".to_string(), 0.1)])),
            preferences: None,
            context: Some("work".to_string()),
        };

        for _ in 0..10 {
            resolver
                .apply_learning("u", TonePreferences::default(), Some(&rating_payload(1.0, "work")))
                .await;
        }
        for _ in 0..9 {
            resolver
                .apply_learning("u", TonePreferences::default(), Some(&correction))
                .await;
        }

        // One poor rating still inside the ten-entry window keeps formality soft
        let prefs = resolver.apply_learning("u", TonePreferences::default(), None).await;
        assert_eq!(prefs.formality, Formality::Casual);

        // The tenth correction pushes the last rating out; no signal remains
        let prefs = resolver
            .apply_learning("u", TonePreferences::default(), Some(&correction))
            .await;
        assert_eq!(prefs, TonePreferences::default());
    }

    #[tokio::test]
    async fn test_first_message_has_no_transition() {
        let resolver = PreferenceResolver::new();
        let prefs = resolver
            .adapt_to_transition("u", TonePreferences::default(), Context::Work)
            .await;
        assert_eq!(prefs, TonePreferences::default());
    }

    #[tokio::test]
    async fn test_work_to_personal_transition() {
        let resolver = PreferenceResolver::new();
        resolver
            .adapt_to_transition("u", TonePreferences::default(), Context::Work)
            .await;
        let prefs = resolver
            .adapt_to_transition("u", TonePreferences::default(), Context::Personal)
            .await;
        assert_eq!(prefs.formality, Formality::Casual);
        assert_eq!(prefs.enthusiasm, Enthusiasm::High);
    }

    #[tokio::test]
    async fn test_personal_to_work_transition() {
        let resolver = PreferenceResolver::new();
        resolver
            .adapt_to_transition("u", TonePreferences::default(), Context::Personal)
            .await;
        let prefs = resolver
            .adapt_to_transition("u", TonePreferences::default(), Context::Work)
            .await;
        assert_eq!(prefs.formality, Formality::Formal);
        assert_eq!(prefs.enthusiasm, Enthusiasm::Low);
    }

    #[tokio::test]
    async fn test_transition_to_academic() {
        let resolver = PreferenceResolver::new();
        let mut start = TonePreferences::default();
        start.formality = Formality::Casual;
        resolver
            .adapt_to_transition("u", start, Context::Personal)
            .await;
        let prefs = resolver.adapt_to_transition("u", start, Context::Academic).await;
        assert_eq!(prefs.verbosity, Verbosity::Detailed);
        assert_eq!(prefs.formality, Formality::Professional);
    }

    #[tokio::test]
    async fn test_same_context_is_not_a_transition() {
        let resolver = PreferenceResolver::new();
        resolver
            .adapt_to_transition("u", TonePreferences::default(), Context::Work)
            .await;
        let prefs = resolver
            .adapt_to_transition("u", TonePreferences::default(), Context::Work)
            .await;
        assert_eq!(prefs, TonePreferences::default());
    }

    #[tokio::test]
    async fn test_resolver_state_is_per_user() {
        let resolver = PreferenceResolver::new();
        resolver
            .adapt_to_transition("alice", TonePreferences::default(), Context::Work)
            .await;
        // Bob's first message; alice's log must not leak
        let prefs = resolver
            .adapt_to_transition("bob", TonePreferences::default(), Context::Personal)
            .await;
        assert_eq!(prefs, TonePreferences::default());
    }
}
