//! Preference resolution through all four stages
//!
//! Drives the resolver the way the engine does, with per-user state carried
//! between calls, and checks how the stages compose: context overrides,
//! flow signals, rating-driven learning, and context-switch adjustments.

use attune::{
    Context, ContextPreferences, ConversationExchange, Empathy, Enthusiasm, FeedbackPayload,
    Formality, Humor, PreferenceResolver, TonePreferences, UserProfile, Verbosity,
};
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

fn rating(value: f64, context: &str) -> FeedbackPayload {
    FeedbackPayload {
        kind: "rating".to_string(),
        value: Some(value),
        corrections: None,
        preferences: None,
        context: Some(context.to_string()),
    }
}

fn formal_work_profile() -> UserProfile {
    let mut profile = UserProfile::new("u");
    profile.context_preferences = Some(ContextPreferences {
        work: Some(TonePreferences {
            formality: Formality::Formal,
            enthusiasm: Enthusiasm::Low,
            verbosity: Verbosity::Detailed,
            empathy_level: Empathy::Low,
            humor: Humor::None,
        }),
        ..Default::default()
    });
    profile
}

#[tokio::test]
async fn test_work_override_applies_only_in_work_context() {
    let resolver = PreferenceResolver::new();
    let profile = formal_work_profile();

    let work = resolver
        .resolve("u", &profile, Context::Work, &[], None)
        .await;
    assert_eq!(work.formality, Formality::Formal);
    assert_eq!(work.verbosity, Verbosity::Detailed);

    // No personal override; the base preferences apply
    let base = PreferenceResolver::resolve_baseline(&profile, Context::Personal);
    assert_eq!(base, profile.tone_preferences);
}

#[tokio::test]
async fn test_low_work_ratings_relax_formality() {
    let resolver = PreferenceResolver::new();
    let profile = UserProfile::new("u");

    let resolved = resolver
        .resolve("u", &profile, Context::Work, &[], Some(&rating(2.0, "work")))
        .await;

    // Default professional, stepped down by the poor work rating
    assert_eq!(resolved.formality, Formality::Casual);
    // Work ratings speak only to formality
    assert_eq!(resolved.enthusiasm, Enthusiasm::Medium);
}

#[tokio::test]
async fn test_work_to_personal_switch_softens_tone() {
    let resolver = PreferenceResolver::new();
    let profile = UserProfile::new("u");

    resolver
        .resolve("u", &profile, Context::Work, &[], None)
        .await;
    let resolved = resolver
        .resolve("u", &profile, Context::Personal, &[], None)
        .await;

    assert_eq!(resolved.formality, Formality::Casual);
    assert_eq!(resolved.enthusiasm, Enthusiasm::High);
}

#[tokio::test]
async fn test_same_context_has_no_transition_effect() {
    let resolver = PreferenceResolver::new();
    let profile = UserProfile::new("u");

    resolver
        .resolve("u", &profile, Context::Work, &[], None)
        .await;
    let resolved = resolver
        .resolve("u", &profile, Context::Work, &[], None)
        .await;

    assert_eq!(resolved, profile.tone_preferences);
}

#[tokio::test]
async fn test_stages_compose_across_messages() {
    let resolver = PreferenceResolver::new();
    let profile = formal_work_profile();

    // Poor work rating pulls the formal override down one step
    let first = resolver
        .resolve("u", &profile, Context::Work, &[], Some(&rating(2.0, "work")))
        .await;
    assert_eq!(first.formality, Formality::Professional);

    // Next message switches context; learning still applies, then the
    // work-to-personal switch steps formality down and enthusiasm up
    let second = resolver
        .resolve("u", &profile, Context::Personal, &[], None)
        .await;
    assert_eq!(second.formality, Formality::Casual);
    assert_eq!(second.enthusiasm, Enthusiasm::High);
}

#[tokio::test]
async fn test_high_engagement_flow_raises_enthusiasm() {
    let resolver = PreferenceResolver::new();
    let profile = UserProfile::new("u");

    let long = "x".repeat(120);
    let history = vec![exchange(&long, Context::Work), exchange(&long, Context::Work)];

    let resolved = resolver
        .resolve("u", &profile, Context::Work, &history, None)
        .await;

    assert_eq!(resolved.enthusiasm, Enthusiasm::High);
    // Same-length messages carry no verbosity signal
    assert_eq!(resolved.verbosity, Verbosity::Balanced);
}

#[tokio::test]
async fn test_context_round_trip_drifts_at_most_one_step() {
    let resolver = PreferenceResolver::new();
    let profile = UserProfile::new("u");
    let base = profile.tone_preferences;

    resolver
        .resolve("u", &profile, Context::Work, &[], None)
        .await;
    resolver
        .resolve("u", &profile, Context::Personal, &[], None)
        .await;
    let back = resolver
        .resolve("u", &profile, Context::Work, &[], None)
        .await;

    // Each switch steps from the per-message baseline, so the round trip is
    // bounded rather than exact: within one step of where it began
    let drift = (back.formality.as_numeric() - base.formality.as_numeric()).abs();
    assert!(drift <= 0.5, "formality drifted {drift} after a round trip");
}

#[tokio::test]
async fn test_forget_user_resets_transition_log() {
    let resolver = PreferenceResolver::new();
    let profile = UserProfile::new("u");

    resolver
        .resolve("u", &profile, Context::Work, &[], None)
        .await;
    resolver.forget_user("u").await;

    // With the log gone, the context change is not a transition
    let resolved = resolver
        .resolve("u", &profile, Context::Personal, &[], None)
        .await;
    assert_eq!(resolved, profile.tone_preferences);
}
