//! Tone inference from free text
//!
//! Estimates a tone preference vector from how a user writes, by counting
//! marker words per axis. Used to seed or refresh a profile from a writing
//! sample.

use chrono::Utc;

use crate::types::{
    Empathy, Enthusiasm, Formality, Humor, TonePreferences, UserProfile, Verbosity,
};

const FORMAL_WORDS: &[&str] =
    &["therefore", "consequently", "furthermore", "moreover", "thus", "hence"];
const INFORMAL_WORDS: &[&str] = &["hey", "cool", "awesome", "gonna", "wanna", "gotta"];
const ENTHUSIASTIC_WORDS: &[&str] =
    &["amazing", "fantastic", "incredible", "wonderful", "excellent", "great"];
const NEUTRAL_WORDS: &[&str] = &["okay", "fine", "alright", "sure"];
const EMPATHETIC_WORDS: &[&str] = &["feel", "understand", "sorry", "hope", "care", "concerned"];
const HUMOR_WORDS: &[&str] = &["haha", "lol", "funny", "joke", "hilarious", "😂", "😄"];

fn count_hits(lowered: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| lowered.contains(*w)).count()
}

/// Infer a tone preference vector from a text sample
pub fn analyze_text_tone(text: &str) -> TonePreferences {
    let lowered = text.to_lowercase();

    let formal = count_hits(&lowered, FORMAL_WORDS);
    let informal = count_hits(&lowered, INFORMAL_WORDS);
    let formality = if formal > informal {
        Formality::Formal
    } else if informal > formal {
        Formality::Casual
    } else {
        Formality::Professional
    };

    let enthusiastic = count_hits(&lowered, ENTHUSIASTIC_WORDS);
    let neutral = count_hits(&lowered, NEUTRAL_WORDS);
    let enthusiasm = if enthusiastic > neutral {
        Enthusiasm::High
    } else if neutral > enthusiastic {
        Enthusiasm::Low
    } else {
        Enthusiasm::Medium
    };

    let word_count = text.split_whitespace().count();
    let verbosity = if word_count < 10 {
        Verbosity::Concise
    } else if word_count > 50 {
        Verbosity::Detailed
    } else {
        Verbosity::Balanced
    };

    let empathy_level = match count_hits(&lowered, EMPATHETIC_WORDS) {
        0 => Empathy::Low,
        1..=2 => Empathy::Medium,
        _ => Empathy::High,
    };

    let humor = match count_hits(&lowered, HUMOR_WORDS) {
        0 => Humor::None,
        1..=2 => Humor::Moderate,
        _ => Humor::Heavy,
    };

    TonePreferences {
        formality,
        enthusiasm,
        verbosity,
        empathy_level,
        humor,
    }
}

/// Replace a profile's tone preferences with those inferred from a sample
/// and bump its interaction counter
pub fn update_profile_from_text(profile: &mut UserProfile, text: &str) {
    profile.tone_preferences = analyze_text_tone(text);
    profile.interaction_history.total_interactions += 1;
    profile.interaction_history.last_interaction = Some(Utc::now());
    profile.updated_at = Utc::now();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formal_sample() {
        let prefs = analyze_text_tone(
            "Therefore, the committee should reconvene; furthermore, the findings merit review.",
        );
        assert_eq!(prefs.formality, Formality::Formal);
    }

    #[test]
    fn test_casual_enthusiastic_sample() {
        let prefs = analyze_text_tone("hey that's awesome, the demo looked amazing and great");
        assert_eq!(prefs.formality, Formality::Casual);
        assert_eq!(prefs.enthusiasm, Enthusiasm::High);
    }

    #[test]
    fn test_verbosity_by_word_count() {
        assert_eq!(analyze_text_tone("short note").verbosity, Verbosity::Concise);
        let medium = vec!["word"; 25].join(" ");
        assert_eq!(analyze_text_tone(&medium).verbosity, Verbosity::Balanced);
        let long = vec!["word"; 60].join(" ");
        assert_eq!(analyze_text_tone(&long).verbosity, Verbosity::Detailed);
    }

    #[test]
    fn test_empathy_and_humor_tiers() {
        let prefs = analyze_text_tone("I understand how you feel, I hope and care about this");
        assert_eq!(prefs.empathy_level, Empathy::High);

        let prefs = analyze_text_tone("haha that joke was funny, truly hilarious lol");
        assert_eq!(prefs.humor, Humor::Heavy);
    }

    #[test]
    fn test_neutral_sample_gets_middle_values() {
        let prefs = analyze_text_tone("the report covers the second quarter results in brief");
        assert_eq!(prefs.formality, Formality::Professional);
        assert_eq!(prefs.enthusiasm, Enthusiasm::Medium);
        assert_eq!(prefs.humor, Humor::None);
    }

    #[test]
    fn test_update_profile_replaces_and_counts() {
        let mut profile = UserProfile::new("u");
        update_profile_from_text(&mut profile, "hey cool, gonna keep it short");
        assert_eq!(profile.tone_preferences.formality, Formality::Casual);
        assert_eq!(profile.interaction_history.total_interactions, 1);
        assert!(profile.interaction_history.last_interaction.is_some());
    }
}
