//! Probabilistic surface styling of response text
//!
//! Applies the five tone axes in a fixed order (formality, enthusiasm,
//! verbosity, empathy, humor), each axis a set of chance-gated text
//! transformations drawn from static phrase banks. The random source is
//! injected so tests can seed it.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;

use crate::types::{Empathy, Enthusiasm, Formality, Humor, TonePreferences, Verbosity};

const FORMAL_GREETINGS: &[&str] = &["Good morning", "Good afternoon", "Good evening", "Greetings"];
const FORMAL_FAREWELLS: &[&str] = &["Best regards", "Sincerely", "Yours truly", "Respectfully"];
const FORMAL_TRANSITIONS: &[&str] = &["Furthermore", "Moreover", "Additionally", "Consequently"];
const CASUAL_GREETINGS: &[&str] = &["Hey", "Hi", "Yo", "What's up"];

const HIGH_EXCLAMATIONS: &[&str] = &["!", "!!", "!!!"];
const MEDIUM_EXCLAMATIONS: &[&str] = &["!"];
const HIGH_INTENSIFIERS: &[&str] = &["absolutely", "definitely", "certainly", "without a doubt"];
const MEDIUM_INTENSIFIERS: &[&str] = &["really", "quite", "pretty", "fairly"];
const HIGH_EMOJIS: &[&str] = &["😊", "🎉", "✨", "👍", "💯"];
const MEDIUM_EMOJIS: &[&str] = &["😊", "👍"];

const DETAILED_EXPLANATIONS: &[&str] = &[
    "Let me explain in detail",
    "I want to make sure you understand",
    "To be more specific",
];
const DETAILED_EXAMPLES: &[&str] = &["For example", "To illustrate this point", "As an example"];

const HIGH_ACKNOWLEDGMENTS: &[&str] = &[
    "I understand how you feel",
    "That must be difficult",
    "I can see why you'd think that",
];
const HIGH_QUESTIONS: &[&str] = &[
    "How does that make you feel?",
    "What do you think about that?",
    "How are you handling this?",
];
const MEDIUM_SUPPORT: &[&str] = &["That sounds tough", "I get it", "That's understandable"];

const HEAVY_PLAYFUL: &[&str] = &["Just kidding!", "Haha", "😊", "That's a good point!"];
const HEAVY_JOKES: &[&str] = &["😄", "😂", "LOL", "That's funny!", "Good one!"];
const MODERATE_JOKES: &[&str] = &["😊", "Haha", "That's funny", "Good point!"];
const LIGHT_JOKES: &[&str] = &["😊", "Haha"];

static CASUAL_GREETING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(hi|hello|hey)\b").expect("greeting pattern"));
static FORMAL_GREETING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(good morning|good afternoon|greetings)\b").expect("greeting pattern")
});

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or("")
}

/// Applies tone preferences to a base response
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleRenderer;

impl StyleRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Style `text` along all five axes, in order
    pub fn render<R: Rng + ?Sized>(
        &self,
        text: &str,
        prefs: &TonePreferences,
        rng: &mut R,
    ) -> String {
        let mut out = text.to_string();
        out = self.apply_formality(&out, prefs.formality, rng);
        out = self.apply_enthusiasm(&out, prefs.enthusiasm, rng);
        out = self.apply_verbosity(&out, prefs.verbosity, rng);
        out = self.apply_empathy(&out, prefs.empathy_level, rng);
        out = self.apply_humor(&out, prefs.humor, rng);
        out
    }

    fn apply_formality<R: Rng + ?Sized>(
        &self,
        text: &str,
        level: Formality,
        rng: &mut R,
    ) -> String {
        let mut out = text.to_string();
        match level {
            Formality::Formal => {
                if CASUAL_GREETING_RE.is_match(&out) {
                    let replacement = pick(rng, FORMAL_GREETINGS).to_string();
                    out = CASUAL_GREETING_RE.replace_all(&out, replacement.as_str()).into_owned();
                }
                if rng.gen::<f64>() < 0.3 {
                    out = out
                        .replace("I'm", "I am")
                        .replace("I'd", "I would")
                        .replace("I'll", "I will");
                }
                if out.to_lowercase().contains("also") {
                    out = out.replace("also", pick(rng, FORMAL_TRANSITIONS));
                }
                let lowered = out.to_lowercase();
                let has_greeting = FORMAL_GREETINGS
                    .iter()
                    .any(|g| lowered.contains(&g.to_lowercase()));
                if !has_greeting && rng.gen::<f64>() < 0.4 {
                    out = format!("{}! {}", pick(rng, FORMAL_GREETINGS), out);
                }
                if rng.gen::<f64>() < 0.2 {
                    out = format!("{} {}.", out, pick(rng, FORMAL_FAREWELLS));
                }
            }
            Formality::Casual => {
                if FORMAL_GREETING_RE.is_match(&out) {
                    let replacement = pick(rng, CASUAL_GREETINGS).to_string();
                    out = FORMAL_GREETING_RE.replace_all(&out, replacement.as_str()).into_owned();
                }
                if rng.gen::<f64>() < 0.3 {
                    out = out
                        .replace("I am", "I'm")
                        .replace("I would", "I'd")
                        .replace("I will", "I'll");
                }
            }
            Formality::Professional => {}
        }
        out
    }

    fn apply_enthusiasm<R: Rng + ?Sized>(
        &self,
        text: &str,
        level: Enthusiasm,
        rng: &mut R,
    ) -> String {
        let mut out = text.to_string();
        let (exclamations, intensifiers, emojis, exclaim_chance) = match level {
            Enthusiasm::High => (HIGH_EXCLAMATIONS, HIGH_INTENSIFIERS, HIGH_EMOJIS, 0.4),
            Enthusiasm::Medium => (MEDIUM_EXCLAMATIONS, MEDIUM_INTENSIFIERS, MEDIUM_EMOJIS, 0.2),
            Enthusiasm::Low => return out,
        };

        if !out.ends_with('!') && rng.gen::<f64>() < exclaim_chance {
            out.push_str(pick(rng, exclamations));
        }

        if rng.gen::<f64>() < 0.3 {
            let intensifier = pick(rng, intensifiers);
            out = match level {
                Enthusiasm::High => format!("{}, {}", intensifier, out.to_lowercase()),
                _ => format!("{} {}", intensifier, out),
            };
        }

        if rng.gen::<f64>() < 0.2 {
            out = format!("{} {}", out, pick(rng, emojis));
        }

        if level == Enthusiasm::High {
            if rng.gen::<f64>() < 0.5 {
                let lowered = out.to_lowercase();
                if lowered.contains("great") || lowered.contains("good") {
                    out.push_str("!!!");
                } else if !out.ends_with('!') {
                    out.push('!');
                }
            }
            if rng.gen::<f64>() < 0.3 {
                if out.to_lowercase().contains("help") {
                    out = out.replace("help", "absolutely help");
                } else if out.to_lowercase().contains("assist") {
                    out = out.replace("assist", "definitely assist");
                }
            }
        }

        out
    }

    fn apply_verbosity<R: Rng + ?Sized>(
        &self,
        text: &str,
        level: Verbosity,
        rng: &mut R,
    ) -> String {
        if level != Verbosity::Detailed {
            return text.to_string();
        }

        let mut out = text.to_string();
        let word_count = out.split_whitespace().count();

        if word_count > 10 && rng.gen::<f64>() < 0.3 {
            out = format!("{}: {}", pick(rng, DETAILED_EXPLANATIONS), out);
        }
        if word_count > 15 && rng.gen::<f64>() < 0.2 {
            out = format!(
                "{} {}, this approach has worked well in similar situations.",
                out,
                pick(rng, DETAILED_EXAMPLES)
            );
        }
        out
    }

    fn apply_empathy<R: Rng + ?Sized>(&self, text: &str, level: Empathy, rng: &mut R) -> String {
        let mut out = text.to_string();
        match level {
            Empathy::High => {
                if rng.gen::<f64>() < 0.2 {
                    out = format!("{}. {}", pick(rng, HIGH_ACKNOWLEDGMENTS), out);
                }
                if rng.gen::<f64>() < 0.1 {
                    out = format!("{} {}", out, pick(rng, HIGH_QUESTIONS));
                }
            }
            Empathy::Medium => {
                if rng.gen::<f64>() < 0.15 {
                    out = format!("{} {}.", out, pick(rng, MEDIUM_SUPPORT));
                }
            }
            Empathy::Low => {}
        }
        out
    }

    fn apply_humor<R: Rng + ?Sized>(&self, text: &str, level: Humor, rng: &mut R) -> String {
        let mut out = text.to_string();
        let jokes = match level {
            Humor::Heavy => {
                if rng.gen::<f64>() < 0.15 {
                    out = format!("{} {}", out, pick(rng, HEAVY_PLAYFUL));
                }
                HEAVY_JOKES
            }
            Humor::Moderate => MODERATE_JOKES,
            Humor::Light => LIGHT_JOKES,
            Humor::None => return out,
        };

        if rng.gen::<f64>() < 0.1 {
            out = format!("{} {}", out, pick(rng, jokes));
        }
        out
    }
}
