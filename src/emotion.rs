//! Keyword and emoji based emotion detection
//!
//! Annotates chat responses with the dominant emotion of the incoming
//! message. Read-only: nothing in the adaptation pipeline consumes the
//! result. Detection never fails; unmatched text is neutral at low
//! intensity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Detected emotion label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Disgust,
    Neutral,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Surprise => "surprise",
            Emotion::Disgust => "disgust",
            Emotion::Neutral => "neutral",
        }
    }
}

/// Coarse intensity of the detected emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

/// Result of scanning one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionReading {
    pub primary_emotion: Emotion,
    pub intensity: Intensity,
    pub confidence: f64,
    pub emotions: HashMap<Emotion, usize>,
}

const JOY_WORDS: &[&str] = &[
    "happy", "joy", "excited", "thrilled", "delighted", "pleased", "great", "wonderful",
    "amazing", "fantastic", "awesome", "brilliant", "excellent", "perfect", "love", "adore",
    "enjoy", "fun", "laugh", "smile", "😊", "😄", "😃", "😁", "🎉", "✨", "💯",
];
const SADNESS_WORDS: &[&str] = &[
    "sad", "depressed", "melancholy", "gloomy", "miserable", "unhappy", "disappointed",
    "heartbroken", "lonely", "hopeless", "sorrow", "grief", "tears", "cry", "😢", "😭",
    "😔", "💔", "😞", "😥",
];
const ANGER_WORDS: &[&str] = &[
    "angry", "mad", "furious", "irritated", "annoyed", "frustrated", "rage", "hate",
    "disgusted", "outraged", "livid", "fuming", "irate", "😠", "😡", "🤬", "💢", "😤",
];
const FEAR_WORDS: &[&str] = &[
    "afraid", "scared", "frightened", "terrified", "anxious", "worried", "nervous",
    "panicked", "horrified", "dread", "terror", "fear", "😨", "😰", "😱", "😳", "😟",
];
const SURPRISE_WORDS: &[&str] = &[
    "surprised", "shocked", "amazed", "astonished", "stunned", "bewildered", "wow",
    "incredible", "unbelievable", "😲", "😯", "😳", "🤯", "😱",
];
const DISGUST_WORDS: &[&str] = &[
    "disgusted", "revolted", "repulsed", "sickened", "gross", "nasty", "vile",
    "🤢", "🤮", "😷", "🤧",
];

const LOW_INDICATORS: &[&str] = &["slightly", "a bit", "somewhat", "kind of", "sort of"];
const MEDIUM_INDICATORS: &[&str] = &["really", "quite", "pretty", "fairly", "rather"];
const HIGH_INDICATORS: &[&str] =
    &["extremely", "absolutely", "completely", "totally", "utterly", "incredibly"];

const EMOJI_INTENSITY: &[(&str, Intensity)] = &[
    ("😊", Intensity::Low),
    ("😄", Intensity::Medium),
    ("😃", Intensity::Medium),
    ("😁", Intensity::High),
    ("😢", Intensity::Low),
    ("😭", Intensity::High),
    ("😔", Intensity::Low),
    ("😠", Intensity::Medium),
    ("😡", Intensity::High),
    ("🤬", Intensity::High),
    ("😨", Intensity::Medium),
    ("😰", Intensity::Medium),
    ("😱", Intensity::High),
    ("😲", Intensity::Medium),
    ("😯", Intensity::Low),
    ("🤯", Intensity::High),
    ("🤢", Intensity::Medium),
    ("🤮", Intensity::High),
];

const LABELS: [(Emotion, &[&str]); 6] = [
    (Emotion::Joy, JOY_WORDS),
    (Emotion::Sadness, SADNESS_WORDS),
    (Emotion::Anger, ANGER_WORDS),
    (Emotion::Fear, FEAR_WORDS),
    (Emotion::Surprise, SURPRISE_WORDS),
    (Emotion::Disgust, DISGUST_WORDS),
];

/// Scan a message for emotion keywords and emoji
pub fn detect_emotion(text: &str) -> EmotionReading {
    let lowered = text.to_lowercase();

    let mut scores: HashMap<Emotion, usize> = HashMap::new();
    let mut primary = Emotion::Neutral;
    let mut max_score = 0usize;
    for (emotion, words) in LABELS {
        let score = words.iter().filter(|w| lowered.contains(*w)).count();
        if score > max_score {
            max_score = score;
            primary = emotion;
        }
        scores.insert(emotion, score);
    }

    let mut intensity = Intensity::Low;
    for (level, indicators) in [
        (Intensity::Low, LOW_INDICATORS),
        (Intensity::Medium, MEDIUM_INDICATORS),
        (Intensity::High, HIGH_INDICATORS),
    ] {
        if indicators.iter().any(|w| lowered.contains(w)) {
            intensity = level;
        }
    }

    // Emoji intensity overrides upward
    let emoji_levels: Vec<Intensity> = EMOJI_INTENSITY
        .iter()
        .filter(|(emoji, _)| text.contains(emoji))
        .map(|&(_, level)| level)
        .collect();
    if emoji_levels.contains(&Intensity::High) {
        intensity = Intensity::High;
    } else if emoji_levels.contains(&Intensity::Medium) && intensity == Intensity::Low {
        intensity = Intensity::Medium;
    }

    let total: usize = scores.values().sum();
    let confidence = if total == 0 {
        0.0
    } else {
        (total as f64 / 10.0).min(1.0)
    };

    EmotionReading {
        primary_emotion: primary,
        intensity,
        confidence,
        emotions: scores,
    }
}
