//! Conversation context classification
//!
//! Scores each incoming message against three context labels (work, personal,
//! academic) using keyword hits, phrase patterns, and temporal idioms, with a
//! second-pass bonus from recent conversation history. All pattern tables are
//! compiled once at first use.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::ConversationExchange;

/// Conversation context label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    Work,
    Personal,
    Academic,
    Unknown,
}

impl Context {
    pub fn as_str(&self) -> &'static str {
        match self {
            Context::Work => "work",
            Context::Personal => "personal",
            Context::Academic => "academic",
            Context::Unknown => "unknown",
        }
    }

    /// The three scoreable labels, in tie-break order
    pub const LABELS: [Context; 3] = [Context::Work, Context::Personal, Context::Academic];
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-label confidence vector; `unknown` is 1 minus the best label score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub work: f64,
    pub personal: f64,
    pub academic: f64,
    pub unknown: f64,
}

/// Matched keywords and phrase fragments per label, for explainability
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Evidence {
    pub work: Vec<String>,
    pub personal: Vec<String>,
    pub academic: Vec<String>,
}

/// Full classification result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub context: Context,
    pub confidence: Confidence,
    pub evidence: Evidence,
}

const WORK_KEYWORDS: &[&str] = &[
    "meeting", "project", "deadline", "client", "business", "work", "office",
    "report", "presentation", "team", "manager", "boss", "colleague",
    "schedule", "agenda", "strategy", "budget", "quarterly", "annual",
    "performance", "review", "promotion", "salary", "benefits", "hr",
    "conference", "workshop", "training", "development", "code", "software",
    "database", "server", "api", "deployment", "testing", "bug", "feature",
    "tomorrow", "appointment", "call", "email", "document", "proposal",
];

const PERSONAL_KEYWORDS: &[&str] = &[
    "family", "friend", "home", "weekend", "vacation", "party", "birthday",
    "dinner", "movie", "music", "hobby", "sport", "game", "pet", "dog",
    "cat", "love", "relationship", "dating", "marriage", "kids", "baby",
    "health", "fitness", "gym", "diet", "travel", "trip", "holiday",
    "celebration", "anniversary", "wedding", "graduation", "fun", "enjoy",
    "relax", "stress", "emotion", "feeling", "happy", "sad", "excited",
];

const ACADEMIC_KEYWORDS: &[&str] = &[
    "study", "research", "paper", "thesis", "dissertation", "assignment",
    "homework", "exam", "test", "quiz", "grade", "professor", "lecture",
    "seminar", "course", "class", "university", "college", "school",
    "student", "academic", "scholarly", "literature", "citation", "reference",
    "methodology", "analysis", "data", "statistics", "theory", "hypothesis",
    "experiment", "laboratory", "lab", "fieldwork", "survey", "interview",
    "publication", "journal", "conference", "peer review", "plagiarism",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid context pattern {p}: {e}")))
        .collect()
}

static WORK_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(team|department|company|organization)\s+(meeting|call|discussion)",
        r"\b(project|task|assignment)\s+(deadline|timeline|schedule)",
        r"\b(quarterly|annual|monthly)\s+(report|review|planning)",
        r"\b(client|customer|stakeholder)\s+(meeting|presentation|feedback)",
        r"\b(performance|evaluation|appraisal)\s+(review|meeting)",
        r"\b(budget|financial|cost)\s+(analysis|planning|review)",
        r"\b(development|engineering|programming)\s+(task|feature|bug)",
        r"\b(conference|workshop|training)\s+(session|event)",
    ])
});

static PERSONAL_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(family|friend)\s+(dinner|party|gathering)",
        r"\b(weekend|vacation|holiday)\s+(plan|trip|activity)",
        r"\b(birthday|anniversary|celebration)\s+(party|event)",
        r"\b(relationship|dating|marriage)\s+(discussion|planning)",
        r"\b(health|fitness|wellness)\s+(goal|plan|routine)",
        r"\b(hobby|interest|passion)\s+(activity|project)",
        r"\b(emotion|feeling)\s+(happy|sad|excited|worried)",
        r"\b(pet|dog|cat)\s+(care|training|activity)",
    ])
});

static ACADEMIC_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(research|study)\s+(paper|thesis|dissertation)",
        r"\b(academic|scholarly)\s+(publication|journal|conference)",
        r"\b(course|class|lecture)\s+(assignment|homework|exam)",
        r"\b(methodology|analysis|data)\s+(collection|analysis|interpretation)",
        r"\b(literature|citation|reference)\s+(review|search)",
        r"\b(experiment|laboratory|lab)\s+(work|procedure|protocol)",
        r"\b(statistics|statistical)\s+(analysis|test|method)",
        r"\b(peer\s+review|academic\s+writing)\s+(process|submission)",
    ])
});

static WORK_TEMPORAL: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(9|10|11|12|1|2|3|4|5|6|7|8)\s*(am|pm)\s*(meeting|call|appointment)",
        r"\b(monday|tuesday|wednesday|thursday|friday)\s+(morning|afternoon|evening)",
        r"\b(deadline|due\s+date)\s+(today|tomorrow|this\s+week)",
        r"\b(work|office)\s+(schedule|hours|time)",
    ])
});

static PERSONAL_TEMPORAL: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(weekend|saturday|sunday)\s+(plan|activity|event)",
        r"\b(vacation|holiday|break)\s+(plan|trip|activity)",
        r"\b(birthday|anniversary|celebration)\s+(party|event)",
        r"\b(family|friend)\s+(dinner|lunch|coffee)",
    ])
});

static ACADEMIC_TEMPORAL: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(semester|quarter|term)\s+(exam|assignment|deadline)",
        r"\b(lecture|class|course)\s+(schedule|time|room)",
        r"\b(research|study)\s+(session|period|time)",
        r"\b(thesis|dissertation)\s+(defense|submission|deadline)",
    ])
});

const KEYWORD_WEIGHT: f64 = 0.1;
const PHRASE_WEIGHT: f64 = 0.3;
const TEMPORAL_WEIGHT: f64 = 0.2;
const HISTORY_WEIGHT: f64 = 0.3;
const HISTORY_WINDOW: usize = 10;
const CLASSIFY_THRESHOLD: f64 = 0.1;

fn tables(label: Context) -> (&'static [&'static str], &'static [Regex], &'static [Regex]) {
    match label {
        Context::Work => (WORK_KEYWORDS, &WORK_PHRASES, &WORK_TEMPORAL),
        Context::Personal => (PERSONAL_KEYWORDS, &PERSONAL_PHRASES, &PERSONAL_TEMPORAL),
        Context::Academic => (ACADEMIC_KEYWORDS, &ACADEMIC_PHRASES, &ACADEMIC_TEMPORAL),
        Context::Unknown => (&[], &[], &[]),
    }
}

/// Keyword and pattern based context classifier
///
/// Stateless; all tables are process-wide statics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextClassifier;

impl ContextClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a message, optionally boosted by recent history
    pub fn classify(
        &self,
        message: &str,
        history: Option<&[ConversationExchange]>,
    ) -> Classification {
        let lowered = message.to_lowercase();

        let mut scores: HashMap<Context, f64> = Context::LABELS
            .iter()
            .map(|&label| (label, self.label_score(&lowered, label)))
            .collect();

        if let Some(history) = history {
            let bonus = self.history_fractions(history);
            for &label in &Context::LABELS {
                if let Some(score) = scores.get_mut(&label) {
                    *score = (*score + bonus.get(&label).copied().unwrap_or(0.0) * HISTORY_WEIGHT)
                        .clamp(0.0, 1.0);
                }
            }
        }

        // Stable tie-break: work, then personal, then academic
        let mut best = Context::Unknown;
        let mut best_score = 0.0_f64;
        for &label in &Context::LABELS {
            let score = scores[&label];
            if score > best_score {
                best_score = score;
                best = label;
            }
        }
        if best_score <= CLASSIFY_THRESHOLD {
            best = Context::Unknown;
        }

        Classification {
            context: best,
            confidence: Confidence {
                work: scores[&Context::Work],
                personal: scores[&Context::Personal],
                academic: scores[&Context::Academic],
                unknown: 1.0 - best_score.max(0.0),
            },
            evidence: self.extract_evidence(&lowered),
        }
    }

    /// Score one label: keywords + phrase patterns + temporal idioms, capped at 1.0
    fn label_score(&self, lowered: &str, label: Context) -> f64 {
        let (keywords, phrases, temporal) = tables(label);
        let mut score = 0.0;

        score += keywords.iter().filter(|k| lowered.contains(*k)).count() as f64 * KEYWORD_WEIGHT;
        score += phrases.iter().filter(|re| re.is_match(lowered)).count() as f64 * PHRASE_WEIGHT;
        score += temporal.iter().filter(|re| re.is_match(lowered)).count() as f64 * TEMPORAL_WEIGHT;

        score.min(1.0)
    }

    /// Fraction of history messages that classify to each label
    ///
    /// Looks at the last `HISTORY_WINDOW` entries (depth-1 classification, no
    /// recursive history) but normalizes by the full history length, so long
    /// mixed histories weaken the bonus.
    fn history_fractions(&self, history: &[ConversationExchange]) -> HashMap<Context, f64> {
        let mut counts: HashMap<Context, f64> = HashMap::new();
        let total = history.len();
        if total == 0 {
            return counts;
        }

        let start = total.saturating_sub(HISTORY_WINDOW);
        for exchange in &history[start..] {
            let label = self.classify(&exchange.user_message, None).context;
            if label != Context::Unknown {
                *counts.entry(label).or_insert(0.0) += 1.0;
            }
        }
        for value in counts.values_mut() {
            *value /= total as f64;
        }
        counts
    }

    /// Per-message confidence vector without any history bonus
    pub fn confidence(&self, message: &str) -> Confidence {
        let lowered = message.to_lowercase();
        let work = self.label_score(&lowered, Context::Work);
        let personal = self.label_score(&lowered, Context::Personal);
        let academic = self.label_score(&lowered, Context::Academic);
        Confidence {
            work,
            personal,
            academic,
            unknown: 1.0 - work.max(personal).max(academic),
        }
    }

    /// Keywords and non-empty phrase captures that matched, per label
    pub fn extract_evidence(&self, lowered: &str) -> Evidence {
        let collect = |label: Context| -> Vec<String> {
            let (keywords, phrases, _) = tables(label);
            let mut found: Vec<String> = keywords
                .iter()
                .filter(|k| lowered.contains(*k))
                .map(|k| k.to_string())
                .collect();
            for re in phrases {
                for caps in re.captures_iter(lowered) {
                    for group in caps.iter().skip(1).flatten() {
                        if !group.as_str().is_empty() {
                            found.push(group.as_str().to_string());
                        }
                    }
                }
            }
            found
        };

        Evidence {
            work: collect(Context::Work),
            personal: collect(Context::Personal),
            academic: collect(Context::Academic),
        }
    }
}
