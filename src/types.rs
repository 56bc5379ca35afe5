//! Core data types for the Attune tone adaptation service
//!
//! This module defines the tone-axis scales, user profiles, conversation
//! records, and feedback payloads used throughout the crate. The five tone
//! axes are ordered categorical scales with a shared numeric mapping so that
//! corrections expressed as deltas can be applied and clamped uniformly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AttuneError;

/// Formality of the rendered response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    Casual,
    Professional,
    Formal,
}

/// Enthusiasm level of the rendered response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enthusiasm {
    Low,
    Medium,
    High,
}

/// How much detail the response carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    Concise,
    Balanced,
    Detailed,
}

/// Empathy level of the rendered response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Empathy {
    Low,
    Medium,
    High,
}

/// Humor level of the rendered response (four positions, unlike the
/// three-level axes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Humor {
    None,
    Light,
    Moderate,
    Heavy,
}

macro_rules! three_level_axis {
    ($ty:ident, $low:ident, $mid:ident, $high:ident, $low_s:literal, $mid_s:literal, $high_s:literal) => {
        impl $ty {
            /// Map to the canonical [0, 1] scale
            pub fn as_numeric(&self) -> f64 {
                match self {
                    $ty::$low => 0.0,
                    $ty::$mid => 0.5,
                    $ty::$high => 1.0,
                }
            }

            /// Map a [0, 1] value back onto the scale
            /// Thresholds: < 0.33 low, < 0.66 mid, else high
            pub fn from_numeric(value: f64) -> Self {
                if value < 0.33 {
                    $ty::$low
                } else if value < 0.66 {
                    $ty::$mid
                } else {
                    $ty::$high
                }
            }

            /// One step toward the high end, saturating
            pub fn step_up(&self) -> Self {
                match self {
                    $ty::$low => $ty::$mid,
                    _ => $ty::$high,
                }
            }

            /// One step toward the low end, saturating
            pub fn step_down(&self) -> Self {
                match self {
                    $ty::$high => $ty::$mid,
                    _ => $ty::$low,
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $ty::$low => $low_s,
                    $ty::$mid => $mid_s,
                    $ty::$high => $high_s,
                }
            }
        }

        impl FromStr for $ty {
            type Err = AttuneError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $low_s => Ok($ty::$low),
                    $mid_s => Ok($ty::$mid),
                    $high_s => Ok($ty::$high),
                    other => Err(AttuneError::InvalidToneLevel(other.to_string())),
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

three_level_axis!(Formality, Casual, Professional, Formal, "casual", "professional", "formal");
three_level_axis!(Enthusiasm, Low, Medium, High, "low", "medium", "high");
three_level_axis!(Verbosity, Concise, Balanced, Detailed, "concise", "balanced", "detailed");
three_level_axis!(Empathy, Low, Medium, High, "low", "medium", "high");

impl Humor {
    /// Map to the canonical [0, 1] scale
    pub fn as_numeric(&self) -> f64 {
        match self {
            Humor::None => 0.0,
            Humor::Light => 0.33,
            Humor::Moderate => 0.66,
            Humor::Heavy => 1.0,
        }
    }

    /// Map a [0, 1] value back onto the scale
    /// Thresholds: < 0.25 none, < 0.5 light, < 0.75 moderate, else heavy
    pub fn from_numeric(value: f64) -> Self {
        if value < 0.25 {
            Humor::None
        } else if value < 0.5 {
            Humor::Light
        } else if value < 0.75 {
            Humor::Moderate
        } else {
            Humor::Heavy
        }
    }

    /// One step toward heavy, saturating
    pub fn step_up(&self) -> Self {
        match self {
            Humor::None => Humor::Light,
            Humor::Light => Humor::Moderate,
            _ => Humor::Heavy,
        }
    }

    /// One step toward none, saturating
    pub fn step_down(&self) -> Self {
        match self {
            Humor::Heavy => Humor::Moderate,
            Humor::Moderate => Humor::Light,
            _ => Humor::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Humor::None => "none",
            Humor::Light => "light",
            Humor::Moderate => "moderate",
            Humor::Heavy => "heavy",
        }
    }
}

impl FromStr for Humor {
    type Err = AttuneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Humor::None),
            "light" => Ok(Humor::Light),
            "moderate" => Ok(Humor::Moderate),
            "heavy" => Ok(Humor::Heavy),
            other => Err(AttuneError::InvalidToneLevel(other.to_string())),
        }
    }
}

impl std::fmt::Display for Humor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The five tone axes a response is styled along
///
/// Identifies an axis by name so corrections and effectiveness stats can be
/// keyed without stringly-typed maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneAxis {
    Formality,
    Enthusiasm,
    Verbosity,
    EmpathyLevel,
    Humor,
}

impl ToneAxis {
    pub const ALL: [ToneAxis; 5] = [
        ToneAxis::Formality,
        ToneAxis::Enthusiasm,
        ToneAxis::Verbosity,
        ToneAxis::EmpathyLevel,
        ToneAxis::Humor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToneAxis::Formality => "formality",
            ToneAxis::Enthusiasm => "enthusiasm",
            ToneAxis::Verbosity => "verbosity",
            ToneAxis::EmpathyLevel => "empathy_level",
            ToneAxis::Humor => "humor",
        }
    }

    /// Parse an axis name as it appears in feedback payloads
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "formality" => Some(ToneAxis::Formality),
            "enthusiasm" => Some(ToneAxis::Enthusiasm),
            "verbosity" => Some(ToneAxis::Verbosity),
            "empathy_level" => Some(ToneAxis::EmpathyLevel),
            "humor" => Some(ToneAxis::Humor),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToneAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A complete tone preference vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TonePreferences {
    pub formality: Formality,
    pub enthusiasm: Enthusiasm,
    pub verbosity: Verbosity,
    pub empathy_level: Empathy,
    pub humor: Humor,
}

impl TonePreferences {
    /// Read one axis on the numeric scale
    pub fn numeric(&self, axis: ToneAxis) -> f64 {
        match axis {
            ToneAxis::Formality => self.formality.as_numeric(),
            ToneAxis::Enthusiasm => self.enthusiasm.as_numeric(),
            ToneAxis::Verbosity => self.verbosity.as_numeric(),
            ToneAxis::EmpathyLevel => self.empathy_level.as_numeric(),
            ToneAxis::Humor => self.humor.as_numeric(),
        }
    }

    /// Set one axis from a numeric value, clamped to [0, 1] first
    pub fn set_numeric(&mut self, axis: ToneAxis, value: f64) {
        let value = value.clamp(0.0, 1.0);
        match axis {
            ToneAxis::Formality => self.formality = Formality::from_numeric(value),
            ToneAxis::Enthusiasm => self.enthusiasm = Enthusiasm::from_numeric(value),
            ToneAxis::Verbosity => self.verbosity = Verbosity::from_numeric(value),
            ToneAxis::EmpathyLevel => self.empathy_level = Empathy::from_numeric(value),
            ToneAxis::Humor => self.humor = Humor::from_numeric(value),
        }
    }

    /// One step toward the low-intensity end of an axis, saturating
    pub fn step_axis_down(&mut self, axis: ToneAxis) {
        match axis {
            ToneAxis::Formality => self.formality = self.formality.step_down(),
            ToneAxis::Enthusiasm => self.enthusiasm = self.enthusiasm.step_down(),
            ToneAxis::Verbosity => self.verbosity = self.verbosity.step_down(),
            ToneAxis::EmpathyLevel => self.empathy_level = self.empathy_level.step_down(),
            ToneAxis::Humor => self.humor = self.humor.step_down(),
        }
    }
}

impl Default for TonePreferences {
    fn default() -> Self {
        Self {
            formality: Formality::Professional,
            enthusiasm: Enthusiasm::Medium,
            verbosity: Verbosity::Balanced,
            empathy_level: Empathy::Medium,
            humor: Humor::Light,
        }
    }
}

/// User's technical proficiency, used when phrasing canned responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// Coarse age bracket carried on the communication style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Teen,
    YoungAdult,
    Adult,
    Senior,
}

/// Static communication attributes that are not tone axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationStyle {
    pub preferred_greeting: String,
    pub technical_level: TechnicalLevel,
    pub cultural_context: String,
    pub age_group: AgeGroup,
}

impl Default for CommunicationStyle {
    fn default() -> Self {
        Self {
            preferred_greeting: "Hello".to_string(),
            technical_level: TechnicalLevel::Intermediate,
            cultural_context: String::new(),
            age_group: AgeGroup::Adult,
        }
    }
}

/// Running interaction statistics for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InteractionHistory {
    pub total_interactions: u64,
    pub successful_tone_matches: u64,
    pub feedback_score: f64,
    pub last_interaction: Option<DateTime<Utc>>,
}

/// Optional per-context tone overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContextPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work: Option<TonePreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal: Option<TonePreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic: Option<TonePreferences>,
}

/// A user's complete adaptation profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub tone_preferences: TonePreferences,
    pub communication_style: CommunicationStyle,
    pub interaction_history: InteractionHistory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_preferences: Option<ContextPreferences>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A fresh profile with documented defaults, used on first contact
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            tone_preferences: TonePreferences::default(),
            communication_style: CommunicationStyle::default(),
            interaction_history: InteractionHistory::default(),
            context_preferences: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One user/assistant exchange kept in short-term memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationExchange {
    pub user_message: String,
    pub ai_response: String,
    pub context: crate::context::Context,
    pub applied_tone: TonePreferences,
    pub timestamp: DateTime<Utc>,
}

/// Kinds of feedback a user can submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Rating,
    Correction,
    Preference,
}

impl std::fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FeedbackKind::Rating => "rating",
            FeedbackKind::Correction => "correction",
            FeedbackKind::Preference => "preference",
        };
        write!(f, "{}", s)
    }
}

/// Raw feedback payload as submitted over the API
///
/// `kind` is a free string on the wire; unknown kinds are accepted and
/// ignored rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Axis name -> numeric delta in [-1, 1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrections: Option<HashMap<String, f64>>,
    /// Axis name -> absolute numeric target in [0, 1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<HashMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// A processed feedback entry in the append-only per-user log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub id: Uuid,
    pub kind: FeedbackKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrections: Option<HashMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<HashMap<String, f64>>,
    pub context: String,
    pub timestamp: DateTime<Utc>,
}
