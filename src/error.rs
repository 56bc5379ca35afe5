//! Error types for the Attune tone adaptation service
//!
//! One library-wide enum covers every failure the engine and stores can
//! produce, with `#[from]` conversions for the underlying crates. The
//! binary bridges into anyhow at its boundary.

use thiserror::Error;

/// Main error type for Attune operations
#[derive(Error, Debug)]
pub enum AttuneError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// User profile not found
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Feedback payload failed validation
    #[error("Invalid feedback: {0}")]
    InvalidFeedback(String),

    /// Tone level string did not match any known level
    #[error("Invalid tone level: {0}")]
    InvalidToneLevel(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid bind address
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Attune operations
pub type Result<T> = std::result::Result<T, AttuneError>;

/// Convert anyhow::Error to AttuneError
impl From<anyhow::Error> for AttuneError {
    fn from(err: anyhow::Error) -> Self {
        AttuneError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AttuneError::ProfileNotFound("user-42".to_string());
        assert_eq!(err.to_string(), "Profile not found: user-42");
    }

    #[test]
    fn test_invalid_feedback_display() {
        let err = AttuneError::InvalidFeedback("rating value out of range".to_string());
        assert_eq!(err.to_string(), "Invalid feedback: rating value out of range");
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json");
        assert!(json_err.is_err());

        let attune_err: AttuneError = json_err.unwrap_err().into();
        assert!(matches!(attune_err, AttuneError::Serialization(_)));
    }
}
