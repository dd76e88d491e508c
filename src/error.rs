//! Error types for the trip planner.

use thiserror::Error;

/// Result type alias for trip planner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised for malformed input or unusable configuration.
///
/// Business-rule outcomes such as oversized groups are not errors; they are
/// reported by the validator.
#[derive(Debug, Error)]
pub enum Error {
    /// A demand record, location, group or route is malformed.
    #[error("Invalid input in {record}: {reason}")]
    InvalidInput { record: String, reason: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_input(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            record: record.into(),
            reason: reason.into(),
        }
    }
}
