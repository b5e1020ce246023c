//! Unified error handling for the liftlog engine.
//!
//! Referenced-data misses (a routine or exercise definition that no longer
//! exists) are not errors: the engine handles them locally by falling back to
//! stored-log behavior. Only storage failures, malformed documents, and
//! malformed date keys surface through this type.

/// Unified error type for liftlog operations.
#[derive(Debug, thiserror::Error)]
pub enum LiftlogError {
    /// Underlying store read or write failed
    #[error("storage failure: {message}")]
    Storage { message: String },

    /// A persisted document could not be decoded
    #[error("malformed document '{key}': {source}")]
    Document {
        /// Document key (date key or exercise id)
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A date key did not parse as `YYYY-MM-DD`
    #[error("invalid date key '{value}' (expected YYYY-MM-DD)")]
    InvalidDateKey { value: String },
}

impl From<rusqlite::Error> for LiftlogError {
    fn from(err: rusqlite::Error) -> Self {
        LiftlogError::Storage {
            message: err.to_string(),
        }
    }
}

/// Result type alias for liftlog operations.
pub type Result<T> = std::result::Result<T, LiftlogError>;
