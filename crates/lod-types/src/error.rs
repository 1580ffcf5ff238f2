//! Error types for the LOD exploration API.

use thiserror::Error;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, LodError>;

/// Unified error type for exploration operations.
#[derive(Debug, Error)]
pub enum LodError {
    /// Caller supplied an unusable request (empty subjects, bad size, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A query template names a method that is not registered
    #[error("Unknown aggregation method: {0}")]
    UnknownMethod(String),

    /// The backend answered a multi-search with the wrong number of responses
    #[error("Batch mismatch: sent {expected} queries, received {actual} responses")]
    BatchMismatch {
        /// Number of queries sent
        expected: usize,
        /// Number of responses received
        actual: usize,
    },

    /// A response lacks an aggregation the query asked for
    #[error("Response is missing aggregation '{name}'")]
    MissingAggregation {
        /// Name of the requested aggregation
        name: String,
    },

    /// Transport or status failure talking to the search backend
    #[error("Backend error: {0}")]
    Backend(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LodError {
    /// True for errors caused by the caller's request rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, LodError::InvalidInput(_) | LodError::UnknownMethod(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(LodError::InvalidInput("subjects".into()).is_client_error());
        assert!(LodError::UnknownMethod("fuzzyMatch".into()).is_client_error());
        assert!(!LodError::Backend("503".into()).is_client_error());
        assert!(!LodError::BatchMismatch {
            expected: 2,
            actual: 1
        }
        .is_client_error());
    }

    #[test]
    fn test_batch_mismatch_message() {
        let err = LodError::BatchMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Batch mismatch: sent 4 queries, received 3 responses"
        );
    }
}
