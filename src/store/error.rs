//! Document store error types

use thiserror::Error;

use super::types::DocumentKey;

/// Errors that can occur in the document store
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite operation failed
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Document body could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Write precondition did not hold
    #[error("Version conflict on {key}: expected {expected}, found {actual}")]
    Conflict {
        key: DocumentKey,
        expected: u64,
        actual: u64,
    },

    /// Collection or document id is not addressable
    #[error("Invalid document key: {0}")]
    InvalidKey(String),

    /// The change feed for a subscription was shut down
    #[error("Subscription to {0} closed")]
    SubscriptionClosed(DocumentKey),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Conflict {
            key: DocumentKey::new("hospitalData", "status"),
            expected: 2,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Version conflict on hospitalData/status: expected 2, found 3"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let store_err: StoreError = json_err.into();
        assert!(matches!(store_err, StoreError::Serialization(_)));
    }
}
