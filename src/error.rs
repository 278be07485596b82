//! Queue actor error types and handling

use std::fmt;

use crate::store::StoreError;

/// Queue actor operation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Malformed or out-of-range caller input.
    InvalidArgument {
        field: &'static str,
        reason: &'static str,
    },

    /// `Acknowledge` called with no active lock on record.
    LockNotFound,

    /// `Acknowledge` id does not match the active lock. The lock is left untouched.
    InvalidLockId,

    /// `Acknowledge` matched an expired lock; recovery was performed as a side effect.
    LockExpired,

    /// The load scan could not retrieve an offloaded segment from cold storage.
    ColdStoreUnavailable { key: String, reason: String },

    /// Unexpected failure; no state mutation was committed.
    Internal { reason: String },

    /// The underlying `StateStore` collaborator returned an error.
    Store(StoreError),
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::InvalidArgument { field, reason } => {
                write!(f, "invalid argument '{field}': {reason}")
            }
            QueueError::LockNotFound => write!(f, "no active lock"),
            QueueError::InvalidLockId => write!(f, "lock id does not match the active lock"),
            QueueError::LockExpired => write!(f, "lock has expired"),
            QueueError::ColdStoreUnavailable { key, reason } => {
                write!(f, "cold store unavailable for key '{key}': {reason}")
            }
            QueueError::Internal { reason } => write!(f, "internal error: {reason}"),
            QueueError::Store(err) => write!(f, "state store error: {err}"),
        }
    }
}

impl std::error::Error for QueueError {}

impl From<StoreError> for QueueError {
    fn from(err: StoreError) -> Self {
        QueueError::Store(err)
    }
}

/// Result type alias for queue actor operations
pub type Result<T> = std::result::Result<T, QueueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = QueueError::InvalidArgument {
            field: "priority",
            reason: "must be non-negative",
        };
        let display = format!("{error}");
        assert!(display.contains("priority"));
        assert!(display.contains("non-negative"));
    }

    #[test]
    fn test_error_clone_and_eq() {
        let error = QueueError::LockExpired;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }

    #[test]
    fn test_store_error_conversion() {
        let store_err = StoreError::Unavailable("cold".into());
        let err: QueueError = store_err.clone().into();
        assert_eq!(err, QueueError::Store(store_err));
    }
}
