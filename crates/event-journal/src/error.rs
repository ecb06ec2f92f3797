//! Journal error types.

use thiserror::Error;

/// Journal error type.
///
/// Delivery failures and the storage failures of recording never surface
/// here: they are recovered inside the journal and retry store. Caller
/// mistakes do, as do storage failures of explicit clears.
#[derive(Error, Debug)]
pub enum JournalError {
    /// Event names identify the event kind and must not be blank.
    #[error("Event name must not be empty")]
    EmptyEventName,

    /// A bounded buffer was configured with no room.
    #[error("Invalid capacity for {component}: must be at least 1")]
    InvalidCapacity {
        /// Which buffer was misconfigured.
        component: &'static str,
    },

    /// Storage error from an explicit clear (`RetryStore::clear`,
    /// `IdentityProvider::clear_user_id`).
    #[error("Storage error: {0}")]
    Storage(#[from] beacon_storage::StorageError),
}

/// Result type alias using JournalError.
pub type JournalResult<T> = Result<T, JournalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_capacity_display() {
        let err = JournalError::InvalidCapacity {
            component: "retry store",
        };
        assert_eq!(
            err.to_string(),
            "Invalid capacity for retry store: must be at least 1"
        );
    }

    #[test]
    fn storage_error_converts() {
        let err: JournalError =
            beacon_storage::StorageError::Unavailable("quota exceeded".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Storage error: Storage unavailable: quota exceeded"
        );
    }
}
