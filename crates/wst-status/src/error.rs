//! Error types for the status engine.

use wst_delta::DiffError;
use wst_snapshot::{SnapshotError, SnapshotResult};

/// Errors raised while configuring or computing status.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// The options are self-contradictory or malformed.
    #[error("invalid status options: {0}")]
    InvalidConfiguration(String),

    /// A pathspec pattern failed to compile.
    #[error("invalid pathspec '{pattern}': {reason}")]
    InvalidPathspec { pattern: String, reason: String },

    /// HEAD, the index or the workdir could not be resolved.
    #[error("repository unavailable: {0}")]
    RepositoryUnavailable(#[source] SnapshotError),

    /// Another writer holds the exclusive index lock.
    #[error("index is locked: {0}")]
    IndexLocked(#[source] SnapshotError),

    /// A single-path query named a path absent from HEAD, index and workdir.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// List access outside `0..count`.
    #[error("index {index} out of range for status list of {count} entries")]
    IndexOutOfRange { index: usize, count: usize },

    /// A collaborator broke its ordering or uniqueness contract.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// The differencer failed.
    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    /// Blob content needed for similarity scoring could not be read.
    #[error("content source error: {0}")]
    Content(#[source] SnapshotError),

    /// The caller's cancellation flag was raised.
    #[error("status computation cancelled")]
    Cancelled,
}

impl StatusError {
    /// Returns `true` for lock contention, which callers may retry.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::IndexLocked(_))
    }

    /// Map a resolver failure, keeping lock contention distinguishable.
    pub(crate) fn from_resolver(err: SnapshotError) -> Self {
        if err.is_locked() {
            Self::IndexLocked(err)
        } else {
            Self::RepositoryUnavailable(err)
        }
    }
}

/// Convenience alias for status results.
pub type StatusResult<T> = Result<T, StatusError>;

/// Adapt a resolver result into a status result.
pub(crate) fn resolved<T>(result: SnapshotResult<T>) -> StatusResult<T> {
    result.map_err(StatusError::from_resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn resolver_lock_errors_stay_distinguishable() {
        let locked = StatusError::from_resolver(SnapshotError::IndexLocked(PathBuf::from("index.lock")));
        assert!(locked.is_locked());

        let corrupt = StatusError::from_resolver(SnapshotError::CorruptIndex("bad".into()));
        assert!(matches!(corrupt, StatusError::RepositoryUnavailable(_)));
        assert!(!corrupt.is_locked());
    }

    #[test]
    fn out_of_range_message_names_bounds() {
        let err = StatusError::IndexOutOfRange { index: 3, count: 3 };
        assert_eq!(err.to_string(), "index 3 out of range for status list of 3 entries");
    }
}
