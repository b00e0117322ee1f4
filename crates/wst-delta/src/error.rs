//! Error types for the delta crate.

/// Errors that can occur while producing delta records.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A delta record was constructed with fields that violate its invariants.
    #[error("invalid delta record: {0}")]
    InvalidRecord(String),

    /// A snapshot backing the comparison failed.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] wst_snapshot::SnapshotError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
