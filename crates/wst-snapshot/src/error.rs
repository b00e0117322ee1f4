//! Error types for the snapshot crate.

use std::path::PathBuf;

/// Errors raised while resolving snapshots or touching the index.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The index could not be read or is structurally invalid.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// Another process or thread holds the exclusive index lock.
    #[error("index is locked: {}", .0.display())]
    IndexLocked(PathBuf),

    /// The working directory root does not exist or is not a directory.
    #[error("working directory unavailable: {}", .0.display())]
    WorkdirUnavailable(PathBuf),

    /// A path could not be represented as a repository-relative string.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Failure while walking the working directory.
    #[error("workdir walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Failure while loading ignore rules.
    #[error("ignore rules error: {0}")]
    Ignore(#[from] ignore::Error),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SnapshotError {
    /// Returns `true` for the lock-contention failure that callers may retry.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::IndexLocked(_))
    }
}

/// Convenience alias for snapshot results.
pub type SnapshotResult<T> = Result<T, SnapshotError>;
