//! Collaborator interfaces consumed by the status engine.
//!
//! All implementations must be thread-safe (`Send + Sync`): several status
//! computations may run against the same repository from different threads.

use std::collections::BTreeSet;

use wst_types::ObjectId;

use crate::error::SnapshotResult;
use crate::lock::IndexLock;
use crate::snapshot::{Snapshot, SnapshotEntry};

/// Restricts which workdir paths a resolver needs to report.
pub trait PathFilter: Send + Sync {
    /// Whether the file at `path` is of interest.
    fn matches(&self, path: &str) -> bool;

    /// Whether any file below directory `dir` (trailing `/`) could match.
    /// Resolvers use this to prune directory walks.
    fn may_contain(&self, _dir: &str) -> bool {
        true
    }
}

/// Accepts every path.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllPaths;

impl PathFilter for AllPaths {
    fn matches(&self, _path: &str) -> bool {
        true
    }
}

/// Accepts exactly one path.
#[derive(Clone, Copy, Debug)]
pub struct ExactPath<'a>(pub &'a str);

impl PathFilter for ExactPath<'_> {
    fn matches(&self, path: &str) -> bool {
        path == self.0
    }

    fn may_contain(&self, dir: &str) -> bool {
        self.0.starts_with(dir)
    }
}

/// Resolves the three states compared by status.
///
/// Returned snapshots must be internally consistent: each describes one
/// moment of its side, even if the three were read at different moments.
pub trait SnapshotResolver: Send + Sync {
    /// The tree of the HEAD commit. An empty snapshot when no commit exists.
    fn resolve_head(&self) -> SnapshotResult<Snapshot>;

    /// The staging index, including stat data and conflict markers.
    fn resolve_index(&self) -> SnapshotResult<Snapshot>;

    /// The working directory files accepted by `filter`.
    fn resolve_workdir(&self, filter: &dyn PathFilter) -> SnapshotResult<Snapshot>;

    /// Look up one HEAD entry.
    ///
    /// Default implementation resolves the full tree. Backends should
    /// override this with a targeted lookup.
    fn head_entry(&self, path: &str) -> SnapshotResult<Option<SnapshotEntry>> {
        Ok(self.resolve_head()?.get(path).cloned())
    }

    /// Look up one index entry.
    fn index_entry(&self, path: &str) -> SnapshotResult<Option<SnapshotEntry>> {
        Ok(self.resolve_index()?.get(path).cloned())
    }

    /// Look up one workdir file.
    fn workdir_entry(&self, path: &str) -> SnapshotResult<Option<SnapshotEntry>> {
        Ok(self.resolve_workdir(&ExactPath(path))?.get(path).cloned())
    }
}

/// Decides whether an untracked path is ignored.
pub trait IgnoreEvaluator: Send + Sync {
    /// Whether `path` matches the ignore rules. Directory paths are passed
    /// with a trailing `/`.
    fn is_ignored(&self, path: &str) -> bool;
}

/// Reads blob content by id, for similarity scoring during rename detection.
pub trait ContentSource: Send + Sync {
    /// Returns `Ok(None)` if the content is not available.
    fn read_blob(&self, id: &ObjectId) -> SnapshotResult<Option<Vec<u8>>>;
}

/// Writes refreshed stat data back into the index.
///
/// This is the only mutating collaborator. Callers must hold the lock
/// returned by [`IndexMutator::lock`] for the duration of a refresh.
pub trait IndexMutator: Send + Sync {
    /// Take the exclusive index lock. Fails with
    /// [`SnapshotError::IndexLocked`](crate::SnapshotError::IndexLocked) when
    /// it is already held.
    fn lock(&self) -> SnapshotResult<IndexLock>;

    /// Refresh cached stat data for every index entry whose workdir content
    /// is unchanged. Returns the paths that could not be refreshed.
    fn refresh_stat_cache(&self, lock: &IndexLock) -> SnapshotResult<BTreeSet<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_path_prunes_unrelated_dirs() {
        let filter = ExactPath("src/lib.rs");
        assert!(filter.matches("src/lib.rs"));
        assert!(!filter.matches("src/main.rs"));
        assert!(filter.may_contain("src/"));
        assert!(!filter.may_contain("docs/"));
    }

    #[test]
    fn all_paths_accepts_everything() {
        assert!(AllPaths.matches("anything/at/all"));
        assert!(AllPaths.may_contain("dir/"));
    }
}
