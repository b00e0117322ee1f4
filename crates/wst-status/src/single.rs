//! Single-path status lookup.

use tracing::debug;
use wst_delta::{classify, DeltaKind};
use wst_snapshot::SnapshotSide;

use crate::error::{resolved, StatusError, StatusResult};
use crate::repository::RepositoryState;
use crate::status::Status;
use crate::untracked::path_is_ignored;

/// Status flags for exactly one file path.
///
/// Uses targeted lookups instead of resolving whole snapshots. No rename
/// detection is done and untracked files are never folded into a
/// directory, so an untracked file reports `WT_NEW` (or `IGNORED`) under
/// its own path.
pub fn status_of(repo: &RepositoryState<'_>, path: &str) -> StatusResult<Status> {
    if path.is_empty() || path.ends_with('/') {
        return Err(StatusError::InvalidConfiguration(format!(
            "status lookup needs a file path, got '{path}'"
        )));
    }
    repo.check_cancelled()?;

    let head = resolved(repo.resolver.head_entry(path))?;
    let index = resolved(repo.resolver.index_entry(path))?;
    let workdir = resolved(repo.resolver.workdir_entry(path))?;
    if head.is_none() && index.is_none() && workdir.is_none() {
        return Err(StatusError::PathNotFound(path.to_string()));
    }

    let mut status = Status::CURRENT;
    if let Some(delta) = classify(path, head.as_ref(), index.as_ref(), SnapshotSide::Index)? {
        status |= Status::from_head_to_index(delta.kind());
    }
    if let Some(delta) = classify(path, index.as_ref(), workdir.as_ref(), SnapshotSide::Workdir)? {
        status |= match delta.kind() {
            DeltaKind::Untracked if path_is_ignored(repo.ignores, path) => Status::IGNORED,
            kind => Status::from_index_to_workdir(kind),
        };
    }

    debug!(path, ?status, "single path status");
    Ok(status)
}
