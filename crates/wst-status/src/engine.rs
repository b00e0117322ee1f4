//! The status computation engine.
//!
//! One run resolves the three snapshots, diffs HEAD against the index and
//! the index against the workdir, merges both delta streams by path and
//! applies the option-driven filters before sorting.

use std::collections::HashSet;
use std::ops::ControlFlow;

use tracing::{debug, warn};
use wst_delta::{DeltaKind, DiffOptions};
use wst_snapshot::{PathFilter, Snapshot};

use crate::entry::{StatusEntry, StatusWarning};
use crate::error::{resolved, StatusError, StatusResult};
use crate::list::StatusList;
use crate::merge::{collect_checked, merge_join, MergedPath, SideStream};
use crate::options::{StatusOptFlags, StatusOptions};
use crate::pathspec::Pathspec;
use crate::rename::{detect_renames, RenameConfig};
use crate::repository::RepositoryState;
use crate::status::Status;
use crate::untracked::{Placement, UntrackedPolicy};

/// Result of [`status_foreach`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForeachOutcome {
    /// Every entry was visited.
    Completed { visited: usize },
    /// The callback asked to stop with `code` after `visited` entries.
    Stopped { code: i32, visited: usize },
}

impl ForeachOutcome {
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped { .. })
    }

    /// Number of entries passed to the callback.
    pub fn visited(&self) -> usize {
        match self {
            Self::Completed { visited } | Self::Stopped { visited, .. } => *visited,
        }
    }
}

/// Compute the status of every path in scope.
pub fn compute_status(
    repo: &RepositoryState<'_>,
    options: &StatusOptions,
) -> StatusResult<StatusList> {
    let (entries, warnings) = compute_entries(repo, options)?;
    Ok(StatusList::new(entries, options.clone(), warnings))
}

/// Invoke `callback` with each entry's path and flags, in list order.
///
/// Returning [`ControlFlow::Break`] stops the enumeration early; that is
/// reported as [`ForeachOutcome::Stopped`], not as an error.
pub fn status_foreach<F>(
    repo: &RepositoryState<'_>,
    options: &StatusOptions,
    mut callback: F,
) -> StatusResult<ForeachOutcome>
where
    F: FnMut(&str, Status) -> ControlFlow<i32>,
{
    let (entries, _) = compute_entries(repo, options)?;
    for (visited, entry) in entries.iter().enumerate() {
        if let ControlFlow::Break(code) = callback(entry.path(), entry.status()) {
            debug!(code, visited = visited + 1, "status enumeration stopped by callback");
            return Ok(ForeachOutcome::Stopped {
                code,
                visited: visited + 1,
            });
        }
    }
    Ok(ForeachOutcome::Completed {
        visited: entries.len(),
    })
}

fn compute_entries(
    repo: &RepositoryState<'_>,
    options: &StatusOptions,
) -> StatusResult<(Vec<StatusEntry>, Vec<StatusWarning>)> {
    let order = options.order();
    let show = options.show();

    let pathspec = Pathspec::compile(
        options.pathspec(),
        options.has(StatusOptFlags::DISABLE_PATHSPEC_MATCH),
    )?;
    let warnings = refresh_index(repo, options)?;

    let index_full = resolved(repo.resolver.resolve_index())?;
    let index_scoped;
    let index: &Snapshot = if pathspec.is_unrestricted() {
        &index_full
    } else {
        index_scoped = scoped(index_full.clone(), &pathspec);
        &index_scoped
    };
    let head = if show.includes_index() {
        Some(scoped(resolved(repo.resolver.resolve_head())?, &pathspec))
    } else {
        None
    };
    let workdir = if show.includes_workdir() {
        Some(scoped(resolved(repo.resolver.resolve_workdir(&pathspec))?, &pathspec))
    } else {
        None
    };
    debug!(
        head = head.as_ref().map(Snapshot::len),
        index = index.len(),
        workdir = workdir.as_ref().map(Snapshot::len),
        ?show,
        "snapshots resolved"
    );

    let diff_options = DiffOptions {
        order,
        include_unmodified: options.has(StatusOptFlags::INCLUDE_UNMODIFIED),
    };
    let rename_config = RenameConfig {
        order,
        from_rewrites: options.has(StatusOptFlags::RENAMES_FROM_REWRITES),
        content: repo.content,
    };
    let mut policy = UntrackedPolicy::new(repo.ignores, &index_full);
    policy.include_untracked = options.has(StatusOptFlags::INCLUDE_UNTRACKED);
    policy.include_ignored = options.has(StatusOptFlags::INCLUDE_IGNORED);
    policy.recurse_untracked = options.has(StatusOptFlags::RECURSE_UNTRACKED_DIRS);
    policy.recurse_ignored = options.has(StatusOptFlags::RECURSE_IGNORED_DIRS);

    let head_to_index: SideStream<'_> = match &head {
        None => Box::new(std::iter::empty()),
        Some(head) => {
            let stream: SideStream<'_> = Box::new(
                repo.differ
                    .diff(head, index, &diff_options)
                    .map(|d| d.map_err(StatusError::from)),
            );
            if options.has(StatusOptFlags::RENAMES_HEAD_TO_INDEX) {
                let deltas = collect_checked("HEAD-to-index", stream, order)?;
                let renamed = detect_renames(deltas, |_| true, &rename_config)?;
                Box::new(renamed.into_iter().map(Ok))
            } else {
                stream
            }
        }
    };

    let index_to_workdir: SideStream<'_> = match &workdir {
        None => Box::new(std::iter::empty()),
        Some(workdir) => {
            let stream: SideStream<'_> = Box::new(
                repo.differ
                    .diff(index, workdir, &diff_options)
                    .map(|d| d.map_err(StatusError::from)),
            );
            if options.has(StatusOptFlags::RENAMES_INDEX_TO_WORKDIR) {
                let deltas = collect_checked("index-to-workdir", stream, order)?;
                let renamed = detect_renames(
                    deltas,
                    |d| d.kind() != DeltaKind::Untracked || !policy.is_ignored(d.key()),
                    &rename_config,
                )?;
                Box::new(renamed.into_iter().map(Ok))
            } else {
                stream
            }
        }
    };

    let merged = merge_join(repo, head_to_index, index_to_workdir, order)?;
    let mut entries = build_entries(merged, &mut policy, options)?;
    for entry in &mut entries {
        if let Some(w) = warnings.iter().find(|w| w.path == entry.path()) {
            entry.set_warning(w.clone());
        }
    }

    order.sort_by_path(&mut entries, |e| e.path());
    if let Some(pair) = entries.windows(2).find(|w| w[0].path() == w[1].path()) {
        return Err(StatusError::InternalInconsistency(format!(
            "two status entries for '{}'",
            pair[0].path()
        )));
    }

    debug!(entries = entries.len(), warnings = warnings.len(), "status computed");
    Ok((entries, warnings))
}

fn build_entries(
    merged: Vec<MergedPath>,
    policy: &mut UntrackedPolicy<'_>,
    options: &StatusOptions,
) -> StatusResult<Vec<StatusEntry>> {
    let include_unmodified = options.has(StatusOptFlags::INCLUDE_UNMODIFIED);
    let exclude_submodules = options.has(StatusOptFlags::EXCLUDE_SUBMODULES);
    let mut collapsed = HashSet::new();
    let mut entries = Vec::with_capacity(merged.len());

    for MergedPath {
        key,
        head_to_index,
        index_to_workdir,
    } in merged
    {
        let (path, index_to_workdir) = match index_to_workdir {
            Some(delta) if delta.kind() == DeltaKind::Untracked => {
                match policy.place(delta, head_to_index.is_some())? {
                    Placement::Hidden => (key, None),
                    Placement::File(delta) => (key, Some(delta)),
                    Placement::Directory(delta) => {
                        let dir = delta.key().to_string();
                        if !collapsed.insert(dir.clone()) {
                            continue;
                        }
                        (dir, Some(delta))
                    }
                }
            }
            other => (key, other),
        };
        if head_to_index.is_none() && index_to_workdir.is_none() {
            continue;
        }

        let submodule = head_to_index.iter().chain(&index_to_workdir).any(|d| d.touches_submodule());
        if exclude_submodules && submodule {
            continue;
        }

        let entry = StatusEntry::new(path, head_to_index, index_to_workdir);
        if entry.status().is_current() && !include_unmodified {
            continue;
        }
        entries.push(entry);
    }

    Ok(entries)
}

/// Take the index lock and refresh its stat cache. Per-path failures come
/// back as warnings.
fn refresh_index(
    repo: &RepositoryState<'_>,
    options: &StatusOptions,
) -> StatusResult<Vec<StatusWarning>> {
    if !options.refreshes_index() {
        return Ok(Vec::new());
    }
    let Some(mutator) = repo.index_mutator else {
        warn!("index update requested without an index mutator; skipping stat refresh");
        return Ok(Vec::new());
    };

    let lock = mutator.lock().map_err(StatusError::from_resolver)?;
    let failed = mutator
        .refresh_stat_cache(&lock)
        .map_err(StatusError::from_resolver)?;
    drop(lock);

    for path in &failed {
        warn!(path = %path, "index stat refresh failed");
    }
    Ok(failed.into_iter().map(StatusWarning::refresh_failed).collect())
}

fn scoped(mut snapshot: Snapshot, pathspec: &Pathspec) -> Snapshot {
    if !pathspec.is_unrestricted() {
        snapshot.retain(|path, _| pathspec.matches(path));
    }
    snapshot
}
