//! Placement of untracked workdir files: ignore filtering and directory
//! collapsing.

use std::collections::HashMap;

use wst_delta::{DeltaKind, DeltaRecord, DeltaSide, DiffResult};
use wst_snapshot::{IgnoreEvaluator, Snapshot};
use wst_types::{dir_prefixes, FileMode, ObjectId};

/// What to report for one untracked file.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Not reported.
    Hidden,
    /// Reported as its own entry carrying this delta.
    File(DeltaRecord),
    /// Folded into a directory entry (`dir/`) carrying this delta.
    Directory(DeltaRecord),
}

/// Decides how untracked files are reported.
pub(crate) struct UntrackedPolicy<'a> {
    ignores: &'a dyn IgnoreEvaluator,
    /// The full index, independent of pathspec, so tracked content outside
    /// the pathspec still blocks collapsing.
    index: &'a Snapshot,
    pub include_untracked: bool,
    pub include_ignored: bool,
    pub recurse_untracked: bool,
    pub recurse_ignored: bool,
    dir_cache: HashMap<String, bool>,
}

impl<'a> UntrackedPolicy<'a> {
    pub fn new(ignores: &'a dyn IgnoreEvaluator, index: &'a Snapshot) -> Self {
        Self {
            ignores,
            index,
            include_untracked: false,
            include_ignored: false,
            recurse_untracked: false,
            recurse_ignored: false,
            dir_cache: HashMap::new(),
        }
    }

    fn dir_ignored(&mut self, dir: &str) -> bool {
        if let Some(&hit) = self.dir_cache.get(dir) {
            return hit;
        }
        let hit = self.ignores.is_ignored(dir);
        self.dir_cache.insert(dir.to_string(), hit);
        hit
    }

    /// The shallowest ignored ancestor directory of `path`, if any.
    fn ignored_ancestor(&mut self, path: &str) -> Option<String> {
        dir_prefixes(path)
            .find(|dir| self.dir_ignored(dir))
            .map(str::to_string)
    }

    /// Whether `path` is ignored, directly or through a parent directory.
    pub fn is_ignored(&mut self, path: &str) -> bool {
        self.ignored_ancestor(path).is_some() || self.ignores.is_ignored(path)
    }

    /// Place an untracked delta. `tracked_elsewhere` is set when HEAD→index
    /// also reports this path, which rules out collapsing.
    pub fn place(&mut self, delta: DeltaRecord, tracked_elsewhere: bool) -> DiffResult<Placement> {
        let path = delta.key().to_string();
        let ancestor = self.ignored_ancestor(&path);
        let ignored = ancestor.is_some() || self.ignores.is_ignored(&path);

        if ignored {
            if !self.include_ignored {
                return Ok(Placement::Hidden);
            }
            if !self.recurse_ignored && !tracked_elsewhere {
                if let Some(ancestor) = ancestor {
                    // Below an ignored directory every level is ignored too.
                    let collapse = dir_prefixes(&path)
                        .skip_while(|d| *d != ancestor)
                        .find(|d| !self.index.has_path_within(d));
                    if let Some(dir) = collapse {
                        return Ok(Placement::Directory(directory_delta(DeltaKind::Ignored, dir)?));
                    }
                }
            }
            let side = delta.new_side().cloned().ok_or_else(|| {
                wst_delta::DiffError::InvalidRecord(format!("untracked delta without new side: {path}"))
            })?;
            return Ok(Placement::File(DeltaRecord::added(DeltaKind::Ignored, side)?));
        }

        if !self.include_untracked {
            return Ok(Placement::Hidden);
        }
        if !self.recurse_untracked && !tracked_elsewhere {
            if let Some(dir) = dir_prefixes(&path).find(|d| !self.index.has_path_within(d)) {
                return Ok(Placement::Directory(directory_delta(DeltaKind::Untracked, dir)?));
            }
        }
        Ok(Placement::File(delta))
    }
}

/// Uncached form of [`UntrackedPolicy::is_ignored`] for one-off lookups.
pub(crate) fn path_is_ignored(ignores: &dyn IgnoreEvaluator, path: &str) -> bool {
    dir_prefixes(path).any(|dir| ignores.is_ignored(dir)) || ignores.is_ignored(path)
}

fn directory_delta(kind: DeltaKind, dir: &str) -> DiffResult<DeltaRecord> {
    DeltaRecord::added(kind, DeltaSide::new(dir, ObjectId::null(), FileMode::Directory))
}
