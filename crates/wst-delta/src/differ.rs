//! Snapshot differencing: compare two snapshots path by path and yield a
//! sorted stream of delta records.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::vec;

use tracing::debug;
use wst_snapshot::{Snapshot, SnapshotEntry, SnapshotSide};
use wst_types::{FileMode, PathOrder};

use crate::delta::{DeltaKind, DeltaRecord, DeltaSide};
use crate::error::DiffResult;

/// A lazy, single-pass stream of deltas sorted by [`DeltaRecord::key`].
pub type DeltaStream<'a> = Box<dyn Iterator<Item = DiffResult<DeltaRecord>> + 'a>;

/// Options controlling one comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Order of the produced stream.
    pub order: PathOrder,
    /// Emit [`DeltaKind::Unmodified`] deltas for unchanged paths.
    pub include_unmodified: bool,
}

/// Produces delta streams between two snapshots.
pub trait Differencer: Send + Sync {
    /// Compare `old` with `new`. The stream must be sorted by key per
    /// `options.order` and contain each key at most once.
    fn diff<'a>(
        &'a self,
        old: &'a Snapshot,
        new: &'a Snapshot,
        options: &DiffOptions,
    ) -> DeltaStream<'a>;
}

/// The default differencer: an ordered merge-join over both snapshots.
///
/// When the new side is the working directory, paths missing from the old
/// side are reported as [`DeltaKind::Untracked`]; otherwise as
/// [`DeltaKind::Added`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SnapshotDiffer;

impl Differencer for SnapshotDiffer {
    fn diff<'a>(
        &'a self,
        old: &'a Snapshot,
        new: &'a Snapshot,
        options: &DiffOptions,
    ) -> DeltaStream<'a> {
        debug!(
            old_side = ?old.side(),
            new_side = ?new.side(),
            old_len = old.len(),
            new_len = new.len(),
            "diffing snapshots"
        );
        Box::new(MergeJoin {
            old: old.ordered(options.order).into_iter().peekable(),
            new: new.ordered(options.order).into_iter().peekable(),
            new_side: new.side(),
            options: *options,
        })
    }
}

type Cursor<'a> = Peekable<vec::IntoIter<(&'a str, &'a SnapshotEntry)>>;

struct MergeJoin<'a> {
    old: Cursor<'a>,
    new: Cursor<'a>,
    new_side: SnapshotSide,
    options: DiffOptions,
}

impl Iterator for MergeJoin<'_> {
    type Item = DiffResult<DeltaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let step = match (self.old.peek(), self.new.peek()) {
                (None, None) => return None,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some((op, _)), Some((np, _))) => self.options.order.compare(op, np),
            };
            let (path, old, new) = match step {
                Ordering::Less => {
                    let (p, e) = self.old.next()?;
                    (p, Some(e), None)
                }
                Ordering::Greater => {
                    let (p, e) = self.new.next()?;
                    (p, None, Some(e))
                }
                Ordering::Equal => {
                    let (p, o) = self.old.next()?;
                    let (_, n) = self.new.next()?;
                    (p, Some(o), Some(n))
                }
            };

            match classify(path, old, new, self.new_side) {
                Ok(Some(delta))
                    if delta.kind() == DeltaKind::Unmodified
                        && !self.options.include_unmodified =>
                {
                    continue
                }
                Ok(Some(delta)) => return Some(Ok(delta)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Classify one path given its entries on both sides.
///
/// Returns `Ok(None)` when the path is absent from both. Unknown workdir
/// content (no id) is compared by cached stat instead, except for a
/// checked-out submodule, which matches any recorded submodule commit.
pub fn classify(
    path: &str,
    old: Option<&SnapshotEntry>,
    new: Option<&SnapshotEntry>,
    new_side: SnapshotSide,
) -> DiffResult<Option<DeltaRecord>> {
    let side = |e: &SnapshotEntry| DeltaSide::new(path, e.id_or_null(), e.mode);
    let conflicted = old.is_some_and(|e| e.conflicted) || new.is_some_and(|e| e.conflicted);

    let delta = match (old, new) {
        (None, None) => return Ok(None),
        (None, Some(n)) => {
            let kind = if conflicted {
                DeltaKind::Conflicted
            } else if new_side == SnapshotSide::Workdir {
                DeltaKind::Untracked
            } else {
                DeltaKind::Added
            };
            DeltaRecord::added(kind, side(n))?
        }
        (Some(o), None) => {
            let kind = if conflicted {
                DeltaKind::Conflicted
            } else {
                DeltaKind::Deleted
            };
            DeltaRecord::deleted(kind, side(o))?
        }
        (Some(o), Some(n)) => {
            let kind = if conflicted {
                DeltaKind::Conflicted
            } else if o.mode.is_type_change(n.mode) {
                DeltaKind::TypeChange
            } else if o.mode != n.mode || !same_content(o, n) {
                DeltaKind::Modified
            } else {
                DeltaKind::Unmodified
            };
            DeltaRecord::changed(kind, side(o), side(n))?
        }
    };
    Ok(Some(delta))
}

fn same_content(old: &SnapshotEntry, new: &SnapshotEntry) -> bool {
    match (old.object_id, new.object_id) {
        (Some(a), Some(b)) => a == b,
        // Checked-out submodule: its commit is not visible from the workdir.
        (Some(_), None) if old.mode == FileMode::Submodule && new.mode == FileMode::Submodule => true,
        // Unhashed workdir file: trust matching stat data.
        _ => old.stat.is_some() && old.stat == new.stat,
    }
}
