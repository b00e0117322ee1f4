//! The delta record: one path's change between two snapshots.

use serde::{Deserialize, Serialize};
use wst_types::{FileMode, ObjectId};

use crate::error::{DiffError, DiffResult};

/// How a path changed between two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeltaKind {
    Unmodified,
    Added,
    Deleted,
    Modified,
    Renamed,
    /// The object type changed (e.g. regular file to symlink).
    TypeChange,
    Copied,
    Ignored,
    /// Present only in the working directory and not tracked by the index.
    Untracked,
    /// The index records an unresolved merge conflict for this path.
    Conflicted,
}

impl DeltaKind {
    /// Kinds with no old side.
    pub fn is_addition(&self) -> bool {
        matches!(self, Self::Added | Self::Untracked | Self::Ignored)
    }

    /// Kinds that carry a similarity score.
    pub fn has_similarity(&self) -> bool {
        matches!(self, Self::Renamed | Self::Copied)
    }
}

/// One side of a delta: where the content lived and what it was.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaSide {
    pub path: String,
    /// Content id, null when the content is unknown.
    pub id: ObjectId,
    pub mode: FileMode,
}

impl DeltaSide {
    pub fn new(path: impl Into<String>, id: ObjectId, mode: FileMode) -> Self {
        Self {
            path: path.into(),
            id,
            mode,
        }
    }
}

/// An immutable description of one path's change.
///
/// Constructors enforce the path invariants: additions have no old side,
/// deletions have no new side, every other kind has both. Only renames and
/// copies carry a similarity score, in `0..=100`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaRecord {
    kind: DeltaKind,
    old: Option<DeltaSide>,
    new: Option<DeltaSide>,
    similarity: Option<u8>,
}

impl DeltaRecord {
    /// A path that appears only on the new side.
    pub fn added(kind: DeltaKind, new: DeltaSide) -> DiffResult<Self> {
        if !kind.is_addition() && kind != DeltaKind::Conflicted {
            return Err(DiffError::InvalidRecord(format!(
                "{kind:?} delta for {} needs an old side",
                new.path
            )));
        }
        Self::checked(kind, None, Some(new), None)
    }

    /// A path that appears only on the old side.
    pub fn deleted(kind: DeltaKind, old: DeltaSide) -> DiffResult<Self> {
        if !matches!(kind, DeltaKind::Deleted | DeltaKind::Conflicted) {
            return Err(DiffError::InvalidRecord(format!(
                "{kind:?} delta for {} needs a new side",
                old.path
            )));
        }
        Self::checked(kind, Some(old), None, None)
    }

    /// A path present on both sides (unmodified, modified, typechange or
    /// conflicted).
    pub fn changed(kind: DeltaKind, old: DeltaSide, new: DeltaSide) -> DiffResult<Self> {
        if kind.is_addition() || kind.has_similarity() || kind == DeltaKind::Deleted {
            return Err(DiffError::InvalidRecord(format!(
                "{kind:?} is not an in-place change"
            )));
        }
        Self::checked(kind, Some(old), Some(new), None)
    }

    /// A rename or copy from `old` to `new` with the given similarity.
    pub fn renamed(
        kind: DeltaKind,
        old: DeltaSide,
        new: DeltaSide,
        similarity: u8,
    ) -> DiffResult<Self> {
        if !kind.has_similarity() {
            return Err(DiffError::InvalidRecord(format!(
                "{kind:?} does not carry a similarity score"
            )));
        }
        Self::checked(kind, Some(old), Some(new), Some(similarity))
    }

    fn checked(
        kind: DeltaKind,
        old: Option<DeltaSide>,
        new: Option<DeltaSide>,
        similarity: Option<u8>,
    ) -> DiffResult<Self> {
        let empty = |side: &Option<DeltaSide>| side.as_ref().is_some_and(|s| s.path.is_empty());
        if empty(&old) || empty(&new) {
            return Err(DiffError::InvalidRecord(format!(
                "{kind:?} delta with an empty path"
            )));
        }
        if similarity.is_some_and(|s| s > 100) {
            return Err(DiffError::InvalidRecord(format!(
                "similarity {} out of range",
                similarity.unwrap_or_default()
            )));
        }
        Ok(Self {
            kind,
            old,
            new,
            similarity,
        })
    }

    pub fn kind(&self) -> DeltaKind {
        self.kind
    }

    /// Old path, empty for additions.
    pub fn old_path(&self) -> &str {
        self.old.as_ref().map_or("", |s| s.path.as_str())
    }

    /// New path, empty for deletions.
    pub fn new_path(&self) -> &str {
        self.new.as_ref().map_or("", |s| s.path.as_str())
    }

    pub fn old_id(&self) -> ObjectId {
        self.old.as_ref().map_or_else(ObjectId::null, |s| s.id)
    }

    pub fn new_id(&self) -> ObjectId {
        self.new.as_ref().map_or_else(ObjectId::null, |s| s.id)
    }

    pub fn old_mode(&self) -> Option<FileMode> {
        self.old.as_ref().map(|s| s.mode)
    }

    pub fn new_mode(&self) -> Option<FileMode> {
        self.new.as_ref().map(|s| s.mode)
    }

    pub fn old_side(&self) -> Option<&DeltaSide> {
        self.old.as_ref()
    }

    pub fn new_side(&self) -> Option<&DeltaSide> {
        self.new.as_ref()
    }

    /// Similarity score for renames and copies.
    pub fn similarity(&self) -> Option<u8> {
        self.similarity
    }

    /// The path this delta is reported under: the new path, or the old path
    /// for deletions.
    pub fn key(&self) -> &str {
        match &self.new {
            Some(side) => &side.path,
            None => self.old_path(),
        }
    }

    /// Returns `true` if either side is a submodule link.
    pub fn touches_submodule(&self) -> bool {
        self.old_mode().is_some_and(|m| m.is_submodule())
            || self.new_mode().is_some_and(|m| m.is_submodule())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side(path: &str, content: &[u8]) -> DeltaSide {
        DeltaSide::new(path, ObjectId::from_bytes(content), FileMode::Regular)
    }

    #[test]
    fn added_has_empty_old_path() {
        let d = DeltaRecord::added(DeltaKind::Added, side("a.txt", b"a")).unwrap();
        assert_eq!(d.old_path(), "");
        assert_eq!(d.new_path(), "a.txt");
        assert!(d.old_id().is_null());
        assert_eq!(d.old_mode(), None);
        assert_eq!(d.key(), "a.txt");
    }

    #[test]
    fn deleted_is_keyed_by_old_path() {
        let d = DeltaRecord::deleted(DeltaKind::Deleted, side("gone.txt", b"g")).unwrap();
        assert_eq!(d.new_path(), "");
        assert_eq!(d.key(), "gone.txt");
        assert!(d.new_id().is_null());
    }

    #[test]
    fn rename_keeps_both_paths_and_score() {
        let d = DeltaRecord::renamed(
            DeltaKind::Renamed,
            side("a.txt", b"x"),
            side("b.txt", b"x"),
            100,
        )
        .unwrap();
        assert_eq!(d.old_path(), "a.txt");
        assert_eq!(d.new_path(), "b.txt");
        assert_eq!(d.key(), "b.txt");
        assert_eq!(d.similarity(), Some(100));
    }

    #[test]
    fn invariants_are_enforced() {
        assert!(DeltaRecord::added(DeltaKind::Modified, side("a", b"a")).is_err());
        assert!(DeltaRecord::deleted(DeltaKind::Added, side("a", b"a")).is_err());
        assert!(DeltaRecord::changed(DeltaKind::Renamed, side("a", b"a"), side("a", b"b")).is_err());
        assert!(DeltaRecord::renamed(DeltaKind::Modified, side("a", b"a"), side("b", b"a"), 90).is_err());
        assert!(DeltaRecord::renamed(DeltaKind::Renamed, side("a", b"a"), side("b", b"a"), 101).is_err());
        assert!(DeltaRecord::added(DeltaKind::Added, side("", b"a")).is_err());
    }

    #[test]
    fn only_renames_and_copies_carry_similarity() {
        let d = DeltaRecord::changed(DeltaKind::Modified, side("a", b"1"), side("a", b"2")).unwrap();
        assert_eq!(d.similarity(), None);
        assert!(DeltaKind::Copied.has_similarity());
        assert!(!DeltaKind::TypeChange.has_similarity());
    }

    #[test]
    fn submodule_detection_checks_both_sides() {
        let old = DeltaSide::new("vendor/lib", ObjectId::from_bytes(b"c1"), FileMode::Submodule);
        let new = DeltaSide::new("vendor/lib", ObjectId::from_bytes(b"c2"), FileMode::Submodule);
        let d = DeltaRecord::changed(DeltaKind::Modified, old, new).unwrap();
        assert!(d.touches_submodule());
        assert!(!DeltaRecord::added(DeltaKind::Added, side("a", b"a")).unwrap().touches_submodule());
    }
}
