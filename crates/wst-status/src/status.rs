//! Status flags: the per-path change classification.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use wst_delta::DeltaKind;

bitflags! {
    /// How a path differs between HEAD, the index and the workdir.
    ///
    /// An entry may carry several flags at once, e.g. a file staged as new
    /// and then edited again is `INDEX_NEW | WT_MODIFIED`. The empty set
    /// is [`Status::CURRENT`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Status: u32 {
        const INDEX_NEW = 1 << 0;
        const INDEX_MODIFIED = 1 << 1;
        const INDEX_DELETED = 1 << 2;
        const INDEX_RENAMED = 1 << 3;
        const INDEX_TYPECHANGE = 1 << 4;

        const WT_NEW = 1 << 7;
        const WT_MODIFIED = 1 << 8;
        const WT_DELETED = 1 << 9;
        const WT_TYPECHANGE = 1 << 10;
        const WT_RENAMED = 1 << 11;

        const IGNORED = 1 << 14;
        const CONFLICTED = 1 << 15;
    }
}

impl Status {
    /// No change anywhere.
    pub const CURRENT: Self = Self::empty();

    const INDEX_MASK: Self = Self::INDEX_NEW
        .union(Self::INDEX_MODIFIED)
        .union(Self::INDEX_DELETED)
        .union(Self::INDEX_RENAMED)
        .union(Self::INDEX_TYPECHANGE);

    const WT_MASK: Self = Self::WT_NEW
        .union(Self::WT_MODIFIED)
        .union(Self::WT_DELETED)
        .union(Self::WT_TYPECHANGE)
        .union(Self::WT_RENAMED);

    /// Flags implied by a HEAD→index delta.
    pub fn from_head_to_index(kind: DeltaKind) -> Self {
        match kind {
            DeltaKind::Added | DeltaKind::Copied => Self::INDEX_NEW,
            DeltaKind::Deleted => Self::INDEX_DELETED,
            DeltaKind::Modified => Self::INDEX_MODIFIED,
            DeltaKind::Renamed => Self::INDEX_RENAMED,
            DeltaKind::TypeChange => Self::INDEX_TYPECHANGE,
            DeltaKind::Conflicted => Self::CONFLICTED,
            DeltaKind::Ignored => Self::IGNORED,
            DeltaKind::Unmodified | DeltaKind::Untracked => Self::CURRENT,
        }
    }

    /// Flags implied by an index→workdir delta.
    pub fn from_index_to_workdir(kind: DeltaKind) -> Self {
        match kind {
            DeltaKind::Added | DeltaKind::Untracked | DeltaKind::Copied => Self::WT_NEW,
            DeltaKind::Deleted => Self::WT_DELETED,
            DeltaKind::Modified => Self::WT_MODIFIED,
            DeltaKind::Renamed => Self::WT_RENAMED,
            DeltaKind::TypeChange => Self::WT_TYPECHANGE,
            DeltaKind::Ignored => Self::IGNORED,
            DeltaKind::Conflicted => Self::CONFLICTED,
            DeltaKind::Unmodified => Self::CURRENT,
        }
    }

    pub fn is_current(&self) -> bool {
        self.is_empty()
    }

    /// Any staged change.
    pub fn is_index_change(&self) -> bool {
        self.intersects(Self::INDEX_MASK)
    }

    /// Any unstaged change, including untracked files.
    pub fn is_workdir_change(&self) -> bool {
        self.intersects(Self::WT_MASK)
    }

    /// The two-letter code of `git status --short`: staged column, then
    /// workdir column.
    pub fn short_code(&self) -> String {
        if self.contains(Self::CONFLICTED) {
            return "UU".to_string();
        }
        if self.contains(Self::IGNORED) {
            return "!!".to_string();
        }
        if self.contains(Self::WT_NEW) && !self.is_index_change() {
            return "??".to_string();
        }

        let staged = if self.contains(Self::INDEX_NEW) {
            'A'
        } else if self.contains(Self::INDEX_DELETED) {
            'D'
        } else if self.contains(Self::INDEX_RENAMED) {
            'R'
        } else if self.contains(Self::INDEX_TYPECHANGE) {
            'T'
        } else if self.contains(Self::INDEX_MODIFIED) {
            'M'
        } else {
            ' '
        };
        let unstaged = if self.contains(Self::WT_DELETED) {
            'D'
        } else if self.contains(Self::WT_RENAMED) {
            'R'
        } else if self.contains(Self::WT_TYPECHANGE) {
            'T'
        } else if self.contains(Self::WT_MODIFIED) {
            'M'
        } else {
            ' '
        };
        [staged, unstaged].iter().collect()
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::CURRENT
    }
}
