//! Ordered path → entry mappings for HEAD, the index, and the workdir.

use std::collections::BTreeMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use wst_types::{is_within, FileMode, ObjectId, PathOrder};

/// Which of the three resolved states a snapshot describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotSide {
    /// The tree of the current HEAD commit.
    Head,
    /// The staging index.
    Index,
    /// The files on disk.
    Workdir,
}

/// Cached filesystem metadata used for quick dirty checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: SystemTime,
}

impl FileStat {
    pub fn new(size: u64, mtime: SystemTime) -> Self {
        Self { size, mtime }
    }
}

/// One path's record inside a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Content id. `None` when the workdir resolver could not hash the file.
    pub object_id: Option<ObjectId>,
    /// File mode.
    pub mode: FileMode,
    /// Stat data. HEAD entries never carry stat.
    pub stat: Option<FileStat>,
    /// Whether the index records an unresolved merge conflict here.
    pub conflicted: bool,
}

impl SnapshotEntry {
    /// An entry with known content and no stat (HEAD tree entries).
    pub fn new(object_id: ObjectId, mode: FileMode) -> Self {
        Self {
            object_id: Some(object_id),
            mode,
            stat: None,
            conflicted: false,
        }
    }

    /// An entry with known content and stat (index and workdir entries).
    pub fn with_stat(object_id: ObjectId, mode: FileMode, stat: FileStat) -> Self {
        Self {
            stat: Some(stat),
            ..Self::new(object_id, mode)
        }
    }

    /// A workdir entry whose content could not be hashed.
    pub fn unhashed(mode: FileMode, stat: FileStat) -> Self {
        Self {
            object_id: None,
            mode,
            stat: Some(stat),
            conflicted: false,
        }
    }

    /// A submodule checked out in the workdir. Its commit is not read, so
    /// the entry has neither content id nor stat.
    pub fn submodule_checkout() -> Self {
        Self {
            object_id: None,
            mode: FileMode::Submodule,
            stat: None,
            conflicted: false,
        }
    }

    /// Mark this entry as conflicted.
    pub fn conflicted(mut self) -> Self {
        self.conflicted = true;
        self
    }

    /// The content id, or the null id when unknown.
    pub fn id_or_null(&self) -> ObjectId {
        self.object_id.unwrap_or_else(ObjectId::null)
    }
}

/// An ordered mapping from repository-relative path to entry.
///
/// Entries are stored keyed by byte order; [`Snapshot::ordered`] yields them
/// in any [`PathOrder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    side: SnapshotSide,
    entries: BTreeMap<String, SnapshotEntry>,
}

impl Snapshot {
    /// Create an empty snapshot for the given side.
    pub fn new(side: SnapshotSide) -> Self {
        Self {
            side,
            entries: BTreeMap::new(),
        }
    }

    /// Build a snapshot from `(path, entry)` pairs.
    pub fn from_entries<I, P>(side: SnapshotSide, entries: I) -> Self
    where
        I: IntoIterator<Item = (P, SnapshotEntry)>,
        P: Into<String>,
    {
        Self {
            side,
            entries: entries.into_iter().map(|(p, e)| (p.into(), e)).collect(),
        }
    }

    pub fn side(&self) -> SnapshotSide {
        self.side
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&SnapshotEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Insert or replace an entry. Returns the previous entry, if any.
    pub fn insert(&mut self, path: impl Into<String>, entry: SnapshotEntry) -> Option<SnapshotEntry> {
        self.entries.insert(path.into(), entry)
    }

    pub fn remove(&mut self, path: &str) -> Option<SnapshotEntry> {
        self.entries.remove(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut SnapshotEntry> {
        self.entries.get_mut(path)
    }

    /// Keep only the paths accepted by `keep`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &SnapshotEntry) -> bool,
    {
        self.entries.retain(|path, entry| keep(path, entry));
    }

    /// Iterate in byte order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SnapshotEntry)> {
        self.entries.iter().map(|(p, e)| (p.as_str(), e))
    }

    /// All entries sorted per `order`.
    pub fn ordered(&self, order: PathOrder) -> Vec<(&str, &SnapshotEntry)> {
        let mut items: Vec<_> = self.iter().collect();
        if order != PathOrder::CaseSensitive {
            order.sort_by_path(&mut items, |(p, _)| *p);
        }
        items
    }

    /// Returns `true` if any entry lies inside directory `dir` (with
    /// trailing `/`).
    pub fn has_path_within(&self, dir: &str) -> bool {
        self.entries
            .range::<str, _>((std::ops::Bound::Excluded(dir), std::ops::Bound::Unbounded))
            .next()
            .is_some_and(|(path, _)| is_within(path, dir))
    }
}
