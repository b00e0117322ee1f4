//! In-memory repository state for tests and embedding.
//!
//! [`InMemoryRepository`] holds a HEAD tree, an index, a working directory and
//! the blob contents behind them, each behind a `RwLock`. It implements every
//! collaborator trait the status engine consumes.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use tracing::debug;
use wst_types::{FileMode, ObjectId};

use crate::error::{SnapshotError, SnapshotResult};
use crate::lock::IndexLock;
use crate::snapshot::{FileStat, Snapshot, SnapshotEntry, SnapshotSide};
use crate::traits::{ContentSource, IndexMutator, PathFilter, SnapshotResolver};
use crate::workdir::WorkdirSource;

/// An in-memory implementation of every snapshot collaborator.
///
/// Writes to the workdir advance a logical clock so each write gets a
/// distinct mtime, which is what makes stale index stat data observable.
pub struct InMemoryRepository {
    head: RwLock<Snapshot>,
    index: RwLock<Snapshot>,
    workdir: RwLock<Snapshot>,
    blobs: RwLock<HashMap<ObjectId, Vec<u8>>>,
    external_workdir: Option<Arc<dyn WorkdirSource>>,
    index_corruption: RwLock<Option<String>>,
    refresh_failures: RwLock<BTreeSet<String>>,
    index_lock: Arc<AtomicBool>,
    clock: AtomicU64,
}

impl InMemoryRepository {
    /// Create an empty repository: no commit, empty index, empty workdir.
    pub fn new() -> Self {
        Self {
            head: RwLock::new(Snapshot::new(SnapshotSide::Head)),
            index: RwLock::new(Snapshot::new(SnapshotSide::Index)),
            workdir: RwLock::new(Snapshot::new(SnapshotSide::Workdir)),
            blobs: RwLock::new(HashMap::new()),
            external_workdir: None,
            index_corruption: RwLock::new(None),
            refresh_failures: RwLock::new(BTreeSet::new()),
            index_lock: Arc::new(AtomicBool::new(false)),
            clock: AtomicU64::new(1),
        }
    }

    /// Read the working directory from `source` instead of memory.
    pub fn with_workdir_source(mut self, source: Arc<dyn WorkdirSource>) -> Self {
        self.external_workdir = Some(source);
        self
    }

    fn tick(&self) -> SystemTime {
        let t = self.clock.fetch_add(1, Ordering::Relaxed);
        SystemTime::UNIX_EPOCH + Duration::from_secs(t)
    }

    fn store_blob(&self, content: &[u8]) -> ObjectId {
        let id = ObjectId::from_bytes(content);
        self.blobs
            .write()
            .expect("lock poisoned")
            .entry(id)
            .or_insert_with(|| content.to_vec());
        id
    }

    // ---------------------------------------------------------------
    // HEAD
    // ---------------------------------------------------------------

    /// Record `path` in the HEAD tree.
    pub fn set_head_file(&self, path: &str, content: &[u8], mode: FileMode) {
        let id = self.store_blob(content);
        self.head
            .write()
            .expect("lock poisoned")
            .insert(path, SnapshotEntry::new(id, mode));
    }

    // ---------------------------------------------------------------
    // Index
    // ---------------------------------------------------------------

    /// Stage `content` at `path`. Stat data is copied from the workdir when
    /// the workdir holds the same content.
    pub fn stage_file(&self, path: &str, content: &[u8], mode: FileMode) {
        let id = self.store_blob(content);
        let stat = self
            .workdir
            .read()
            .expect("lock poisoned")
            .get(path)
            .filter(|e| e.object_id == Some(id))
            .and_then(|e| e.stat)
            .unwrap_or_else(|| FileStat::new(content.len() as u64, self.tick()));
        self.index
            .write()
            .expect("lock poisoned")
            .insert(path, SnapshotEntry::with_stat(id, mode, stat));
    }

    pub fn unstage_file(&self, path: &str) {
        self.index.write().expect("lock poisoned").remove(path);
    }

    /// Mark an index entry as carrying an unresolved conflict.
    pub fn mark_conflicted(&self, path: &str) -> SnapshotResult<()> {
        let mut index = self.index.write().expect("lock poisoned");
        let entry = index
            .get_mut(path)
            .ok_or_else(|| SnapshotError::InvalidPath(format!("not in index: {path}")))?;
        entry.conflicted = true;
        Ok(())
    }

    /// Make every subsequent index resolution fail as corrupt.
    pub fn corrupt_index(&self, reason: impl Into<String>) {
        *self.index_corruption.write().expect("lock poisoned") = Some(reason.into());
    }

    /// Make the next stat refreshes fail for `path`.
    pub fn fail_refresh_for(&self, path: &str) {
        self.refresh_failures
            .write()
            .expect("lock poisoned")
            .insert(path.to_string());
    }

    // ---------------------------------------------------------------
    // Workdir
    // ---------------------------------------------------------------

    /// Write `content` to `path` in the working directory.
    pub fn write_workdir_file(&self, path: &str, content: &[u8], mode: FileMode) {
        let id = self.store_blob(content);
        let stat = FileStat::new(content.len() as u64, self.tick());
        self.workdir
            .write()
            .expect("lock poisoned")
            .insert(path, SnapshotEntry::with_stat(id, mode, stat));
    }

    /// Bump the mtime of a workdir file without changing its content.
    pub fn touch_workdir_file(&self, path: &str) {
        let now = self.tick();
        if let Some(entry) = self.workdir.write().expect("lock poisoned").get_mut(path) {
            if let Some(stat) = entry.stat.as_mut() {
                stat.mtime = now;
            }
        }
    }

    pub fn remove_workdir_file(&self, path: &str) {
        self.workdir.write().expect("lock poisoned").remove(path);
    }

    // ---------------------------------------------------------------
    // Convenience
    // ---------------------------------------------------------------

    /// Record a clean tracked file: identical in HEAD, index and workdir.
    pub fn commit_file(&self, path: &str, content: &[u8]) {
        self.write_workdir_file(path, content, FileMode::Regular);
        self.stage_file(path, content, FileMode::Regular);
        self.set_head_file(path, content, FileMode::Regular);
    }

    /// Stat data currently cached in the index for `path`.
    pub fn index_stat(&self, path: &str) -> Option<FileStat> {
        self.index
            .read()
            .expect("lock poisoned")
            .get(path)
            .and_then(|e| e.stat)
    }

    fn check_index(&self) -> SnapshotResult<()> {
        match self.index_corruption.read().expect("lock poisoned").as_ref() {
            Some(reason) => Err(SnapshotError::CorruptIndex(reason.clone())),
            None => Ok(()),
        }
    }

    fn workdir_snapshot(&self, filter: &dyn PathFilter) -> SnapshotResult<Snapshot> {
        if let Some(source) = &self.external_workdir {
            return source.list(filter);
        }
        let mut snap = self.workdir.read().expect("lock poisoned").clone();
        snap.retain(|path, _| filter.matches(path));
        Ok(snap)
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotResolver for InMemoryRepository {
    fn resolve_head(&self) -> SnapshotResult<Snapshot> {
        Ok(self.head.read().expect("lock poisoned").clone())
    }

    fn resolve_index(&self) -> SnapshotResult<Snapshot> {
        self.check_index()?;
        Ok(self.index.read().expect("lock poisoned").clone())
    }

    fn resolve_workdir(&self, filter: &dyn PathFilter) -> SnapshotResult<Snapshot> {
        self.workdir_snapshot(filter)
    }

    fn head_entry(&self, path: &str) -> SnapshotResult<Option<SnapshotEntry>> {
        Ok(self.head.read().expect("lock poisoned").get(path).cloned())
    }

    fn index_entry(&self, path: &str) -> SnapshotResult<Option<SnapshotEntry>> {
        self.check_index()?;
        Ok(self.index.read().expect("lock poisoned").get(path).cloned())
    }

    fn workdir_entry(&self, path: &str) -> SnapshotResult<Option<SnapshotEntry>> {
        if let Some(source) = &self.external_workdir {
            return source.entry(path);
        }
        Ok(self.workdir.read().expect("lock poisoned").get(path).cloned())
    }
}

impl ContentSource for InMemoryRepository {
    fn read_blob(&self, id: &ObjectId) -> SnapshotResult<Option<Vec<u8>>> {
        if let Some(data) = self.blobs.read().expect("lock poisoned").get(id) {
            return Ok(Some(data.clone()));
        }
        match &self.external_workdir {
            Some(source) => source.read_content(id),
            None => Ok(None),
        }
    }
}

impl IndexMutator for InMemoryRepository {
    fn lock(&self) -> SnapshotResult<IndexLock> {
        IndexLock::acquire_flag(&self.index_lock, "<memory index>")
    }

    fn refresh_stat_cache(&self, _lock: &IndexLock) -> SnapshotResult<BTreeSet<String>> {
        self.check_index()?;
        let failures = self.refresh_failures.read().expect("lock poisoned").clone();
        let workdir = self.workdir_snapshot(&crate::traits::AllPaths)?;
        let mut index = self.index.write().expect("lock poisoned");

        let mut failed = BTreeSet::new();
        let mut refreshed = 0usize;
        let paths: Vec<String> = index.iter().map(|(p, _)| p.to_string()).collect();
        for path in paths {
            let Some(current) = workdir.get(&path) else {
                continue;
            };
            let Some(entry) = index.get_mut(&path) else {
                continue;
            };
            if entry.object_id != current.object_id || entry.stat == current.stat {
                continue;
            }
            if failures.contains(&path) {
                failed.insert(path);
                continue;
            }
            entry.stat = current.stat;
            refreshed += 1;
        }

        debug!(refreshed, failed = failed.len(), "index stat cache refreshed");
        Ok(failed)
    }
}

impl std::fmt::Debug for InMemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("head", &self.head.read().expect("lock poisoned").len())
            .field("index", &self.index.read().expect("lock poisoned").len())
            .field("workdir", &self.workdir.read().expect("lock poisoned").len())
            .field("blobs", &self.blobs.read().expect("lock poisoned").len())
            .finish()
    }
}
