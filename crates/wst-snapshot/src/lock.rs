//! Exclusive index lock.
//!
//! On disk the lock is a `<index>.lock` file created with `O_EXCL`
//! semantics; its presence means another writer owns the index. In-memory
//! indexes use a shared flag instead. Either way the lock is released when
//! the [`IndexLock`] is dropped.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{SnapshotError, SnapshotResult};

enum LockKind {
    File(PathBuf),
    Flag(Arc<AtomicBool>),
}

/// RAII guard for the exclusive index lock.
pub struct IndexLock {
    kind: LockKind,
}

impl IndexLock {
    /// Lock the index file at `index_path` by creating `<index_path>.lock`.
    pub fn acquire_file(index_path: &Path) -> SnapshotResult<Self> {
        let lock_path = lock_path_for(index_path);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(_) => {
                debug!(path = %lock_path.display(), "index lock acquired");
                Ok(Self {
                    kind: LockKind::File(lock_path),
                })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(SnapshotError::IndexLocked(lock_path))
            }
            Err(e) => Err(SnapshotError::Io(e)),
        }
    }

    /// Lock an in-memory index guarded by `flag`.
    pub fn acquire_flag(flag: &Arc<AtomicBool>, name: &str) -> SnapshotResult<Self> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SnapshotError::IndexLocked(PathBuf::from(name)));
        }
        Ok(Self {
            kind: LockKind::Flag(Arc::clone(flag)),
        })
    }

    /// The lock file path, for file-backed locks.
    pub fn path(&self) -> Option<&Path> {
        match &self.kind {
            LockKind::File(path) => Some(path),
            LockKind::Flag(_) => None,
        }
    }
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        match &self.kind {
            LockKind::File(path) => {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "failed to release index lock");
                }
            }
            LockKind::Flag(flag) => flag.store(false, Ordering::Release),
        }
    }
}

impl std::fmt::Debug for IndexLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            LockKind::File(path) => f.debug_struct("IndexLock").field("file", path).finish(),
            LockKind::Flag(_) => f.debug_struct("IndexLock").field("file", &"<memory>").finish(),
        }
    }
}

fn lock_path_for(index_path: &Path) -> PathBuf {
    let mut name = index_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}
