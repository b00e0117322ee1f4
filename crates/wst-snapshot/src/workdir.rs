//! Filesystem-backed working directory listing.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};
use walkdir::WalkDir;
use wst_types::{FileMode, ObjectId};

use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::{FileStat, Snapshot, SnapshotEntry, SnapshotSide};
use crate::traits::{ContentSource, PathFilter};

/// Default name of the repository metadata directory skipped while walking.
pub const DEFAULT_METADATA_DIR: &str = ".git";

/// Source of workdir listings.
pub trait WorkdirSource: Send + Sync {
    /// List the files accepted by `filter`.
    fn list(&self, filter: &dyn PathFilter) -> SnapshotResult<Snapshot>;

    /// Stat and hash a single file. `Ok(None)` if it does not exist.
    fn entry(&self, path: &str) -> SnapshotResult<Option<SnapshotEntry>>;

    /// Read the content of a file seen during the last listing.
    fn read_content(&self, _id: &ObjectId) -> SnapshotResult<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// Lists files under a root directory, hashing their content.
///
/// Files that cannot be read are still listed with their stat data but no
/// content id; the differencer then falls back to stat comparison.
pub struct FsWorkdir {
    root: PathBuf,
    metadata_dir: String,
    /// Content id → path for files hashed by the last listing.
    seen: RwLock<HashMap<ObjectId, PathBuf>>,
}

impl FsWorkdir {
    /// Open the working directory at `root`.
    pub fn open(root: impl Into<PathBuf>) -> SnapshotResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SnapshotError::WorkdirUnavailable(root));
        }
        Ok(Self {
            root,
            metadata_dir: DEFAULT_METADATA_DIR.to_string(),
            seen: RwLock::new(HashMap::new()),
        })
    }

    /// Use a different metadata directory name.
    pub fn with_metadata_dir(mut self, name: impl Into<String>) -> Self {
        self.metadata_dir = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative_path(&self, path: &Path) -> SnapshotResult<String> {
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| SnapshotError::InvalidPath(path.display().to_string()))?;
        let mut out = String::new();
        for component in relative.components() {
            let part = component
                .as_os_str()
                .to_str()
                .ok_or_else(|| SnapshotError::InvalidPath(relative.display().to_string()))?;
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(part);
        }
        Ok(out)
    }

    /// A directory below the root holding its own metadata directory is a
    /// checked-out submodule.
    fn is_submodule_checkout(&self, dir: &Path) -> bool {
        dir.join(&self.metadata_dir).exists()
    }

    fn read_entry(&self, abs: &Path, metadata: &fs::Metadata) -> SnapshotResult<SnapshotEntry> {
        let stat = FileStat::new(metadata.len(), metadata.modified()?);

        if metadata.file_type().is_symlink() {
            let target = fs::read_link(abs)?;
            let id = ObjectId::from_bytes(target.to_string_lossy().as_bytes());
            return Ok(SnapshotEntry::with_stat(id, FileMode::Symlink, stat));
        }

        let mode = if is_executable(metadata) {
            FileMode::Executable
        } else {
            FileMode::Regular
        };

        match File::open(abs).and_then(ObjectId::from_reader) {
            Ok(id) => {
                self.seen
                    .write()
                    .expect("lock poisoned")
                    .insert(id, abs.to_path_buf());
                Ok(SnapshotEntry::with_stat(id, mode, stat))
            }
            Err(e) => {
                warn!(path = %abs.display(), error = %e, "cannot hash workdir file; using stat only");
                Ok(SnapshotEntry::unhashed(mode, stat))
            }
        }
    }
}

impl WorkdirSource for FsWorkdir {
    fn list(&self, filter: &dyn PathFilter) -> SnapshotResult<Snapshot> {
        let mut snapshot = Snapshot::new(SnapshotSide::Workdir);
        let metadata_dir = self.metadata_dir.as_str();

        let mut walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 {
                    return true;
                }
                if e.file_name() == metadata_dir {
                    return false;
                }
                if e.file_type().is_dir() {
                    return match self.relative_path(e.path()) {
                        Ok(rel) => filter.matches(&rel) || filter.may_contain(&format!("{rel}/")),
                        Err(err) => {
                            warn!(path = %e.path().display(), error = %err, "skipping workdir directory");
                            false
                        }
                    };
                }
                true
            });

        while let Some(entry) = walker.next() {
            let entry = entry?;
            if entry.depth() == 0 {
                continue;
            }
            let path = match self.relative_path(entry.path()) {
                Ok(path) => path,
                Err(err) => {
                    warn!(path = %entry.path().display(), error = %err, "skipping workdir file");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                if self.is_submodule_checkout(entry.path()) {
                    walker.skip_current_dir();
                    if filter.matches(&path) {
                        snapshot.insert(path, SnapshotEntry::submodule_checkout());
                    }
                }
                continue;
            }
            if !filter.matches(&path) {
                continue;
            }
            let metadata = entry.path().symlink_metadata()?;
            let record = self.read_entry(entry.path(), &metadata)?;
            snapshot.insert(path, record);
        }

        debug!(root = %self.root.display(), files = snapshot.len(), "workdir listed");
        Ok(snapshot)
    }

    fn entry(&self, path: &str) -> SnapshotResult<Option<SnapshotEntry>> {
        if path.is_empty() || path.split('/').any(|c| c == self.metadata_dir || c == "..") {
            return Ok(None);
        }
        let abs = self.root.join(path);
        let metadata = match abs.symlink_metadata() {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if metadata.is_dir() {
            return Ok(self
                .is_submodule_checkout(&abs)
                .then(SnapshotEntry::submodule_checkout));
        }
        self.read_entry(&abs, &metadata).map(Some)
    }

    fn read_content(&self, id: &ObjectId) -> SnapshotResult<Option<Vec<u8>>> {
        let path = self.seen.read().expect("lock poisoned").get(id).cloned();
        match path {
            Some(path) => match fs::read(&path) {
                Ok(data) if ObjectId::from_bytes(&data) == *id => Ok(Some(data)),
                Ok(_) => Ok(None),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            },
            None => Ok(None),
        }
    }
}

impl ContentSource for FsWorkdir {
    fn read_blob(&self, id: &ObjectId) -> SnapshotResult<Option<Vec<u8>>> {
        self.read_content(id)
    }
}

impl std::fmt::Debug for FsWorkdir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsWorkdir")
            .field("root", &self.root)
            .field("metadata_dir", &self.metadata_dir)
            .finish()
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{AllPaths, ExactPath};

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn open_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsWorkdir::open(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, SnapshotError::WorkdirUnavailable(_)));
    }

    #[test]
    fn lists_files_and_skips_metadata_dir() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "alpha");
        write(dir.path(), "src/lib.rs", "fn main() {}");
        write(dir.path(), ".git/HEAD", "ref: refs/heads/main");

        let workdir = FsWorkdir::open(dir.path()).unwrap();
        let snap = workdir.list(&AllPaths).unwrap();

        assert_eq!(snap.side(), SnapshotSide::Workdir);
        let paths: Vec<_> = snap.iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(paths, vec!["a.txt", "src/lib.rs"]);

        let entry = snap.get("a.txt").unwrap();
        assert_eq!(entry.object_id, Some(ObjectId::from_bytes(b"alpha")));
        assert_eq!(entry.stat.unwrap().size, 5);
    }

    #[test]
    fn filter_prunes_directories() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/lib.rs", "lib");
        write(dir.path(), "docs/guide.md", "guide");

        let workdir = FsWorkdir::open(dir.path()).unwrap();
        let snap = workdir.list(&ExactPath("src/lib.rs")).unwrap();
        assert_eq!(snap.len(), 1);
        assert!(snap.contains("src/lib.rs"));
    }

    #[test]
    fn single_entry_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes/todo.txt", "buy milk");

        let workdir = FsWorkdir::open(dir.path()).unwrap();
        let entry = workdir.entry("notes/todo.txt").unwrap().unwrap();
        assert_eq!(entry.mode, FileMode::Regular);
        assert!(workdir.entry("notes/missing.txt").unwrap().is_none());
        assert!(workdir.entry("notes").unwrap().is_none());
        assert!(workdir.entry(".git/config").unwrap().is_none());
    }

    #[test]
    fn content_of_listed_files_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "hello");

        let workdir = FsWorkdir::open(dir.path()).unwrap();
        workdir.list(&AllPaths).unwrap();
        let id = ObjectId::from_bytes(b"hello");
        assert_eq!(workdir.read_blob(&id).unwrap(), Some(b"hello".to_vec()));
        assert_eq!(workdir.read_blob(&ObjectId::from_bytes(b"other")).unwrap(), None);

        // Content changed after listing: the stale id no longer resolves.
        write(dir.path(), "a.txt", "changed");
        assert_eq!(workdir.read_blob(&id).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn detects_executables_and_symlinks() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "run.sh", "#!/bin/sh\n");
        fs::set_permissions(dir.path().join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
        std::os::unix::fs::symlink("run.sh", dir.path().join("link")).unwrap();

        let workdir = FsWorkdir::open(dir.path()).unwrap();
        let snap = workdir.list(&AllPaths).unwrap();
        assert_eq!(snap.get("run.sh").unwrap().mode, FileMode::Executable);
        let link = snap.get("link").unwrap();
        assert_eq!(link.mode, FileMode::Symlink);
        assert_eq!(link.object_id, Some(ObjectId::from_bytes(b"run.sh")));
    }

    #[test]
    fn checked_out_submodule_is_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "vendor/lib/.git/HEAD", "0123abcd");
        write(dir.path(), "vendor/lib/x.c", "int x;");
        write(dir.path(), "vendor/notes.txt", "notes");

        let workdir = FsWorkdir::open(dir.path()).unwrap();
        let snap = workdir.list(&AllPaths).unwrap();
        let paths: Vec<_> = snap.iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(paths, vec!["vendor/lib", "vendor/notes.txt"]);
        assert_eq!(snap.get("vendor/lib"), Some(&SnapshotEntry::submodule_checkout()));

        assert_eq!(
            workdir.entry("vendor/lib").unwrap(),
            Some(SnapshotEntry::submodule_checkout())
        );
        assert!(workdir.entry("vendor").unwrap().is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "kept.txt", "kept");
        fs::write(dir.path().join(OsStr::from_bytes(b"bad\xffname")), "bad").unwrap();
        fs::create_dir(dir.path().join(OsStr::from_bytes(b"dir\xfe"))).unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"dir\xfe/inner.txt")), "inner").unwrap();

        let workdir = FsWorkdir::open(dir.path()).unwrap();
        let snap = workdir.list(&AllPaths).unwrap();
        let paths: Vec<_> = snap.iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(paths, vec!["kept.txt"]);
    }
}
