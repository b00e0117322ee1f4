//! Point-in-time snapshots of the three repository states compared by
//! status: the HEAD tree, the staging index and the working directory.
//!
//! # Collaborators
//!
//! The status engine never touches storage directly. It consumes the traits
//! in [`traits`]:
//!
//! - [`SnapshotResolver`] -- resolves HEAD, index and workdir snapshots
//! - [`IgnoreEvaluator`] -- decides whether an untracked path is ignored
//! - [`ContentSource`] -- reads blob content for rename similarity
//! - [`IndexMutator`] -- writes refreshed stat data back under [`IndexLock`]
//!
//! # Backends
//!
//! - [`InMemoryRepository`] -- `RwLock`-guarded state for tests and embedding
//! - [`FsWorkdir`] -- walks a real directory, hashing file content
//! - [`GitignoreEvaluator`] -- nested `.gitignore` files via the `ignore` crate

pub mod error;
pub mod ignore_rules;
pub mod lock;
pub mod memory;
pub mod snapshot;
pub mod traits;
pub mod workdir;

pub use error::{SnapshotError, SnapshotResult};
pub use ignore_rules::{GitignoreEvaluator, NoIgnores, IGNORE_FILE};
pub use lock::IndexLock;
pub use memory::InMemoryRepository;
pub use snapshot::{FileStat, Snapshot, SnapshotEntry, SnapshotSide};
pub use traits::{
    AllPaths, ContentSource, ExactPath, IgnoreEvaluator, IndexMutator, PathFilter,
    SnapshotResolver,
};
pub use workdir::{FsWorkdir, WorkdirSource, DEFAULT_METADATA_DIR};
