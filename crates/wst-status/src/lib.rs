//! Working-tree status: how every path differs between the HEAD commit,
//! the staging index and the working directory.
//!
//! A status run diffs HEAD against the index and the index against the
//! workdir, optionally detects renames on either side, joins both delta
//! streams by path and reports one [`StatusEntry`] per path in a sorted
//! [`StatusList`].
//!
//! # Key Types
//!
//! - [`StatusOptions`] / [`StatusOptFlags`] / [`StatusShow`] -- what to compute
//! - [`RepositoryState`] -- the collaborators a run reads from
//! - [`StatusList`] / [`StatusEntry`] -- the result
//! - [`Status`] -- per-path change flags
//!
//! # Entry points
//!
//! - [`compute_status`] -- the full list
//! - [`status_foreach`] -- callback enumeration with early stop
//! - [`status_of`] -- one file path, without renames or collapsing

pub mod engine;
pub mod entry;
pub mod error;
pub mod list;
pub mod options;
pub mod pathspec;
pub mod repository;
pub mod single;
pub mod status;

mod merge;
mod rename;
mod untracked;

pub use engine::{compute_status, status_foreach, ForeachOutcome};
pub use entry::{StatusEntry, StatusWarning};
pub use error::{StatusError, StatusResult};
pub use list::StatusList;
pub use options::{StatusOptFlags, StatusOptions, StatusShow};
pub use pathspec::Pathspec;
pub use repository::RepositoryState;
pub use single::status_of;
pub use status::Status;
