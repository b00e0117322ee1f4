//! Foundation types for worktree status computation.
//!
//! Every other `wst` crate depends on `wst-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content identifier (BLAKE3 hash)
//! - [`FileMode`] -- Mode recorded for a path (regular, executable, symlink, ...)
//! - [`PathOrder`] -- Case-sensitive or case-insensitive path ordering

pub mod mode;
pub mod object;
pub mod path;

pub use mode::FileMode;
pub use object::ObjectId;
pub use path::{dir_prefixes, is_within, PathOrder};
