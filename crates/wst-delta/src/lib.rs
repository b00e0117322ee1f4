//! Delta records between snapshots.
//!
//! # Key Types
//!
//! - [`DeltaRecord`] / [`DeltaKind`] -- one path's change between two snapshots
//! - [`Differencer`] -- produces sorted, lazy [`DeltaStream`]s
//! - [`SnapshotDiffer`] -- the default merge-join differencer
//! - [`similarity`] -- content similarity for rename detection

pub mod delta;
pub mod differ;
pub mod error;
pub mod similarity;

pub use delta::{DeltaKind, DeltaRecord, DeltaSide};
pub use differ::{classify, DeltaStream, DiffOptions, Differencer, SnapshotDiffer};
pub use error::{DiffError, DiffResult};
pub use similarity::{similarity, DEFAULT_RENAME_THRESHOLD, DEFAULT_REWRITE_THRESHOLD, IDENTICAL};
