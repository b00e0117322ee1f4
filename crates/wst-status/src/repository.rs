//! The bundle of collaborators a status computation runs against.

use std::sync::atomic::{AtomicBool, Ordering};

use wst_delta::{Differencer, SnapshotDiffer};
use wst_snapshot::{ContentSource, IgnoreEvaluator, IndexMutator, NoIgnores, SnapshotResolver};

use crate::error::{StatusError, StatusResult};

static DEFAULT_DIFFER: SnapshotDiffer = SnapshotDiffer;
static NO_IGNORES: NoIgnores = NoIgnores;

/// Borrowed collaborators describing one repository.
///
/// Only the resolver is mandatory. Without a content source, rename
/// detection pairs identical content only; without an index mutator,
/// `UPDATE_INDEX` is skipped with a warning.
#[derive(Clone, Copy)]
pub struct RepositoryState<'r> {
    pub(crate) resolver: &'r dyn SnapshotResolver,
    pub(crate) differ: &'r dyn Differencer,
    pub(crate) ignores: &'r dyn IgnoreEvaluator,
    pub(crate) content: Option<&'r dyn ContentSource>,
    pub(crate) index_mutator: Option<&'r dyn IndexMutator>,
    pub(crate) cancel: Option<&'r AtomicBool>,
}

impl<'r> RepositoryState<'r> {
    /// State backed by `resolver`, the default differencer and no ignore
    /// rules.
    pub fn new(resolver: &'r dyn SnapshotResolver) -> Self {
        Self {
            resolver,
            differ: &DEFAULT_DIFFER,
            ignores: &NO_IGNORES,
            content: None,
            index_mutator: None,
            cancel: None,
        }
    }

    pub fn with_differ(mut self, differ: &'r dyn Differencer) -> Self {
        self.differ = differ;
        self
    }

    pub fn with_ignores(mut self, ignores: &'r dyn IgnoreEvaluator) -> Self {
        self.ignores = ignores;
        self
    }

    pub fn with_content(mut self, content: &'r dyn ContentSource) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_index_mutator(mut self, mutator: &'r dyn IndexMutator) -> Self {
        self.index_mutator = Some(mutator);
        self
    }

    /// Abort with [`StatusError::Cancelled`] once `flag` is set. Checked
    /// once per path.
    pub fn with_cancel_flag(mut self, flag: &'r AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub(crate) fn check_cancelled(&self) -> StatusResult<()> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(StatusError::Cancelled),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for RepositoryState<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryState")
            .field("content", &self.content.is_some())
            .field("index_mutator", &self.index_mutator.is_some())
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}
