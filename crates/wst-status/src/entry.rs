//! Status entries: one path's combined classification.

use serde::{Deserialize, Serialize};
use wst_delta::DeltaRecord;

use crate::status::Status;

/// Non-fatal problem noticed while computing one path's status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusWarning {
    pub path: String,
    pub message: String,
}

impl StatusWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The index stat cache for `path` could not be refreshed.
    pub fn refresh_failed(path: impl Into<String>) -> Self {
        Self::new(path, "index stat cache could not be refreshed")
    }
}

/// How one path differs across HEAD, the index and the workdir.
///
/// The flags are the union of what each present delta implies. An entry
/// with no deltas is only ever [`Status::CURRENT`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    path: String,
    status: Status,
    head_to_index: Option<DeltaRecord>,
    index_to_workdir: Option<DeltaRecord>,
    warning: Option<StatusWarning>,
}

impl StatusEntry {
    pub(crate) fn new(
        path: String,
        head_to_index: Option<DeltaRecord>,
        index_to_workdir: Option<DeltaRecord>,
    ) -> Self {
        let mut status = Status::CURRENT;
        if let Some(d) = &head_to_index {
            status |= Status::from_head_to_index(d.kind());
        }
        if let Some(d) = &index_to_workdir {
            status |= Status::from_index_to_workdir(d.kind());
        }
        Self {
            path,
            status,
            head_to_index,
            index_to_workdir,
            warning: None,
        }
    }

    pub(crate) fn set_warning(&mut self, warning: StatusWarning) {
        self.warning = Some(warning);
    }

    /// The path this entry is reported under. Collapsed directories end
    /// with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn head_to_index(&self) -> Option<&DeltaRecord> {
        self.head_to_index.as_ref()
    }

    pub fn index_to_workdir(&self) -> Option<&DeltaRecord> {
        self.index_to_workdir.as_ref()
    }

    /// Advisory warning, e.g. a failed stat refresh.
    pub fn warning(&self) -> Option<&StatusWarning> {
        self.warning.as_ref()
    }
}
