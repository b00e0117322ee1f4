//! Status options: scope, ordering, feature flags and pathspec.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use wst_types::PathOrder;

use crate::error::{StatusError, StatusResult};

/// Which comparisons a status run performs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusShow {
    /// HEAD→index and index→workdir.
    #[default]
    IndexAndWorkdir,
    /// HEAD→index only. The workdir is never read.
    IndexOnly,
    /// Index→workdir only. HEAD is never resolved.
    WorkdirOnly,
}

impl StatusShow {
    pub fn includes_index(&self) -> bool {
        !matches!(self, Self::WorkdirOnly)
    }

    pub fn includes_workdir(&self) -> bool {
        !matches!(self, Self::IndexOnly)
    }
}

bitflags! {
    /// Feature flags for a status run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct StatusOptFlags: u32 {
        const INCLUDE_UNTRACKED = 1 << 0;
        const INCLUDE_IGNORED = 1 << 1;
        const INCLUDE_UNMODIFIED = 1 << 2;
        const EXCLUDE_SUBMODULES = 1 << 3;
        const RECURSE_UNTRACKED_DIRS = 1 << 4;
        /// Match pathspec patterns as literal paths instead of globs.
        const DISABLE_PATHSPEC_MATCH = 1 << 5;
        const RECURSE_IGNORED_DIRS = 1 << 6;
        const RENAMES_HEAD_TO_INDEX = 1 << 7;
        const RENAMES_INDEX_TO_WORKDIR = 1 << 8;
        const SORT_CASE_SENSITIVELY = 1 << 9;
        const SORT_CASE_INSENSITIVELY = 1 << 10;
        const RENAMES_FROM_REWRITES = 1 << 11;
        const NO_REFRESH = 1 << 12;
        /// Refresh the index stat cache before scanning. The only mutating
        /// option.
        const UPDATE_INDEX = 1 << 13;
    }
}

/// Validated configuration for one status computation.
///
/// Construction rejects contradictory sort flags and empty pathspec
/// patterns, so a value of this type is always usable. Deserialization goes
/// through the same checks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStatusOptions")]
pub struct StatusOptions {
    show: StatusShow,
    flags: StatusOptFlags,
    pathspec: Vec<String>,
}

/// Unvalidated wire form of [`StatusOptions`].
#[derive(Deserialize)]
struct RawStatusOptions {
    #[serde(default)]
    show: StatusShow,
    #[serde(default)]
    flags: StatusOptFlags,
    #[serde(default)]
    pathspec: Vec<String>,
}

impl TryFrom<RawStatusOptions> for StatusOptions {
    type Error = StatusError;

    fn try_from(raw: RawStatusOptions) -> StatusResult<Self> {
        Self::new(raw.show, raw.flags, raw.pathspec)
    }
}

impl StatusOptions {
    /// Build and validate options.
    pub fn new<I, S>(show: StatusShow, flags: StatusOptFlags, pathspec: I) -> StatusResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if flags.contains(StatusOptFlags::SORT_CASE_SENSITIVELY | StatusOptFlags::SORT_CASE_INSENSITIVELY) {
            return Err(StatusError::InvalidConfiguration(
                "SORT_CASE_SENSITIVELY and SORT_CASE_INSENSITIVELY are mutually exclusive".into(),
            ));
        }
        let pathspec: Vec<String> = pathspec.into_iter().map(Into::into).collect();
        if let Some(pos) = pathspec.iter().position(|p| p.is_empty()) {
            return Err(StatusError::InvalidConfiguration(format!(
                "pathspec pattern {pos} is empty"
            )));
        }
        Ok(Self {
            show,
            flags,
            pathspec,
        })
    }

    /// Default scope with the given flags and no pathspec.
    pub fn with_flags(flags: StatusOptFlags) -> StatusResult<Self> {
        Self::new(StatusShow::default(), flags, Vec::<String>::new())
    }

    pub fn show(&self) -> StatusShow {
        self.show
    }

    pub fn flags(&self) -> StatusOptFlags {
        self.flags
    }

    pub fn pathspec(&self) -> &[String] {
        &self.pathspec
    }

    /// Returns `true` if every flag in `flag` is set.
    pub fn has(&self, flag: StatusOptFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Path ordering for this run.
    pub fn order(&self) -> PathOrder {
        if self.has(StatusOptFlags::SORT_CASE_SENSITIVELY) {
            PathOrder::CaseSensitive
        } else if self.has(StatusOptFlags::SORT_CASE_INSENSITIVELY) {
            PathOrder::CaseInsensitive
        } else {
            PathOrder::platform_default()
        }
    }

    /// Whether the index stat cache is refreshed before scanning.
    pub fn refreshes_index(&self) -> bool {
        self.has(StatusOptFlags::UPDATE_INDEX) && !self.has(StatusOptFlags::NO_REFRESH)
    }
}
