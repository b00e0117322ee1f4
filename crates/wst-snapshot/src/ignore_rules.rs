//! Ignore evaluators backed by gitignore-style rules.
//!
//! Rule syntax is delegated entirely to the `ignore` crate. Nested
//! `.gitignore` files are honored: the deepest file that has an opinion about
//! a path (ignore or whitelist) decides.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::SnapshotResult;
use crate::traits::IgnoreEvaluator;

/// File name of per-directory ignore rules.
pub const IGNORE_FILE: &str = ".gitignore";

/// An evaluator that ignores nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoIgnores;

impl IgnoreEvaluator for NoIgnores {
    fn is_ignored(&self, _path: &str) -> bool {
        false
    }
}

/// Where a set of rules applies.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Scope {
    /// A `.gitignore` in the directory with this prefix (`""` for the root).
    Dir(String),
    /// The repository-wide exclude file.
    Exclude,
}

impl Scope {
    /// Deeper directories take precedence; the exclude file comes last.
    fn rank(&self) -> isize {
        match self {
            Self::Dir(prefix) => prefix.matches('/').count() as isize,
            Self::Exclude => -1,
        }
    }
}

/// Gitignore rules scoped to directories of the workdir.
pub struct GitignoreEvaluator {
    /// Highest precedence first.
    matchers: Vec<(Scope, Gitignore)>,
}

impl GitignoreEvaluator {
    /// Build an evaluator from rule lines applied at the workdir root.
    pub fn from_lines<I, S>(lines: I) -> SnapshotResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new(".");
        for line in lines {
            builder.add_line(None, line.as_ref())?;
        }
        Ok(Self {
            matchers: vec![(Scope::Dir(String::new()), builder.build()?)],
        })
    }

    /// Load every `.gitignore` below `root`, plus `<metadata_dir>/info/exclude`
    /// when present. The metadata directory itself is not walked.
    pub fn from_workdir(root: &Path, metadata_dir: &str) -> SnapshotResult<Self> {
        let mut matchers = Vec::new();

        let exclude = root.join(metadata_dir).join("info").join("exclude");
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || e.file_name() != metadata_dir);

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || entry.file_name() != IGNORE_FILE {
                continue;
            }
            let Some(dir) = entry.path().parent() else {
                continue;
            };
            let prefix = dir_prefix(root, dir);
            let matcher = build_matcher(dir, &[entry.path().to_path_buf()])?;
            debug!(dir = %prefix, rules = matcher.num_ignores(), "loaded ignore rules");
            matchers.push((Scope::Dir(prefix), matcher));
        }

        if exclude.is_file() {
            matchers.push((Scope::Exclude, build_matcher(root, &[exclude])?));
        }

        matchers.sort_by_key(|(scope, _)| std::cmp::Reverse(scope.rank()));
        Ok(Self { matchers })
    }

    /// Number of rule sources loaded.
    pub fn sources(&self) -> usize {
        self.matchers.len()
    }
}

impl IgnoreEvaluator for GitignoreEvaluator {
    fn is_ignored(&self, path: &str) -> bool {
        let is_dir = path.ends_with('/');
        let trimmed = path.trim_end_matches('/');

        for (scope, matcher) in &self.matchers {
            let relative = match scope {
                Scope::Exclude => trimmed,
                Scope::Dir(prefix) => match trimmed.strip_prefix(prefix.as_str()) {
                    Some(rest) if !rest.is_empty() => rest,
                    _ => continue,
                },
            };
            let m = matcher.matched(relative, is_dir);
            if m.is_ignore() {
                return true;
            }
            if m.is_whitelist() {
                return false;
            }
        }
        false
    }
}

impl std::fmt::Debug for GitignoreEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitignoreEvaluator")
            .field("sources", &self.matchers.len())
            .finish()
    }
}

fn build_matcher(dir: &Path, files: &[PathBuf]) -> SnapshotResult<Gitignore> {
    let mut builder = GitignoreBuilder::new(dir);
    for file in files {
        if let Some(err) = builder.add(file) {
            return Err(err.into());
        }
    }
    Ok(builder.build()?)
}

/// `dir` relative to `root`, `/`-separated with a trailing `/`; `""` for
/// the root itself.
fn dir_prefix(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    let mut prefix = String::new();
    for component in relative.components() {
        prefix.push_str(&component.as_os_str().to_string_lossy());
        prefix.push('/');
    }
    prefix
}
