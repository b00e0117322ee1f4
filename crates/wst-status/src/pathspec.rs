//! Pathspec matching.
//!
//! A pathspec is a list of patterns; a path is in scope if any pattern
//! matches it. Patterns are globs (compiled with `globset`, `*` crosses
//! directory separators) unless literal matching is requested. Either way
//! a pattern naming a directory matches everything below it.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use wst_snapshot::PathFilter;
use wst_types::is_within;

use crate::error::{StatusError, StatusResult};

const GLOB_META: &[char] = &['*', '?', '[', '{', '\\'];

#[derive(Clone, Debug)]
enum Matcher {
    All,
    Literal,
    Glob(GlobSet),
}

/// A compiled pathspec.
#[derive(Clone, Debug)]
pub struct Pathspec {
    matcher: Matcher,
    /// Patterns without trailing `/`.
    patterns: Vec<String>,
}

impl Pathspec {
    /// A pathspec that matches every path.
    pub fn all() -> Self {
        Self {
            matcher: Matcher::All,
            patterns: Vec::new(),
        }
    }

    /// Compile `patterns`. An empty list matches everything.
    pub fn compile(patterns: &[String], literal: bool) -> StatusResult<Self> {
        if patterns.is_empty() {
            return Ok(Self::all());
        }
        let trimmed: Vec<String> = patterns
            .iter()
            .map(|p| p.trim_end_matches('/').to_string())
            .collect();
        if literal {
            return Ok(Self {
                matcher: Matcher::Literal,
                patterns: trimmed,
            });
        }

        let mut builder = GlobSetBuilder::new();
        for (raw, pattern) in patterns.iter().zip(&trimmed) {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(false)
                .build()
                .map_err(|err| StatusError::InvalidPathspec {
                    pattern: raw.clone(),
                    reason: err.kind().to_string(),
                })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|err| StatusError::InvalidPathspec {
            pattern: patterns.join(" "),
            reason: err.to_string(),
        })?;
        Ok(Self {
            matcher: Matcher::Glob(set),
            patterns: trimmed,
        })
    }

    /// Returns `true` if this pathspec restricts nothing.
    pub fn is_unrestricted(&self) -> bool {
        matches!(self.matcher, Matcher::All)
    }

    fn under_pattern_dir(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| {
            path.len() > p.len() && path.starts_with(p.as_str()) && path.as_bytes()[p.len()] == b'/'
        })
    }
}

impl PathFilter for Pathspec {
    fn matches(&self, path: &str) -> bool {
        let path = path.trim_end_matches('/');
        match &self.matcher {
            Matcher::All => true,
            Matcher::Literal => {
                self.patterns.iter().any(|p| p == path) || self.under_pattern_dir(path)
            }
            Matcher::Glob(set) => set.is_match(path) || self.under_pattern_dir(path),
        }
    }

    fn may_contain(&self, dir: &str) -> bool {
        match &self.matcher {
            Matcher::All => true,
            Matcher::Literal | Matcher::Glob(_) => self.patterns.iter().any(|p| {
                let prefix = match p.find(GLOB_META) {
                    Some(idx) if matches!(self.matcher, Matcher::Glob(_)) => &p[..idx],
                    _ => p.as_str(),
                };
                prefix.starts_with(dir) || dir.starts_with(prefix) || is_within(dir, &format!("{p}/"))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(patterns: &[&str], literal: bool) -> Pathspec {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        Pathspec::compile(&patterns, literal).unwrap()
    }

    #[test]
    fn empty_pathspec_matches_everything() {
        let s = spec(&[], false);
        assert!(s.is_unrestricted());
        assert!(s.matches("any/path.txt"));
    }

    #[test]
    fn glob_patterns_cross_directories() {
        let s = spec(&["*.rs"], false);
        assert!(s.matches("main.rs"));
        assert!(s.matches("src/lib.rs"));
        assert!(!s.matches("README.md"));
    }

    #[test]
    fn directory_pattern_matches_contents() {
        let s = spec(&["docs"], false);
        assert!(s.matches("docs/guide.md"));
        assert!(s.matches("docs/"));
        assert!(!s.matches("docsite/index.html"));
        assert!(s.may_contain("docs/"));
        assert!(!s.may_contain("src/"));
    }

    #[test]
    fn literal_mode_disables_globbing() {
        let s = spec(&["*.rs"], true);
        assert!(!s.matches("main.rs"));
        assert!(s.matches("*.rs"));

        let s = spec(&["src/"], true);
        assert!(s.matches("src/lib.rs"));
        assert!(!s.matches("srcs"));
    }

    #[test]
    fn glob_prefix_prunes_directories() {
        let s = spec(&["src/*.rs"], false);
        assert!(s.may_contain("src/"));
        assert!(s.may_contain("src/nested/"));
        assert!(!s.may_contain("tests/"));
    }

    #[test]
    fn invalid_glob_is_reported() {
        let patterns = vec!["src/[".to_string()];
        let err = Pathspec::compile(&patterns, false).unwrap_err();
        assert!(matches!(err, StatusError::InvalidPathspec { ref pattern, .. } if pattern == "src/["));
    }
}
