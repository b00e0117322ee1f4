//! Repository-relative path ordering.
//!
//! Paths are `/`-separated strings relative to the workdir root. Directory
//! entries produced by collapsing carry a trailing `/`.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// How paths are ordered when sorting snapshots, delta streams and the final
/// status list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathOrder {
    /// Byte-wise comparison.
    CaseSensitive,
    /// ASCII case-folded comparison. Paths that fold to the same key are
    /// ordered case-sensitively so the order stays total.
    CaseInsensitive,
}

impl PathOrder {
    /// The ordering native to the host filesystem.
    pub fn platform_default() -> Self {
        if cfg!(any(windows, target_os = "macos")) {
            Self::CaseInsensitive
        } else {
            Self::CaseSensitive
        }
    }

    /// Compare two paths.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Self::CaseSensitive => a.cmp(b),
            Self::CaseInsensitive => {
                let folded = a
                    .bytes()
                    .map(|c| c.to_ascii_lowercase())
                    .cmp(b.bytes().map(|c| c.to_ascii_lowercase()));
                folded.then_with(|| a.cmp(b))
            }
        }
    }

    /// Sort a slice of items by a path key.
    pub fn sort_by_path<T, F>(&self, items: &mut [T], key: F)
    where
        F: Fn(&T) -> &str,
    {
        items.sort_by(|x, y| self.compare(key(x), key(y)));
    }

    /// Returns `true` if `a` sorts strictly before `b`.
    pub fn precedes(&self, a: &str, b: &str) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

impl Default for PathOrder {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// The directory prefixes of `path`, shallowest first, each with a trailing
/// `/`. `"a/b/c.txt"` yields `"a/"` then `"a/b/"`.
pub fn dir_prefixes(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    trimmed
        .match_indices('/')
        .map(move |(idx, _)| &trimmed[..=idx])
}

/// Returns `true` if `path` lies inside the directory `dir` (`dir` ends
/// with `/`).
pub fn is_within(path: &str, dir: &str) -> bool {
    debug_assert!(dir.ends_with('/'));
    path.len() > dir.len() && path.starts_with(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_sensitive_orders_uppercase_first() {
        let order = PathOrder::CaseSensitive;
        assert!(order.precedes("B.txt", "a.txt"));
        assert!(order.precedes("a.txt", "b.txt"));
    }

    #[test]
    fn case_insensitive_folds_then_breaks_ties() {
        let order = PathOrder::CaseInsensitive;
        assert!(order.precedes("a.txt", "B.txt"));
        assert!(order.precedes("A.txt", "a.txt"));
        assert_eq!(order.compare("dir/x", "dir/x"), Ordering::Equal);
    }

    #[test]
    fn sort_by_path_uses_order() {
        let mut paths = vec!["b", "C", "a"];
        PathOrder::CaseInsensitive.sort_by_path(&mut paths, |p| *p);
        assert_eq!(paths, vec!["a", "b", "C"]);
        PathOrder::CaseSensitive.sort_by_path(&mut paths, |p| *p);
        assert_eq!(paths, vec!["C", "a", "b"]);
    }

    #[test]
    fn dir_prefixes_are_shallowest_first() {
        let prefixes: Vec<_> = dir_prefixes("a/b/c.txt").collect();
        assert_eq!(prefixes, vec!["a/", "a/b/"]);
        assert_eq!(dir_prefixes("top.txt").count(), 0);
        let dirs: Vec<_> = dir_prefixes("a/b/").collect();
        assert_eq!(dirs, vec!["a/"]);
    }

    #[test]
    fn within_requires_strict_prefix() {
        assert!(is_within("src/lib.rs", "src/"));
        assert!(!is_within("src/", "src/"));
        assert!(!is_within("srcs/lib.rs", "src/"));
    }
}
