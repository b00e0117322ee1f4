//! The status list: an immutable, ordered result of one status run.

use crate::entry::{StatusEntry, StatusWarning};
use crate::error::{StatusError, StatusResult};
use crate::options::StatusOptions;

/// Ordered status entries produced by one computation.
///
/// Entries are sorted by path per the options' ordering and never change
/// after construction. The list is `Send + Sync` and may be shared freely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusList {
    entries: Vec<StatusEntry>,
    options: StatusOptions,
    warnings: Vec<StatusWarning>,
}

impl StatusList {
    pub(crate) fn new(
        entries: Vec<StatusEntry>,
        options: StatusOptions,
        warnings: Vec<StatusWarning>,
    ) -> Self {
        Self {
            entries,
            options,
            warnings,
        }
    }

    /// Number of entries.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// The entry at `index`, in list order.
    pub fn entry_at(&self, index: usize) -> StatusResult<&StatusEntry> {
        self.entries.get(index).ok_or(StatusError::IndexOutOfRange {
            index,
            count: self.entries.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StatusEntry> {
        self.entries.iter()
    }

    /// Returns `true` if no entry reports a change.
    pub fn is_clean(&self) -> bool {
        self.entries.iter().all(|e| e.status().is_current())
    }

    /// Look up the entry for `path`.
    pub fn find(&self, path: &str) -> Option<&StatusEntry> {
        let order = self.options.order();
        self.entries
            .binary_search_by(|e| order.compare(e.path(), path))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// The options this list was computed with.
    pub fn options(&self) -> &StatusOptions {
        &self.options
    }

    /// Every advisory warning raised during the run, including those not
    /// attached to a listed entry.
    pub fn warnings(&self) -> &[StatusWarning] {
        &self.warnings
    }
}

impl<'a> IntoIterator for &'a StatusList {
    type Item = &'a StatusEntry;
    type IntoIter = std::slice::Iter<'a, StatusEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::StatusOptFlags;

    fn list(paths: &[&str]) -> StatusList {
        let entries = paths
            .iter()
            .map(|p| StatusEntry::new(p.to_string(), None, None))
            .collect();
        let options = StatusOptions::with_flags(StatusOptFlags::SORT_CASE_SENSITIVELY).unwrap();
        StatusList::new(entries, options, Vec::new())
    }

    #[test]
    fn entry_at_bounds() {
        let l = list(&["a", "b"]);
        assert_eq!(l.count(), 2);
        assert_eq!(l.entry_at(1).unwrap().path(), "b");
        assert!(matches!(
            l.entry_at(2),
            Err(StatusError::IndexOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn find_uses_list_order() {
        let l = list(&["a.txt", "dir/", "z.txt"]);
        assert_eq!(l.find("dir/").unwrap().path(), "dir/");
        assert!(l.find("missing").is_none());
    }

    #[test]
    fn empty_list_is_clean() {
        let l = list(&[]);
        assert!(l.is_clean());
        assert_eq!(l.iter().count(), 0);
        assert!(l.warnings().is_empty());
    }
}
