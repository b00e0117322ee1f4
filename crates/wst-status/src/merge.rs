//! Ordered merge-join of the HEAD→index and index→workdir delta streams.

use std::cmp::Ordering;

use wst_delta::DeltaRecord;
use wst_types::PathOrder;

use crate::error::{StatusError, StatusResult};
use crate::repository::RepositoryState;

/// A boxed delta stream after error conversion.
pub(crate) type SideStream<'a> = Box<dyn Iterator<Item = StatusResult<DeltaRecord>> + 'a>;

/// Both sides' deltas for one path.
#[derive(Debug)]
pub(crate) struct MergedPath {
    pub key: String,
    pub head_to_index: Option<DeltaRecord>,
    pub index_to_workdir: Option<DeltaRecord>,
}

/// Pulls from one stream, enforcing strictly increasing keys.
struct Cursor<'a> {
    label: &'static str,
    stream: SideStream<'a>,
    order: PathOrder,
    current: Option<DeltaRecord>,
    last: Option<String>,
}

impl<'a> Cursor<'a> {
    fn open(label: &'static str, stream: SideStream<'a>, order: PathOrder) -> StatusResult<Self> {
        let mut cursor = Self {
            label,
            stream,
            order,
            current: None,
            last: None,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    fn advance(&mut self) -> StatusResult<()> {
        self.current = match self.stream.next() {
            None => None,
            Some(delta) => {
                let delta = delta?;
                if let Some(prev) = &self.last {
                    if !self.order.precedes(prev, delta.key()) {
                        return Err(StatusError::InternalInconsistency(format!(
                            "{} stream yielded '{}' after '{}'",
                            self.label,
                            delta.key(),
                            prev
                        )));
                    }
                }
                self.last = Some(delta.key().to_string());
                Some(delta)
            }
        };
        Ok(())
    }

    fn take(&mut self) -> StatusResult<Option<DeltaRecord>> {
        let delta = self.current.take();
        self.advance()?;
        Ok(delta)
    }
}

/// Drain one stream, enforcing strictly increasing keys.
pub(crate) fn collect_checked(
    label: &'static str,
    stream: SideStream<'_>,
    order: PathOrder,
) -> StatusResult<Vec<DeltaRecord>> {
    let mut cursor = Cursor::open(label, stream, order)?;
    let mut deltas = Vec::new();
    while let Some(delta) = cursor.take()? {
        deltas.push(delta);
    }
    Ok(deltas)
}

/// Join two key-sorted streams into one record per distinct path.
///
/// Checks the caller's cancellation flag once per path.
pub(crate) fn merge_join(
    repo: &RepositoryState<'_>,
    head_to_index: SideStream<'_>,
    index_to_workdir: SideStream<'_>,
    order: PathOrder,
) -> StatusResult<Vec<MergedPath>> {
    let mut h2i = Cursor::open("HEAD-to-index", head_to_index, order)?;
    let mut i2w = Cursor::open("index-to-workdir", index_to_workdir, order)?;
    let mut merged = Vec::new();

    loop {
        repo.check_cancelled()?;
        let step = match (&h2i.current, &i2w.current) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => order.compare(a.key(), b.key()),
        };
        let (head_to_index, index_to_workdir) = match step {
            Ordering::Less => (h2i.take()?, None),
            Ordering::Greater => (None, i2w.take()?),
            Ordering::Equal => (h2i.take()?, i2w.take()?),
        };
        let key = head_to_index
            .as_ref()
            .or(index_to_workdir.as_ref())
            .map(|d| d.key().to_string())
            .unwrap_or_default();
        merged.push(MergedPath {
            key,
            head_to_index,
            index_to_workdir,
        });
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use wst_delta::{DeltaKind, DeltaSide};
    use wst_snapshot::InMemoryRepository;
    use wst_types::{FileMode, ObjectId};

    fn added(path: &str) -> DeltaRecord {
        DeltaRecord::added(
            DeltaKind::Added,
            DeltaSide::new(path, ObjectId::from_bytes(path.as_bytes()), FileMode::Regular),
        )
        .unwrap()
    }

    fn stream(paths: &[&str]) -> SideStream<'static> {
        let deltas: Vec<_> = paths.iter().map(|p| Ok(added(p))).collect();
        Box::new(deltas.into_iter())
    }

    #[test]
    fn joins_shared_paths() {
        let repo = InMemoryRepository::new();
        let state = RepositoryState::new(&repo);
        let merged = merge_join(
            &state,
            stream(&["a", "c"]),
            stream(&["b", "c"]),
            PathOrder::CaseSensitive,
        )
        .unwrap();
        let keys: Vec<_> = merged.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert!(merged[2].head_to_index.is_some() && merged[2].index_to_workdir.is_some());
        assert!(merged[1].head_to_index.is_none());
    }

    #[test]
    fn unsorted_stream_is_inconsistent() {
        let repo = InMemoryRepository::new();
        let state = RepositoryState::new(&repo);
        let err = merge_join(&state, stream(&["b", "a"]), stream(&[]), PathOrder::CaseSensitive)
            .unwrap_err();
        assert!(matches!(err, StatusError::InternalInconsistency(_)));
    }

    #[test]
    fn duplicate_key_is_inconsistent() {
        let repo = InMemoryRepository::new();
        let state = RepositoryState::new(&repo);
        let err = merge_join(&state, stream(&[]), stream(&["a", "a"]), PathOrder::CaseSensitive)
            .unwrap_err();
        assert!(matches!(err, StatusError::InternalInconsistency(_)));
    }

    #[test]
    fn collect_checked_rejects_out_of_order() {
        assert_eq!(
            collect_checked("test", stream(&["a", "b"]), PathOrder::CaseSensitive)
                .unwrap()
                .len(),
            2
        );
        assert!(collect_checked("test", stream(&["b", "a"]), PathOrder::CaseSensitive).is_err());
    }

    #[test]
    fn cancellation_stops_the_join() {
        let repo = InMemoryRepository::new();
        let cancel = AtomicBool::new(true);
        let state = RepositoryState::new(&repo).with_cancel_flag(&cancel);
        let err = merge_join(&state, stream(&["a"]), stream(&[]), PathOrder::CaseSensitive)
            .unwrap_err();
        assert!(matches!(err, StatusError::Cancelled));
    }
}
