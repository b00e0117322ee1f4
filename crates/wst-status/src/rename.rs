//! Similarity-based rename detection over one side's deltas.
//!
//! Sources are deletions (and, with rewrites enabled, heavily rewritten
//! modifications). Targets are additions accepted by the caller's
//! predicate. Candidate pairs at or above the threshold are chosen greedily,
//! highest score first, each path used at most once.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};
use wst_delta::{
    similarity, DeltaKind, DeltaRecord, DeltaSide, DEFAULT_RENAME_THRESHOLD,
    DEFAULT_REWRITE_THRESHOLD, IDENTICAL,
};
use wst_snapshot::ContentSource;
use wst_types::{ObjectId, PathOrder};

use crate::error::{StatusError, StatusResult};

/// Above `RENAME_LIMIT` squared source/target pairs, only identical content
/// is paired.
const RENAME_LIMIT: usize = 200;

/// Parameters for one rename pass.
pub(crate) struct RenameConfig<'a> {
    pub order: PathOrder,
    pub from_rewrites: bool,
    pub content: Option<&'a dyn ContentSource>,
}

struct Source {
    /// Index into the delta list.
    at: usize,
    side: DeltaSide,
    rewrite: bool,
}

struct Candidate {
    score: u8,
    source: usize,
    target: usize,
}

/// Blob reads memoized for the duration of one pass.
struct BlobCache<'a> {
    content: Option<&'a dyn ContentSource>,
    /// Whether content may be read to score non-identical pairs.
    inexact: bool,
    blobs: HashMap<ObjectId, Option<Vec<u8>>>,
}

impl BlobCache<'_> {
    fn get(&mut self, id: ObjectId) -> StatusResult<Option<&[u8]>> {
        let Some(content) = self.content else {
            return Ok(None);
        };
        if id.is_null() {
            return Ok(None);
        }
        if !self.blobs.contains_key(&id) {
            let data = content.read_blob(&id).map_err(StatusError::Content)?;
            self.blobs.insert(id, data);
        }
        Ok(self.blobs.get(&id).and_then(|b| b.as_deref()))
    }

    fn score(&mut self, old: ObjectId, new: ObjectId) -> StatusResult<Option<u8>> {
        if !old.is_null() && old == new {
            return Ok(Some(IDENTICAL));
        }
        if !self.inexact {
            return Ok(None);
        }
        let Some(old) = self.get(old)?.map(<[u8]>::to_vec) else {
            return Ok(None);
        };
        Ok(self.get(new)?.map(|new| similarity(&old, new)))
    }
}

/// Rewrite matching (source, target) pairs in `deltas` as renames.
///
/// `deltas` must be sorted by key; the result is sorted the same way.
pub(crate) fn detect_renames<F>(
    deltas: Vec<DeltaRecord>,
    mut is_target: F,
    config: &RenameConfig<'_>,
) -> StatusResult<Vec<DeltaRecord>>
where
    F: FnMut(&DeltaRecord) -> bool,
{
    let mut cache = BlobCache {
        content: config.content,
        inexact: true,
        blobs: HashMap::new(),
    };

    let mut sources = Vec::new();
    let mut targets = Vec::new();
    for (at, delta) in deltas.iter().enumerate() {
        let addition = matches!(delta.kind(), DeltaKind::Added | DeltaKind::Untracked);
        if addition {
            if is_target(delta) {
                targets.push(at);
            }
            continue;
        }
        match delta.kind() {
            DeltaKind::Deleted => {
                if let Some(side) = delta.old_side() {
                    sources.push(Source {
                        at,
                        side: side.clone(),
                        rewrite: false,
                    });
                }
            }
            DeltaKind::Modified if config.from_rewrites => {
                let (Some(old), Some(_)) = (delta.old_side(), delta.new_side()) else {
                    continue;
                };
                let rewritten = cache
                    .score(delta.old_id(), delta.new_id())?
                    .is_some_and(|s| s < DEFAULT_REWRITE_THRESHOLD);
                if rewritten {
                    sources.push(Source {
                        at,
                        side: old.clone(),
                        rewrite: true,
                    });
                }
            }
            _ => {}
        }
    }
    if sources.is_empty() || targets.is_empty() {
        return Ok(deltas);
    }
    if sources.len().saturating_mul(targets.len()) > RENAME_LIMIT * RENAME_LIMIT {
        warn!(
            sources = sources.len(),
            targets = targets.len(),
            "too many rename candidates; pairing identical content only"
        );
        cache.inexact = false;
    }

    let mut candidates = Vec::new();
    for (si, source) in sources.iter().enumerate() {
        for &ti in &targets {
            let Some(target) = deltas[ti].new_side() else {
                continue;
            };
            if target.path == source.side.path || source.side.mode.is_type_change(target.mode) {
                continue;
            }
            if let Some(score) = cache.score(source.side.id, target.id)? {
                if score >= DEFAULT_RENAME_THRESHOLD {
                    candidates.push(Candidate {
                        score,
                        source: si,
                        target: ti,
                    });
                }
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| config.order.compare(deltas[a.target].key(), deltas[b.target].key()))
            .then_with(|| {
                config
                    .order
                    .compare(&sources[a.source].side.path, &sources[b.source].side.path)
            })
    });

    let mut used_sources = HashSet::new();
    let mut used_targets = HashSet::new();
    let mut renamed: HashMap<usize, DeltaRecord> = HashMap::new();
    let mut consumed = HashSet::new();
    for candidate in &candidates {
        if used_sources.contains(&candidate.source) || used_targets.contains(&candidate.target) {
            continue;
        }
        let source = &sources[candidate.source];
        let Some(target) = deltas[candidate.target].new_side() else {
            continue;
        };
        let record = DeltaRecord::renamed(
            DeltaKind::Renamed,
            source.side.clone(),
            target.clone(),
            candidate.score,
        )?;
        used_sources.insert(candidate.source);
        used_targets.insert(candidate.target);
        renamed.insert(candidate.target, record);
        if !source.rewrite {
            consumed.insert(source.at);
        }
    }

    debug!(
        sources = sources.len(),
        targets = targets.len(),
        renames = renamed.len(),
        "rename detection"
    );

    let mut out: Vec<DeltaRecord> = deltas
        .into_iter()
        .enumerate()
        .filter(|(at, _)| !consumed.contains(at))
        .map(|(at, delta)| renamed.remove(&at).unwrap_or(delta))
        .collect();
    config.order.sort_by_path(&mut out, |d| d.key());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wst_snapshot::InMemoryRepository;
    use wst_types::FileMode;

    fn side(path: &str, content: &[u8]) -> DeltaSide {
        DeltaSide::new(path, ObjectId::from_bytes(content), FileMode::Regular)
    }

    fn config(content: Option<&dyn ContentSource>, from_rewrites: bool) -> RenameConfig<'_> {
        RenameConfig {
            order: PathOrder::CaseSensitive,
            from_rewrites,
            content,
        }
    }

    fn lines(n: usize, tag: &str) -> Vec<u8> {
        (0..n).map(|i| format!("{tag} line {i}\n")).collect::<String>().into_bytes()
    }

    #[test]
    fn identical_content_pairs_without_content_source() {
        let deltas = vec![
            DeltaRecord::deleted(DeltaKind::Deleted, side("a.txt", b"same")).unwrap(),
            DeltaRecord::added(DeltaKind::Untracked, side("b.txt", b"same")).unwrap(),
        ];
        let out = detect_renames(deltas, |_| true, &config(None, false)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind(), DeltaKind::Renamed);
        assert_eq!(out[0].old_path(), "a.txt");
        assert_eq!(out[0].new_path(), "b.txt");
        assert_eq!(out[0].similarity(), Some(100));
    }

    #[test]
    fn similar_content_pairs_with_score() {
        let repo = InMemoryRepository::new();
        let old = lines(10, "x");
        let mut new = old.clone();
        new.extend_from_slice(b"one more line\n");
        repo.set_head_file("old.txt", &old, FileMode::Regular);
        repo.set_head_file("new.txt", &new, FileMode::Regular);

        let deltas = vec![
            DeltaRecord::added(DeltaKind::Added, side("new.txt", &new)).unwrap(),
            DeltaRecord::deleted(DeltaKind::Deleted, side("old.txt", &old)).unwrap(),
        ];
        let out = detect_renames(deltas, |_| true, &config(Some(&repo), false)).unwrap();
        assert_eq!(out.len(), 1);
        let score = out[0].similarity().unwrap();
        assert!(score >= 90 && score < 100, "score {score}");
    }

    #[test]
    fn dissimilar_content_is_left_alone() {
        let repo = InMemoryRepository::new();
        repo.set_head_file("a.txt", &lines(5, "a"), FileMode::Regular);
        repo.set_head_file("b.txt", &lines(5, "b"), FileMode::Regular);
        let deltas = vec![
            DeltaRecord::deleted(DeltaKind::Deleted, side("a.txt", &lines(5, "a"))).unwrap(),
            DeltaRecord::added(DeltaKind::Added, side("b.txt", &lines(5, "b"))).unwrap(),
        ];
        let out = detect_renames(deltas, |_| true, &config(Some(&repo), false)).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|d| d.kind() != DeltaKind::Renamed));
    }

    #[test]
    fn best_score_wins_and_paths_are_used_once() {
        let deltas = vec![
            DeltaRecord::deleted(DeltaKind::Deleted, side("a.txt", b"payload")).unwrap(),
            DeltaRecord::added(DeltaKind::Added, side("b.txt", b"payload")).unwrap(),
            DeltaRecord::added(DeltaKind::Added, side("c.txt", b"payload")).unwrap(),
        ];
        let out = detect_renames(deltas, |_| true, &config(None, false)).unwrap();
        let kinds: Vec<_> = out.iter().map(|d| (d.key(), d.kind())).collect();
        assert_eq!(
            kinds,
            vec![("b.txt", DeltaKind::Renamed), ("c.txt", DeltaKind::Added)]
        );
    }

    #[test]
    fn rejected_targets_are_not_paired() {
        let deltas = vec![
            DeltaRecord::deleted(DeltaKind::Deleted, side("a.txt", b"x")).unwrap(),
            DeltaRecord::added(DeltaKind::Untracked, side("b.o", b"x")).unwrap(),
        ];
        let out = detect_renames(deltas, |d| !d.key().ends_with(".o"), &config(None, false)).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn rewrites_offer_old_content_but_never_self_pair() {
        let repo = InMemoryRepository::new();
        let original = lines(10, "orig");
        let rewritten = lines(10, "new");
        for content in [&original, &rewritten] {
            repo.set_head_file("scratch", content, FileMode::Regular);
        }

        let deltas = vec![
            DeltaRecord::changed(
                DeltaKind::Modified,
                side("main.rs", &original),
                side("main.rs", &rewritten),
            )
            .unwrap(),
            DeltaRecord::added(DeltaKind::Added, side("moved.rs", &original)).unwrap(),
        ];

        let without = detect_renames(deltas.clone(), |_| true, &config(Some(&repo), false)).unwrap();
        assert_eq!(without[1].kind(), DeltaKind::Added);

        let with = detect_renames(deltas, |_| true, &config(Some(&repo), true)).unwrap();
        assert_eq!(with.len(), 2);
        assert_eq!(with[0].key(), "main.rs");
        assert_eq!(with[0].kind(), DeltaKind::Modified);
        assert_eq!(with[1].kind(), DeltaKind::Renamed);
        assert_eq!(with[1].old_path(), "main.rs");
        assert_eq!(with[1].new_path(), "moved.rs");
    }

    #[test]
    fn too_many_candidates_pair_identical_content_only() {
        let repo = InMemoryRepository::new();
        let old = lines(10, "x");
        let mut new = old.clone();
        new.extend_from_slice(b"one more line\n");
        repo.set_head_file("old.txt", &old, FileMode::Regular);
        repo.set_head_file("new.txt", &new, FileMode::Regular);

        let mut deltas = vec![
            DeltaRecord::deleted(DeltaKind::Deleted, side("a-old.txt", &old)).unwrap(),
            DeltaRecord::added(DeltaKind::Added, side("a-new.txt", &new)).unwrap(),
            DeltaRecord::deleted(DeltaKind::Deleted, side("b-old.txt", b"same")).unwrap(),
            DeltaRecord::added(DeltaKind::Added, side("b-new.txt", b"same")).unwrap(),
        ];
        for i in 0..RENAME_LIMIT {
            let gone = format!("gone/{i:03}");
            let fresh = format!("fresh/{i:03}");
            deltas.push(DeltaRecord::deleted(DeltaKind::Deleted, side(&gone, gone.as_bytes())).unwrap());
            deltas.push(DeltaRecord::added(DeltaKind::Added, side(&fresh, fresh.as_bytes())).unwrap());
        }
        deltas.sort_by(|a, b| a.key().cmp(b.key()));

        let out = detect_renames(deltas, |_| true, &config(Some(&repo), false)).unwrap();
        let renamed: Vec<_> = out
            .iter()
            .filter(|d| d.kind() == DeltaKind::Renamed)
            .map(|d| (d.old_path(), d.new_path()))
            .collect();
        assert_eq!(renamed, vec![("b-old.txt", "b-new.txt")]);
        assert!(out.iter().any(|d| d.key() == "a-new.txt" && d.kind() == DeltaKind::Added));
    }
}
