//! Content similarity scoring for rename detection.
//!
//! Small inputs are diffed with the `similar` crate's Myers diff: text line
//! by line, anything that is not UTF-8 byte by byte. Larger inputs are
//! scored by counting the bytes of shared chunks, which is linear in the
//! input size. Both paths depend only on the content.

use std::collections::HashMap;

use similar::{capture_diff_slices, get_diff_ratio, Algorithm, TextDiff};

/// Score given to byte-identical content.
pub const IDENTICAL: u8 = 100;

/// Default minimum score for a rename pairing.
pub const DEFAULT_RENAME_THRESHOLD: u8 = 50;

/// A modified path whose old and new content score below this is treated as
/// a rewrite and may act as a rename source.
pub const DEFAULT_REWRITE_THRESHOLD: u8 = 60;

/// Text with more lines than this on either side is chunk-scored.
const MAX_DIFF_LINES: usize = 2_000;

/// Binary content longer than this on either side is chunk-scored.
const MAX_DIFF_BYTES: usize = 4_096;

/// Binary chunks end at a newline or after this many bytes.
const CHUNK_LEN: usize = 64;

/// Similarity of two blobs in `0..=100`.
///
/// Only byte-identical content scores [`IDENTICAL`]; anything else is capped
/// at 99. Two empty blobs are identical; one empty blob scores 0.
pub fn similarity(old: &[u8], new: &[u8]) -> u8 {
    if old == new {
        return IDENTICAL;
    }
    if old.is_empty() || new.is_empty() {
        return 0;
    }

    let ratio = match (std::str::from_utf8(old), std::str::from_utf8(new)) {
        (Ok(old), Ok(new)) if old.lines().count().max(new.lines().count()) <= MAX_DIFF_LINES => {
            TextDiff::configure()
                .algorithm(Algorithm::Myers)
                .diff_lines(old, new)
                .ratio()
        }
        (Ok(_), Ok(_)) => chunk_ratio(old, new),
        _ if old.len().max(new.len()) <= MAX_DIFF_BYTES => {
            let ops = capture_diff_slices(Algorithm::Myers, old, new);
            get_diff_ratio(&ops, old.len(), new.len())
        }
        _ => chunk_ratio(old, new),
    };

    ((ratio * 100.0).round() as u8).min(IDENTICAL - 1)
}

/// Bytes held by each distinct chunk.
fn chunk_sizes(data: &[u8]) -> HashMap<&[u8], usize> {
    let mut sizes = HashMap::new();
    let mut rest = data;
    while !rest.is_empty() {
        let window = &rest[..rest.len().min(CHUNK_LEN)];
        let end = window
            .iter()
            .position(|&b| b == b'\n')
            .map_or(window.len(), |at| at + 1);
        let (chunk, tail) = rest.split_at(end);
        *sizes.entry(chunk).or_insert(0) += chunk.len();
        rest = tail;
    }
    sizes
}

/// Share of the larger blob made of chunks also present in the other.
fn chunk_ratio(old: &[u8], new: &[u8]) -> f32 {
    let old_chunks = chunk_sizes(old);
    let new_chunks = chunk_sizes(new);
    let shared: usize = old_chunks
        .iter()
        .filter_map(|(chunk, size)| new_chunks.get(chunk).map(|other| (*size).min(*other)))
        .sum();
    shared as f32 / old.len().max(new.len()) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> String {
        (0..n).map(|i| format!("line {i}\n")).collect()
    }

    #[test]
    fn identical_content_scores_100() {
        assert_eq!(similarity(b"hello\nworld\n", b"hello\nworld\n"), IDENTICAL);
        assert_eq!(similarity(b"", b""), IDENTICAL);
    }

    #[test]
    fn empty_versus_content_scores_0() {
        assert_eq!(similarity(b"", b"data"), 0);
        assert_eq!(similarity(b"data", b""), 0);
    }

    #[test]
    fn one_changed_line_out_of_ten_is_similar() {
        let old = numbered(10);
        let new = old.replace("line 4\n", "line four\n");
        let score = similarity(old.as_bytes(), new.as_bytes());
        assert!(score >= 80, "score {score}");
        assert!(score < IDENTICAL);
    }

    #[test]
    fn unrelated_text_is_dissimilar() {
        let score = similarity(b"alpha\nbeta\ngamma\n", b"one\ntwo\nthree\n");
        assert!(score < DEFAULT_RENAME_THRESHOLD, "score {score}");
    }

    #[test]
    fn binary_content_compares_bytes() {
        let old: Vec<u8> = (0..=255u8).chain([0xff, 0xfe]).collect();
        let mut new = old.clone();
        new[10] = 0;
        let score = similarity(&old, &new);
        assert!(score >= 90 && score < IDENTICAL, "score {score}");
    }

    #[test]
    fn large_text_scores_are_stable() {
        let old = numbered(40_000);
        let new = old.replace("line 20000\n", "line twenty thousand\n");
        let first = similarity(old.as_bytes(), new.as_bytes());
        assert!(first >= 95 && first < IDENTICAL, "score {first}");
        for _ in 0..3 {
            assert_eq!(similarity(old.as_bytes(), new.as_bytes()), first);
        }

        let unrelated: String = (0..40_000).map(|i| format!("other {i}\n")).collect();
        assert!(similarity(old.as_bytes(), unrelated.as_bytes()) < DEFAULT_RENAME_THRESHOLD);
    }

    #[test]
    fn large_binary_uses_chunks() {
        let old: Vec<u8> = (0..20_000u32).flat_map(|i| i.to_le_bytes()).chain([0xff]).collect();
        let mut new = old.clone();
        new[100] ^= 0x55;
        let score = similarity(&old, &new);
        assert!(score >= 90 && score < IDENTICAL, "score {score}");
        assert_eq!(similarity(&old, &new), score);
    }
}
