//! Normalization and word-level diffing for extracted document text.
//!
//! [`compare`] is a pure function: both inputs are run through [`normalize`], split into
//! word and whitespace tokens, and diffed with the Myers algorithm from [`similar`]. Whitespace
//! runs are tokens of their own, so concatenating the runs of the edit script reproduces
//! the normalized inputs exactly.
//!
//! # Similarity
//!
//! ```text
//! similarity = round(100 * unchanged / (unchanged + max(added, removed)))
//! ```
//!
//! and `100` when there are no words at all. The denominator uses the *larger* side of the
//! edit, so a deletion of N words costs as much as an insertion of N words, while a
//! replacement of N words by N words costs N and not 2N. The score is symmetric under
//! swapping the inputs only when `added == removed`. This asymmetry is deliberate and is
//! kept as observable behavior; it is not a Jaccard index.
//!
//! ```
//! use doccompare_compare::compare;
//!
//! let result = compare("The cat sat", "The dog sat");
//! assert!(!result.is_exact_match);
//! assert_eq!(result.similarity, 67);
//! ```

mod model;
mod normalize;

pub use model::{Change, ChangeKind, ComparisonResult};
pub use normalize::normalize;

use similar::{Algorithm, DiffOp, capture_diff_slices};

/// Compare two texts after normalization.
#[must_use]
pub fn compare(text_a: &str, text_b: &str) -> ComparisonResult {
    let normalized_a = normalize(text_a);
    let normalized_b = normalize(text_b);

    let differences = if normalized_a == normalized_b {
        if normalized_a.is_empty() {
            Vec::new()
        } else {
            vec![Change::new(ChangeKind::Unchanged, normalized_a.clone())]
        }
    } else {
        diff_words(&normalized_a, &normalized_b)
    };

    let (added_count, removed_count, unchanged_count) = count_words(&differences);
    let similarity = similarity(added_count, removed_count, unchanged_count);
    let is_exact_match = normalized_a == normalized_b;

    tracing::debug!(
        added = added_count,
        removed = removed_count,
        unchanged = unchanged_count,
        similarity,
        "compared texts"
    );

    ComparisonResult {
        is_exact_match,
        similarity,
        differences,
        added_count,
        removed_count,
        unchanged_count,
        document_a_text: normalized_a,
        document_b_text: normalized_b,
    }
}

/// Similarity percentage for the given word counts.
///
/// See the crate documentation for why the larger of `added` and `removed` is used.
#[must_use]
pub fn similarity(added: usize, removed: usize, unchanged: usize) -> u8 {
    let total = added + removed + unchanged;
    if total == 0 {
        return 100;
    }
    let denominator = unchanged + added.max(removed);
    let ratio = unchanged as f64 / denominator as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Split text into alternating runs of whitespace and non-whitespace.
pub(crate) fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current_is_space: Option<bool> = None;
    for (index, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        match current_is_space {
            Some(previous) if previous != is_space => {
                tokens.push(&text[start..index]);
                start = index;
            }
            _ => {}
        }
        current_is_space = Some(is_space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

fn diff_words(old: &str, new: &str) -> Vec<Change> {
    let old_tokens = tokenize(old);
    let new_tokens = tokenize(new);
    let ops = capture_diff_slices(Algorithm::Myers, &old_tokens, &new_tokens);

    let mut changes = Vec::new();
    let mut unchanged = String::new();
    let mut removed = String::new();
    let mut added = String::new();

    for op in ops {
        match op {
            DiffOp::Equal { old_index, len, .. } => {
                flush_edit(&mut changes, &mut removed, &mut added);
                unchanged.extend(old_tokens[old_index..old_index + len].iter().copied());
            }
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                flush_unchanged(&mut changes, &mut unchanged);
                removed.extend(old_tokens[old_index..old_index + old_len].iter().copied());
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                flush_unchanged(&mut changes, &mut unchanged);
                added.extend(new_tokens[new_index..new_index + new_len].iter().copied());
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                flush_unchanged(&mut changes, &mut unchanged);
                removed.extend(old_tokens[old_index..old_index + old_len].iter().copied());
                added.extend(new_tokens[new_index..new_index + new_len].iter().copied());
            }
        }
    }
    flush_unchanged(&mut changes, &mut unchanged);
    flush_edit(&mut changes, &mut removed, &mut added);

    changes
}

fn flush_unchanged(changes: &mut Vec<Change>, unchanged: &mut String) {
    if !unchanged.is_empty() {
        changes.push(Change::new(ChangeKind::Unchanged, std::mem::take(unchanged)));
    }
}

// Removed text goes before added text inside one edited region.
fn flush_edit(changes: &mut Vec<Change>, removed: &mut String, added: &mut String) {
    if !removed.is_empty() {
        changes.push(Change::new(ChangeKind::Removed, std::mem::take(removed)));
    }
    if !added.is_empty() {
        changes.push(Change::new(ChangeKind::Added, std::mem::take(added)));
    }
}

fn count_words(changes: &[Change]) -> (usize, usize, usize) {
    let mut added = 0;
    let mut removed = 0;
    let mut unchanged = 0;
    for change in changes {
        let words = change.word_count();
        match change.kind {
            ChangeKind::Added => added += words,
            ChangeKind::Removed => removed += words,
            ChangeKind::Unchanged => unchanged += words,
        }
    }
    (added, removed, unchanged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_words_and_whitespace_runs() {
        assert_eq!(
            tokenize("one two\n\nthree"),
            vec!["one", " ", "two", "\n\n", "three"]
        );
        assert!(tokenize("").is_empty());
        assert_eq!(tokenize("  "), vec!["  "]);
    }

    #[test]
    fn replacement_is_removed_then_added() {
        let result = compare("The cat sat", "The dog sat");
        let kinds: Vec<_> = result.differences.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::Unchanged,
                ChangeKind::Removed,
                ChangeKind::Added,
                ChangeKind::Unchanged,
            ]
        );
        assert_eq!(result.differences[1].value, "cat");
        assert_eq!(result.differences[2].value, "dog");
    }

    #[test]
    fn insertion_leaves_old_words_unchanged() {
        let result = compare("one three five", "one two three four five");
        assert_eq!(result.removed_count, 0);
        assert_eq!(result.added_count, 2);
        assert_eq!(result.unchanged_count, 3);
        assert!(!result.differences.iter().any(Change::is_removed));
    }

    #[test]
    fn similarity_uses_larger_side() {
        assert_eq!(similarity(0, 0, 0), 100);
        assert_eq!(similarity(1, 1, 2), 67);
        assert_eq!(similarity(4, 0, 4), 50);
        assert_eq!(similarity(0, 4, 4), 50);
        assert_eq!(similarity(3, 0, 0), 0);
    }

    #[test]
    fn empty_inputs_match_exactly() {
        let result = compare("", "");
        assert!(result.is_exact_match);
        assert_eq!(result.similarity, 100);
        assert!(result.differences.is_empty());
    }

    #[test]
    fn formatting_noise_is_ignored() {
        let result = compare("Total:\t$1,200", "total  1 200");
        assert!(result.is_exact_match);
    }
}
