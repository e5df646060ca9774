use serde::{Deserialize, Serialize};

/// Whether a diff run is shared by both texts or present on one side only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present in both texts.
    Unchanged,
    /// Present only in the second text.
    Added,
    /// Present only in the first text.
    Removed,
}

impl ChangeKind {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

/// One contiguous run of text in an edit script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// The run's text, whitespace included.
    pub value: String,
    /// Which side(s) the run belongs to.
    pub kind: ChangeKind,
}

impl Change {
    /// Create a run of the given kind.
    #[must_use]
    pub fn new(kind: ChangeKind, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    /// Returns `true` if the run exists only in the second text.
    #[must_use]
    pub const fn is_added(&self) -> bool {
        matches!(self.kind, ChangeKind::Added)
    }

    /// Returns `true` if the run exists only in the first text.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        matches!(self.kind, ChangeKind::Removed)
    }

    /// Number of whitespace-delimited words in the run.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.value.split_whitespace().count()
    }
}

/// Outcome of comparing two texts.
///
/// `is_exact_match` holds exactly when the two normalized texts are equal, which is also
/// exactly when `differences` contains no added or removed runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// The normalized texts are identical.
    pub is_exact_match: bool,
    /// Similarity percentage in `0..=100`.
    pub similarity: u8,
    /// Ordered edit script from the first text to the second.
    pub differences: Vec<Change>,
    /// Words present only in the second text.
    pub added_count: usize,
    /// Words present only in the first text.
    pub removed_count: usize,
    /// Words shared by both texts.
    pub unchanged_count: usize,
    /// First text after normalization.
    pub document_a_text: String,
    /// Second text after normalization.
    pub document_b_text: String,
}

impl ComparisonResult {
    /// Rebuild the first (old) text: every run that was not added.
    #[must_use]
    pub fn old_text(&self) -> String {
        self.differences
            .iter()
            .filter(|change| !change.is_added())
            .map(|change| change.value.as_str())
            .collect()
    }

    /// Rebuild the second (new) text: every run that was not removed.
    #[must_use]
    pub fn new_text(&self) -> String {
        self.differences
            .iter()
            .filter(|change| !change.is_removed())
            .map(|change| change.value.as_str())
            .collect()
    }
}
