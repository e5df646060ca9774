//! Human-readable rendering of a comparison report.

use std::fmt::Write as _;
use std::io::IsTerminal;

use doccompare_compare::{ChangeKind, ComparisonResult};
use doccompare_extract::{ComparisonReport, DocumentExtractionResult};

const GREEN: &str = "\x1b[32m";
const RED_STRUCK: &str = "\x1b[31;9m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Colors only when stdout is a terminal and `NO_COLOR` is unset.
pub fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Print every pairwise comparison in `report` to stdout.
pub fn print(report: &ComparisonReport, color: bool) {
    for (index, document) in report.documents.iter().enumerate() {
        println!("{}", describe_document(index, document));
    }
    for pair in &report.comparisons {
        let (Some(baseline), Some(other)) = (
            report.documents.get(pair.baseline),
            report.documents.get(pair.other),
        ) else {
            continue;
        };
        println!();
        println!(
            "{}── {} → {} ──{}",
            paint(color, BOLD),
            baseline.file_name,
            other.file_name,
            paint(color, RESET)
        );
        println!("{}", render_diff(&pair.result, color));
        println!();
        println!("{}", summary(&pair.result));
    }
}

fn paint(color: bool, code: &'static str) -> &'static str {
    if color { code } else { "" }
}

fn describe_document(index: usize, document: &DocumentExtractionResult) -> String {
    let mut line = format!(
        "[{}] {} ({:?}, {} words)",
        index + 1,
        document.file_name,
        document.file_type,
        document.text.split_whitespace().count()
    );
    if let Some(confidence) = document.ocr_confidence {
        let _ = write!(line, ", OCR confidence {confidence:.0}%");
    }
    line
}

/// Inline diff: added runs in green, removed runs struck through in red.
///
/// Without color, additions are wrapped as `{+…+}` and removals as `[-…-]`.
pub fn render_diff(result: &ComparisonResult, color: bool) -> String {
    let mut out = String::new();
    for change in &result.differences {
        match (change.kind, color) {
            (ChangeKind::Unchanged, _) => out.push_str(&change.value),
            (ChangeKind::Added, true) => {
                let _ = write!(out, "{GREEN}{}{RESET}", change.value);
            }
            (ChangeKind::Removed, true) => {
                let _ = write!(out, "{RED_STRUCK}{}{RESET}", change.value);
            }
            (ChangeKind::Added, false) => {
                let _ = write!(out, "{{+{}+}}", change.value);
            }
            (ChangeKind::Removed, false) => {
                let _ = write!(out, "[-{}-]", change.value);
            }
        }
    }
    if out.is_empty() && color {
        out = format!("{DIM}(both documents are empty){RESET}");
    }
    out
}

/// One-line statistics for a pair.
pub fn summary(result: &ComparisonResult) -> String {
    if result.is_exact_match {
        return format!(
            "Identical ({} words, similarity {}%)",
            result.unchanged_count, result.similarity
        );
    }
    format!(
        "Similarity {}%: +{} added, -{} removed, {} unchanged",
        result.similarity, result.added_count, result.removed_count, result.unchanged_count
    )
}
