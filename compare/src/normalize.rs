//! Canonical text form used before diffing.
//!
//! Extraction leaves behind artifacts that are not content: column gaps rendered as tabs,
//! OCR case noise, stray punctuation, runs of blank lines. [`normalize`] removes them in a
//! fixed order. Later steps rely on earlier ones, so the order is part of the contract:
//!
//! 1. line endings become `\n`
//! 2. tab runs become a single space
//! 3. anything that is not a letter, digit or whitespace becomes a space, as do upper-case
//!    letters that have no lower-case form
//! 4. runs of spaces collapse to one
//! 5. three or more consecutive newlines collapse to two
//! 6. lower-case
//! 7. trim

/// Normalize extracted text for comparison.
///
/// The function is pure and idempotent: `normalize(&normalize(x)) == normalize(x)`.
#[must_use]
pub fn normalize(text: &str) -> String {
    let unified = unify_line_endings(text);
    let untabbed = collapse_tabs(&unified);
    let stripped = strip_punctuation(&untabbed);
    let spaced = collapse_spaces(&stripped);
    let paragraphs = collapse_blank_lines(&spaced);
    let lowered = lower_case(&paragraphs);
    lowered.trim().to_string()
}

fn unify_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn collapse_tabs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tabs = false;
    for ch in text.chars() {
        if ch == '\t' {
            if !in_tabs {
                out.push(' ');
            }
            in_tabs = true;
        } else {
            out.push(ch);
            in_tabs = false;
        }
    }
    out
}

// Upper-case letters without a lower-case form (such as `ℂ`) count as punctuation.
fn is_kept(ch: char) -> bool {
    (ch.is_alphanumeric() || ch.is_whitespace()) && !lacks_lower_case(ch)
}

fn lacks_lower_case(ch: char) -> bool {
    ch.is_uppercase() && ch.to_lowercase().any(char::is_uppercase)
}

fn strip_punctuation(text: &str) -> String {
    text.chars()
        .map(|ch| if is_kept(ch) { ch } else { ' ' })
        .collect()
}

fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == ' ' && out.ends_with(' ') {
            continue;
        }
        out.push(ch);
    }
    out
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(ch);
    }
    out
}

// Some lower-case mappings expand into combining marks; those are dropped the same way
// punctuation is, otherwise a second pass would strip them and break idempotency.
fn lower_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        for lower in ch.to_lowercase() {
            if is_kept(lower) {
                out.push(lower);
            }
        }
    }
    out
}
