//! Splitting raw lyrics into slide-sized paragraphs.
//!
//! A paragraph is a run of lines between two or more consecutive newlines.
//! A line holding only spaces or tabs is not a boundary. Text inside a
//! paragraph is kept verbatim apart from trimming its ends.

use regex::Regex;
use std::sync::LazyLock;

/// Regex matching a paragraph boundary: two or more consecutive newlines.
static BLANK_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Normalize `\r\n` and lone `\r` line endings to `\n`.
fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split lyrics into trimmed, non-empty paragraphs, preserving order.
pub fn split_paragraphs(lyrics: &str) -> Vec<String> {
    let text = normalize_line_endings(lyrics);

    BLANK_LINE_REGEX
        .split(&text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
