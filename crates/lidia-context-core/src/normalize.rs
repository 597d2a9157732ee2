//! Canonical plain-text normalization.
//!
//! Raw extractor output is full of layout noise: form feeds from PDF page
//! breaks, runs of spaces used for column alignment, and stacks of blank
//! lines. [`normalize`] reduces all of that to a canonical form:
//!
//! 1. CRLF and lone CR line endings become LF.
//! 2. Code points below 32 are removed, except tab and newline.
//! 3. Runs of two or more spaces collapse to one.
//! 4. Three or more newlines, optionally separated by spaces or tabs,
//!    collapse to exactly two.
//! 5. Leading and trailing whitespace is trimmed.
//!
//! The function is idempotent: `normalize(&normalize(x)) == normalize(x)`.

use regex::Regex;
use std::sync::OnceLock;

fn spaces_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {2,}").expect("valid regex"))
}

fn blank_lines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("valid regex"))
}

/// Normalize raw extracted text. Pure, no I/O.
pub fn normalize(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let stripped: String = unified
        .chars()
        .filter(|&c| (c as u32) >= 32 || c == '\t' || c == '\n')
        .collect();

    let spaced = spaces_re().replace_all(&stripped, " ");
    let collapsed = blank_lines_re().replace_all(&spaced, "\n\n");

    collapsed.trim().to_string()
}

/// Count of non-whitespace characters in `text`.
pub fn content_length(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// True if `text` has at least `min_length` non-whitespace characters.
pub fn has_significant_content(text: &str, min_length: usize) -> bool {
    !text.is_empty() && content_length(text) >= min_length
}
