//! Header extraction for Markdown documents.
//!
//! Headers are found with a plain line scan: a line starting with one or more
//! `#` followed by at least one space and a title. Fenced code blocks are not tracked,
//! so a `# comment` inside a shell snippet is reported as a header too.

use once_cell::sync::Lazy;
use regex::Regex;

/// Extract the header titles of `text` in document order.
///
/// Titles are trimmed; duplicates are kept.
pub fn parse_markdown_headers(text: &str) -> Vec<String> {
    static HEADING_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^#+ +(?<heading_text>\S.*)$").unwrap());

    text.lines()
        .filter_map(|line| HEADING_RE.captures(line))
        .filter_map(|captures| captures.name("heading_text"))
        .map(|heading| heading.as_str().trim().to_string())
        .collect()
}

/// Anchor fragment for a header title: lower-cased, spaces encoded as `%20`.
pub fn slugify(header: &str) -> String {
    header.to_lowercase().replace(' ', "%20")
}
