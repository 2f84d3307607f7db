use tower_lsp::lsp_types::{Position, Range};

use super::Context;

/// Text of `line` up to the cursor.
pub fn line_prefix(context: &Context, line: usize, character: usize) -> Option<String> {
    context.document.line_prefix(Position {
        line: line as u32,
        character: character as u32,
    })
}

/// Range of the last occurrence of any of `markers` in the line prefix.
///
/// Plain substring search: a marker that was closed earlier on the line still
/// counts.
pub fn last_marker_range(prefix: &str, markers: &[&str], line: usize) -> Option<Range> {
    let (byte_start, marker) = markers
        .iter()
        .filter_map(|marker| prefix.rfind(marker).map(|start| (start, *marker)))
        .max_by_key(|(start, _)| *start)?;

    let start = utf16_offset(prefix, byte_start);
    let end = start + marker.encode_utf16().count();

    Some(Range {
        start: Position {
            line: line as u32,
            character: start as u32,
        },
        end: Position {
            line: line as u32,
            character: end as u32,
        },
    })
}

/// LSP column (UTF-16 code units) of a byte offset in `text`.
pub fn utf16_offset(text: &str, byte_offset: usize) -> usize {
    text.get(..byte_offset)
        .unwrap_or(text)
        .encode_utf16()
        .count()
}

/// Escape text for use inside a snippet placeholder.
pub fn escape_snippet(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('$', "\\$")
        .replace('}', "\\}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_marker_range() {
        let range = last_marker_range("see [[a]] and [[", &["[[", "【【"], 2).unwrap();
        assert_eq!(range.start, Position::new(2, 14));
        assert_eq!(range.end, Position::new(2, 16));
    }

    #[test]
    fn test_full_width_marker_is_one_unit_per_character() {
        let range = last_marker_range("说明【【", &["[[", "【【"], 0).unwrap();
        assert_eq!(range.start, Position::new(0, 2));
        assert_eq!(range.end, Position::new(0, 4));
    }

    #[test]
    fn test_astral_characters_count_two_units() {
        let range = last_marker_range("🚀 go [[", &["[[", "【【"], 0).unwrap();
        assert_eq!(range.start, Position::new(0, 6));
        assert_eq!(range.end, Position::new(0, 8));
    }

    #[test]
    fn test_utf16_offset() {
        assert_eq!(utf16_offset("a🚀b", 5), 3);
        assert_eq!(utf16_offset("中文", 3), 1);
        assert_eq!(utf16_offset("abc", 10), 3);
    }

    #[test]
    fn test_rightmost_marker_wins() {
        let range = last_marker_range("【【x [[", &["[[", "【【"], 0).unwrap();
        assert_eq!(range.start.character, 4);
    }

    #[test]
    fn test_no_marker() {
        assert!(last_marker_range("plain [text]", &["[[", "【【"], 0).is_none());
    }

    #[test]
    fn test_escape_snippet() {
        assert_eq!(escape_snippet("cost $5 {x}"), "cost \\$5 {x\\}");
        assert_eq!(escape_snippet("a\\b"), "a\\\\b");
    }
}
