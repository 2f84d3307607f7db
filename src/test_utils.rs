//! Shared test utilities for mdlink.
//!
//! This module provides common helpers used across multiple test modules.
//! It is only compiled when running tests.

use std::fs;
use std::path::PathBuf;

use ropey::Rope;
use tempfile::TempDir;
use tower_lsp::lsp_types::{Position, TextEdit, Url, WorkspaceEdit};

use crate::workspace::Workspace;

/// Creates a temporary workspace directory for testing.
///
/// Returns a tuple of (TempDir, PathBuf) where:
/// - TempDir: The temp directory handle (must be kept alive for the test duration)
/// - PathBuf: The path to the workspace subdirectory
///
/// The file listing skips hidden entries, and on some systems temp
/// directories live under paths like `/tmp/.tmpXXXXX`; the non-hidden
/// `workspace` subdirectory keeps fixtures visible.
pub fn create_test_workspace_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let workspace_dir = temp_dir.path().join("workspace");
    fs::create_dir(&workspace_dir).expect("Failed to create workspace subdirectory");
    (temp_dir, workspace_dir)
}

/// Creates a workspace whose files are written by `files`: pairs of
/// (path relative to the root, content). Parent directories are created.
pub fn create_test_workspace(files: &[(&str, &str)]) -> (TempDir, PathBuf, Workspace) {
    let (temp_dir, workspace_dir) = create_test_workspace_dir();

    for (relative, content) in files {
        let path = workspace_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
    }

    let workspace = Workspace::new(&workspace_dir);
    (temp_dir, workspace_dir, workspace)
}

/// Applies the edits `edit` holds for `uri` to `text`, the way an editor
/// would on `workspace/applyEdit`.
pub fn apply_workspace_edit(text: &str, edit: &WorkspaceEdit, uri: &Url) -> String {
    let edits = edit
        .changes
        .as_ref()
        .and_then(|changes| changes.get(uri))
        .cloned()
        .unwrap_or_default();

    apply_text_edits(text, edits)
}

pub fn apply_text_edits(text: &str, mut edits: Vec<TextEdit>) -> String {
    let mut rope = Rope::from_str(text);

    // Back to front so earlier offsets stay valid.
    edits.sort_by_key(|edit| {
        std::cmp::Reverse((edit.range.start.line, edit.range.start.character))
    });

    for edit in edits {
        let start = char_index(&rope, edit.range.start);
        let end = char_index(&rope, edit.range.end);
        rope.remove(start..end);
        rope.insert(start, &edit.new_text);
    }

    rope.to_string()
}

/// Char index of an LSP position, whose column is in UTF-16 code units.
fn char_index(rope: &Rope, position: Position) -> usize {
    let line = position.line as usize;
    rope.line_to_char(line) + rope.line(line).utf16_cu_to_char(position.character as usize)
}
