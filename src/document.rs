//! Snapshots of editor buffers.

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use ropey::Rope;
use tower_lsp::lsp_types::{Position, Url};

/// A text buffer as last synchronised from the client.
#[derive(Debug, Clone)]
pub struct Document {
    uri: Url,
    language_id: String,
    rope: Rope,
}

impl Document {
    pub fn new(uri: Url, language_id: impl Into<String>, text: &str) -> Document {
        Document {
            uri,
            language_id: language_id.into(),
            rope: Rope::from_str(text),
        }
    }

    /// A markdown document backed by a file on disk.
    pub fn from_path(path: &Path, text: &str) -> anyhow::Result<Document> {
        let uri = Url::from_file_path(path)
            .map_err(|_| anyhow!("Can't convert {} to a file url", path.display()))?;

        Ok(Document::new(uri, "markdown", text))
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Whether the providers serve this document: markdown saved on disk or
    /// not yet saved.
    pub fn is_markdown(&self) -> bool {
        self.language_id == "markdown" && matches!(self.uri.scheme(), "file" | "untitled")
    }

    /// Filesystem path; `None` for untitled buffers.
    pub fn path(&self) -> Option<PathBuf> {
        match self.uri.scheme() {
            "file" => self.uri.to_file_path().ok(),
            _ => None,
        }
    }

    /// The directory relative links of this document resolve against.
    pub fn directory(&self) -> Option<PathBuf> {
        self.path()
            .and_then(|path| path.parent().map(Path::to_path_buf))
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn replace_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    /// Text of the cursor's line up to the cursor. `position.character` is in
    /// UTF-16 code units; a cursor past the end of the line is clamped to the
    /// line end.
    pub fn line_prefix(&self, position: Position) -> Option<String> {
        let slice = self.rope.get_line(position.line as usize)?;
        let column = (position.character as usize).min(slice.len_utf16_cu());
        let end = slice.utf16_cu_to_char(column);

        let mut prefix = slice.slice(..end).to_string();
        while prefix.ends_with(['\n', '\r']) {
            prefix.pop();
        }

        Some(prefix)
    }
}
