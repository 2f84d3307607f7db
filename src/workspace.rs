//! The workspace folder the server was started for.

use std::path::{Path, PathBuf};

use anyhow::Context;
use pathdiff::diff_paths;
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone)]
pub struct Workspace {
    root_dir: PathBuf,
}

impl Workspace {
    pub fn new(root_dir: impl Into<PathBuf>) -> Workspace {
        Workspace {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Markdown files below the root, at most `limit` of them, in a stable
    /// (file name sorted) walk order. Hidden files and directories are skipped.
    ///
    /// Any error while walking fails the whole listing.
    pub fn find_markdown_files(&self, limit: usize) -> anyhow::Result<Vec<PathBuf>> {
        WalkDir::new(&self.root_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
            .filter(|entry| entry.as_ref().map_or(true, is_markdown_file))
            .take(limit)
            .map(|entry| {
                entry
                    .map(DirEntry::into_path)
                    .with_context(|| format!("Failed to list {}", self.root_dir.display()))
            })
            .collect()
    }

    /// Display form of `path`: relative to the root with `/` separators, or
    /// the path itself when it lies outside the workspace.
    pub fn relative_display(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root_dir) {
            Ok(relative) => to_slash(relative),
            Err(_) => path.to_string_lossy().to_string(),
        }
    }
}

/// Path of `path` relative to the directory `base`.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Join the components of `path` with `/`, whatever the platform separator.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn is_markdown_file(entry: &DirEntry) -> bool {
    !entry.file_type().is_dir() && entry.path().extension().and_then(|e| e.to_str()) == Some("md")
}
