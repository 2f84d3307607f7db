use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, InsertTextFormat, Range};

use crate::{
    commands::{LinkCommand, RemoveTriggerMarker},
    config::Settings,
    document::Document,
    transliterate::with_pinyin,
    workspace::{relative_to, to_slash, Workspace},
};

use super::{
    util::{escape_snippet, last_marker_range, line_prefix},
    Completable, Completer, Context,
};

const LINK_MARKERS: [&str; 2] = ["[[", "【【"];

/// Completes `[[` into a markdown link to any note of the workspace.
pub struct LinkCompleter<'a> {
    /// The `[[` or `【【` that triggered completion
    marker: Range,
    document: &'a Document,
    workspace: &'a Workspace,
    settings: &'a Settings,
}

impl<'a> LinkCompleter<'a> {
    /// Relative links are written from the document's directory; untitled
    /// documents link from the workspace root.
    fn base_dir(&self) -> PathBuf {
        self.document
            .directory()
            .unwrap_or_else(|| self.workspace.root_dir().to_path_buf())
    }
}

impl<'a> Completer<'a> for LinkCompleter<'a> {
    const TRIGGER_CHARACTERS: &'static [&'static str] = &["[", "【"];

    fn construct(context: Context<'a>, line: usize, character: usize) -> Option<Self>
    where
        Self: Sized,
    {
        if !context.settings.link_completions {
            return None;
        }

        let prefix = line_prefix(&context, line, character)?;
        let marker = last_marker_range(&prefix, &LINK_MARKERS, line)?;

        Some(LinkCompleter {
            marker,
            document: context.document,
            workspace: context.workspace,
            settings: context.settings,
        })
    }

    fn completions(&self) -> anyhow::Result<Vec<impl Completable<'a, LinkCompleter<'a>>>> {
        let files = self
            .workspace
            .find_markdown_files(self.settings.max_link_files)?;

        let base_dir = self.base_dir();

        let completions = files
            .into_par_iter()
            .filter_map(|path| LinkCompletion::new(path, &base_dir))
            .collect::<Vec<_>>();

        Ok(completions)
    }

    /// (file name, `/` separated relative path)
    type FilterParams = (String, String);

    fn completion_filter_text(&self, (file_name, relative): Self::FilterParams) -> String {
        with_pinyin(&format!("{} {}", file_name, relative.replace('/', " ")))
    }
}

/// One markdown file of the workspace.
#[derive(Debug, Clone)]
pub struct LinkCompletion {
    path: PathBuf,
    /// File name without the `.md` extension
    file_name: String,
    /// Path relative to the linking document, platform separators
    relative: String,
}

impl LinkCompletion {
    fn new(path: PathBuf, base_dir: &Path) -> Option<LinkCompletion> {
        let file_name = path.file_stem()?.to_str()?.to_string();
        let relative = relative_to(&path, base_dir).to_string_lossy().to_string();

        Some(LinkCompletion {
            path,
            file_name,
            relative,
        })
    }

    /// The link target as written into the document.
    fn link_target(&self) -> String {
        to_slash(Path::new(&self.relative)).replace(' ', "%20")
    }

    /// Shorter paths first; padded so that 10 sorts after 9.
    fn sort_text(&self) -> String {
        format!(
            "{:05}{}",
            self.relative.encode_utf16().count(),
            self.file_name
        )
    }
}

impl<'a> Completable<'a, LinkCompleter<'a>> for LinkCompletion {
    fn completions(&self, completer: &LinkCompleter<'a>) -> Option<CompletionItem> {
        let normalized = self.relative.replace('\\', "/");
        let filter_text = completer.completion_filter_text((self.file_name.clone(), normalized));
        let target = self.link_target();

        let (insert_text, insert_text_format) = if completer.settings.snippets {
            (
                format!(
                    "[${{1:{}}}]({})",
                    escape_snippet(&self.file_name),
                    escape_snippet(&target)
                ),
                InsertTextFormat::SNIPPET,
            )
        } else {
            (
                format!("[{}]({})", self.file_name, target),
                InsertTextFormat::PLAIN_TEXT,
            )
        };

        let command = LinkCommand::RemoveTriggerMarker(RemoveTriggerMarker {
            uri: completer.document.uri().clone(),
            range: completer.marker,
        });

        Some(CompletionItem {
            label: self.file_name.clone(),
            kind: Some(CompletionItemKind::FILE),
            detail: Some(completer.workspace.relative_display(&self.path)),
            sort_text: Some(self.sort_text()),
            filter_text: Some(filter_text),
            insert_text: Some(insert_text),
            insert_text_format: Some(insert_text_format),
            command: Some(command.to_command()),
            ..Default::default()
        })
    }
}
