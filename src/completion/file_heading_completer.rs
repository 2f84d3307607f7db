//! `[label](other.md#` completes the fragment with a header of `other.md`.
//!
//! The editor only inserts the slug; the attached command then rewrites the
//! whole link so it reads `[label](other.md#slug)`.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, InsertTextFormat, Position, Range};

use crate::{
    commands::{LinkCommand, ReplaceLinkContent},
    document::Document,
    headers::{parse_markdown_headers, slugify},
    transliterate::with_pinyin,
};

use super::{
    util::{line_prefix, utf16_offset},
    Completable, Completer, Context,
};

pub struct FileHeadingCompleter<'a> {
    /// Display text of the link
    label: String,
    /// Link target as written, still percent-encoded
    link_path: String,
    /// Where the link's `[` is on the line
    link_start: Position,
    position: Position,
    /// Headers of the linked file
    headers: Vec<String>,
    document: &'a Document,
}

impl<'a> Completer<'a> for FileHeadingCompleter<'a> {
    const TRIGGER_CHARACTERS: &'static [&'static str] = &["#"];

    fn construct(context: Context<'a>, line: usize, character: usize) -> Option<Self>
    where
        Self: Sized,
    {
        if !context.settings.file_heading_completions {
            return None;
        }

        let prefix = line_prefix(&context, line, character)?;
        if !prefix.ends_with(".md#") {
            return None;
        }

        static PARTIAL_MDLINK_REGEX: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\[(?<label>.*?)\]\((?<path>.*?\.md)#").unwrap());

        // Scan from the last `[` only; link labels containing brackets are not supported.
        let window_start = prefix.rfind('[').unwrap_or(0);
        let window = &prefix[window_start..];

        let Some(captures) = PARTIAL_MDLINK_REGEX.captures_iter(window).last() else {
            context.log.append_line(&format!("linePrefix is {}", window));
            return None;
        };

        let (full, label, link_path) = (
            captures.get(0)?,
            captures.name("label")?,
            captures.name("path")?,
        );

        let base_dir = context
            .document
            .directory()
            .unwrap_or_else(|| context.workspace.root_dir().to_path_buf());
        let joined = base_dir.join(link_path.as_str().trim_start_matches('/'));

        let target = match urlencoding::decode(&joined.to_string_lossy()) {
            Ok(decoded) => PathBuf::from(decoded.into_owned()),
            Err(err) => {
                context
                    .log
                    .append_line(&format!("can't decode {}: {}", joined.display(), err));
                return None;
            }
        };

        if !target.exists() {
            context.log.append_line(&format!("md link is {}", full.as_str()));
            context
                .log
                .append_line(&format!("file not exists {}", target.display()));
            return None;
        }

        let text = match std::fs::read_to_string(&target) {
            Ok(text) => text,
            Err(err) => {
                context
                    .log
                    .append_line(&format!("can't read {}: {}", target.display(), err));
                return None;
            }
        };

        Some(FileHeadingCompleter {
            label: label.as_str().to_string(),
            link_path: link_path.as_str().to_string(),
            link_start: Position {
                line: line as u32,
                character: utf16_offset(&prefix, window_start + full.start()) as u32,
            },
            position: Position {
                line: line as u32,
                character: character as u32,
            },
            headers: parse_markdown_headers(&text),
            document: context.document,
        })
    }

    fn completions(&self) -> anyhow::Result<Vec<impl Completable<'a, FileHeadingCompleter<'a>>>> {
        Ok(self
            .headers
            .iter()
            .cloned()
            .map(FileHeadingCompletion)
            .collect())
    }

    type FilterParams = String;

    fn completion_filter_text(&self, header: Self::FilterParams) -> String {
        with_pinyin(&header)
    }
}

/// A header of the linked file.
pub struct FileHeadingCompletion(String);

impl<'a> Completable<'a, FileHeadingCompleter<'a>> for FileHeadingCompletion {
    fn completions(&self, completer: &FileHeadingCompleter<'a>) -> Option<CompletionItem> {
        let FileHeadingCompletion(header) = self;
        let slug = slugify(header);

        // The link as it reads once the slug is inserted at the cursor.
        let inserted_end = Position {
            line: completer.position.line,
            character: completer.position.character + slug.encode_utf16().count() as u32,
        };

        let command = LinkCommand::ReplaceLinkContent(ReplaceLinkContent {
            uri: completer.document.uri().clone(),
            range: Range {
                start: completer.link_start,
                end: inserted_end,
            },
            label: completer.label.clone(),
            path: completer.link_path.clone(),
            slug: slug.clone(),
        });

        Some(CompletionItem {
            label: header.clone(),
            kind: Some(CompletionItemKind::REFERENCE),
            filter_text: Some(completer.completion_filter_text(header.clone())),
            insert_text: Some(slug),
            insert_text_format: Some(InsertTextFormat::PLAIN_TEXT),
            command: Some(command.to_command()),
            ..Default::default()
        })
    }
}
