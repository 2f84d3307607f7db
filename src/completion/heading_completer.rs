//! `[[#` completes into a link to a header of the current document.

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, InsertTextFormat, Range};

use crate::{
    commands::{LinkCommand, RemoveTriggerMarker},
    document::Document,
    headers::{parse_markdown_headers, slugify},
    logsink::LogSink,
    transliterate::with_pinyin,
};

use super::{
    util::{last_marker_range, line_prefix},
    Completable, Completer, Context,
};

const HEADING_MARKERS: [&str; 2] = ["[[#", "【【#"];

pub struct HeadingCompleter<'a> {
    /// The `[[#` or `【【#` that triggered completion
    marker: Range,
    document: &'a Document,
    log: &'a dyn LogSink,
}

impl<'a> Completer<'a> for HeadingCompleter<'a> {
    const TRIGGER_CHARACTERS: &'static [&'static str] = &["#"];

    fn construct(context: Context<'a>, line: usize, character: usize) -> Option<Self>
    where
        Self: Sized,
    {
        if !context.settings.heading_completions {
            return None;
        }

        let prefix = line_prefix(&context, line, character)?;
        let marker = last_marker_range(&prefix, &HEADING_MARKERS, line)?;

        Some(HeadingCompleter {
            marker,
            document: context.document,
            log: context.log,
        })
    }

    fn completions(&self) -> anyhow::Result<Vec<impl Completable<'a, HeadingCompleter<'a>>>> {
        let headers = parse_markdown_headers(&self.document.text());
        self.log
            .append_line(&format!("headers count is {}", headers.len()));

        Ok(headers.into_iter().map(HeadingCompletion).collect())
    }

    type FilterParams = String;

    fn completion_filter_text(&self, header: Self::FilterParams) -> String {
        with_pinyin(&header)
    }
}

/// A header of the current document.
pub struct HeadingCompletion(String);

impl<'a> Completable<'a, HeadingCompleter<'a>> for HeadingCompletion {
    fn completions(&self, completer: &HeadingCompleter<'a>) -> Option<CompletionItem> {
        let HeadingCompletion(header) = self;

        let command = LinkCommand::RemoveTriggerMarker(RemoveTriggerMarker {
            uri: completer.document.uri().clone(),
            range: completer.marker,
        });

        Some(CompletionItem {
            label: header.clone(),
            kind: Some(CompletionItemKind::REFERENCE),
            filter_text: Some(completer.completion_filter_text(header.clone())),
            insert_text: Some(format!("[{}](#{})", header, slugify(header))),
            insert_text_format: Some(InsertTextFormat::PLAIN_TEXT),
            command: Some(command.to_command()),
            ..Default::default()
        })
    }
}
