use tower_lsp::lsp_types::{CompletionItem, CompletionList, CompletionResponse, Position};

use crate::{config::Settings, document::Document, logsink::LogSink, workspace::Workspace};

use self::{
    file_heading_completer::FileHeadingCompleter, heading_completer::HeadingCompleter,
    link_completer::LinkCompleter,
};

mod file_heading_completer;
mod heading_completer;
mod link_completer;
mod util;

/// Everything a completer may look at for one request.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    document: &'a Document,
    workspace: &'a Workspace,
    settings: &'a Settings,
    log: &'a dyn LogSink,
}

impl<'a> Context<'a> {
    pub fn new(
        document: &'a Document,
        workspace: &'a Workspace,
        settings: &'a Settings,
        log: &'a dyn LogSink,
    ) -> Context<'a> {
        Context {
            document,
            workspace,
            settings,
            log,
        }
    }
}

pub trait Completer<'a>: Sized {
    /// Characters on which the editor asks this completer again.
    const TRIGGER_CHARACTERS: &'static [&'static str];

    fn construct(context: Context<'a>, line: usize, character: usize) -> Option<Self>
    where
        Self: Sized + Completer<'a>;

    fn completions(&self) -> anyhow::Result<Vec<impl Completable<'a, Self>>>
    where
        Self: Sized;

    type FilterParams;
    /// Text the editor fuzzy matches typed input against
    fn completion_filter_text(&self, params: Self::FilterParams) -> String;
}

pub trait Completable<'a, T: Completer<'a>>: Sized {
    fn completions(&self, completer: &T) -> Option<CompletionItem>;
}

/// Trigger characters of all completers, for the server capabilities.
pub fn trigger_characters() -> Vec<String> {
    let mut characters = Vec::new();

    for character in LinkCompleter::TRIGGER_CHARACTERS
        .iter()
        .chain(HeadingCompleter::TRIGGER_CHARACTERS)
        .chain(FileHeadingCompleter::TRIGGER_CHARACTERS)
    {
        if !characters.iter().any(|known| known == character) {
            characters.push(character.to_string());
        }
    }

    characters
}

/// Run the completers for a completion request and merge what they return.
///
/// A request caused by a trigger character only reaches the completers
/// registered for that character; any other request reaches all of them.
/// `Ok(None)` means no completer accepted the position.
pub fn get_completions(
    context: Context,
    position: Position,
    trigger_character: Option<&str>,
) -> anyhow::Result<Option<CompletionResponse>> {
    let (line, character) = (position.line, position.character);

    let results = [
        run_completer::<FileHeadingCompleter>(context, line, character, trigger_character)?,
        run_completer::<HeadingCompleter>(context, line, character, trigger_character)?,
        run_completer::<LinkCompleter>(context, line, character, trigger_character)?,
    ];

    let items = results.into_iter().flatten().reduce(|mut items, more| {
        items.extend(more);
        items
    });

    Ok(items.map(|items| {
        CompletionResponse::List(CompletionList {
            is_incomplete: false,
            items,
        })
    }))
}

fn run_completer<'a, T: Completer<'a>>(
    context: Context<'a>,
    line: u32,
    character: u32,
    trigger_character: Option<&str>,
) -> anyhow::Result<Option<Vec<CompletionItem>>> {
    let registered = |trigger: &str| T::TRIGGER_CHARACTERS.iter().any(|c| *c == trigger);
    if trigger_character.is_some_and(|trigger| !registered(trigger)) {
        return Ok(None);
    }

    let Some(completer) = T::construct(context, line as usize, character as usize) else {
        return Ok(None);
    };

    let completions = completer
        .completions()?
        .into_iter()
        .flat_map(|completable| completable.completions(&completer))
        .collect::<Vec<CompletionItem>>();

    Ok(Some(completions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logsink::MemoryLog;
    use crate::test_utils::create_test_workspace;

    fn items(response: Option<CompletionResponse>) -> Vec<CompletionItem> {
        match response {
            Some(CompletionResponse::List(list)) => list.items,
            Some(CompletionResponse::Array(items)) => items,
            None => vec![],
        }
    }

    #[test]
    fn test_trigger_characters() {
        assert_eq!(trigger_characters(), vec!["[", "【", "#"]);
    }

    #[test]
    fn test_no_trigger_declines() {
        let (_temp_dir, root, workspace) = create_test_workspace(&[("a.md", "# A")]);
        let document = Document::from_path(&root.join("b.md"), "just text").unwrap();
        let (settings, log) = (Settings::default(), MemoryLog::new());
        let context = Context::new(&document, &workspace, &settings, &log);

        let response = get_completions(context, Position::new(0, 9), None).unwrap();

        assert!(response.is_none());
    }

    #[test]
    fn test_hash_trigger_skips_link_completer() {
        let (_temp_dir, root, workspace) = create_test_workspace(&[("a.md", "# A")]);
        let document = Document::from_path(&root.join("b.md"), "# Local\n[[#").unwrap();
        let (settings, log) = (Settings::default(), MemoryLog::new());
        let context = Context::new(&document, &workspace, &settings, &log);

        let labels = items(get_completions(context, Position::new(1, 3), Some("#")).unwrap())
            .into_iter()
            .map(|item| item.label)
            .collect::<Vec<_>>();

        assert_eq!(labels, vec!["Local"]);
    }

    #[test]
    fn test_typing_merges_all_accepting_completers() {
        let (_temp_dir, root, workspace) = create_test_workspace(&[("a.md", "# A")]);
        let document = Document::from_path(&root.join("b.md"), "# Local\n[[#").unwrap();
        let (settings, log) = (Settings::default(), MemoryLog::new());
        let context = Context::new(&document, &workspace, &settings, &log);

        let labels = items(get_completions(context, Position::new(1, 3), None).unwrap())
            .into_iter()
            .map(|item| item.label)
            .collect::<Vec<_>>();

        assert!(labels.contains(&"Local".to_string()));
        assert!(labels.contains(&"a".to_string()));
    }

    #[test]
    fn test_listing_failure_is_an_error() {
        let (_temp_dir, root, _workspace) = create_test_workspace(&[]);
        let workspace = Workspace::new(root.join("missing"));
        let document = Document::from_path(&root.join("b.md"), "[[").unwrap();
        let (settings, log) = (Settings::default(), MemoryLog::new());
        let context = Context::new(&document, &workspace, &settings, &log);

        assert!(get_completions(context, Position::new(0, 2), Some("[")).is_err());
    }
}
