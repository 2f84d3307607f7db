//! Follow-up commands attached to completion items.
//!
//! The editor runs an item's command after it has inserted the item. The
//! server receives it through `workspace/executeCommand` and answers with a
//! `workspace/applyEdit`, so the document is only ever changed by the editor.

use std::collections::HashMap;

use anyhow::{anyhow, Context as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_lsp::lsp_types::{Command, Range, TextEdit, Url, WorkspaceEdit};

pub const REMOVE_TRIGGER_MARKER: &str = "mdlink.removeTriggerMarker";
pub const REPLACE_LINK_CONTENT: &str = "mdlink.replaceLinkContent";

/// Deletes the `[[` / `【【` (or `[[#`) that only served to trigger completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveTriggerMarker {
    pub uri: Url,
    pub range: Range,
}

/// Rewrites a link whose fragment was just completed.
///
/// `range` covers the link as it reads after the slug was inserted, from its
/// opening `[` to the end of the slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceLinkContent {
    pub uri: Url,
    pub range: Range,
    pub label: String,
    pub path: String,
    pub slug: String,
}

impl ReplaceLinkContent {
    pub fn link_text(&self) -> String {
        format!("[{}]({}#{})", self.label, self.path, self.slug)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkCommand {
    RemoveTriggerMarker(RemoveTriggerMarker),
    ReplaceLinkContent(ReplaceLinkContent),
}

impl LinkCommand {
    /// Every command the server can execute.
    pub const NAMES: [&'static str; 2] = [REMOVE_TRIGGER_MARKER, REPLACE_LINK_CONTENT];

    pub fn name(&self) -> &'static str {
        match self {
            LinkCommand::RemoveTriggerMarker(_) => REMOVE_TRIGGER_MARKER,
            LinkCommand::ReplaceLinkContent(_) => REPLACE_LINK_CONTENT,
        }
    }

    /// The LSP command to attach to a completion item.
    pub fn to_command(&self) -> Command {
        let (title, argument) = match self {
            LinkCommand::RemoveTriggerMarker(args) => {
                ("Remove link trigger", serde_json::to_value(args))
            }
            LinkCommand::ReplaceLinkContent(args) => {
                ("Rewrite heading link", serde_json::to_value(args))
            }
        };

        Command {
            title: title.to_string(),
            command: self.name().to_string(),
            arguments: argument.ok().map(|argument| vec![argument]),
        }
    }

    /// Parse the arguments of a `workspace/executeCommand` request.
    pub fn from_params(command: &str, arguments: &[Value]) -> anyhow::Result<LinkCommand> {
        let argument = arguments
            .first()
            .cloned()
            .ok_or(anyhow!("{command} expects one argument"))?;

        match command {
            REMOVE_TRIGGER_MARKER => serde_json::from_value(argument)
                .map(LinkCommand::RemoveTriggerMarker)
                .with_context(|| format!("Invalid arguments for {command}")),
            REPLACE_LINK_CONTENT => serde_json::from_value(argument)
                .map(LinkCommand::ReplaceLinkContent)
                .with_context(|| format!("Invalid arguments for {command}")),
            unknown => Err(anyhow!("Unknown command {unknown}")),
        }
    }

    pub fn workspace_edit(&self) -> WorkspaceEdit {
        let (uri, edit) = match self {
            LinkCommand::RemoveTriggerMarker(args) => (
                args.uri.clone(),
                TextEdit {
                    range: args.range,
                    new_text: String::new(),
                },
            ),
            LinkCommand::ReplaceLinkContent(args) => (
                args.uri.clone(),
                TextEdit {
                    range: args.range,
                    new_text: args.link_text(),
                },
            ),
        };

        WorkspaceEdit {
            changes: Some(HashMap::from([(uri, vec![edit])])),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use tower_lsp::lsp_types::Position;

    use super::*;
    use crate::test_utils::apply_workspace_edit;

    fn uri() -> Url {
        Url::parse("file:///notes/b.md").unwrap()
    }

    fn replace_link() -> LinkCommand {
        LinkCommand::ReplaceLinkContent(ReplaceLinkContent {
            uri: uri(),
            range: Range::new(Position::new(0, 4), Position::new(0, 30)),
            label: "x".to_string(),
            path: "other.md".to_string(),
            slug: "section%20one".to_string(),
        })
    }

    #[test]
    fn test_command_round_trips_through_params() {
        let command = replace_link();
        let lsp_command = command.to_command();

        assert_eq!(lsp_command.command, REPLACE_LINK_CONTENT);
        let parsed = LinkCommand::from_params(
            &lsp_command.command,
            &lsp_command.arguments.unwrap_or_default(),
        )
        .unwrap();
        assert_eq!(parsed, command);
    }

    #[test]
    fn test_remove_marker_edit() {
        let command = LinkCommand::RemoveTriggerMarker(RemoveTriggerMarker {
            uri: uri(),
            range: Range::new(Position::new(0, 4), Position::new(0, 6)),
        });

        let text = apply_workspace_edit("see [[[a](a.md) now", &command.workspace_edit(), &uri());

        assert_eq!(text, "see [a](a.md) now");
    }

    #[test]
    fn test_replace_link_edit_closes_the_link() {
        let text = apply_workspace_edit(
            "see [x](other.md#section%20one",
            &replace_link().workspace_edit(),
            &uri(),
        );

        assert_eq!(text, "see [x](other.md#section%20one)");
    }

    #[test]
    fn test_unknown_command() {
        let argument = serde_json::json!({});
        assert!(LinkCommand::from_params("mdlink.other", &[argument]).is_err());
    }

    #[test]
    fn test_missing_arguments() {
        assert!(LinkCommand::from_params(REMOVE_TRIGGER_MARKER, &[]).is_err());
    }

    #[test]
    fn test_malformed_arguments() {
        let argument = serde_json::json!({ "uri": "file:///a.md" });
        assert!(LinkCommand::from_params(REMOVE_TRIGGER_MARKER, &[argument]).is_err());
    }
}
