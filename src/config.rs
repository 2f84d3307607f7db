use std::path::Path;

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;
use tower_lsp::lsp_types::ClientCapabilities;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// `[[` file link completions
    pub link_completions: bool,
    /// `[[#` completions from the headers of the current document
    pub heading_completions: bool,
    /// `file.md#` completions from the headers of the linked document
    pub file_heading_completions: bool,
    /// Upper bound on the markdown files listed for link completions
    pub max_link_files: usize,
    pub snippets: bool,
}

impl Settings {
    pub fn new(root_dir: &Path, capabilities: &ClientCapabilities) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/mdlink/settings");
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.mdlink",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("link_completions", true)?
            .set_default("heading_completions", true)?
            .set_default("file_heading_completions", true)?
            .set_default("max_link_files", 1000)?
            .set_default("snippets", true)?
            .set_override_option("snippets", snippet_override(capabilities))?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let settings = settings.try_deserialize::<Settings>()?;

        anyhow::Ok(settings)
    }
}

/// Clients that do not declare snippet support get plain link text.
fn snippet_override(capabilities: &ClientCapabilities) -> Option<bool> {
    let snippet_support = capabilities
        .text_document
        .as_ref()
        .and_then(|it| it.completion.as_ref())
        .and_then(|it| it.completion_item.as_ref())
        .and_then(|it| it.snippet_support);

    match snippet_support {
        Some(true) => None,
        _ => Some(false),
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            link_completions: true,
            heading_completions: true,
            file_heading_completions: true,
            max_link_files: 1000,
            snippets: true,
        }
    }
}
