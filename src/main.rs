use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use mdlink::{
    commands::LinkCommand,
    completion::{get_completions, trigger_characters, Context},
    config::Settings,
    document::Document,
    logsink::LogSink,
    workspace::Workspace,
};
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing_subscriber::EnvFilter;

/// Markdown link and header completion over the Language Server Protocol.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Communicate over stdin/stdout. This is the only transport; the flag is
    /// accepted because many clients pass it.
    #[arg(long)]
    stdio: bool,

    /// Filter for the log written to stderr; `RUST_LOG` takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Forwards completer diagnostics to the client's log.
struct ClientLog {
    sender: mpsc::UnboundedSender<String>,
}

impl ClientLog {
    fn spawn(client: Client) -> ClientLog {
        let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            while let Some(line) = receiver.recv().await {
                client.log_message(MessageType::LOG, line).await;
            }
        });

        ClientLog { sender }
    }
}

impl LogSink for ClientLog {
    fn append_line(&self, line: &str) {
        tracing::debug!("{}", line);
        // Only fails once the server is shutting down.
        let _ = self.sender.send(line.to_string());
    }
}

struct Backend {
    client: Client,
    log: Arc<ClientLog>,
    documents: Arc<RwLock<HashMap<Url, Document>>>,
    workspace: Arc<RwLock<Option<Workspace>>>,
    settings: Arc<RwLock<Settings>>,
}

impl Backend {
    fn new(client: Client) -> Backend {
        Backend {
            log: Arc::new(ClientLog::spawn(client.clone())),
            client,
            documents: Default::default(),
            workspace: Default::default(),
            settings: Default::default(),
        }
    }

    #[allow(deprecated)]
    fn root_dir(params: &InitializeParams) -> Option<PathBuf> {
        params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .map(|folder| &folder.uri)
            .or(params.root_uri.as_ref())
            .and_then(|uri| uri.to_file_path().ok())
            .or_else(|| std::env::current_dir().ok())
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let root_dir = Self::root_dir(&params).ok_or_else(|| {
            Error::invalid_params("Can't determine a workspace folder".to_string())
        })?;

        let settings = match Settings::new(&root_dir, &params.capabilities) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!("Falling back to default settings: {:#}", err);
                Settings::default()
            }
        };

        tracing::info!("Workspace root {}", root_dir.display());
        tracing::debug!("{:?}", settings);

        *self.workspace.write().await = Some(Workspace::new(root_dir));
        *self.settings.write().await = settings;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(trigger_characters()),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: LinkCommand::NAMES.map(String::from).to_vec(),
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "mdlink initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        let document = Document::new(item.uri.clone(), item.language_id, &item.text);

        self.documents.write().await.insert(item.uri, document);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change holds the whole text.
        let Some(change) = params.content_changes.last() else {
            return;
        };

        if let Some(document) = self
            .documents
            .write()
            .await
            .get_mut(&params.text_document.uri)
        {
            document.replace_text(&change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents
            .write()
            .await
            .remove(&params.text_document.uri);
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let trigger_character = params
            .context
            .and_then(|context| context.trigger_character);

        let Some(document) = self.documents.read().await.get(&uri).cloned() else {
            return Ok(None);
        };
        if !document.is_markdown() {
            return Ok(None);
        }

        let Some(workspace) = self.workspace.read().await.clone() else {
            return Ok(None);
        };
        let settings = self.settings.read().await.clone();
        let log = self.log.clone();

        let completions = tokio::task::spawn_blocking(move || {
            let context = Context::new(&document, &workspace, &settings, &*log);
            get_completions(context, position, trigger_character.as_deref())
        })
        .await;

        match completions {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => {
                self.log
                    .append_line(&format!("completion failed: {:#}", err));
                Err(Error::internal_error())
            }
            Err(err) => {
                tracing::error!("Completion task failed: {}", err);
                Err(Error::internal_error())
            }
        }
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let command = LinkCommand::from_params(&params.command, &params.arguments)
            .map_err(|err| Error::invalid_params(format!("{:#}", err)))?;

        let response = self.client.apply_edit(command.workspace_edit()).await?;
        if !response.applied {
            self.log.append_line(&format!(
                "{} was not applied: {}",
                command.name(),
                response.failure_reason.unwrap_or_default()
            ));
        }

        Ok(None)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!(stdio = cli.stdio, "Starting mdlink server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
