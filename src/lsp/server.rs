//! Core LSP server implementation.

use crate::bridge::decorations::{scan, MentionKind};
use crate::color::{parse_color, rgba_to_hex, rgba_to_rgb_functional};
use crate::config::loader::{find_workspace_config, is_config_file};
use crate::config::{find_config_for_document, load_config, ThemeConfig};
use crate::named_colors::get_hex_color;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::notification::Notification;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};

use super::completions::{completions_for, resolve_completion_item, to_completion_item};
use super::context::classify;
use super::hover::{get_hover, word_span};
use super::notifications::{
    all_colors, color_value, ColorInfo, ColorValueParams, GetAllColors, GetColorValue,
};
use super::text::{byte_to_utf16, line_at, line_prefix, offset_to_position};

const CONFIG_WATCH_GLOB: &str = "**/europa.config.{js,cjs}";

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// The EuropaCSS language server
pub struct EuropaLanguageServer {
    client: Client,
    /// Document state tracking for open files
    documents: RwLock<HashMap<Url, String>>,
    workspace_roots: RwLock<Vec<PathBuf>>,
    /// Config the current theme was loaded from
    config_path: RwLock<Option<PathBuf>>,
    theme: RwLock<Arc<ThemeConfig>>,
}

impl EuropaLanguageServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: RwLock::new(HashMap::new()),
            workspace_roots: RwLock::new(Vec::new()),
            config_path: RwLock::new(None),
            theme: RwLock::new(Arc::new(ThemeConfig::default())),
        }
    }

    fn theme(&self) -> Arc<ThemeConfig> {
        Arc::clone(&read(&self.theme))
    }

    fn document(&self, uri: &Url) -> Option<String> {
        read(&self.documents).get(uri).cloned()
    }

    /// Find and load the config governing `document`, or the workspace config.
    ///
    /// Any failure leaves an empty theme in place.
    async fn reload_theme(&self, document: Option<PathBuf>) {
        let roots = read(&self.workspace_roots).clone();
        let found = match document {
            Some(document) => find_config_for_document(&document, &roots),
            None => find_workspace_config(&roots),
        };

        let theme = match &found {
            Some(path) => match load_config(path) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded theme config");
                    self.client
                        .log_message(
                            MessageType::INFO,
                            format!("EuropaCSS config loaded from {}", path.display()),
                        )
                        .await;
                    config.theme
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load theme config");
                    self.client
                        .log_message(
                            MessageType::WARNING,
                            format!("EuropaCSS config {} not loaded: {}", path.display(), e),
                        )
                        .await;
                    ThemeConfig::default()
                }
            },
            None => {
                debug!("no europa.config.js found");
                ThemeConfig::default()
            }
        };

        *write(&self.theme) = Arc::new(theme);
        *write(&self.config_path) = found;
    }

    /// Reload after the config changed and push every color to the client
    async fn refresh_theme(&self) {
        let hint = read(&self.config_path).clone();
        self.reload_theme(hint).await;
        self.get_all_colors().await;
    }

    /// `europacss/getAllColors`
    pub async fn get_all_colors(&self) {
        let infos = all_colors(&self.theme());
        debug!(count = infos.len(), "pushing all colors");
        for info in infos {
            self.client.send_notification::<ColorInfo>(info).await;
        }
    }

    /// `europacss/getColorValue`
    pub async fn get_color_value(&self, params: ColorValueParams) {
        let answer = color_value(&self.theme(), &params.color_name);
        match answer {
            Some(info) => self.client.send_notification::<ColorInfo>(info).await,
            None => debug!(color = %params.color_name, "not a theme color"),
        }
    }

    /// Swatches for `@color` values and hex literals in `text`
    pub fn document_colors(text: &str, theme: &ThemeConfig) -> Vec<ColorInformation> {
        let colors = theme.colors();

        scan(text)
            .into_iter()
            .filter_map(|mention| {
                let value = match mention.kind {
                    MentionKind::Hex => mention.name.to_string(),
                    MentionKind::Theme => {
                        let configured = colors.as_ref().and_then(|c| c.lookup(mention.name));
                        get_hex_color(configured.unwrap_or(mention.name))
                    }
                };
                let (red, green, blue, alpha) = parse_color(&value).ok()?.to_unit();
                Some(ColorInformation {
                    range: Range::new(
                        offset_to_position(text, mention.span.start),
                        offset_to_position(text, mention.span.end),
                    ),
                    color: Color { red, green, blue, alpha },
                })
            })
            .collect()
    }

    async fn watch_config_files(&self) {
        let options = DidChangeWatchedFilesRegistrationOptions {
            watchers: vec![FileSystemWatcher {
                glob_pattern: GlobPattern::String(CONFIG_WATCH_GLOB.to_string()),
                kind: None,
            }],
        };
        let registration = Registration {
            id: "europa-config-watcher".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: serde_json::to_value(options).ok(),
        };
        if let Err(e) = self.client.register_capability(vec![registration]).await {
            warn!(error = %e, "client refused config file watcher");
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for EuropaLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let mut roots: Vec<PathBuf> = params
            .workspace_folders
            .unwrap_or_default()
            .iter()
            .filter_map(|folder| folder.uri.to_file_path().ok())
            .collect();
        #[allow(deprecated)]
        let root_uri = params.root_uri;
        if roots.is_empty() {
            roots.extend(root_uri.and_then(|uri| uri.to_file_path().ok()));
        }
        debug!(?roots, "workspace roots");
        *write(&self.workspace_roots) = roots;

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "europa-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(true),
                    trigger_characters: Some(
                        ["@", " ", ".", "/", "-"].iter().map(|c| c.to_string()).collect(),
                    ),
                    ..Default::default()
                }),
                color_provider: Some(ColorProviderCapability::Simple(true)),
                ..Default::default()
            },
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.reload_theme(None).await;
        self.watch_config_files().await;
        self.client.log_message(MessageType::INFO, "EuropaCSS LSP initialized").await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        write(&self.documents).insert(uri.clone(), params.text_document.text);

        // A config outside the workspace roots can only be found from a document
        let unconfigured = read(&self.config_path).is_none();
        if unconfigured {
            if let Ok(path) = uri.to_file_path() {
                self.reload_theme(Some(path)).await;
            }
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // FULL sync: the first change carries the whole text
        if let Some(change) = params.content_changes.into_iter().next() {
            write(&self.documents).insert(params.text_document.uri, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        write(&self.documents).remove(&params.text_document.uri);
    }

    async fn did_change_configuration(&self, _params: DidChangeConfigurationParams) {
        self.refresh_theme().await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let touches_config = params
            .changes
            .iter()
            .filter_map(|change| change.uri.to_file_path().ok())
            .any(|path| is_config_file(&path));
        if touches_config {
            self.refresh_theme().await;
        }
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position.position;
        let Some(content) = self.document(&params.text_document_position.text_document.uri)
        else {
            return Ok(None);
        };

        let context = classify(line_prefix(&content, position));
        let records = completions_for(context, &self.theme());
        debug!(?context, count = records.len(), "completion");

        let items = records.into_iter().map(to_completion_item).collect();
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn completion_resolve(&self, item: CompletionItem) -> Result<CompletionItem> {
        Ok(resolve_completion_item(item))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params.position;
        let Some(content) =
            self.document(&params.text_document_position_params.text_document.uri)
        else {
            return Ok(None);
        };

        let line = line_at(&content, position.line);
        let Some(span) = word_span(line, position.character) else {
            return Ok(None);
        };
        let range = Range::new(
            Position::new(position.line, byte_to_utf16(line, span.start)),
            Position::new(position.line, byte_to_utf16(line, span.end)),
        );

        Ok(get_hover(&line[span], line, &self.theme()).map(|value| Hover {
            contents: HoverContents::Markup(MarkupContent { kind: MarkupKind::Markdown, value }),
            range: Some(range),
        }))
    }

    async fn document_color(&self, params: DocumentColorParams) -> Result<Vec<ColorInformation>> {
        let Some(content) = self.document(&params.text_document.uri) else {
            return Ok(Vec::new());
        };
        Ok(Self::document_colors(&content, &self.theme()))
    }

    async fn color_presentation(
        &self,
        params: ColorPresentationParams,
    ) -> Result<Vec<ColorPresentation>> {
        let Color { red, green, blue, alpha } = params.color;

        let presentations = [
            rgba_to_hex(red, green, blue, alpha),
            rgba_to_rgb_functional(red, green, blue, alpha),
        ]
        .into_iter()
        .map(|text| ColorPresentation {
            label: text.clone(),
            text_edit: Some(TextEdit { range: params.range, new_text: text }),
            additional_text_edits: None,
        })
        .collect();

        Ok(presentations)
    }
}

/// Run the LSP server on stdin/stdout
pub async fn run_server() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(EuropaLanguageServer::new)
        .custom_method(GetAllColors::METHOD, EuropaLanguageServer::get_all_colors)
        .custom_method(GetColorValue::METHOD, EuropaLanguageServer::get_color_value)
        .finish();
    Server::new(stdin, stdout, socket).serve(service).await;
}
