//! Smarty Language Server implementation.

use std::sync::OnceLock;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService};
use tracing::{debug, info};

mod debounce;
mod document;
pub(crate) mod error;
mod lsp;
pub(crate) mod settings;
pub mod template;

pub use debounce::Debouncer;
pub use document::{DocumentState, DocumentStore, LineIndex};
pub use error::Error;
pub use lsp::{
    completion_response, legend, token_types, tokens_for_document, DelimiterStyleNotification,
    DelimiterStyleParams, DELIMITER_STYLE_METHOD,
};
pub use settings::{discover_settings, load_settings, Settings, SETTINGS_FILE};

use template::{CompletionQuery, LiteralMarkers};

pub struct Backend {
    client: Client,
    documents: DocumentStore,
    settings: OnceLock<Settings>,
    debouncer: OnceLock<Debouncer<Url>>,
    completions: InFlight,
    markers: LiteralMarkers,
}

impl Backend {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            documents: DocumentStore::new(),
            settings: OnceLock::new(),
            debouncer: OnceLock::new(),
            completions: InFlight::default(),
            markers: LiteralMarkers::default(),
        }
    }

    fn settings(&self) -> &Settings {
        self.settings.get_or_init(Settings::default)
    }

    /// Install workspace settings. Only the first call takes effect.
    fn configure(&self, settings: Settings) {
        if self.settings.set(settings).is_err() {
            debug!("settings already initialized, keeping the first");
        }
    }

    fn debouncer(&self) -> &Debouncer<Url> {
        self.debouncer
            .get_or_init(|| Debouncer::new(self.settings().debounce()))
    }

    /// Answer `smarty/delimiterStyle` requests for an open document.
    async fn delimiter_style(
        &self,
        params: TextDocumentIdentifier,
    ) -> Result<Option<DelimiterStyleParams>> {
        Ok(self
            .documents
            .get(&params.uri)
            .map(|doc| DelimiterStyleParams::detect(params.uri.clone(), doc.text())))
    }
}

/// Cancellation tokens of the include lookups still running, one per document.
#[derive(Debug, Default)]
struct InFlight {
    tokens: DashMap<Url, CancellationToken>,
}

impl InFlight {
    /// Register a lookup for `uri`, cancelling the one it supersedes.
    fn start(&self, uri: Url) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.tokens.insert(uri, token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Forget the entry for `uri` once its lookup is over.
    ///
    /// The caller's token is already cancelled at this point, so a newer
    /// lookup that replaced it keeps its live entry.
    fn finish(&self, uri: &Url) {
        self.tokens.remove_if(uri, |_, token| token.is_cancelled());
    }

    fn cancel(&self, uri: &Url) {
        if let Some((_, token)) = self.tokens.remove(uri) {
            token.cancel();
        }
    }

    fn cancel_all(&self) {
        self.tokens.retain(|_, token| {
            token.cancel();
            false
        });
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.tokens.len()
    }
}

/// Detect and push the delimiter dialect of a document to the client.
async fn publish_delimiter_style(client: &Client, uri: Url, text: &str) {
    let params = DelimiterStyleParams::detect(uri, text);
    debug!(uri = %params.uri, style = ?params.style, "publishing delimiter style");
    client
        .send_notification::<DelimiterStyleNotification>(params)
        .await;
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // Extract workspace root from params
        let workspace_root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|f| f.uri.to_file_path().ok())
            .or_else(|| {
                #[allow(deprecated)]
                params.root_uri.as_ref()?.to_file_path().ok()
            });

        if let Some(root) = workspace_root {
            let (settings, settings_dir) = settings::discover_settings(&root);
            info!(
                root = %root.display(),
                settings_dir = %settings_dir.display(),
                extension = settings.template_extension(),
                "workspace configured"
            );
            self.configure(settings);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![
                        "/".to_string(),
                        "\"".to_string(),
                        "'".to_string(),
                    ]),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(
                        SemanticTokensOptions {
                            legend: lsp::legend(),
                            full: Some(SemanticTokensFullOptions::Bool(true)),
                            range: None,
                            work_done_progress_options: WorkDoneProgressOptions::default(),
                        },
                    ),
                ),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("initialized");
        self.client
            .log_message(MessageType::INFO, "Smarty language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.debouncer().dispose();
        self.completions.cancel_all();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let state = self.documents.open(
            uri.clone(),
            params.text_document.text,
            params.text_document.version,
        );
        publish_delimiter_style(&self.client, uri, state.text()).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // We use FULL sync, so there's exactly one change with the full text
        let Some(change) = params.content_changes.into_iter().next() else {
            return;
        };
        let uri = params.text_document.uri;
        let state = self
            .documents
            .open(uri.clone(), change.text, params.text_document.version);

        let client = self.client.clone();
        let text = state.line_index.shared_text();
        self.debouncer().schedule(uri.clone(), async move {
            publish_delimiter_style(&client, uri, &text).await;
        });
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.close(&uri);
        self.debouncer().cancel(&uri);
        self.completions.cancel(&uri);
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Some(doc) = self.documents.get(uri) else {
            debug!(%uri, "completion for unknown document");
            return Ok(None);
        };
        let Some(directory) = doc.directory() else {
            return Ok(None);
        };
        let Some(offset) = doc.line_index.position_to_offset(position) else {
            return Ok(None);
        };
        let Some(query) = CompletionQuery::at_cursor(doc.text(), offset, directory) else {
            return Ok(None);
        };

        let cancel = self.completions.start(uri.clone());
        // Dropping this request (client cancellation) cancels the walk.
        let guard = cancel.clone().drop_guard();
        let extension = self.settings().template_extension();
        let candidates = template::include_path::resolve(&query, extension, cancel).await;
        drop(guard);
        self.completions.finish(uri);

        debug!(
            %uri,
            directory = %query.directory.display(),
            candidates = candidates.len(),
            "include completion"
        );
        Ok(lsp::completion_response(&candidates, &doc.line_index))
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let Some(doc) = self.documents.get(&params.text_document.uri) else {
            return Ok(None);
        };

        Ok(Some(SemanticTokensResult::Tokens(SemanticTokens {
            result_id: None,
            data: lsp::tokens_for_document(&doc, self.markers),
        })))
    }
}

pub fn create_service() -> (LspService<Backend>, tower_lsp::ClientSocket) {
    LspService::build(Backend::new)
        .custom_method(DELIMITER_STYLE_METHOD, Backend::delimiter_style)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_can_be_created() {
        let (_service, _socket) = create_service();
    }

    fn with_extension(extension: &str) -> Settings {
        Settings {
            completion: Some(settings::CompletionSettings {
                extension: Some(extension.to_string()),
            }),
            decorations: None,
        }
    }

    #[test]
    fn first_settings_win() {
        let (service, _socket) = create_service();
        let backend = service.inner();

        backend.configure(with_extension("html"));
        backend.configure(with_extension("smarty"));
        assert_eq!(backend.settings().template_extension(), "html");
    }

    fn finished(in_flight: &InFlight, uri: &Url, token: CancellationToken) {
        token.cancel();
        in_flight.finish(uri);
    }

    #[test]
    fn finished_lookup_leaves_no_entry() {
        let in_flight = InFlight::default();
        let uri = Url::parse("file:///t/a.tpl").unwrap();

        let token = in_flight.start(uri.clone());
        assert_eq!(in_flight.len(), 1);
        finished(&in_flight, &uri, token);
        assert_eq!(in_flight.len(), 0);
    }

    #[test]
    fn superseded_lookup_keeps_newer_entry() {
        let in_flight = InFlight::default();
        let uri = Url::parse("file:///t/a.tpl").unwrap();

        let first = in_flight.start(uri.clone());
        let second = in_flight.start(uri.clone());
        assert!(first.is_cancelled());

        finished(&in_flight, &uri, first);
        assert_eq!(in_flight.len(), 1);
        assert!(!second.is_cancelled());

        finished(&in_flight, &uri, second);
        assert_eq!(in_flight.len(), 0);
    }

    #[test]
    fn close_and_shutdown_cancel_lookups() {
        let in_flight = InFlight::default();
        let a = Url::parse("file:///t/a.tpl").unwrap();
        let b = Url::parse("file:///t/b.tpl").unwrap();

        let first = in_flight.start(a.clone());
        let second = in_flight.start(b);
        in_flight.cancel(&a);
        assert!(first.is_cancelled());
        assert_eq!(in_flight.len(), 1);

        in_flight.cancel_all();
        assert!(second.is_cancelled());
        assert_eq!(in_flight.len(), 0);
    }
}
