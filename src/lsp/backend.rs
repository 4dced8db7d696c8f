//! LSP (Language Server Protocol) backend implementation for Motoko

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use motoko_syntax::syntax_tree::SyntaxNode;

use crate::api::{ScopeCache, Session};
use crate::frontend::scope::ModuleScope;
use crate::lsp::completion::{expression_at, expression_ending_at};
use crate::lsp::diagnostics::to_lsp_diagnostic;

/// Last successfully typed state of an open document.
#[derive(Debug, Clone)]
pub struct TypedDocument {
    pub ast: SyntaxNode,
    pub scope: Arc<ModuleScope>,
}

/// Document state stored by the LSP
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// Unit path of the document in the session store.
    pub path: String,
    pub version: i32,
    /// Kept from the last analysis without errors, so completions still work while the user types `receiver.`.
    pub typed: Option<TypedDocument>,
}

/// Motoko Language Server
pub struct MotokoLanguageServer {
    client: Client,
    session: Arc<Mutex<Session>>,
    cache: Arc<Mutex<ScopeCache>>,
    documents: Arc<RwLock<HashMap<Url, DocumentState>>>,
}

impl MotokoLanguageServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            session: Arc::new(Mutex::new(Session::with_disk())),
            cache: Arc::new(Mutex::new(ScopeCache::new())),
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn unit_path(uri: &Url) -> String {
        match uri.to_file_path() {
            Ok(path) => path.to_string_lossy().into_owned(),
            Err(()) => uri.path().to_string(),
        }
    }

    /// Analyze a document and publish diagnostics
    async fn analyze_document(&self, uri: &Url, source: String, version: i32) {
        let path = Self::unit_path(uri);
        let (diagnostics, typed) = {
            let mut session = self.session.lock().await;
            session.save_unit(&path, source);
            let mut cache = self.cache.lock().await;
            match session.parse_typed_with_cache(true, &[path.clone()], cache.clone()) {
                Ok(result) => {
                    let typed = result.code.and_then(|(units, next_cache)| {
                        *cache = next_cache;
                        units.into_iter().next().map(|unit| TypedDocument {
                            ast: unit.ast,
                            scope: unit.scope,
                        })
                    });
                    (result.diagnostics, typed)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "document could not be read back");
                    (Vec::new(), None)
                }
            }
        };

        let normalized = crate::vfs::normalize(&path);
        let published: Vec<Diagnostic> = diagnostics
            .iter()
            .filter(|d| d.source == normalized)
            .map(to_lsp_diagnostic)
            .collect();

        {
            let mut docs = self.documents.write().await;
            let previous = docs.remove(uri).and_then(|doc| doc.typed);
            docs.insert(
                uri.clone(),
                DocumentState {
                    path,
                    version,
                    typed: typed.or(previous),
                },
            );
        }

        // Publish diagnostics (even if empty, to clear old ones)
        self.client
            .publish_diagnostics(uri.clone(), published, Some(version))
            .await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for MotokoLanguageServer {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string()]),
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "motoko-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "Motoko LSP initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.analyze_document(&doc.uri, doc.text, doc.version).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        if let Some(change) = params.content_changes.into_iter().next() {
            self.analyze_document(&uri, change.text, version).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;

        let removed = self.documents.write().await.remove(&uri);
        if let Some(doc) = removed {
            // Later reads fall back to the file on disk.
            let mut session = self.session.lock().await;
            if let Ok(saved) = std::fs::read_to_string(&doc.path) {
                session.save_unit(&doc.path, saved);
            }
        }

        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let docs = self.documents.read().await;
        let Some(typed) = docs.get(uri).and_then(|doc| doc.typed.as_ref()) else {
            return Ok(None);
        };
        let Some(exp) = expression_at(&typed.ast, position) else {
            return Ok(None);
        };

        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: format!("```motoko\n{}\n```", exp.ty),
            }),
            range: Some(Range::new(exp.start, exp.end)),
        }))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        // The cursor sits after the `.`; the receiver ends right before it.
        let Some(dot) = position.character.checked_sub(1).map(|c| Position::new(position.line, c)) else {
            return Ok(None);
        };

        let docs = self.documents.read().await;
        let Some(typed) = docs.get(uri).and_then(|doc| doc.typed.as_ref()) else {
            return Ok(None);
        };
        let Some(handle) = expression_ending_at(&typed.ast, dot).and_then(|exp| exp.handle) else {
            return Ok(None);
        };

        let session = self.session.lock().await;
        let items: Vec<CompletionItem> = session
            .suggest_dot_completions(&typed.scope, handle)
            .into_iter()
            .map(|suggestion| CompletionItem {
                label: suggestion.func_name.clone(),
                kind: Some(CompletionItemKind::FUNCTION),
                detail: Some(suggestion.func_type),
                label_details: Some(CompletionItemLabelDetails {
                    detail: None,
                    description: Some(suggestion.module_uri),
                }),
                ..Default::default()
            })
            .collect();
        tracing::debug!(count = items.len(), line = dot.line, character = dot.character, "dot completions");

        Ok(Some(CompletionResponse::Array(items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::diagnostics::to_position;

    #[test]
    fn positions_convert_without_shifting() {
        let at = motoko_syntax::diagnostics::LineCol { line: 3, character: 7 };
        assert_eq!(to_position(at), Position::new(3, 7));
    }
}
