//! Motoko Language Server binary entry point
//!
//! Run with: motoko-lsp
//!
//! The LSP communicates via stdin/stdout using the Language Server Protocol.

use motoko::lsp::MotokoLanguageServer;
use tower_lsp::{LspService, Server};

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the protocol.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(MotokoLanguageServer::new);

    Server::new(stdin, stdout, socket).serve(service).await;
}
