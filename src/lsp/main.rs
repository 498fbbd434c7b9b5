//! polyglot-analyzer Language Server - Entry Point
//!
//! Sets up the tower-lsp service and runs it over stdio.
//!
//! # Usage
//!
//! The LSP server is typically started by an editor/IDE:
//!
//! ```bash
//! polyglot-analyzer-lsp
//! ```
//!
//! For debugging, you can run with logging:
//!
//! ```bash
//! RUST_LOG=debug polyglot-analyzer-lsp 2>lsp.log
//! ```
//!
//! Analyzer limits come from the `POLYGLOT_*` environment variables.

use tower_lsp::{LspService, Server};

use polyglot_analyzer::lsp::PolyglotLanguageServer;

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the protocol
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    log::info!(
        "Starting polyglot-analyzer LSP server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(PolyglotLanguageServer::new);

    Server::new(stdin, stdout, socket).serve(service).await;
}
