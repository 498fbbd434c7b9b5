//! Language Server Protocol implementation for polyglot-analyzer.
//!
//! This module provides an LSP server that enables IDE features like:
//! - Diagnostics from every analysis phase, republished on each edit
//! - Hover information (token category, symbol kind, type and scope)
//!
//! # Architecture
//!
//! The LSP server uses `tower-lsp` and communicates via JSON-RPC over stdio.
//! It keeps each open document together with its latest report, so hover
//! requests never re-run the pipeline.
//!
//! ```text
//! Editor (VSCode, etc.)
//!     ↓ JSON-RPC over stdio
//! PolyglotLanguageServer
//!     ↓ Uses
//! Analyzer (lexer, parser, semantic, trace)
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::diagnostics::{EditorMarker, Severity};
use crate::language::Language;
use crate::lexer::TokenCategory;
use crate::pipeline::{AnalysisReport, Analyzer, AnalyzerConfig};

/// State for a single open document.
#[derive(Debug)]
pub struct DocumentState {
    pub content: String,
    pub version: i32,
    pub language: Language,
    /// Result of the last analysis of `content`.
    pub report: AnalysisReport,
}

/// Shared state for the language server.
#[derive(Debug, Default)]
pub struct ServerState {
    /// Open documents indexed by URI.
    pub documents: HashMap<Url, DocumentState>,
}

/// The polyglot-analyzer Language Server.
pub struct PolyglotLanguageServer {
    /// Client handle for sending notifications.
    client: Client,
    analyzer: Analyzer,
    /// Shared server state.
    state: Arc<RwLock<ServerState>>,
}

impl PolyglotLanguageServer {
    /// Creates a new language server configured from the environment.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            analyzer: Analyzer::new(AnalyzerConfig::from_env()),
            state: Arc::new(RwLock::new(ServerState::default())),
        }
    }

    /// Analyzes a document, stores the report and publishes its diagnostics.
    async fn analyze_document(&self, uri: Url, content: String, version: i32, language: Language) {
        let report = self.analyzer.analyze(&content, language);
        log::debug!(
            "{uri}: {} diagnostics ({language}, {:.1} ms)",
            report.errors.len(),
            report.processing_time
        );
        let diagnostics = report.markers().iter().map(to_lsp_diagnostic).collect();

        {
            let mut state = self.state.write().await;
            state.documents.insert(
                uri.clone(),
                DocumentState {
                    content,
                    version,
                    language,
                    report,
                },
            );
        }

        self.client
            .publish_diagnostics(uri, diagnostics, Some(version))
            .await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for PolyglotLanguageServer {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "polyglot-analyzer-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "polyglot-analyzer LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        let language = language_for_id(&document.language_id);
        self.analyze_document(document.uri, document.text, document.version, language)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;

        // FULL sync: the only change carries the whole document
        let Some(change) = params.content_changes.into_iter().next() else {
            return;
        };
        let language = {
            let state = self.state.read().await;
            state
                .documents
                .get(&uri)
                .map_or(Language::Unknown, |doc| doc.language)
        };
        self.analyze_document(uri, change.text, params.text_document.version, language)
            .await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        {
            let mut state = self.state.write().await;
            state.documents.remove(&uri);
        }
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let state = self.state.read().await;
        let info = state
            .documents
            .get(uri)
            .and_then(|doc| hover_info(doc, position));

        Ok(info.map(|value| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            }),
            range: None,
        }))
    }
}

/// Maps an LSP `languageId` to a language.
fn language_for_id(id: &str) -> Language {
    match id {
        "javascriptreact" => Language::JavaScript,
        "c" => Language::Cpp,
        "objectpascal" | "delphi" => Language::Pascal,
        "oraclesql" => Language::PlSql,
        other => Language::from_tag(other),
    }
}

fn to_lsp_diagnostic(marker: &EditorMarker) -> Diagnostic {
    let severity = match marker.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
    };
    Diagnostic {
        range: Range {
            start: marker_position(marker.start_line, marker.start_column),
            end: marker_position(marker.end_line, marker.end_column),
        },
        severity: Some(severity),
        code: None,
        code_description: None,
        source: Some(format!("polyglot-analyzer ({})", marker.source)),
        message: marker.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}

/// Converts 1-based marker coordinates to a 0-based LSP position.
fn marker_position(line: u32, column: u32) -> Position {
    Position {
        line: line.saturating_sub(1),
        character: column.saturating_sub(1),
    }
}

/// Markdown describing the token under `position`.
fn hover_info(doc: &DocumentState, position: Position) -> Option<String> {
    let offset = u32::try_from(position_to_offset(&doc.content, position)?).ok()?;
    let token = doc
        .report
        .tokens
        .iter()
        .find(|t| t.offset <= offset && offset < t.end_offset())?;

    let mut info = format!("**{}** `{}`", token.category, token.text);
    if token.category == TokenCategory::Identifier {
        let profile = doc.language.profile();
        // The closest declaration above the cursor wins.
        let symbol = doc
            .report
            .symbol_table
            .iter()
            .filter(|s| profile.same_name(&s.name, &token.text))
            .min_by_key(|s| (s.offset > token.offset, s.offset.abs_diff(token.offset)));
        if let Some(symbol) = symbol {
            info.push_str(&format!("\n\n{} in scope `{}`", symbol.kind, symbol.scope));
            if let Some(data_type) = &symbol.data_type {
                info.push_str(&format!("\n\n**Type:** `{data_type}`"));
            }
        }
    }
    Some(info)
}

/// Converts an LSP Position to a byte offset.
fn position_to_offset(source: &str, position: Position) -> Option<usize> {
    let mut current_line = 0u32;
    let mut current_char = 0u32;

    for (i, c) in source.char_indices() {
        if current_line == position.line && current_char == position.character {
            return Some(i);
        }
        if c == '\n' {
            if current_line == position.line {
                // Position is past end of line
                return Some(i);
            }
            current_line += 1;
            current_char = 0;
        } else {
            current_char += 1;
        }
    }

    if current_line == position.line {
        Some(source.len())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Phase;

    fn document(content: &str, language: Language) -> DocumentState {
        DocumentState {
            content: content.to_string(),
            version: 1,
            language,
            report: crate::analyze(content, language),
        }
    }

    #[test]
    fn test_language_for_id() {
        assert_eq!(language_for_id("javascript"), Language::JavaScript);
        assert_eq!(language_for_id("javascriptreact"), Language::JavaScript);
        assert_eq!(language_for_id("sql"), Language::TSql);
        assert_eq!(language_for_id("c"), Language::Cpp);
        assert_eq!(language_for_id("rust"), Language::Unknown);
    }

    #[test]
    fn test_position_to_offset() {
        let source = "let a = 1;\nlet b = 2;\n";
        assert_eq!(position_to_offset(source, Position::new(0, 0)), Some(0));
        assert_eq!(position_to_offset(source, Position::new(0, 4)), Some(4));
        assert_eq!(position_to_offset(source, Position::new(1, 0)), Some(11));
        assert_eq!(position_to_offset(source, Position::new(0, 40)), Some(10));
        assert_eq!(position_to_offset(source, Position::new(5, 0)), None);
    }

    #[test]
    fn test_marker_conversion() {
        let marker = EditorMarker {
            start_line: 3,
            start_column: 5,
            end_line: 3,
            end_column: 9,
            severity: Severity::Warning,
            message: "unused".to_string(),
            source: Phase::Semantic,
        };
        let diagnostic = to_lsp_diagnostic(&marker);
        assert_eq!(diagnostic.range.start, Position::new(2, 4));
        assert_eq!(diagnostic.range.end, Position::new(2, 8));
        assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(diagnostic.message, "unused");
    }

    #[test]
    fn test_hover_on_symbol() {
        let doc = document("int total = 0;\nint main() { return total; }\n", Language::Cpp);
        let info = hover_info(&doc, Position::new(1, 21)).unwrap();
        assert!(info.starts_with("**IDENTIFIER** `total`"), "{info}");
        assert!(info.contains("variable in scope `global`"), "{info}");
        assert!(info.contains("**Type:** `int`"), "{info}");
    }

    #[test]
    fn test_hover_on_keyword() {
        let doc = document("let x = 1;", Language::JavaScript);
        let info = hover_info(&doc, Position::new(0, 1)).unwrap();
        assert_eq!(info, "**KEYWORD** `let`");
        assert!(hover_info(&doc, Position::new(0, 3)).is_none());
    }
}
