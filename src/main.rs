//! polyglot-analyzer - command-line interface
//!
//! Runs the analysis pipeline on one file (or stdin) and prints the report.

use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use polyglot_analyzer::ast::ParseNode;
use polyglot_analyzer::language::Language;
use polyglot_analyzer::pipeline::{AnalysisReport, Analyzer, AnalyzerConfig};

/// polyglot-analyzer - lexical, syntax and semantic analysis for several languages
#[derive(Parser, Debug)]
#[command(name = "polyglot-analyzer")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source file, or `-` for stdin
    #[arg(value_name = "FILE", default_value = "-")]
    input: PathBuf,

    /// Source language (javascript, python, cpp, html, pascal, tsql, plsql).
    /// Guessed from the file extension when omitted.
    #[arg(short, long, env = "POLYGLOT_LANGUAGE")]
    language: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Print the token table
    #[arg(long)]
    tokens: bool,

    /// Also print the parse tree and the symbol table
    #[arg(short, long)]
    verbose: bool,

    /// Lexical errors below which syntax analysis still runs
    #[arg(long, env = "POLYGLOT_LEXICAL_CONTINUATION")]
    lexical_continuation: Option<usize>,

    /// Semantic errors tolerated before language rules are skipped
    #[arg(long, env = "POLYGLOT_RULE_ERROR_LIMIT")]
    rule_error_limit: Option<usize>,

    /// Token count below which cosmetic structure warnings are skipped
    #[arg(long, env = "POLYGLOT_COSMETIC_TOKENS")]
    cosmetic_tokens: Option<usize>,

    /// Lexer iteration ceiling per source byte
    #[arg(long, env = "POLYGLOT_LEXER_ITERATION_FACTOR")]
    lexer_iteration_factor: Option<usize>,

    /// Maximum block nesting depth
    #[arg(long, env = "POLYGLOT_MAX_NESTING")]
    max_nesting: Option<usize>,

    /// Largest accepted input, in bytes
    #[arg(long, env = "POLYGLOT_MAX_SOURCE_BYTES")]
    max_source_bytes: Option<usize>,

    /// Execution trace line limit
    #[arg(long, env = "POLYGLOT_MAX_TRACE_LINES")]
    max_trace_lines: Option<usize>,
}

impl Args {
    fn config(&self) -> AnalyzerConfig {
        let defaults = AnalyzerConfig::default();
        AnalyzerConfig {
            lexical_continuation_threshold: self
                .lexical_continuation
                .unwrap_or(defaults.lexical_continuation_threshold),
            semantic_rule_error_limit: self
                .rule_error_limit
                .unwrap_or(defaults.semantic_rule_error_limit),
            cosmetic_token_threshold: self
                .cosmetic_tokens
                .unwrap_or(defaults.cosmetic_token_threshold),
            lexer_iteration_factor: self
                .lexer_iteration_factor
                .unwrap_or(defaults.lexer_iteration_factor),
            max_nesting_depth: self.max_nesting.unwrap_or(defaults.max_nesting_depth),
            max_source_bytes: self.max_source_bytes.unwrap_or(defaults.max_source_bytes),
            max_trace_lines: self.max_trace_lines.unwrap_or(defaults.max_trace_lines),
        }
    }

    fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }

    fn language(&self) -> Language {
        match &self.language {
            Some(tag) => Language::from_tag(tag),
            None if self.reads_stdin() => Language::Unknown,
            None => guess_language(&self.input),
        }
    }
}

fn guess_language(path: &Path) -> Language {
    match path.extension().and_then(|e| e.to_str()) {
        Some("cc" | "cxx" | "hpp" | "h") => Language::Cpp,
        Some("pls" | "pkb" | "pks") => Language::PlSql,
        Some(ext) => Language::from_tag(ext),
        None => Language::Unknown,
    }
}

fn read_source(args: &Args) -> io::Result<String> {
    if args.reads_stdin() {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(&args.input)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let source = match read_source(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {}", args.input.display(), e);
            return ExitCode::from(1);
        }
    };

    let language = args.language();
    log::debug!(
        "analyzing {} ({} bytes) as {language}",
        args.input.display(),
        source.len()
    );
    let report = Analyzer::new(args.config()).analyze(&source, language);

    if args.json {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing the report: {e}");
                return ExitCode::from(1);
            }
        }
    } else {
        print_report(&args, &report);
    }

    if report.can_execute || !report.has_errors() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

fn print_report(args: &Args, report: &AnalysisReport) {
    println!("polyglot-analyzer v{}", env!("CARGO_PKG_VERSION"));
    println!("Language: {}", report.language);
    println!();

    if args.tokens {
        println!("Tokens:");
        println!("{:-<60}", "");
        for token in &report.tokens {
            println!(
                "{:>4}:{:<4} {:12} {:?}",
                token.line,
                token.column,
                token.category.to_string(),
                token.text
            );
        }
        println!();
    }

    let phases = &report.analysis_phases;
    println!(
        "Lexical:  {} ({} tokens, {} errors)",
        status(phases.lexical.completed),
        phases.lexical.tokens_found,
        phases.lexical.errors_found
    );
    println!(
        "Syntax:   {} ({} nodes, {} errors)",
        status(phases.syntax.completed),
        phases.syntax.nodes_generated,
        phases.syntax.errors_found
    );
    println!(
        "Semantic: {} ({} symbols, {} errors)",
        status(phases.semantic.completed),
        phases.semantic.symbols_found,
        phases.semantic.errors_found
    );
    println!();

    if args.verbose {
        println!("Parse tree:");
        for node in &report.parse_tree {
            print_node(node, 1);
        }
        println!();
        println!("Symbols:");
        for symbol in &report.symbol_table {
            println!(
                "  {:<20} {:<10} {:<12} {} ({}:{})",
                symbol.name,
                symbol.kind.to_string(),
                symbol.data_type.as_deref().unwrap_or("-"),
                symbol.scope,
                symbol.line,
                symbol.column
            );
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Diagnostics:");
        for diagnostic in &report.errors {
            println!("  {diagnostic}");
        }
        println!();
    }

    let summary = &report.summary;
    println!(
        "{} errors, {} warnings, {} infos in {:.2} ms",
        summary.total_errors, summary.total_warnings, summary.total_infos, report.processing_time
    );

    match &report.execution_result {
        Some(result) => {
            println!();
            println!("Execution trace:");
            for line in result.output.lines() {
                println!("  {line}");
            }
            if let Some(error) = &result.error {
                println!("  (failed: {error})");
            }
        }
        None => println!("Execution trace skipped: the program has errors."),
    }
}

fn print_node(node: &ParseNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node.value() {
        Some(value) => println!("{indent}{} `{value}` ({}:{})", node.kind, node.line, node.column),
        None => println!("{indent}{} ({}:{})", node.kind, node.line, node.column),
    }
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn status(completed: bool) -> &'static str {
    if completed { "OK" } else { "skipped" }
}
