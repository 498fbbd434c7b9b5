//! Analyzer limits and gating thresholds.
//!
//! Every threshold the pipeline uses is a named field here, with a default
//! matching the behavior users expect. Each can be overridden from the
//! environment:
//!
//! | Variable                               | Field                            |
//! |----------------------------------------|----------------------------------|
//! | `POLYGLOT_LEXICAL_CONTINUATION`        | `lexical_continuation_threshold` |
//! | `POLYGLOT_RULE_ERROR_LIMIT`            | `semantic_rule_error_limit`      |
//! | `POLYGLOT_COSMETIC_TOKENS`             | `cosmetic_token_threshold`       |
//! | `POLYGLOT_LEXER_ITERATION_FACTOR`      | `lexer_iteration_factor`         |
//! | `POLYGLOT_MAX_NESTING`                 | `max_nesting_depth`              |
//! | `POLYGLOT_MAX_SOURCE_BYTES`            | `max_source_bytes`               |
//! | `POLYGLOT_MAX_TRACE_LINES`             | `max_trace_lines`                |

use log::warn;

use crate::lexer::DEFAULT_ITERATION_FACTOR;
use crate::parser::{DEFAULT_COSMETIC_THRESHOLD, DEFAULT_MAX_DEPTH};
use crate::semantic::DEFAULT_RULE_ERROR_LIMIT;
use crate::trace::DEFAULT_MAX_TRACE_LINES;

/// Syntax analysis still runs with fewer lexical errors than this.
pub const DEFAULT_LEXICAL_CONTINUATION: usize = 5;

/// Inputs larger than this are rejected before lexing.
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 1024 * 1024;

/// Tunable limits for one [`Analyzer`](super::Analyzer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Lexical error count below which parsing still runs.
    pub lexical_continuation_threshold: usize,
    /// Semantic errors tolerated before the language rules are skipped.
    pub semantic_rule_error_limit: usize,
    /// Inputs with fewer tokens only get error-level structure reports.
    pub cosmetic_token_threshold: usize,
    /// Lexer iteration ceiling, per source byte.
    pub lexer_iteration_factor: usize,
    pub max_nesting_depth: usize,
    pub max_source_bytes: usize,
    pub max_trace_lines: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            lexical_continuation_threshold: DEFAULT_LEXICAL_CONTINUATION,
            semantic_rule_error_limit: DEFAULT_RULE_ERROR_LIMIT,
            cosmetic_token_threshold: DEFAULT_COSMETIC_THRESHOLD,
            lexer_iteration_factor: DEFAULT_ITERATION_FACTOR,
            max_nesting_depth: DEFAULT_MAX_DEPTH,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            max_trace_lines: DEFAULT_MAX_TRACE_LINES,
        }
    }
}

impl AnalyzerConfig {
    /// Defaults overridden by any `POLYGLOT_*` variables that are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source. Values that do
    /// not parse as a non-negative integer are ignored with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str, default: usize| -> usize {
            match lookup(name) {
                None => default,
                Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                    warn!("ignoring {name}={raw:?}: expected a non-negative integer");
                    default
                }),
            }
        };
        let defaults = Self::default();
        Self {
            lexical_continuation_threshold: read(
                "POLYGLOT_LEXICAL_CONTINUATION",
                defaults.lexical_continuation_threshold,
            ),
            semantic_rule_error_limit: read(
                "POLYGLOT_RULE_ERROR_LIMIT",
                defaults.semantic_rule_error_limit,
            ),
            cosmetic_token_threshold: read(
                "POLYGLOT_COSMETIC_TOKENS",
                defaults.cosmetic_token_threshold,
            ),
            lexer_iteration_factor: read(
                "POLYGLOT_LEXER_ITERATION_FACTOR",
                defaults.lexer_iteration_factor,
            ),
            max_nesting_depth: read("POLYGLOT_MAX_NESTING", defaults.max_nesting_depth),
            max_source_bytes: read("POLYGLOT_MAX_SOURCE_BYTES", defaults.max_source_bytes),
            max_trace_lines: read("POLYGLOT_MAX_TRACE_LINES", defaults.max_trace_lines),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.lexical_continuation_threshold, 5);
        assert_eq!(config.semantic_rule_error_limit, 3);
        assert_eq!(config.cosmetic_token_threshold, 10);
        assert_eq!(config.lexer_iteration_factor, 3);
        assert_eq!(config.max_nesting_depth, 256);
        assert_eq!(config.max_source_bytes, 1024 * 1024);
        assert_eq!(config.max_trace_lines, 200);
    }

    #[test]
    fn test_lookup_overrides_and_bad_values() {
        let vars: HashMap<&str, &str> = [
            ("POLYGLOT_MAX_TRACE_LINES", " 20 "),
            ("POLYGLOT_MAX_NESTING", "deep"),
        ]
        .into_iter()
        .collect();
        let config = AnalyzerConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.max_trace_lines, 20);
        assert_eq!(config.max_nesting_depth, 256);
        assert_eq!(config.semantic_rule_error_limit, 3);
    }
}
