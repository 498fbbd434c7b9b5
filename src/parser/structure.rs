//! Whole-input checks run after the statement routines.
//!
//! These look at the token stream or the finished tree rather than at a
//! single statement:
//! - bracket balance (every language except HTML)
//! - BEGIN/END pairing (Pascal and both SQL dialects)
//! - a `main` function (C++)
//! - a root `<html>` element (HTML)

use crate::ast::{NodeKind, ParseNode, find_all};
use crate::diagnostics::Position;
use crate::language::Language;
use crate::lexer::{Token, TokenCategory};

use super::{Parser, SyntaxError};

/// Delimiter problems reported before the rest are summarized.
const MAX_DELIMITER_REPORTS: usize = 25;

fn closer_for(opener: char) -> char {
    match opener {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn delimiter_char(token: &Token) -> Option<char> {
    if token.category != TokenCategory::Delimiter {
        return None;
    }
    match token.text.as_str() {
        "(" => Some('('),
        ")" => Some(')'),
        "[" => Some('['),
        "]" => Some(']'),
        "{" => Some('{'),
        "}" => Some('}'),
        _ => None,
    }
}

impl<'a> Parser<'a> {
    /// Runs the checks that apply to the current language.
    pub(super) fn check_structure(&mut self, nodes: &[ParseNode]) {
        if self.tokens.is_empty() {
            return;
        }
        match self.language {
            Language::Html => self.check_root_element(nodes),
            Language::Pascal | Language::TSql | Language::PlSql => {
                self.check_delimiters();
                self.check_block_words();
            }
            Language::Cpp => {
                self.check_delimiters();
                self.check_main(nodes);
            }
            Language::JavaScript | Language::Python | Language::Unknown => self.check_delimiters(),
        }
    }

    // ==================== Brackets ====================

    fn check_delimiters(&mut self) {
        let mut problems = Vec::new();
        let mut open: Vec<(char, Position)> = Vec::new();

        for token in &self.tokens {
            let Some(c) = delimiter_char(token) else {
                continue;
            };
            match c {
                '(' | '[' | '{' => open.push((c, token.position())),
                _ => match open.pop() {
                    Some((opener, _)) if closer_for(opener) == c => {}
                    Some((opener, opened_at)) => problems.push(SyntaxError::MismatchedDelimiter {
                        opener,
                        closer: c,
                        opened_at,
                        position: token.position(),
                    }),
                    None => problems.push(SyntaxError::UnmatchedCloser {
                        delimiter: c,
                        position: token.position(),
                    }),
                },
            }
        }
        problems.extend(
            open.into_iter()
                .map(|(delimiter, position)| SyntaxError::UnclosedDelimiter { delimiter, position }),
        );

        let total = problems.len();
        if total > MAX_DELIMITER_REPORTS {
            let position = problems[MAX_DELIMITER_REPORTS].position();
            problems.truncate(MAX_DELIMITER_REPORTS);
            problems.push(SyntaxError::DelimiterReportTruncated {
                omitted: total - MAX_DELIMITER_REPORTS,
                position,
            });
        }
        self.errors.extend(problems);
    }

    // ==================== Block Words ====================

    /// Counts block openers against `END`. Reported once, as a warning.
    fn check_block_words(&mut self) {
        let mut open: Vec<Position> = Vec::new();
        let mut excess_end = None;
        let mut closed = 0usize;
        let mut opened = 0usize;

        for (i, token) in self.tokens.iter().enumerate() {
            if token.category != TokenCategory::ReservedWord {
                continue;
            }
            let previous = i.checked_sub(1).and_then(|p| self.tokens.get(p));
            let next = self.tokens.get(i + 1);
            if self.opens_block(token, previous.copied(), next.copied()) {
                opened += 1;
                open.push(token.position());
            } else if self.closes_block(token, next.copied()) {
                closed += 1;
                if open.pop().is_none() && excess_end.is_none() {
                    excess_end = Some(token.position());
                }
            }
        }

        if opened != closed {
            let position = excess_end
                .or_else(|| open.last().copied())
                .unwrap_or(Position::START);
            self.errors.push(SyntaxError::BlockImbalance {
                opened,
                closed,
                position,
            });
        }
    }

    fn opens_block(&self, token: &Token, previous: Option<&Token>, next: Option<&Token>) -> bool {
        match self.language {
            Language::Pascal => {
                token.is_any_keyword(&["begin", "case", "record", "try"])
                    || (token.is_any_keyword(&["class", "object"])
                        && previous.is_some_and(|p| p.is_punct("="))
                        && !next.is_some_and(|n| n.is_punct(";") || n.is_keyword("of")))
            }
            Language::TSql => {
                (token.is_keyword("begin")
                    && !next.is_some_and(|n| {
                        n.is_any_keyword(&["tran", "transaction"]) || n.is_word("distributed")
                    }))
                    || token.is_keyword("case")
            }
            Language::PlSql => {
                token.is_keyword("begin")
                    || (token.is_keyword("case") && !previous.is_some_and(|p| p.is_keyword("end")))
            }
            _ => false,
        }
    }

    fn closes_block(&self, token: &Token, next: Option<&Token>) -> bool {
        if !token.is_keyword("end") {
            return false;
        }
        match self.language {
            Language::PlSql => !next.is_some_and(|n| n.is_any_keyword(&["if", "loop"])),
            _ => true,
        }
    }

    // ==================== Required Elements ====================

    fn check_main(&mut self, nodes: &[ParseNode]) {
        let has_main = find_all(nodes, NodeKind::FunctionDeclaration)
            .iter()
            .any(|f| f.value() == Some("main"));
        if !has_main {
            self.errors.push(SyntaxError::MissingMain {
                position: self.tokens[0].position(),
            });
        }
    }

    fn check_root_element(&mut self, nodes: &[ParseNode]) {
        let has_root = find_all(nodes, NodeKind::Element)
            .iter()
            .any(|e| e.value() == Some("html"));
        if !has_root {
            self.errors.push(SyntaxError::MissingRootElement {
                tag: "html".to_string(),
                position: self.tokens[0].position(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::{Diagnostic, Severity};
    use crate::language::Language;
    use crate::lexer::lex;
    use crate::parser::analyze;

    fn diagnostics(source: &str, language: Language) -> Vec<Diagnostic> {
        let tokens = lex(source, language);
        analyze(&tokens, language).1
    }

    #[test]
    fn test_unmatched_closer() {
        let diags = diagnostics("let a = [1, 2]];\nlet b = 3;\n", Language::JavaScript);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unmatched closing `]`"));
        assert_eq!(diags[0].column, 15);
    }

    #[test]
    fn test_mismatched_delimiter() {
        let diags = diagnostics("print(items[0)\nx = 1\ny = 2\n", Language::Python);
        assert_eq!(diags.len(), 2);
        assert!(diags[0].message.contains("does not match `[` opened at 1:12"));
        assert_eq!(diags[1].message, "unclosed `(`");
        assert_eq!((diags[1].line, diags[1].column), (1, 6));
    }

    #[test]
    fn test_pascal_block_imbalance_warning() {
        let source = "program p;\nbegin\n  if x > 0 then\n  begin\n    writeln(x);\nend.\n";
        let diags = diagnostics(source, Language::Pascal);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert!(diags[0].message.contains("2 block openers"));
    }

    #[test]
    fn test_plsql_end_if_is_not_a_block_end() {
        let source = "BEGIN\n  IF x > 1 THEN\n    NULL;\n  END IF;\n  LOOP\n    EXIT;\n  END LOOP;\nEND;\n";
        assert!(diagnostics(source, Language::PlSql).is_empty());
    }

    #[test]
    fn test_tsql_transaction_is_not_a_block() {
        let source = "BEGIN TRANSACTION;\nUPDATE t SET a = 1 WHERE id = 2;\nCOMMIT;\n";
        assert!(diagnostics(source, Language::TSql).is_empty());
    }

    #[test]
    fn test_cpp_missing_main() {
        let source = "int add(int a, int b) {\n    return a + b;\n}\n";
        let diags = diagnostics(source, Language::Cpp);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("main"));
        assert_eq!(diags[0].severity, Severity::Warning);
    }
}
