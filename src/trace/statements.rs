//! SQL statement descriptions and the HTML document summary.

use crate::diagnostics::AnalysisFault;
use crate::language::Language;
use crate::lexer::{Token, TokenCategory};
use crate::parser::expressions::{is_closer, is_opener, span_text};

use super::Simulator;
use super::output::render;

/// Words that start a statement the trace describes.
const DESCRIBED_VERBS: &[&str] = &[
    "create", "select", "insert", "update", "delete", "drop", "exec", "execute", "print",
];

/// Words after which a new statement starts.
const STATEMENT_BOUNDARIES: &[&str] = &["go", "begin", "end", "then", "else", "loop"];

fn is_name(token: &Token) -> bool {
    matches!(
        token.category,
        TokenCategory::Identifier | TokenCategory::ReservedWord
    )
}

fn rows(count: usize) -> String {
    if count == 1 {
        "1 row".to_string()
    } else {
        format!("{count} rows")
    }
}

impl<'a> Simulator<'a> {
    // ==================== SQL ====================

    /// Dotted name starting at `index` and the index after it.
    fn qualified_name(&self, index: usize) -> (String, usize) {
        let mut name = String::new();
        let mut i = index;
        while let Some(token) = self.tok(i).filter(|t| t.is_identifier()) {
            name.push_str(&token.text);
            if self.is_punct_at(i + 1, ".") && self.tok(i + 2).is_some_and(Token::is_identifier) {
                name.push('.');
                i += 2;
            } else {
                i += 1;
                break;
            }
        }
        (name, i)
    }

    /// End of the SQL statement starting at `from`: a `;` or `GO`, or a
    /// described verb that starts a new line.
    fn sql_statement_end(&self, from: usize) -> usize {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(from) {
            if is_opener(token) {
                depth += 1;
                continue;
            }
            if is_closer(token) {
                depth = depth.saturating_sub(1);
                continue;
            }
            if depth > 0 {
                continue;
            }
            let next_statement = i > from
                && self.at_line_start(i)
                && token.is_any_keyword(DESCRIBED_VERBS)
                && !token.is_keyword("select");
            if token.is_punct(";") || token.is_keyword("go") || next_statement {
                return i;
            }
        }
        self.tokens.len()
    }

    pub(super) fn sql_statements(&mut self) -> Result<(), AnalysisFault> {
        let mut depth = 0usize;
        // Verb of the statement in progress.
        let mut current: Option<String> = None;
        let mut i = 0;
        while let Some(token) = self.tok(i) {
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                depth = depth.saturating_sub(1);
            } else if token.is_punct(";") || token.is_any_keyword(STATEMENT_BOUNDARIES) {
                current = None;
            } else if depth == 0 && token.is_word("dbms_output") {
                i = self.put_line(i)?;
                continue;
            } else if depth == 0 && token.is_any_keyword(DESCRIBED_VERBS) {
                let verb = token.text.to_ascii_lowercase();
                let nested = matches!(current.as_deref(), Some("insert" | "create"));
                let fresh = current.is_none() || (self.at_line_start(i) && !nested);
                if fresh {
                    self.describe(i, &verb);
                    // `INSERT ... VALUES` cannot continue with a query.
                    current = if verb == "insert" && self.values_clause(i).is_some() {
                        Some("insert values".to_string())
                    } else {
                        Some(verb)
                    };
                }
            }
            i += 1;
        }
        Ok(())
    }

    fn describe(&mut self, index: usize, verb: &str) {
        let end = self.sql_statement_end(index + 1);
        let line = match verb {
            "create" | "drop" => {
                let mut i = index + 1;
                if self.tok(i).is_some_and(|t| t.is_keyword("or")) {
                    i += 2;
                }
                if self.tok(i).is_some_and(|t| t.is_word("unique") || t.is_word("clustered")) {
                    i += 1;
                }
                let kind = self
                    .tok(i)
                    .map(|t| t.text.to_ascii_lowercase())
                    .unwrap_or_default();
                let kind = if kind == "proc" { "procedure".to_string() } else { kind };
                let (name, _) = self.qualified_name(i + 1);
                let done = if verb == "create" { "created" } else { "dropped" };
                if name.is_empty() || kind.is_empty() {
                    format!("{} statement executed", verb.to_ascii_uppercase())
                } else {
                    format!("{kind} `{name}` {done}")
                }
            }
            "select" => {
                let from = (index + 1..end).find(|&i| self.tok(i).is_some_and(|t| t.is_keyword("from")));
                match from.map(|f| self.qualified_name(f + 1).0) {
                    Some(table) if !table.is_empty() => format!("query on `{table}`"),
                    _ => "query evaluated".to_string(),
                }
            }
            "insert" => {
                let mut i = index + 1;
                if self.tok(i).is_some_and(|t| t.is_keyword("into")) {
                    i += 1;
                }
                let (table, _) = self.qualified_name(i);
                match self.values_clause(index) {
                    Some(v) => format!("{} inserted into `{table}`", rows(self.count_tuples(v + 1, end))),
                    None => format!("rows inserted into `{table}` from a query"),
                }
            }
            "update" => {
                let (table, _) = self.qualified_name(index + 1);
                format!("rows updated in `{table}`")
            }
            "delete" => {
                let mut i = index + 1;
                if self.tok(i).is_some_and(|t| t.is_keyword("from")) {
                    i += 1;
                }
                let (table, _) = self.qualified_name(i);
                format!("rows deleted from `{table}`")
            }
            "exec" | "execute" => {
                let (name, _) = self.qualified_name(index + 1);
                format!("procedure `{name}` executed")
            }
            "print" if self.language == Language::TSql => {
                let tokens = self.tokens.get(index + 1..end).unwrap_or_default();
                let text = render(tokens, self.language);
                self.write(&text);
                self.end_line();
                return;
            }
            _ => return,
        };
        self.emit(line);
    }

    /// Index of the `VALUES` keyword of the `INSERT` at `index`.
    fn values_clause(&self, index: usize) -> Option<usize> {
        let end = self.sql_statement_end(index + 1);
        (index + 1..end).find(|&i| self.tok(i).is_some_and(|t| t.is_keyword("values")))
    }

    /// Parenthesized row tuples in `tokens[from..end]`.
    fn count_tuples(&self, from: usize, end: usize) -> usize {
        let mut count = 0;
        let mut i = from;
        while i < end {
            if !self.is_punct_at(i, "(") {
                break;
            }
            count += 1;
            let Some(close) = self.group_end(i) else {
                break;
            };
            i = close + 1;
            if self.is_punct_at(i, ",") {
                i += 1;
            }
        }
        count
    }

    /// `dbms_output.put_line(...)` and `dbms_output.put(...)`. Returns the
    /// index to continue from.
    fn put_line(&mut self, index: usize) -> Result<usize, AnalysisFault> {
        let Some(method) = self.tok(index + 2) else {
            return Ok(index + 1);
        };
        let line_break = method.is_word("put_line");
        let call = self.is_punct_at(index + 1, ".")
            && (line_break || method.is_word("put"))
            && self.is_punct_at(index + 3, "(");
        if !call {
            return Ok(index + 1);
        }
        let (args, close) = self.call_arguments("dbms_output.put_line", index + 3)?;
        let text: String = args.iter().map(|a| render(a, self.language)).collect();
        self.write(&text);
        if line_break {
            self.end_line();
        }
        Ok(close + 1)
    }

    // ==================== HTML ====================

    pub(super) fn markup_summary(&mut self) {
        let count = (0..self.tokens.len())
            .filter(|&i| self.is_punct_at(i, "<") && self.tok(i + 1).is_some_and(is_name))
            .count();
        let plural = if count == 1 { "" } else { "s" };
        self.emit(format!("rendered {count} element{plural}"));

        let title_tag = (0..self.tokens.len()).find(|&i| {
            self.is_punct_at(i, "<")
                && self
                    .tok(i + 1)
                    .is_some_and(|t| t.text.eq_ignore_ascii_case("title"))
        });
        let Some(tag) = title_tag else {
            return;
        };
        let Some(start) = (tag..self.tokens.len()).find(|&i| self.is_punct_at(i, ">")) else {
            return;
        };
        let end = (start..self.tokens.len())
            .find(|&i| self.is_punct_at(i, "</"))
            .unwrap_or(self.tokens.len());
        let title = span_text(self.tokens.get(start + 1..end).unwrap_or_default());
        if !title.is_empty() {
            self.emit(format!("title: {title}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::language::Language;
    use crate::trace::tests::trace;

    #[test]
    fn test_tsql_statements() {
        let source = "CREATE TABLE users (id INT, name VARCHAR(20));\nINSERT INTO users VALUES (1, 'a'), (2, 'b'), (3, 'c');\nSELECT * FROM users WHERE id IN (SELECT id FROM users);\nUPDATE users SET name = 'x' WHERE id = 1;\nDELETE FROM users WHERE id = 2;\nPRINT 'done';\n";
        let result = trace(source, Language::TSql);
        assert!(result.success, "{result:?}");
        let lines: Vec<&str> = result.output.lines().collect();
        assert_eq!(
            lines,
            [
                "table `users` created",
                "3 rows inserted into `users`",
                "query on `users`",
                "rows updated in `users`",
                "rows deleted from `users`",
                "done",
            ]
        );
    }

    #[test]
    fn test_statements_without_semicolons() {
        let source = "INSERT INTO log VALUES (1)\nSELECT name FROM log\nDROP TABLE log\n";
        let result = trace(source, Language::TSql);
        let lines: Vec<&str> = result.output.lines().collect();
        assert_eq!(lines, ["1 row inserted into `log`", "query on `log`", "table `log` dropped"]);
    }

    #[test]
    fn test_plsql_put_line() {
        let source = "CREATE OR REPLACE PROCEDURE greet IS\nBEGIN\n  dbms_output.put_line('Hello ' || 'world');\nEND;\n";
        let result = trace(source, Language::PlSql);
        let lines: Vec<&str> = result.output.lines().collect();
        assert_eq!(lines, ["procedure `greet` created", "Hello world"]);
    }

    #[test]
    fn test_html_summary() {
        let source = "<html><head><title>My Page</title></head><body><p>x</p></body></html>";
        let result = trace(source, Language::Html);
        let lines: Vec<&str> = result.output.lines().collect();
        assert_eq!(lines, ["rendered 5 elements", "title: My Page"]);
    }
}
