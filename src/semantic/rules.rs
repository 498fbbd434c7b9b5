//! Per-language rules that run after name resolution.
//!
//! Each rule is an independent check over the tokens, the parse tree or the
//! symbol table. A rule that fails internally is logged and reported as an
//! informational `CheckFailed` diagnostic; the remaining rules still run.
//!
//! | Language   | Rules                                                        |
//! |------------|--------------------------------------------------------------|
//! | JavaScript | naming, loose equality, `var`                                |
//! | Python     | naming, Python 2 `print` statement                           |
//! | C++        | class naming, bare pointers/references, `main`, includes     |
//! | Pascal     | `begin`/`end` pairing, final `end.`                          |
//! | SQL        | statement verbs, `CREATE TABLE` shape, unfiltered writes     |
//! | HTML       | `img` alt text, deprecated elements                          |

use std::collections::HashSet;

use log::{debug, warn};

use super::declarations::{closes_block, opens_block};
use crate::ast::{self, NodeKind, ParseNode};
use crate::diagnostics::{AnalysisFault, Position, Severity};
use crate::language::Language;
use crate::lexer::TokenKind;
use crate::semantic::{SemanticAnalyzer, SemanticError, SymbolEntry, SymbolKind};

type Check<'a> = fn(&mut SemanticAnalyzer<'a>) -> Result<(), AnalysisFault>;

const STREAM_NAMES: &[&str] = &["cout", "cin", "cerr", "clog", "endl", "getline"];

const STDIO_NAMES: &[&str] = &["printf", "scanf", "puts", "gets", "fopen", "fprintf", "fscanf"];

/// Words that start a statement in either SQL dialect.
const SQL_VERBS: &[&str] = &[
    "select", "insert", "update", "delete", "create", "alter", "drop", "declare", "begin",
    "exec", "execute", "set", "print", "merge", "truncate", "grant", "revoke", "with", "use",
    "if", "while", "commit", "rollback",
];

const SQL_COLUMN_TYPES: &[&str] = &[
    "int", "integer", "bigint", "smallint", "tinyint", "bit", "decimal", "numeric", "money",
    "smallmoney", "float", "real", "double", "date", "datetime", "datetime2", "smalldatetime",
    "datetimeoffset", "time", "timestamp", "interval", "char", "varchar", "nchar", "nvarchar",
    "text", "ntext", "binary", "varbinary", "image", "uniqueidentifier", "xml", "number",
    "varchar2", "nvarchar2", "clob", "nclob", "blob", "long", "raw", "boolean", "pls_integer",
    "binary_integer", "binary_float", "binary_double", "rowid", "serial",
];

const DEPRECATED_ELEMENTS: &[&str] = &[
    "font", "center", "marquee", "blink", "big", "strike", "tt", "frame", "frameset", "applet",
    "acronym", "basefont", "dir", "isindex",
];

fn is_camel_case(name: &str) -> bool {
    let core = name.trim_start_matches(['_', '$']);
    core.is_empty()
        || (core.starts_with(|c: char| c.is_ascii_lowercase()) && !core.contains('_'))
}

fn is_pascal_case(name: &str) -> bool {
    let core = name.trim_start_matches('_');
    core.is_empty() || (core.starts_with(|c: char| c.is_ascii_uppercase()) && !core.contains('_'))
}

fn is_snake_case(name: &str) -> bool {
    name.trim_matches('_')
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn is_upper_snake_case(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// The naming style `entry` breaks, if any.
fn naming_violation(language: Language, entry: &SymbolEntry) -> Option<&'static str> {
    let name = entry.name.as_str();
    if entry.kind == SymbolKind::Class {
        let alias = matches!(entry.data_type.as_deref(), Some("typedef" | "alias"));
        return (!alias && !is_pascal_case(name)).then_some("PascalCase");
    }
    match language {
        Language::JavaScript => match entry.kind {
            SymbolKind::Constant => {
                (!is_camel_case(name) && !is_upper_snake_case(name)).then_some("camelCase")
            }
            SymbolKind::Variable | SymbolKind::Function | SymbolKind::Method | SymbolKind::Parameter => {
                (!is_camel_case(name)).then_some("camelCase")
            }
            _ => None,
        },
        Language::Python => match entry.kind {
            SymbolKind::Variable | SymbolKind::Constant => {
                (!is_snake_case(name) && !is_upper_snake_case(name)).then_some("snake_case")
            }
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Parameter => {
                (!is_snake_case(name)).then_some("snake_case")
            }
            _ => None,
        },
        _ => None,
    }
}

impl<'a> SemanticAnalyzer<'a> {
    /// Runs the rules for the analyzed language.
    pub(super) fn apply_rules(&mut self) {
        match self.language {
            Language::JavaScript => {
                self.run_check("naming", Self::naming_rules);
                self.run_check("loose equality", Self::js_equality_rule);
                self.run_check("var declarations", Self::js_var_rule);
            }
            Language::Python => {
                self.run_check("naming", Self::naming_rules);
                self.run_check("print statement", Self::python_print_rule);
            }
            Language::Cpp => {
                self.run_check("naming", Self::naming_rules);
                self.run_check("declarators", Self::cpp_declarator_rule);
                self.run_check("main signature", Self::cpp_main_rule);
                self.run_check("includes", Self::cpp_include_rule);
            }
            Language::Pascal => {
                self.run_check("block pairing", Self::pascal_block_rule);
                self.run_check("program end", Self::pascal_end_rule);
            }
            Language::TSql | Language::PlSql => {
                self.run_check("statement verbs", Self::sql_verb_rule);
                self.run_check("table definitions", Self::sql_table_rule);
                self.run_check("unfiltered writes", Self::sql_where_rule);
            }
            Language::Html => {
                self.run_check("image text", Self::html_alt_rule);
                self.run_check("deprecated elements", Self::html_deprecated_rule);
            }
            Language::Unknown => {}
        }
    }

    fn run_check(&mut self, check: &'static str, rule: Check<'a>) {
        if let Err(fault) = rule(self) {
            warn!("{} rule `{check}` failed: {fault}", self.language);
            let position = self.position_of(0);
            self.report(SemanticError::CheckFailed {
                check,
                reason: fault.to_string(),
                position,
            });
        }
    }

    /// Position of a parse node, with the byte offset of the token that
    /// starts it when one matches.
    fn node_position(&self, node: &ParseNode) -> Position {
        let offset = self
            .tokens
            .iter()
            .find(|t| t.line == node.line && t.column == node.column)
            .map_or(0, |t| t.offset);
        Position::new(node.line, node.column, offset)
    }

    fn first_token_named(&self, names: &[&str]) -> Option<usize> {
        self.tokens
            .iter()
            .position(|t| t.is_identifier() && names.contains(&t.text.as_str()))
    }

    // ==================== Shared ====================

    fn naming_rules(&mut self) -> Result<(), AnalysisFault> {
        let findings: Vec<SemanticError> = self
            .table
            .entries()
            .iter()
            .filter(|e| !e.builtin)
            .filter_map(|e| {
                naming_violation(self.language, e).map(|style| {
                    SemanticError::rule(
                        Severity::Info,
                        format!("{} `{}` should be written in {style}", e.kind, e.name),
                        e.position(),
                    )
                })
            })
            .collect();
        debug!("naming rule found {} findings", findings.len());
        for finding in findings {
            self.report(finding);
        }
        Ok(())
    }

    // ==================== JavaScript ====================

    fn js_equality_rule(&mut self) -> Result<(), AnalysisFault> {
        let findings: Vec<(String, Position)> = self
            .tokens
            .iter()
            .filter(|t| t.is_punct("==") || t.is_punct("!="))
            .map(|t| (t.text.clone(), t.position()))
            .collect();
        for (operator, position) in findings {
            let strict = if operator == "==" { "===" } else { "!==" };
            self.report(SemanticError::rule(
                Severity::Info,
                format!("use `{strict}` instead of `{operator}` to avoid type coercion"),
                position,
            ));
        }
        Ok(())
    }

    fn js_var_rule(&mut self) -> Result<(), AnalysisFault> {
        let positions: Vec<Position> = self
            .tokens
            .iter()
            .filter(|t| t.is_keyword("var"))
            .map(|t| t.position())
            .collect();
        for position in positions {
            self.report(SemanticError::rule(
                Severity::Info,
                "prefer `let` or `const` over `var`",
                position,
            ));
        }
        Ok(())
    }

    // ==================== Python ====================

    fn python_print_rule(&mut self) -> Result<(), AnalysisFault> {
        for i in 0..self.tokens.len() {
            let token = self.token(i)?;
            if !(token.is_word("print") && self.at_line_start(i)) {
                continue;
            }
            let Some(next) = self.tok(i + 1) else {
                continue;
            };
            let same_line = next.line == token.line;
            let statement_form = same_line
                && !next.is_punct("(")
                && !next.is_punct(".")
                && !next.is_punct("=")
                && next.kind != TokenKind::Operator;
            if statement_form {
                self.report(SemanticError::rule(
                    Severity::Error,
                    "`print` is a function in Python 3; call it as `print(...)`",
                    token.position(),
                ));
            }
        }
        Ok(())
    }

    // ==================== C++ ====================

    fn cpp_declarator_rule(&mut self) -> Result<(), AnalysisFault> {
        for id in self.bare_declarations.clone() {
            let entry = self.table.get(id)?;
            let name = entry.name.clone();
            let position = entry.position();
            let declared = entry.data_type.clone().unwrap_or_default();
            if declared.ends_with('&') {
                self.report(SemanticError::rule(
                    Severity::Error,
                    format!("reference `{name}` must be bound to a value when it is declared"),
                    position,
                ));
            } else {
                self.report(SemanticError::rule(
                    Severity::Warning,
                    format!("pointer `{name}` is declared without a value"),
                    position,
                ));
            }
        }
        Ok(())
    }

    fn cpp_main_rule(&mut self) -> Result<(), AnalysisFault> {
        let void_main = self
            .table
            .entries()
            .iter()
            .find(|e| {
                e.name == "main"
                    && !e.builtin
                    && e.kind == SymbolKind::Function
                    && e.return_type.as_deref() == Some("void")
            })
            .map(SymbolEntry::position);
        if let Some(position) = void_main {
            self.report(SemanticError::rule(
                Severity::Warning,
                "`main` should return `int`, not `void`",
                position,
            ));
        }
        Ok(())
    }

    fn cpp_include_rule(&mut self) -> Result<(), AnalysisFault> {
        let includes: Vec<String> = self
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Directive && t.text.contains("include"))
            .map(|t| t.text.to_ascii_lowercase())
            .collect();
        let included = |header: &str| includes.iter().any(|d| d.contains(header));

        if let Some(i) = self.first_token_named(STREAM_NAMES)
            && !included("iostream")
        {
            let token = self.token(i)?;
            self.report(SemanticError::rule(
                Severity::Warning,
                format!("`{}` is used without `#include <iostream>`", token.text),
                token.position(),
            ));
        }

        if let Some(i) = self.first_token_named(STDIO_NAMES)
            && !included("cstdio")
            && !included("stdio.h")
        {
            let token = self.token(i)?;
            self.report(SemanticError::rule(
                Severity::Warning,
                format!("`{}` is used without `#include <cstdio>`", token.text),
                token.position(),
            ));
        }

        let using_std = (0..self.tokens.len()).any(|i| {
            self.is_keyword_at(i, "using")
                && (self.tok(i + 1).is_some_and(|t| t.is_word("namespace"))
                    && self.tok(i + 2).is_some_and(|t| t.text == "std")
                    || self.tok(i + 1).is_some_and(|t| t.text == "std")
                        && self.is_punct_at(i + 2, "::"))
        });
        if !using_std {
            let unqualified = (0..self.tokens.len()).find(|&i| {
                self.tok(i)
                    .is_some_and(|t| t.is_identifier() && STREAM_NAMES.contains(&t.text.as_str()))
                    && !self.previous(i).is_some_and(|p| p.is_punct("::"))
            });
            if let Some(i) = unqualified {
                let token = self.token(i)?;
                self.report(SemanticError::rule(
                    Severity::Warning,
                    format!("`{}` needs `std::` or `using namespace std`", token.text),
                    token.position(),
                ));
            }
        }
        Ok(())
    }

    // ==================== Pascal ====================

    fn pascal_block_rule(&mut self) -> Result<(), AnalysisFault> {
        let mut depth = 0usize;
        for i in 0..self.tokens.len() {
            let token = self.token(i)?;
            let next = self.tok(i + 1);
            if opens_block(self.language, token, self.previous(i), next) {
                depth += 1;
            } else if closes_block(self.language, token, next) {
                if depth == 0 {
                    self.report(SemanticError::rule(
                        Severity::Error,
                        "`end` without a matching `begin`",
                        token.position(),
                    ));
                } else {
                    depth -= 1;
                }
            }
        }
        Ok(())
    }

    fn pascal_end_rule(&mut self) -> Result<(), AnalysisFault> {
        let Some(last) = self.tokens.len().checked_sub(1) else {
            return Ok(());
        };
        let program = self.tok(0).is_some_and(|t| t.is_any_keyword(&["program", "unit", "library"]))
            || self.tokens.iter().any(|t| t.is_keyword("begin"));
        if !program {
            return Ok(());
        }
        let finished = self.is_punct_at(last, ".")
            && last > 0
            && self.is_keyword_at(last - 1, "end");
        if !finished {
            let position = self.position_of(last);
            self.report(SemanticError::rule(
                Severity::Warning,
                "the program should finish with `end.`",
                position,
            ));
        }
        Ok(())
    }

    // ==================== SQL ====================

    fn sql_verb_rule(&mut self) -> Result<(), AnalysisFault> {
        if self.tokens.is_empty() {
            return Ok(());
        }
        let has_verb = self
            .tokens
            .iter()
            .any(|t| t.is_any_keyword(SQL_VERBS) || t.is_word("exec") || t.is_word("merge"));
        if !has_verb {
            let position = self.position_of(0);
            self.report(SemanticError::rule(
                Severity::Error,
                "no SQL statement found (expected SELECT, INSERT, UPDATE, DELETE or CREATE)",
                position,
            ));
        }
        Ok(())
    }

    fn sql_table_rule(&mut self) -> Result<(), AnalysisFault> {
        let mut findings = Vec::new();
        for node in ast::find_all(self.nodes, NodeKind::CreateStatement) {
            if node.value() != Some("TABLE") {
                continue;
            }
            let table = node
                .child(NodeKind::Identifier)
                .and_then(ParseNode::value)
                .unwrap_or("?");
            match node.child(NodeKind::ColumnDefinitions) {
                Some(list) => findings.extend(self.column_findings(table, list)),
                None if node.child(NodeKind::SelectStatement).is_none() => {
                    findings.push(SemanticError::rule(
                        Severity::Error,
                        format!("CREATE TABLE `{table}` has no column definitions"),
                        self.node_position(node),
                    ));
                }
                None => {}
            }
        }
        for finding in findings {
            self.report(finding);
        }
        Ok(())
    }

    fn column_findings(&self, table: &str, list: &ParseNode) -> Vec<SemanticError> {
        let mut findings = Vec::new();
        if list.children.is_empty() {
            findings.push(SemanticError::rule(
                Severity::Error,
                format!("CREATE TABLE `{table}` has no columns"),
                self.node_position(list),
            ));
            return findings;
        }

        let mut seen = HashSet::new();
        for column in list.children.iter().filter(|c| c.kind == NodeKind::ColumnDefinition) {
            let name = column.value().unwrap_or("?");
            let position = self.node_position(column);
            if !seen.insert(name.to_ascii_lowercase()) {
                findings.push(SemanticError::rule(
                    Severity::Error,
                    format!("duplicate column `{name}` in `{table}`"),
                    position,
                ));
            }
            let Some(data_type) = column.child(NodeKind::Identifier).and_then(ParseNode::value) else {
                findings.push(SemanticError::rule(
                    Severity::Error,
                    format!("column `{name}` has no data type"),
                    position,
                ));
                continue;
            };
            let base = data_type
                .split(['(', ' '])
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();
            if !SQL_COLUMN_TYPES.contains(&base.as_str()) {
                findings.push(SemanticError::rule(
                    Severity::Warning,
                    format!("column `{name}` has unknown type `{data_type}`"),
                    position,
                ));
            }
        }
        findings
    }

    fn sql_where_rule(&mut self) -> Result<(), AnalysisFault> {
        let findings: Vec<(String, Position)> = ast::find_all(self.nodes, NodeKind::DataManipulation)
            .into_iter()
            .filter(|n| matches!(n.value(), Some("UPDATE" | "DELETE")))
            .filter(|n| n.child(NodeKind::Condition).is_none())
            .map(|n| (n.value().unwrap_or_default().to_string(), self.node_position(n)))
            .collect();
        for (verb, position) in findings {
            self.report(SemanticError::rule(
                Severity::Warning,
                format!("{verb} without WHERE affects every row"),
                position,
            ));
        }
        Ok(())
    }

    // ==================== HTML ====================

    fn html_alt_rule(&mut self) -> Result<(), AnalysisFault> {
        let findings: Vec<Position> = ast::find_all(self.nodes, NodeKind::Element)
            .into_iter()
            .filter(|n| n.value() == Some("img"))
            .filter(|n| {
                !n.children
                    .iter()
                    .any(|c| c.kind == NodeKind::Attribute && c.value() == Some("alt"))
            })
            .map(|n| self.node_position(n))
            .collect();
        for position in findings {
            self.report(SemanticError::rule(
                Severity::Warning,
                "`<img>` is missing an `alt` attribute",
                position,
            ));
        }
        Ok(())
    }

    fn html_deprecated_rule(&mut self) -> Result<(), AnalysisFault> {
        let findings: Vec<(String, Position)> = ast::find_all(self.nodes, NodeKind::Element)
            .into_iter()
            .filter_map(|n| {
                let tag = n.value()?;
                DEPRECATED_ELEMENTS
                    .contains(&tag)
                    .then(|| (tag.to_string(), self.node_position(n)))
            })
            .collect();
        for (tag, position) in findings {
            self.report(SemanticError::rule(
                Severity::Warning,
                format!("`<{tag}>` is deprecated"),
                position,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;
    use crate::lexer::lex;
    use crate::semantic::tests::run;

    fn messages(diags: &[Diagnostic]) -> Vec<&str> {
        diags.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn test_naming_styles() {
        assert!(is_camel_case("totalCount"));
        assert!(is_camel_case("$el"));
        assert!(!is_camel_case("total_count"));
        assert!(is_pascal_case("Greeter"));
        assert!(!is_pascal_case("greeter"));
        assert!(is_snake_case("__init__"));
        assert!(!is_snake_case("myFunc"));
        assert!(is_upper_snake_case("MAX_SIZE"));
    }

    #[test]
    fn test_js_naming_and_style() {
        let source = "var my_value = 1;\nclass point {}\nif (my_value == 1) {\n  console.log(new point());\n}\n";
        let (diags, _) = run(source, Language::JavaScript);
        let infos: Vec<&Diagnostic> = diags.iter().filter(|d| d.severity == Severity::Info).collect();
        assert_eq!(infos.len(), 4, "{diags:?}");
        let text = messages(&diags).join("\n");
        assert!(text.contains("variable `my_value` should be written in camelCase"));
        assert!(text.contains("class `point` should be written in PascalCase"));
        assert!(text.contains("use `===` instead of `==`"));
        assert!(text.contains("prefer `let` or `const`"));
    }

    #[test]
    fn test_python_naming() {
        let source = "def MyFunc():\n    return 1\n\nclass my_class:\n    pass\n\nMyFunc()\nmy_class()\n";
        let (diags, _) = run(source, Language::Python);
        assert_eq!(diags.len(), 2, "{diags:?}");
        assert!(diags.iter().all(|d| d.severity == Severity::Info));
    }

    #[test]
    fn test_python2_print_statement() {
        let tokens = lex("x = 1\nprint x\nprint(x)\n", Language::Python);
        let (diags, _) = crate::semantic::analyze(&tokens, &[], Language::Python);
        let errors: Vec<&Diagnostic> = diags.iter().filter(|d| d.is_error()).collect();
        assert_eq!(errors.len(), 1, "{diags:?}");
        assert_eq!(errors[0].line, 2);
    }

    #[test]
    fn test_void_main_warning() {
        let (diags, _) = run("void main() {\n}\n", Language::Cpp);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert_eq!(diags[0].severity, Severity::Warning);
        assert!(diags[0].message.contains("should return `int`"));
    }

    #[test]
    fn test_bare_pointer_warning() {
        let source = "int main() {\n    int* p;\n    int value = 1;\n    p = &value;\n    return *p;\n}\n";
        let (diags, _) = run(source, Language::Cpp);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert_eq!(diags[0].severity, Severity::Warning);
        assert!(diags[0].message.contains("pointer `p`"));
    }

    #[test]
    fn test_stream_without_include() {
        let source = "int main() {\n    std::cout << 1;\n    return 0;\n}\n";
        let (diags, _) = run(source, Language::Cpp);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].message.contains("#include <iostream>"));
    }

    #[test]
    fn test_unqualified_stream() {
        let source = "#include <iostream>\nint main() {\n    cout << 1;\n    return 0;\n}\n";
        let (diags, _) = run(source, Language::Cpp);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].message.contains("needs `std::`"));

        let source = "#include <iostream>\nusing namespace std;\nint main() {\n    cout << 1;\n    return 0;\n}\n";
        let (diags, _) = run(source, Language::Cpp);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn test_pascal_program_end() {
        let tokens = lex("program P;\nbegin\n  writeln(1);\nend;\n", Language::Pascal);
        let (diags, _) = crate::semantic::analyze(&tokens, &[], Language::Pascal);
        assert!(
            diags.iter().any(|d| d.message.contains("`end.`") && d.severity == Severity::Warning),
            "{diags:?}"
        );
    }

    #[test]
    fn test_pascal_unpaired_end() {
        let tokens = lex("program P;\nbegin\n  writeln(1);\nend;\nend.\n", Language::Pascal);
        let (diags, _) = crate::semantic::analyze(&tokens, &[], Language::Pascal);
        let errors: Vec<&Diagnostic> = diags.iter().filter(|d| d.is_error()).collect();
        assert_eq!(errors.len(), 1, "{diags:?}");
        assert_eq!(errors[0].line, 5);
    }

    #[test]
    fn test_update_without_where() {
        let (diags, _) = run("UPDATE users SET active = 0;\nDELETE FROM users WHERE id = 1;\n", Language::TSql);
        let warnings: Vec<&Diagnostic> = diags.iter().filter(|d| d.severity == Severity::Warning).collect();
        assert_eq!(warnings.len(), 1, "{diags:?}");
        assert!(warnings[0].message.starts_with("UPDATE without WHERE"));
    }

    #[test]
    fn test_sql_without_statement() {
        let tokens = lex("users, orders", Language::TSql);
        let (diags, _) = crate::semantic::analyze(&tokens, &[], Language::TSql);
        assert!(diags.iter().any(|d| d.is_error() && d.message.contains("no SQL statement")), "{diags:?}");
    }

    #[test]
    fn test_table_columns() {
        let (diags, _) = run("CREATE TABLE t ();\n", Language::PlSql);
        assert!(diags.iter().any(|d| d.is_error() && d.message.contains("has no columns")), "{diags:?}");

        let source = "CREATE TABLE users (id INT, name VARCHAR(20), ID INT, score WIDGET);\n";
        let (diags, _) = run(source, Language::TSql);
        let text = messages(&diags).join("\n");
        assert!(text.contains("duplicate column `ID` in `users`"), "{text}");
        assert!(text.contains("unknown type `WIDGET`"), "{text}");
        assert!(!text.contains("VARCHAR"), "{text}");
    }

    #[test]
    fn test_html_rules() {
        let source = "<html><body><img src=\"a.png\"><img src=\"b.png\" alt=\"b\"><center>x</center></body></html>";
        let (diags, _) = run(source, Language::Html);
        let text = messages(&diags).join("\n");
        assert_eq!(diags.len(), 2, "{text}");
        assert!(text.contains("missing an `alt` attribute"));
        assert!(text.contains("`<center>` is deprecated"));
    }
}
