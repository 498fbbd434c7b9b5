//! Pass 1: declaration collection.
//!
//! One forward walk over the tokens. Each language module recognizes the
//! declarations it knows at the current index and returns the index the
//! walk continues from, which is usually just past the declared names so
//! that initializers and bodies are still visited.
//!
//! Scopes are opened when their first token is reached, with their full
//! byte range computed up front (matching brace, `END`, or indentation).
//! The walk leaves a scope once it passes the end of that range.
//!
//! - [`script`] - JavaScript (and the generic fallback), plus the block
//!   scopes shared with C++
//! - [`cpp`] - C++
//! - [`python`] - Python
//! - [`pascal`] - Pascal
//! - [`sql`] - T-SQL and PL/SQL
//! - HTML element ids are handled here

mod cpp;
mod pascal;
mod python;
mod script;
mod sql;

use crate::diagnostics::{AnalysisFault, Position, Severity};
use crate::language::Language;
use crate::lexer::{Token, TokenCategory, TokenKind};
use crate::parser::expressions::{is_closer, is_opener};
use crate::semantic::symbols::SymbolId;
use crate::semantic::{
    ParamInfo, ScopeId, ScopeKind, SemanticAnalyzer, SemanticError, SymbolEntry, SymbolKind,
    ValueType,
};

/// Words that start a nested routine inside a Pascal or PL/SQL body.
const ROUTINE_WORDS: &[&str] = &["procedure", "function", "constructor", "destructor"];

/// Whether `token` opens a block that a later `END` closes.
pub(super) fn opens_block(
    language: Language,
    token: &Token,
    previous: Option<&Token>,
    next: Option<&Token>,
) -> bool {
    match language {
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

/// Whether `token` is an `END` that closes a block.
pub(super) fn closes_block(language: Language, token: &Token, next: Option<&Token>) -> bool {
    if !token.is_keyword("end") {
        return false;
    }
    match language {
        Language::PlSql => !next.is_some_and(|n| n.is_any_keyword(&["if", "loop"])),
        _ => true,
    }
}

fn unquote(text: &str) -> &str {
    text.trim_matches(['"', '\''])
}

impl<'a> SemanticAnalyzer<'a> {
    pub(super) fn collect_declarations(&mut self) -> Result<(), AnalysisFault> {
        let mut i = 0;
        while i < self.tokens.len() {
            let offset = self.token(i)?.offset;
            self.table.exit_scopes_ending_by(offset);
            let next = match self.language {
                Language::JavaScript | Language::Unknown => self.script_declaration(i)?,
                Language::Python => self.python_declaration(i)?,
                Language::Cpp => self.cpp_declaration(i)?,
                Language::Pascal => self.pascal_declaration(i)?,
                Language::TSql => self.tsql_declaration(i)?,
                Language::PlSql => self.plsql_declaration(i)?,
                Language::Html => self.markup_declaration(i)?,
            };
            i = next.max(i + 1);
        }
        self.table.set_current_scope(ScopeId::GLOBAL);
        Ok(())
    }

    // ==================== Symbols ====================

    fn current_kind(&self) -> ScopeKind {
        self.table
            .scope(self.table.current_scope())
            .map_or(ScopeKind::Global, |s| s.kind)
    }

    fn current_scope_name(&self) -> Option<&str> {
        self.table
            .scope(self.table.current_scope())
            .ok()
            .map(|s| s.name.as_str())
    }

    /// Entry for the name written at `index`.
    fn entry_at(&self, index: usize, kind: SymbolKind) -> Result<SymbolEntry, AnalysisFault> {
        let token = self.token(index)?;
        Ok(SymbolEntry::new(token.text.as_str(), kind, token.position()))
    }

    fn declare(&mut self, entry: SymbolEntry) -> Option<SymbolId> {
        self.declare_in(self.table.current_scope(), entry)
    }

    fn declare_in(&mut self, scope: ScopeId, entry: SymbolEntry) -> Option<SymbolId> {
        self.declaration_sites.insert(entry.offset);
        match self.table.define_in(scope, entry.clone()) {
            Ok(id) => Some(id),
            Err(existing) => {
                self.redeclared(existing, &entry);
                None
            }
        }
    }

    fn redeclared(&mut self, existing: SymbolId, entry: &SymbolEntry) {
        let Ok(prior) = self.table.get(existing) else {
            return;
        };
        let severity = match self.language {
            Language::Python if !entry.kind.is_callable() => return,
            Language::Python => Severity::Warning,
            Language::Cpp
                if prior.kind == entry.kind
                    && (entry.forward || (entry.kind.is_callable() && prior.parameters != entry.parameters)) =>
            {
                // A repeated prototype, a forward declaration after the
                // definition, or an overload.
                return;
            }
            _ => Severity::Error,
        };
        let previous_line = prior.line;
        self.report(SemanticError::Redeclared {
            name: entry.name.clone(),
            previous_line,
            severity,
            position: entry.position(),
        });
    }

    /// Parameter infos for the names at `indices`.
    fn param_infos(&self, params: &[(usize, Option<String>)]) -> Vec<ParamInfo> {
        params
            .iter()
            .filter_map(|(index, data_type)| {
                self.tok(*index).map(|t| ParamInfo {
                    name: t.text.clone(),
                    data_type: data_type.clone(),
                })
            })
            .collect()
    }

    /// Declares the parameters of a routine in the current scope.
    fn declare_params(&mut self, params: &[(usize, Option<String>)]) -> Result<(), AnalysisFault> {
        for (index, data_type) in params {
            let mut entry = self.entry_at(*index, SymbolKind::Parameter)?;
            entry.data_type = data_type.clone();
            self.declare(entry);
        }
        Ok(())
    }

    // ==================== Initializers ====================

    /// Type of a literal initializer at `index` (optionally negated) that
    /// makes up the whole value.
    fn literal_initializer(&self, index: usize) -> Option<ValueType> {
        let negated = self.is_punct_at(index, "-");
        let at = if negated { index + 1 } else { index };
        let token = self.tok(at)?;
        let value_type = ValueType::of_literal(token, self.language)?;
        if negated && !matches!(value_type, ValueType::Integer | ValueType::Real) {
            return None;
        }
        let complete = match self.tok(at + 1) {
            None => true,
            Some(next) => {
                next.is_punct(";")
                    || next.is_punct(",")
                    || next.is_punct(")")
                    || next.line > token.line
                    || next.category == TokenCategory::ReservedWord
            }
        };
        complete.then_some(value_type)
    }

    /// Reports a literal initializer that cannot be stored in `declared`.
    pub(super) fn check_initializer(&mut self, name: &str, position: Position, declared: &str, value: usize) {
        let Some(found) = self.literal_initializer(value) else {
            return;
        };
        let expected = ValueType::from_declared(declared, self.language);
        if !self.profile.allows_conversion(found, expected) {
            self.report(SemanticError::TypeMismatch {
                name: name.to_string(),
                expected,
                found,
                position,
            });
        }
    }

    /// Index just past an expression starting at `from`: the first `,`,
    /// `;` or unmatched closer, or (in languages without statement
    /// terminators) a line break that does not continue the expression.
    fn expression_end(&self, from: usize) -> usize {
        let line_sensitive = matches!(
            self.language,
            Language::JavaScript | Language::Python | Language::Unknown
        );
        let mut depth = 0usize;
        let mut previous = self.previous(from);
        for (k, token) in self.tokens.iter().enumerate().skip(from) {
            if depth == 0 {
                if token.is_punct(",") || token.is_punct(";") || is_closer(token) {
                    return k;
                }
                if line_sensitive
                    && let Some(p) = previous
                    && token.line > p.line
                    && !(p.category == TokenCategory::Operator || is_opener(p) || p.is_punct(","))
                    && !(token.category == TokenCategory::Operator || token.text == ".")
                {
                    return k;
                }
            }
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                depth -= 1;
            }
            previous = Some(token);
        }
        self.tokens.len()
    }

    /// Indices of the names bound by a pattern in `tokens[start..end]`:
    /// plain names, destructured names and rest elements. Default values
    /// and object keys are skipped.
    fn binding_names(&self, start: usize, end: usize) -> Vec<usize> {
        let mut names = Vec::new();
        let mut depth = 0usize;
        let mut skip_at: Option<usize> = None;
        for k in start..end.min(self.tokens.len()) {
            let token = self.tokens[k];
            if let Some(level) = skip_at {
                if is_opener(token) {
                    depth += 1;
                } else if is_closer(token) {
                    if depth == level {
                        skip_at = None;
                    }
                    depth = depth.saturating_sub(1);
                } else if depth == level && token.is_punct(",") {
                    skip_at = None;
                }
                continue;
            }
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                depth = depth.saturating_sub(1);
            } else if token.is_punct("=") {
                skip_at = Some(depth);
            } else if token.is_identifier()
                && !self.is_punct_at(k + 1, ":")
                && !self.previous(k).is_some_and(|p| p.is_punct("."))
            {
                names.push(k);
            }
        }
        names
    }

    /// Index of the last token on the line of `index`.
    fn line_end(&self, index: usize) -> usize {
        let Some(line) = self.tok(index).map(|t| t.line) else {
            return index;
        };
        let mut k = index;
        while self.tok(k + 1).is_some_and(|t| t.line == line) {
            k += 1;
        }
        k
    }

    // ==================== Blocks ====================

    /// Index of the `END` closing the routine whose header ends before
    /// `from` (Pascal, PL/SQL, T-SQL `BEGIN` bodies). Nested routines
    /// declared before the body are skipped.
    fn routine_end(&self, from: usize) -> usize {
        let mut pending = 1usize;
        let mut stack: Vec<bool> = Vec::new();
        for k in from..self.tokens.len() {
            let token = self.tokens[k];
            let previous = self.previous(k);
            let next = self.tok(k + 1);
            if stack.is_empty()
                && token.is_any_keyword(ROUTINE_WORDS)
                && !previous.is_some_and(|p| p.is_punct(":") || p.is_punct("=") || p.is_keyword("end"))
            {
                pending += 1;
                continue;
            }
            if stack.is_empty() && pending > 1 && (token.is_word("forward") || token.is_word("external")) {
                pending -= 1;
                continue;
            }
            if opens_block(self.language, token, previous, next) {
                stack.push(token.is_keyword("begin"));
            } else if closes_block(self.language, token, next) {
                let was_body = stack.pop();
                if stack.is_empty() && was_body == Some(true) {
                    pending -= 1;
                    if pending == 0 {
                        return k;
                    }
                }
            }
        }
        self.tokens.len().saturating_sub(1)
    }

    // ==================== HTML ====================

    /// `id="name"` attributes; each id may appear once per document.
    fn markup_declaration(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let token = self.token(i)?;
        if !token.is_word("id") || !self.is_punct_at(i + 1, "=") {
            return Ok(i + 1);
        }
        let Some(value) = self.tok(i + 2) else {
            return Ok(i + 2);
        };
        let name = if value.kind == TokenKind::StringLiteral {
            unquote(&value.text)
        } else {
            value.text.as_str()
        };
        if !name.is_empty() {
            let mut entry = SymbolEntry::new(name, SymbolKind::Variable, value.position())
                .with_type("element id")
                .initialized(true);
            entry.is_used = true;
            self.declare(entry);
        }
        Ok(i + 3)
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::Severity;
    use crate::language::Language;
    use crate::semantic::tests::run;
    use crate::semantic::SymbolKind;

    #[test]
    fn test_duplicate_html_id() {
        let source = "<html><body><div id=\"main\"></div><p id=\"main\">x</p></body></html>";
        let (diags, symbols) = run(source, Language::Html);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "main");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_error());
        assert!(diags[0].message.contains("already declared"));
    }

    #[test]
    fn test_redeclaration_is_error() {
        let source = "let count = 1;\nlet count = 2;\nconsole.log(count);\n";
        let (diags, _) = run(source, Language::JavaScript);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].line, 2);
        assert!(diags[0].message.contains("line 1"));
    }

    #[test]
    fn test_literal_type_mismatch_in_declaration() {
        let source = "int main() {\n    int count = \"three\";\n    return count;\n}\n";
        let (diags, symbols) = run(source, Language::Cpp);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].message.contains("cannot assign a value of type string to `count`"));
        let count = symbols.iter().find(|s| s.name == "count").unwrap();
        assert_eq!(count.kind, SymbolKind::Variable);
        assert_eq!(count.data_type.as_deref(), Some("int"));
    }
}
