//! Pass 2: name resolution and assignment checks.
//!
//! Walks the tokens again, replaying scopes from their recorded ranges,
//! and looks up every identifier that is a name use. A use is classified
//! as a read, a write, a read-modify-write or an input target (`cin >>`,
//! `readln`, `INTO`), which decides the checks that apply.
//!
//! How strict a missing name is depends on the language:
//!
//! | Language | Undeclared read | Undeclared write |
//! |---|---|---|
//! | C++, Pascal | error | error |
//! | T-SQL | error for `@names` | error for `@names` |
//! | PL/SQL | not reported | error |
//! | JavaScript, Python | warning | implicit global |
//!
//! Each missing name is reported once.

use std::collections::HashSet;

use crate::diagnostics::{AnalysisFault, Severity};
use crate::language::Language;
use crate::parser::expressions::{is_closer, is_opener};
use crate::semantic::symbols::{ScopeWalker, SymbolId};
use crate::semantic::{
    ScopeId, ScopeKind, SemanticAnalyzer, SemanticError, SymbolEntry, SymbolKind, ValueType,
};

const COMPOUND_OPERATORS: &[&str] = &[
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=", "**=", "//=", "++", "--",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Read,
    Write,
    /// `name[i] = value`
    ElementWrite,
    ReadWrite,
    Input,
}

impl Role {
    fn stores(self) -> bool {
        !matches!(self, Role::Read)
    }
}

enum Lookup {
    Found(SymbolId),
    /// Declared in a visible scope, but after this use.
    Later(SymbolId),
    Missing,
}

/// Per-walk bookkeeping.
#[derive(Default)]
struct Reported {
    names: HashSet<String>,
    uninitialized: HashSet<SymbolId>,
}

impl<'a> SemanticAnalyzer<'a> {
    pub(super) fn verify(&mut self) -> Result<(), AnalysisFault> {
        let inputs = self.input_targets();
        let mut walker = ScopeWalker::new(&self.table);
        let mut reported = Reported::default();
        let mut depth = 0usize;

        for i in 0..self.tokens.len() {
            let token = self.token(i)?;
            let scope = walker.advance(&self.table, token.offset);
            if is_opener(token) {
                depth += 1;
                continue;
            }
            if is_closer(token) {
                depth = depth.saturating_sub(1);
                continue;
            }
            if !self.is_name_use(i, depth) {
                continue;
            }
            let role = if inputs.contains(&i) {
                Role::Input
            } else {
                self.role_of(i)
            };
            self.resolve_use(i, scope, role, &mut reported)?;
        }

        self.check_unused();
        Ok(())
    }

    fn dynamic(&self) -> bool {
        matches!(
            self.language,
            Language::JavaScript | Language::Python | Language::Unknown
        )
    }

    fn scope_kind(&self, id: ScopeId) -> ScopeKind {
        self.table.scope(id).map_or(ScopeKind::Global, |s| s.kind)
    }

    // ==================== Uses ====================

    fn is_name_use(&self, i: usize, depth: usize) -> bool {
        let Some(token) = self.tok(i) else {
            return false;
        };
        if !token.is_identifier()
            || self.language == Language::Html
            || self.declaration_sites.contains(&token.offset)
            || self.is_opaque(token.offset)
        {
            return false;
        }
        let previous = self.previous(i);
        if previous.is_some_and(|p| [".", "->", "::", "?."].iter().any(|m| p.is_punct(m))) {
            return false;
        }
        let next_is = |text: &str| self.is_punct_at(i + 1, text);
        match self.language {
            // Object literal keys.
            Language::JavaScript | Language::Unknown => {
                !(next_is(":") && previous.is_some_and(|p| p.is_punct("{") || p.is_punct(",")))
            }
            // Keyword arguments.
            Language::Python => !(depth > 0 && next_is("=")),
            _ => true,
        }
    }

    fn assignment_operator(&self) -> &'static str {
        match self.language {
            Language::Pascal | Language::PlSql => ":=",
            _ => "=",
        }
    }

    fn role_of(&self, i: usize) -> Role {
        let assign = self.assignment_operator();
        if self.is_punct_at(i + 1, assign) {
            if self.language == Language::TSql {
                let statement = self.previous(i).is_some_and(|p| {
                    p.is_any_keyword(&["set", "select"]) || p.is_punct(",")
                });
                return if statement { Role::Write } else { Role::Read };
            }
            return Role::Write;
        }
        if self.is_punct_at(i + 1, "[")
            && let Some(close) = self.group_end(i + 1)
            && self.is_punct_at(close + 1, assign)
        {
            return Role::ElementWrite;
        }
        let compound = |k: usize| {
            self.tok(k)
                .is_some_and(|t| COMPOUND_OPERATORS.iter().any(|op| t.is_punct(op)))
        };
        let prefix = i
            .checked_sub(1)
            .is_some_and(|p| self.is_punct_at(p, "++") || self.is_punct_at(p, "--"));
        if compound(i + 1) || prefix {
            return Role::ReadWrite;
        }
        Role::Read
    }

    /// Token indices that receive input: `cin >> x`, `getline(cin, s)`,
    /// `scanf("%d", &n)`, `readln(a, b)` and `INTO a, b`.
    fn input_targets(&self) -> HashSet<usize> {
        let mut targets = HashSet::new();
        for (i, token) in self.tokens.iter().enumerate() {
            match self.language {
                Language::Cpp if token.text == "cin" => {
                    let end = self.find_at_depth(i, |t| t.is_punct(";"));
                    for k in i + 1..end {
                        if self.is_punct_at(k, ">>") && self.tok(k + 1).is_some_and(|t| t.is_identifier()) {
                            targets.insert(k + 1);
                        }
                    }
                }
                Language::Cpp if token.text == "getline" && self.is_punct_at(i + 1, "(") => {
                    let comma = self.find_at_depth(i + 2, |t| t.is_punct(","));
                    if self.is_punct_at(comma, ",") && self.tok(comma + 1).is_some_and(|t| t.is_identifier()) {
                        targets.insert(comma + 1);
                    }
                }
                Language::Cpp if token.text == "scanf" && self.is_punct_at(i + 1, "(") => {
                    let close = self.group_end(i + 1).unwrap_or(self.tokens.len());
                    for k in i + 2..close {
                        if self.is_punct_at(k, "&") && self.tok(k + 1).is_some_and(|t| t.is_identifier()) {
                            targets.insert(k + 1);
                        }
                    }
                }
                Language::Pascal
                    if token.is_word("read") || token.is_word("readln") =>
                {
                    if !self.is_punct_at(i + 1, "(") {
                        continue;
                    }
                    let close = self.group_end(i + 1).unwrap_or(self.tokens.len());
                    for k in i + 2..close {
                        let after_separator = self.is_punct_at(k - 1, "(") || self.is_punct_at(k - 1, ",");
                        if after_separator && self.tok(k).is_some_and(|t| t.is_identifier()) {
                            targets.insert(k);
                        }
                    }
                }
                Language::TSql | Language::PlSql if token.is_keyword("into") => {
                    let mut k = i + 1;
                    while self.tok(k).is_some_and(|t| t.is_identifier()) {
                        if !self.is_punct_at(k + 1, "(") {
                            targets.insert(k);
                        }
                        if !self.is_punct_at(k + 1, ",") {
                            break;
                        }
                        k += 2;
                    }
                }
                _ => {}
            }
        }
        targets
    }

    // ==================== Resolution ====================

    /// Finds `name` from `scope` outwards, honoring declaration order.
    fn find_visible(&self, scope: ScopeId, name: &str, offset: u32) -> Result<Lookup, AnalysisFault> {
        let mut later = None;
        for s in self.table.chain(scope) {
            let Some(id) = self.table.lookup_local(s, name) else {
                continue;
            };
            let entry = self.table.get(id)?;
            let visible = entry.builtin
                || entry.visible_from <= offset
                || self.scope_kind(s) == ScopeKind::Class
                || (self.dynamic() && (entry.kind.is_callable() || s != scope));
            if visible {
                return Ok(Lookup::Found(id));
            }
            later.get_or_insert(id);
        }
        Ok(later.map_or(Lookup::Missing, Lookup::Later))
    }

    /// Severity for a missing name, or `None` when the language does
    /// not report it.
    fn missing_severity(&self, name: &str, write: bool) -> Option<Severity> {
        match self.language {
            Language::Cpp | Language::Pascal => Some(Severity::Error),
            Language::TSql => name.starts_with('@').then_some(Severity::Error),
            Language::PlSql => write.then_some(Severity::Error),
            Language::JavaScript | Language::Python | Language::Unknown => Some(Severity::Warning),
            Language::Html => None,
        }
    }

    fn resolve_use(
        &mut self,
        i: usize,
        scope: ScopeId,
        role: Role,
        reported: &mut Reported,
    ) -> Result<(), AnalysisFault> {
        let token = self.token(i)?;
        let name = token.text.as_str();
        let position = token.position();

        let from = if self
            .table
            .chain(scope)
            .any(|s| self.table.is_global_name(s, name))
        {
            ScopeId::GLOBAL
        } else {
            scope
        };

        match self.find_visible(from, name, token.offset)? {
            Lookup::Found(id) => self.check_use(id, i, role, reported),
            Lookup::Later(id) => {
                let declared_line = self.table.get(id)?.line;
                let write = matches!(role, Role::Write | Role::ElementWrite);
                if let Some(severity) = self.missing_severity(name, write)
                    && reported.names.insert(self.profile.normalize(name).into_owned())
                {
                    self.report(SemanticError::UsedBeforeDeclaration {
                        name: name.to_string(),
                        declared_line,
                        severity,
                        position,
                    });
                }
                Ok(())
            }
            Lookup::Missing if matches!(role, Role::Write | Role::ElementWrite) => {
                if self.dynamic() {
                    // Assignment creates the binding.
                    let entry = SymbolEntry::new(name, SymbolKind::Variable, position).initialized(true);
                    let _ = self.table.define_in(ScopeId::GLOBAL, entry);
                } else if self.missing_severity(name, true).is_some()
                    && reported.names.insert(self.profile.normalize(name).into_owned())
                {
                    self.report(SemanticError::AssignmentToUndeclared {
                        name: name.to_string(),
                        position,
                    });
                }
                Ok(())
            }
            Lookup::Missing => {
                if let Some(severity) = self.missing_severity(name, false)
                    && reported.names.insert(self.profile.normalize(name).into_owned())
                {
                    self.report(SemanticError::Undeclared {
                        name: name.to_string(),
                        severity,
                        position,
                    });
                }
                Ok(())
            }
        }
    }

    /// Checks on a use that resolved to `id`.
    fn check_use(&mut self, id: SymbolId, i: usize, role: Role, reported: &mut Reported) -> Result<(), AnalysisFault> {
        let position = self.position_of(i);
        let entry = self.table.get(id)?;
        let name = entry.name.clone();
        let constant = entry.is_constant;
        let declared = entry.data_type.clone().or_else(|| entry.return_type.clone());
        let unset = matches!(role, Role::Read | Role::ReadWrite)
            && !entry.is_initialized
            && self.tracks_initialization(entry);

        if unset && reported.uninitialized.insert(id) {
            self.report(SemanticError::Uninitialized {
                name: name.clone(),
                position,
            });
        }
        if role.stores() && constant {
            self.report(SemanticError::AssignmentToConstant { name, position });
        } else if role == Role::Write
            && let Some(declared) = declared
        {
            self.check_initializer(&name, position, &declared, i + 2);
        }

        let entry = self.table.get_mut(id)?;
        if role != Role::Write {
            entry.is_used = true;
        }
        if role.stores() {
            entry.is_initialized = true;
        }
        Ok(())
    }

    /// Whether reads of `entry` before any store are reported.
    fn tracks_initialization(&self, entry: &SymbolEntry) -> bool {
        !self.dynamic()
            && entry.kind == SymbolKind::Variable
            && !entry.builtin
            && self.scope_kind(entry.scope_id) != ScopeKind::Class
            && !(self.language == Language::Cpp && entry.scope_id == ScopeId::GLOBAL)
            && entry
                .data_type
                .as_deref()
                .is_some_and(|t| ValueType::from_declared(t, self.language).is_scalar())
    }

    /// Variables that are never read. Dynamic languages are skipped.
    fn check_unused(&mut self) {
        if self.dynamic() || self.language == Language::Html {
            return;
        }
        let unused: Vec<_> = self
            .table
            .entries()
            .iter()
            .filter(|e| {
                e.kind == SymbolKind::Variable
                    && !e.builtin
                    && !e.is_used
                    && self.scope_kind(e.scope_id) != ScopeKind::Class
            })
            .map(|e| SemanticError::UnusedVariable {
                name: e.name.clone(),
                position: e.position(),
            })
            .collect();
        for error in unused {
            self.report(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::Severity;
    use crate::language::Language;
    use crate::semantic::tests::run;

    #[test]
    fn test_undeclared_severity_follows_language() {
        let (cpp, _) = run("int main() {\n    return total;\n}\n", Language::Cpp);
        assert_eq!(cpp.len(), 1, "{cpp:?}");
        assert_eq!(cpp[0].severity, Severity::Error);
        assert_eq!((cpp[0].line, cpp[0].column), (2, 12));

        let (js, _) = run("console.log(total);\n", Language::JavaScript);
        assert_eq!(js.len(), 1);
        assert_eq!(js[0].severity, Severity::Warning);
        assert!(js[0].message.contains("`total` is not declared"));
    }

    #[test]
    fn test_missing_name_reported_once() {
        let (diags, _) = run("console.log(total);\nconsole.log(total + 1);\n", Language::JavaScript);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_use_before_declaration() {
        let (diags, _) = run("console.log(x);\nlet x = 1;\n", Language::JavaScript);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("before its declaration on line 2"));
        assert_eq!(diags[0].severity, Severity::Warning);
    }

    #[test]
    fn test_function_declarations_are_hoisted() {
        let (diags, _) = run("greet();\nfunction greet() {\n  return 1;\n}\n", Language::JavaScript);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn test_implicit_global_in_script() {
        let (diags, symbols) = run("counter = 1;\nconsole.log(counter);\n", Language::JavaScript);
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(symbols[0].name, "counter");
    }

    #[test]
    fn test_assignment_to_constant() {
        let (diags, _) = run("const limit = 1;\nlimit = 2;\n", Language::JavaScript);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_error());
        assert!(diags[0].message.contains("cannot assign to constant `limit`"));
    }

    #[test]
    fn test_assignment_type_mismatch() {
        let source = "int main() {\n    int n = 0;\n    n = \"five\";\n    return n;\n}\n";
        let (diags, _) = run(source, Language::Cpp);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert_eq!(diags[0].line, 3);
        assert!(diags[0].message.contains("cannot assign a value of type string to `n`"));
    }

    #[test]
    fn test_uninitialized_read_reported_once() {
        let source = "int main() {\n    int n;\n    int m = n + n;\n    return m;\n}\n";
        let (diags, _) = run(source, Language::Cpp);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert_eq!(diags[0].severity, Severity::Warning);
        assert!(diags[0].message.contains("`n` is used before it is initialized"));
    }

    #[test]
    fn test_input_initializes() {
        let source = "#include <iostream>\nusing namespace std;\nint main() {\n    int n;\n    cin >> n;\n    return n;\n}\n";
        let (diags, _) = run(source, Language::Cpp);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn test_unused_variable() {
        let source = "int main() {\n    int spare = 1;\n    return 0;\n}\n";
        let (diags, _) = run(source, Language::Cpp);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].message.contains("`spare` is declared but never used"));
    }

    #[test]
    fn test_plsql_reports_writes_only() {
        let source = "BEGIN\n  v_missing := other_missing;\nEND;\n";
        let (diags, _) = run(source, Language::PlSql);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].message.contains("assignment to undeclared `v_missing`"));
    }
}
