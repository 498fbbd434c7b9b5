//! Python declarations.
//!
//! Names are bound by assignment, `def`, `class`, `for`, `import`,
//! `with ... as`, `except ... as` and function parameters. A suite ends
//! at the first later line indented no deeper than its header.
//! Comprehensions and lambdas get their own scope.

use crate::diagnostics::AnalysisFault;
use crate::lexer::TokenCategory;
use crate::parser::expressions::{is_closer, is_opener};
use crate::semantic::{ScopeId, ScopeKind, SemanticAnalyzer, SymbolKind};

/// Parameter name index and annotation text.
type Param = (usize, Option<String>);

impl<'a> SemanticAnalyzer<'a> {
    pub(super) fn python_declaration(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let token = self.token(i)?;
        if token.category == TokenCategory::ReservedWord {
            return match token.text.as_str() {
                "def" => self.python_def(i),
                "class" => self.python_class(i),
                "for" => self.python_for(i),
                "import" | "from" if self.python_statement_start(i) => self.python_import(i),
                "with" | "except" => self.python_as_targets(i),
                "global" | "nonlocal" => self.python_global(i),
                "lambda" => self.python_lambda(i),
                _ => Ok(i + 1),
            };
        }
        if is_opener(token) {
            self.python_comprehension(i)?;
            return Ok(i + 1);
        }
        if token.is_identifier() && self.python_statement_start(i) {
            return self.python_assignment(i);
        }
        Ok(i + 1)
    }

    fn python_statement_start(&self, i: usize) -> bool {
        self.at_line_start(i) || self.previous(i).is_some_and(|p| p.is_punct(";"))
    }

    /// Last index of the suite whose header starts at `head` and whose
    /// colon is at `colon`.
    fn python_block_end(&self, head: usize, colon: usize) -> usize {
        let last = self.tokens.len().saturating_sub(1);
        let Some(colon_token) = self.tok(colon) else {
            return last;
        };
        if self
            .tok(colon + 1)
            .is_some_and(|t| t.line == colon_token.line)
        {
            return self.line_end(colon);
        }
        let mut first = head;
        while first > 0 && !self.at_line_start(first) {
            first -= 1;
        }
        let indent = self.tok(first).map_or(1, |t| t.column);
        for k in colon + 1..self.tokens.len() {
            if self.at_line_start(k) && self.tokens[k].column <= indent {
                return k - 1;
            }
        }
        last
    }

    /// Binds `index` in the current scope, or in the global scope after a
    /// `global` statement. A name already bound there is only marked as
    /// initialized.
    fn python_bind(
        &mut self,
        index: usize,
        data_type: Option<String>,
        initialized: bool,
    ) -> Result<(), AnalysisFault> {
        let token = self.token(index)?;
        let current = self.table.current_scope();
        let function = self.table.enclosing_function(current);
        let scope = if self.table.is_global_name(function, &token.text) {
            ScopeId::GLOBAL
        } else {
            current
        };
        if let Some(existing) = self.table.lookup_local(scope, &token.text) {
            self.table.get_mut(existing)?.is_initialized |= initialized;
            return Ok(());
        }
        let mut entry = self
            .entry_at(index, SymbolKind::Variable)?
            .initialized(initialized);
        entry.data_type = data_type;
        self.declare_in(scope, entry);
        Ok(())
    }

    // ==================== Assignments ====================

    /// `a = 1`, `a, b = b, a`, `x = y = 0` and `count: int = 0`.
    fn python_assignment(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let line = self.token(i)?.line;
        let mut start = i;
        let mut resume = i + 1;
        loop {
            // A target list holds names, commas, brackets and `*`.
            let mut k = start;
            while let Some(token) = self.tok(k) {
                if token.line != line {
                    break;
                }
                if token.is_identifier() {
                    if self.is_punct_at(k + 1, "(") || self.is_punct_at(k + 1, "[") {
                        return Ok(resume);
                    }
                } else if !(token.is_punct(",")
                    || token.is_punct("(")
                    || token.is_punct(")")
                    || token.is_punct("[")
                    || token.is_punct("]")
                    || token.is_punct("*"))
                {
                    break;
                }
                k += 1;
            }
            if k == start {
                return Ok(resume);
            }

            if self.is_punct_at(k, "=") {
                let literal = self.literal_initializer(k + 1).map(|t| t.as_str().to_string());
                for name in self.binding_names(start, k) {
                    self.python_bind(name, literal.clone(), true)?;
                }
                resume = k + 1;
                start = k + 1;
                continue;
            }

            if self.is_punct_at(k, ":") && start == i && k == i + 1 {
                let line_end = self.line_end(k);
                let equals = self
                    .find_at_depth(k + 1, |t| t.is_punct("="))
                    .min(line_end + 1);
                let annotation = self.text_between(k + 1, equals);
                self.mark_opaque(k + 1, equals - 1);
                let initialized = self.is_punct_at(equals, "=");
                if initialized {
                    let token = self.token(i)?;
                    self.check_initializer(&token.text, token.position(), &annotation, equals + 1);
                }
                self.python_bind(i, Some(annotation), initialized)?;
                return Ok(equals + 1);
            }
            return Ok(resume);
        }
    }

    fn python_for(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let in_index = self.find_at_depth(i + 1, |t| t.is_keyword("in"));
        for name in self.binding_names(i + 1, in_index) {
            self.python_bind(name, None, true)?;
        }
        Ok(in_index)
    }

    /// Names after `as` in `with` items and `except` clauses.
    fn python_as_targets(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let colon = self.find_at_depth(i + 1, |t| t.is_punct(":"));
        let mut k = i + 1;
        while k < colon {
            if self.is_keyword_at(k, "as") {
                let end = self
                    .find_at_depth(k + 1, |t| t.is_punct(",") || t.is_punct(":"))
                    .min(colon);
                // `binding_names` would read `fh:` as an annotation.
                for name in k + 1..end {
                    let bound = self.tok(name).is_some_and(|t| t.is_identifier())
                        && !self.previous(name).is_some_and(|p| p.is_punct("."));
                    if bound {
                        self.python_bind(name, None, true)?;
                    }
                }
                k = end;
            } else {
                k += 1;
            }
        }
        Ok(i + 1)
    }

    fn python_global(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let last = self.line_end(i);
        if self.is_keyword_at(i, "global") {
            let function = self.table.enclosing_function(self.table.current_scope());
            for k in i + 1..=last {
                let token = self.token(k)?;
                if token.is_identifier() {
                    self.table.add_global_name(function, &token.text);
                }
            }
        }
        self.mark_opaque(i, last);
        Ok(last + 1)
    }

    /// `import a.b as c, d` and `from m import (x, y as z)`.
    fn python_import(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let mut last = self.line_end(i);
        if let Some(open) = (i..=last).find(|&k| self.is_punct_at(k, "("))
            && let Some(close) = self.group_end(open)
        {
            last = last.max(close);
        }
        let names_start = if self.is_keyword_at(i, "from") {
            match (i..=last).find(|&k| self.is_keyword_at(k, "import")) {
                Some(k) => k + 1,
                None => return Ok(last + 1),
            }
        } else {
            i + 1
        };

        let mut segment = names_start;
        while segment <= last {
            let segment_end = (segment..=last)
                .find(|&k| self.is_punct_at(k, ","))
                .unwrap_or(last + 1);
            let alias = (segment..segment_end).find(|&k| self.is_keyword_at(k, "as"));
            let name = match alias {
                Some(k) => Some(k + 1).filter(|&n| n < segment_end),
                None => (segment..segment_end).find(|&k| self.token(k).is_ok_and(|t| t.is_identifier())),
            };
            if let Some(index) = name {
                let token = self.token(index)?;
                if token.is_identifier() && self.table.lookup_local(self.table.current_scope(), &token.text).is_none() {
                    let entry = self
                        .entry_at(index, SymbolKind::Variable)?
                        .with_type("module")
                        .initialized(true);
                    self.declare(entry);
                }
            }
            segment = segment_end + 1;
        }
        self.mark_opaque(i, last);
        Ok(last + 1)
    }

    // ==================== Functions and Classes ====================

    fn python_def(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let name = i + 1;
        let open = i + 2;
        if !self.tok(name).is_some_and(|t| t.is_identifier()) || !self.is_punct_at(open, "(") {
            return Ok(i + 1);
        }
        let Some(close) = self.group_end(open) else {
            return Ok(i + 1);
        };
        let colon = self.find_at_depth(close + 1, |t| t.is_punct(":"));
        let return_type = if self.is_punct_at(close + 1, "->") {
            self.mark_opaque(close + 2, colon.saturating_sub(1));
            Some(self.text_between(close + 2, colon))
        } else {
            None
        };
        let end = self.python_block_end(i, colon);
        let params = self.python_params(open, close);

        let kind = if self.current_kind() == ScopeKind::Class {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };
        let mut entry = self.entry_at(name, kind)?;
        entry.parameters = self.param_infos(&params);
        entry.return_type = return_type;
        let scope_name = entry.name.clone();
        self.declare(entry);

        let range = self.span(open, end);
        self.table.enter_scope(scope_name, ScopeKind::Function, range);
        self.declare_params(&params)?;
        Ok(colon.max(close) + 1)
    }

    /// Parameters with their annotations; `*`, `**` and `/` markers are
    /// skipped and defaults are left for the resolver.
    fn python_params(&mut self, open: usize, close: usize) -> Vec<Param> {
        let mut params = Vec::new();
        let mut k = open + 1;
        while k < close {
            let segment_end = self.find_at_depth(k, |t| t.is_punct(",")).min(close);
            let mut name = k;
            while name < segment_end
                && self
                    .tok(name)
                    .is_some_and(|t| t.is_punct("*") || t.is_punct("**") || t.is_punct("/"))
            {
                name += 1;
            }
            if name < segment_end && self.tok(name).is_some_and(|t| t.is_identifier()) {
                let annotation = if name + 1 < segment_end && self.is_punct_at(name + 1, ":") {
                    let annotation_end = self
                        .find_at_depth(name + 2, |t| t.is_punct("="))
                        .min(segment_end);
                    self.mark_opaque(name + 2, annotation_end.saturating_sub(1));
                    Some(self.text_between(name + 2, annotation_end))
                } else {
                    None
                };
                params.push((name, annotation));
            }
            k = segment_end + 1;
        }
        params
    }

    fn python_class(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        if !self.tok(i + 1).is_some_and(|t| t.is_identifier()) {
            return Ok(i + 1);
        }
        let colon = self.find_at_depth(i + 2, |t| t.is_punct(":"));
        let end = self.python_block_end(i, colon);
        let entry = self.entry_at(i + 1, SymbolKind::Class)?;
        let scope_name = entry.name.clone();
        self.declare(entry);

        let range = self.span(i + 2, end);
        self.table.enter_scope(scope_name, ScopeKind::Class, range);
        Ok(colon + 1)
    }

    fn python_lambda(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let colon = self.find_at_depth(i + 1, |t| t.is_punct(":"));
        // The colon closing the list never starts an annotation.
        let params = self.python_params(i, colon);
        let end = self.expression_end(colon + 1).saturating_sub(1).max(colon);
        let range = self.span(i, end);
        self.table.enter_scope("lambda", ScopeKind::Function, range);
        self.declare_params(&params)?;
        Ok(colon + 1)
    }

    /// A bracket group holding a `for` clause gets a scope of its own.
    /// Its loop names are visible from the opening bracket, since the
    /// element expression comes first.
    fn python_comprehension(&mut self, i: usize) -> Result<(), AnalysisFault> {
        let Some(end) = self.group_end(i) else {
            return Ok(());
        };
        let mut clauses = Vec::new();
        let mut depth = 0usize;
        for k in i + 1..end {
            let token = self.token(k)?;
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && token.is_keyword("for") {
                clauses.push(k);
            }
        }
        if clauses.is_empty() {
            return Ok(());
        }

        let range = self.span(i, end);
        let visible_from = range.start;
        self.table.enter_scope("comprehension", ScopeKind::Block, range);
        for clause in clauses {
            let in_index = self.find_at_depth(clause + 1, |t| t.is_keyword("in"));
            for name in self.binding_names(clause + 1, in_index) {
                let mut entry = self.entry_at(name, SymbolKind::Variable)?.initialized(true);
                entry.visible_from = visible_from;
                if self
                    .table
                    .lookup_local(self.table.current_scope(), &entry.name)
                    .is_none()
                {
                    self.declare(entry);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::Severity;
    use crate::language::Language;
    use crate::semantic::tests::run;
    use crate::semantic::SymbolKind;

    #[test]
    fn test_assignments_and_functions() {
        let source = "total = 0\n\ndef add(a, b: int = 1) -> int:\n    result = a + b\n    return result\n\ntotal = add(2)\nprint(total)\n";
        let (diags, symbols) = run(source, Language::Python);
        assert!(diags.is_empty(), "{diags:?}");
        let names: Vec<_> = symbols.iter().map(|s| (s.name.as_str(), s.scope.as_str())).collect();
        assert_eq!(
            names,
            [
                ("total", "global"),
                ("add", "global"),
                ("a", "add"),
                ("b", "add"),
                ("result", "add"),
            ]
        );
        assert_eq!(symbols[0].data_type.as_deref(), Some("integer"));
        assert_eq!(symbols[1].return_type.as_deref(), Some("int"));
        assert_eq!(symbols[3].data_type.as_deref(), Some("int"));
    }

    #[test]
    fn test_suite_ends_at_dedent() {
        let source = "def f():\n    local = 1\n    return local\n\nprint(local)\n";
        let (diags, _) = run(source, Language::Python);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].line, 5);
    }

    #[test]
    fn test_classes_and_methods() {
        let source = "class Greeter:\n    def __init__(self, name):\n        self.name = name\n\n    def greet(self):\n        print(self.name)\n\ng = Greeter(\"x\")\ng.greet()\n";
        let (diags, symbols) = run(source, Language::Python);
        assert!(diags.is_empty(), "{diags:?}");
        let greet = symbols.iter().find(|s| s.name == "greet").unwrap();
        assert_eq!(greet.kind, SymbolKind::Method);
        assert_eq!(greet.scope, "Greeter");
    }

    #[test]
    fn test_comprehension_scope() {
        let source = "squares = [n * n for n in range(5)]\nprint(squares, n)\n";
        let (diags, symbols) = run(source, Language::Python);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].message.contains("`n`"));
        let n = symbols.iter().find(|s| s.name == "n").unwrap();
        assert_eq!(n.scope, "comprehension");
    }

    #[test]
    fn test_imports_and_with() {
        let source = "import os.path as osp\nfrom json import dumps, loads as parse\nwith open(\"f\") as handle:\n    print(osp, dumps, parse(handle.read()))\n";
        let (diags, symbols) = run(source, Language::Python);
        assert!(diags.is_empty(), "{diags:?}");
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["osp", "dumps", "parse", "handle"]);
    }

    #[test]
    fn test_except_and_lambda_bindings() {
        let source = "try:\n    risky = int(\"x\")\nexcept ValueError as e:\n    print(e)\n\ndouble = lambda x, step=2: x * step\nprint(double(3))\n";
        let (diags, symbols) = run(source, Language::Python);
        assert!(diags.is_empty(), "{diags:?}");
        assert!(symbols.iter().any(|s| s.name == "e"));
        assert!(symbols.iter().any(|s| s.name == "x" && s.scope == "lambda"));
    }

    #[test]
    fn test_repeated_def_is_warning() {
        let source = "def f():\n    return 1\n\ndef f():\n    return 2\n\nprint(f())\n";
        let (diags, _) = run(source, Language::Python);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].line, 4);
    }

    #[test]
    fn test_global_statement() {
        let source = "count = 0\n\ndef bump():\n    global count\n    count = count + 1\n\nbump()\n";
        let (diags, symbols) = run(source, Language::Python);
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(symbols.iter().filter(|s| s.name == "count").count(), 1);
    }
}
