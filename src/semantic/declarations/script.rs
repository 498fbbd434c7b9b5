//! JavaScript declarations, and the brace-delimited block scopes shared
//! with C++.
//!
//! `var` is function scoped; `let`, `const`, classes and parameters are
//! block scoped. Function declarations are hoisted, which the resolver
//! handles by ignoring declaration order for callables.

use crate::diagnostics::AnalysisFault;
use crate::language::Language;
use crate::lexer::TokenCategory;
use crate::semantic::{ScopeKind, SemanticAnalyzer, SymbolKind};

impl<'a> SemanticAnalyzer<'a> {
    pub(super) fn script_declaration(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let token = self.token(i)?;
        if token.category == TokenCategory::ReservedWord {
            return match token.text.to_ascii_lowercase().as_str() {
                "var" | "let" | "const" => self.script_variables(i),
                "function" => self.script_function(i),
                "class" => self.script_class(i),
                "for" | "catch" if self.is_punct_at(i + 1, "(") => self.header_block(i),
                "import" => self.script_import(i),
                _ => Ok(i + 1),
            };
        }
        if token.is_punct("=>") {
            return self.arrow_function(i);
        }
        if token.is_punct("{") {
            self.open_block(i);
        } else if token.is_identifier() && self.current_kind() == ScopeKind::Class {
            return self.class_member(i);
        }
        Ok(i + 1)
    }

    // ==================== Blocks ====================

    /// Opens a block scope for a `{` that starts a statement block.
    pub(super) fn open_block(&mut self, i: usize) {
        if self.claimed.contains(&i) {
            return;
        }
        let starts_block = self.previous(i).is_none_or(|p| {
            p.is_punct(")")
                || p.is_punct(";")
                || p.is_punct("{")
                || p.is_punct("}")
                || p.is_any_keyword(&["else", "do", "try", "finally"])
        });
        if !starts_block {
            return;
        }
        let end = self
            .group_end(i)
            .unwrap_or(self.tokens.len().saturating_sub(1));
        let range = self.span(i, end);
        self.table.enter_scope("block", ScopeKind::Block, range);
    }

    /// `for (...)` and `catch (...)`: the scope starts at the parenthesis
    /// so that loop variables and the caught value stay inside it.
    pub(super) fn header_block(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let open = i + 1;
        let Some(close) = self.group_end(open) else {
            return Ok(i + 1);
        };
        let end = if self.is_punct_at(close + 1, "{") {
            self.claimed.insert(close + 1);
            self.group_end(close + 1)
                .unwrap_or(self.tokens.len().saturating_sub(1))
        } else {
            self.find_at_depth(close + 1, |t| t.is_punct(";"))
        };
        let keyword = self.token(i)?.text.to_ascii_lowercase();
        let range = self.span(open, end);
        self.table.enter_scope(keyword.as_str(), ScopeKind::Block, range);

        if keyword != "catch" {
            return Ok(open + 1);
        }
        let params = if self.language == Language::Cpp {
            self.cpp_params(open, close)?
        } else {
            self.binding_names(open + 1, close)
                .into_iter()
                .map(|k| (k, None))
                .collect()
        };
        for (index, data_type) in params {
            let mut entry = self.entry_at(index, SymbolKind::Variable)?.initialized(true);
            entry.data_type = data_type;
            self.declare(entry);
        }
        Ok(close + 1)
    }

    // ==================== Variables ====================

    fn script_variables(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let keyword = self.token(i)?.text.to_ascii_lowercase();
        let kind = if keyword == "const" {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };
        let current = self.table.current_scope();
        let scope = if keyword == "var" {
            self.table.enclosing_function(current)
        } else {
            current
        };

        let mut j = i + 1;
        let mut resume = None;
        while let Some(token) = self.tok(j) {
            let (names, after) = if token.is_identifier() {
                (vec![j], j + 1)
            } else if token.is_punct("{") || token.is_punct("[") {
                let Some(end) = self.group_end(j) else {
                    break;
                };
                (self.binding_names(j + 1, end), end + 1)
            } else {
                break;
            };
            resume.get_or_insert(after);

            // `for (const x of xs)` binds on every iteration.
            let initialized = self.is_punct_at(after, "=")
                || self.tok(after).is_some_and(|t| t.is_word("of") || t.is_keyword("in"));
            let literal = if self.is_punct_at(after, "=") {
                self.literal_initializer(after + 1)
            } else {
                None
            };
            for index in names {
                let token = self.token(index)?;
                if keyword == "var"
                    && let Some(existing) = self.table.lookup_local(scope, &token.text)
                {
                    // `var` may be repeated.
                    self.declaration_sites.insert(token.offset);
                    self.table.get_mut(existing)?.is_initialized |= initialized;
                    continue;
                }
                let mut entry = self.entry_at(index, kind)?.initialized(initialized);
                if let Some(value_type) = literal {
                    entry = entry.with_type(value_type.as_str());
                }
                self.declare_in(scope, entry);
            }

            let next = if self.is_punct_at(after, "=") {
                self.expression_end(after + 1)
            } else {
                after
            };
            if !self.is_punct_at(next, ",") {
                break;
            }
            j = next + 1;
        }
        Ok(resume.unwrap_or(i + 1))
    }

    // ==================== Functions and Classes ====================

    fn script_function(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let mut j = i + 1;
        if self.is_punct_at(j, "*") {
            j += 1;
        }
        let name = self.tok(j).filter(|t| t.is_identifier()).map(|_| j);
        if name.is_some() {
            j += 1;
        }
        if !self.is_punct_at(j, "(") {
            return Ok(i + 1);
        }
        let Some(close) = self.group_end(j) else {
            return Ok(j + 1);
        };
        let body = close + 1;
        if !self.is_punct_at(body, "{") {
            return Ok(close + 1);
        }
        let end = self
            .group_end(body)
            .unwrap_or(self.tokens.len().saturating_sub(1));

        let params: Vec<(usize, Option<String>)> = self
            .binding_names(j + 1, close)
            .into_iter()
            .map(|k| (k, None))
            .collect();
        let scope_name = match name {
            Some(index) => {
                let mut entry = self.entry_at(index, SymbolKind::Function)?;
                entry.parameters = self.param_infos(&params);
                let scope_name = entry.name.clone();
                self.declare(entry);
                scope_name
            }
            None => "anonymous".to_string(),
        };

        self.claimed.insert(body);
        let range = self.span(j, end);
        self.table.enter_scope(scope_name, ScopeKind::Function, range);
        self.declare_params(&params)?;
        Ok(close + 1)
    }

    /// `(a, b) => ...` and `x => ...`, seen at the arrow.
    fn arrow_function(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let Some(previous) = self.previous(i) else {
            return Ok(i + 1);
        };
        let (params, start) = if previous.is_punct(")") {
            let Some(open) = self.group_start(i - 1) else {
                return Ok(i + 1);
            };
            (self.binding_names(open + 1, i - 1), open)
        } else if previous.is_identifier() {
            (vec![i - 1], i - 1)
        } else {
            return Ok(i + 1);
        };

        let end = if self.is_punct_at(i + 1, "{") {
            self.claimed.insert(i + 1);
            self.group_end(i + 1)
                .unwrap_or(self.tokens.len().saturating_sub(1))
        } else {
            self.expression_end(i + 1).saturating_sub(1).max(i)
        };

        // `const name = (...) =>` names the scope after the binding.
        let mut before = start;
        if self.previous(before).is_some_and(|t| t.is_keyword("async")) {
            before -= 1;
        }
        let name = match (self.previous(before), before.checked_sub(2).and_then(|k| self.tok(k))) {
            (Some(eq), Some(target)) if eq.is_punct("=") && target.is_identifier() => target.text.clone(),
            _ => "arrow".to_string(),
        };

        let range = self.span(start, end);
        self.table.enter_scope(name, ScopeKind::Function, range);
        let params: Vec<(usize, Option<String>)> = params.into_iter().map(|k| (k, None)).collect();
        self.declare_params(&params)?;
        Ok(i + 1)
    }

    fn script_class(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let name = self.tok(i + 1).filter(|t| t.is_identifier()).map(|_| i + 1);
        let brace = self.find_at_depth(i + 1, |t| t.is_punct("{") || t.is_punct(";"));
        let scope_name = match name {
            Some(index) => {
                let entry = self.entry_at(index, SymbolKind::Class)?;
                let scope_name = entry.name.clone();
                self.declare(entry);
                scope_name
            }
            None => "class".to_string(),
        };
        if !self.is_punct_at(brace, "{") {
            return Ok(i + 1);
        }
        let end = self
            .group_end(brace)
            .unwrap_or(self.tokens.len().saturating_sub(1));
        self.claimed.insert(brace);
        let range = self.span(brace, end);
        self.table.enter_scope(scope_name, ScopeKind::Class, range);
        Ok(brace + 1)
    }

    /// Methods and fields directly inside a class body.
    fn class_member(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let member_start = self.previous(i).is_none_or(|p| {
            p.is_punct("{")
                || p.is_punct("}")
                || p.is_punct(";")
                || p.is_punct("*")
                || p.is_any_keyword(&["static", "async"])
                || p.is_word("get")
                || p.is_word("set")
        });
        if !member_start {
            return Ok(i + 1);
        }

        if self.is_punct_at(i + 1, "(") {
            let Some(close) = self.group_end(i + 1) else {
                return Ok(i + 1);
            };
            if !self.is_punct_at(close + 1, "{") {
                return Ok(i + 1);
            }
            let end = self
                .group_end(close + 1)
                .unwrap_or(self.tokens.len().saturating_sub(1));
            let params: Vec<(usize, Option<String>)> = self
                .binding_names(i + 2, close)
                .into_iter()
                .map(|k| (k, None))
                .collect();
            let mut entry = self.entry_at(i, SymbolKind::Method)?;
            entry.parameters = self.param_infos(&params);
            let scope_name = entry.name.clone();
            self.declare(entry);

            self.claimed.insert(close + 1);
            let range = self.span(i + 1, end);
            self.table.enter_scope(scope_name, ScopeKind::Function, range);
            self.declare_params(&params)?;
            return Ok(close + 1);
        }

        if self.is_punct_at(i + 1, "=") || self.is_punct_at(i + 1, ";") {
            let entry = self
                .entry_at(i, SymbolKind::Variable)?
                .initialized(self.is_punct_at(i + 1, "="));
            self.declare(entry);
        }
        Ok(i + 1)
    }

    // ==================== Modules ====================

    /// `import a, { b as c } from "m"` and `import * as ns from "m"`.
    fn script_import(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let mut end = i + 1;
        while let Some(token) = self.tok(end) {
            if token.is_word("from") || token.is_punct(";") || token.category == TokenCategory::String {
                break;
            }
            end += 1;
        }
        for k in i + 1..end {
            let token = self.token(k)?;
            if !token.is_identifier()
                || token.is_word("as")
                || self.tok(k + 1).is_some_and(|t| t.is_word("as"))
            {
                continue;
            }
            let entry = self
                .entry_at(k, SymbolKind::Variable)?
                .with_type("module")
                .initialized(true);
            self.declare(entry);
        }
        self.mark_opaque(i, end);
        Ok(end)
    }
}

#[cfg(test)]
mod tests {
    use crate::language::Language;
    use crate::semantic::tests::run;
    use crate::semantic::SymbolKind;

    #[test]
    fn test_function_and_parameters() {
        let source = "function add(a, b = 2) {\n  return a + b;\n}\nconsole.log(add(1));\n";
        let (diags, symbols) = run(source, Language::JavaScript);
        assert!(diags.is_empty(), "{diags:?}");
        let names: Vec<_> = symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert_eq!(
            names,
            [
                ("add", SymbolKind::Function),
                ("a", SymbolKind::Parameter),
                ("b", SymbolKind::Parameter),
            ]
        );
        assert_eq!(symbols[0].parameters.len(), 2);
        assert_eq!(symbols[1].scope, "add");
    }

    #[test]
    fn test_block_scoping() {
        let source = "if (true) {\n  let inner = 1;\n}\nconsole.log(inner);\n";
        let (diags, _) = run(source, Language::JavaScript);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("`inner` is not declared"));
        assert_eq!(diags[0].line, 4);
    }

    #[test]
    fn test_var_is_function_scoped() {
        let source = "function f() {\n  if (true) {\n    var v = 1;\n  }\n  return v;\n}\nf();\n";
        let (diags, symbols) = run(source, Language::JavaScript);
        assert!(diags.iter().all(|d| !d.message.contains("not declared")), "{diags:?}");
        assert_eq!(symbols.iter().find(|s| s.name == "v").unwrap().scope, "f");
    }

    #[test]
    fn test_arrow_functions_and_destructuring() {
        let source = "const double = (x) => x * 2;\nconst { a, b: renamed } = { a: 1, b: 2 };\nconsole.log(double(a), renamed);\n";
        let (diags, symbols) = run(source, Language::JavaScript);
        assert!(diags.is_empty(), "{diags:?}");
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["double", "x", "a", "renamed"]);
        assert_eq!(symbols[1].scope, "double");
        assert_eq!(symbols[0].kind, SymbolKind::Constant);
    }

    #[test]
    fn test_class_members() {
        let source = "class Counter {\n  count = 0;\n  increment(step) {\n    this.count += step;\n  }\n}\nconst c = new Counter();\nc.increment(1);\n";
        let (diags, symbols) = run(source, Language::JavaScript);
        assert!(diags.is_empty(), "{diags:?}");
        let counter = symbols.iter().find(|s| s.name == "Counter").unwrap();
        assert_eq!(counter.kind, SymbolKind::Class);
        let method = symbols.iter().find(|s| s.name == "increment").unwrap();
        assert_eq!(method.kind, SymbolKind::Method);
        assert_eq!(method.scope, "Counter");
    }

    #[test]
    fn test_catch_and_for_scopes() {
        let source = "for (let i = 0; i < 3; i++) {\n  try {\n    console.log(i);\n  } catch (err) {\n    console.log(err);\n  }\n}\n";
        let (diags, symbols) = run(source, Language::JavaScript);
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(symbols[0].scope, "for");
        assert_eq!(symbols[1].name, "err");
        assert_eq!(symbols[1].scope, "catch");
    }
}
