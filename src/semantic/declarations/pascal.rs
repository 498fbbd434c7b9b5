//! Pascal declarations.
//!
//! Pascal declares everything up front in `var`, `const` and `type`
//! sections, either at program level or between a routine header and
//! its `begin`. Routine scopes run from the header to the `end` that
//! closes the routine body, so local sections and nested routines land
//! in the right scope.
//!
//! Record and class types get a class scope holding their fields and
//! method headers. `procedure TFoo.Bar` bodies are scoped below it.

use crate::diagnostics::AnalysisFault;
use crate::semantic::declarations::ROUTINE_WORDS;
use crate::semantic::{ScopeId, ScopeKind, SemanticAnalyzer, SymbolEntry, SymbolKind};

type Param = (usize, Option<String>);

/// Routine directives that may follow a header.
const DIRECTIVES: &[&str] = &[
    "forward", "external", "overload", "override", "virtual", "abstract", "reintroduce",
    "inline", "cdecl", "stdcall", "register", "pascal", "static", "dynamic",
];

impl<'a> SemanticAnalyzer<'a> {
    pub(super) fn pascal_declaration(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let token = self.token(i)?;
        if token.is_any_keyword(&["program", "unit"]) {
            let semicolon = self.find_at_depth(i, |t| t.is_punct(";"));
            if self.tok(i + 1).is_some_and(|t| t.is_identifier()) {
                let mut entry = self.entry_at(i + 1, SymbolKind::Keyword)?.initialized(true);
                entry.is_used = true;
                self.declare_in(ScopeId::GLOBAL, entry);
            }
            self.mark_opaque(i + 2, semicolon);
            return Ok(semicolon + 1);
        }
        if token.is_keyword("uses") {
            let semicolon = self.find_at_depth(i, |t| t.is_punct(";"));
            self.mark_opaque(i, semicolon);
            return Ok(semicolon + 1);
        }
        if token.is_keyword("var") {
            return self.pascal_variables(i + 1);
        }
        if token.is_keyword("const") {
            return self.pascal_constants(i + 1);
        }
        if token.is_keyword("type") {
            return self.pascal_types(i + 1);
        }
        if token.is_any_keyword(ROUTINE_WORDS)
            && !self
                .previous(i)
                .is_some_and(|p| p.is_punct(":") || p.is_punct("="))
        {
            return self.pascal_routine(i);
        }
        Ok(i + 1)
    }

    /// Index of the `;` ending a type that starts at `from`. Record,
    /// object and class bodies contain `;` of their own.
    fn pascal_type_end(&self, from: usize) -> usize {
        let mut nesting = 0usize;
        let mut depth = 0usize;
        for k in from..self.tokens.len() {
            let token = self.tokens[k];
            if depth == 0 && nesting == 0 && token.is_punct(";") {
                return k;
            }
            if token.is_punct("(") || token.is_punct("[") {
                depth += 1;
            } else if token.is_punct(")") || token.is_punct("]") {
                depth = depth.saturating_sub(1);
            } else if self.pascal_opens_type(k) {
                nesting += 1;
            } else if token.is_keyword("end") {
                nesting = nesting.saturating_sub(1);
            } else if nesting == 0 && depth == 0 && token.is_any_keyword(&["begin", "var", "procedure", "function"]) {
                return k;
            }
        }
        self.tokens.len()
    }

    /// True for `record`, `object` or `class` starting a body (not
    /// `class of` or a forward `class;`).
    fn pascal_opens_type(&self, k: usize) -> bool {
        let Some(token) = self.tok(k) else {
            return false;
        };
        if token.is_keyword("record") {
            return true;
        }
        token.is_any_keyword(&["class", "object"])
            && !self
                .tok(k + 1)
                .is_some_and(|n| n.is_punct(";") || n.is_keyword("of") || n.is_any_keyword(ROUTINE_WORDS))
    }

    /// `name, name: Type [= value];` items of a `var` section.
    fn pascal_variables(&mut self, mut k: usize) -> Result<usize, AnalysisFault> {
        while let Some(names) = self.pascal_name_list(k) {
            let colon = names.last().map_or(k, |&n| n + 1);
            let end = self.pascal_type_end(colon + 1);
            let eq = self
                .find_at_depth(colon + 1, |t| t.is_punct("=") || t.is_punct(";"))
                .min(end);
            let data_type = self.text_between(colon + 1, eq);
            self.mark_opaque(colon + 1, eq.saturating_sub(1));
            let initialized = eq < end;
            for name in names {
                let entry = self
                    .entry_at(name, SymbolKind::Variable)?
                    .with_type(data_type.as_str())
                    .initialized(initialized);
                if initialized {
                    self.check_initializer(&entry.name, entry.position(), &data_type, eq + 1);
                }
                self.declare(entry);
            }
            k = end + 1;
        }
        Ok(k)
    }

    /// Names before the `:` of a field or variable item, or `None` when
    /// `k` does not start one.
    fn pascal_name_list(&self, mut k: usize) -> Option<Vec<usize>> {
        let mut names = Vec::new();
        loop {
            if !self.tok(k)?.is_identifier() {
                return None;
            }
            names.push(k);
            let next = self.tok(k + 1)?;
            if next.is_punct(":") {
                return Some(names);
            }
            if !next.is_punct(",") {
                return None;
            }
            k += 2;
        }
    }

    /// `Name = value;` and typed `Name: Type = value;` constants.
    fn pascal_constants(&mut self, mut k: usize) -> Result<usize, AnalysisFault> {
        while self.tok(k).is_some_and(|t| t.is_identifier())
            && (self.is_punct_at(k + 1, "=") || self.is_punct_at(k + 1, ":"))
        {
            let semicolon = self.find_at_depth(k, |t| t.is_punct(";"));
            let mut entry = self.entry_at(k, SymbolKind::Constant)?.initialized(true);
            if self.is_punct_at(k + 1, "=") {
                entry.data_type = self
                    .literal_initializer(k + 2)
                    .map(|value_type| value_type.as_str().to_string());
            } else {
                let eq = self
                    .find_at_depth(k + 2, |t| t.is_punct("=") || t.is_punct(";"))
                    .min(semicolon);
                let data_type = self.text_between(k + 2, eq);
                self.mark_opaque(k + 2, eq.saturating_sub(1));
                self.check_initializer(&entry.name, entry.position(), &data_type, eq + 1);
                entry.data_type = Some(data_type);
            }
            self.declare(entry);
            k = semicolon + 1;
        }
        Ok(k)
    }

    /// `Name = <type>;` items of a `type` section.
    fn pascal_types(&mut self, mut k: usize) -> Result<usize, AnalysisFault> {
        while self.tok(k).is_some_and(|t| t.is_identifier()) && self.is_punct_at(k + 1, "=") {
            let mut start = k + 2;
            if self.is_keyword_at(start, "packed") {
                start += 1;
            }
            let end = self.pascal_type_end(start);
            let first = self.token(start)?;

            if first.is_punct("(") {
                self.pascal_enum(k, start)?;
            } else if self.pascal_opens_type(start) {
                let kind = first.text.to_ascii_lowercase();
                let entry = self.entry_at(k, SymbolKind::Class)?.with_type(kind.as_str());
                let name = entry.name.clone();
                self.declare(entry);
                self.pascal_members(&name, start, end)?;
                self.mark_opaque(start, end.saturating_sub(1));
            } else if first.is_any_keyword(&["class", "object"]) && self.is_punct_at(start + 1, ";") {
                let mut entry = self.entry_at(k, SymbolKind::Class)?.with_type(first.text.to_ascii_lowercase());
                entry.forward = true;
                self.declare(entry);
            } else {
                let entry = self
                    .entry_at(k, SymbolKind::Class)?
                    .with_type(self.text_between(start, end));
                self.declare(entry);
                self.mark_opaque(start, end.saturating_sub(1));
            }
            k = end + 1;
        }
        Ok(k)
    }

    /// `TColor = (Red, Green, Blue);`
    fn pascal_enum(&mut self, name: usize, open: usize) -> Result<(), AnalysisFault> {
        let entry = self.entry_at(name, SymbolKind::Class)?.with_type("enum");
        let type_name = entry.name.clone();
        self.declare(entry);
        let close = self.group_end(open).unwrap_or(self.tokens.len());
        for k in open + 1..close {
            if self.token(k)?.is_identifier() && !self.previous(k).is_some_and(|p| p.is_punct("=")) {
                let entry = self
                    .entry_at(k, SymbolKind::Constant)?
                    .with_type(type_name.as_str())
                    .initialized(true);
                self.declare(entry);
            }
        }
        Ok(())
    }

    /// Fields and method headers of a record or class body.
    fn pascal_members(&mut self, type_name: &str, start: usize, end: usize) -> Result<(), AnalysisFault> {
        let outer = self.table.current_scope();
        let range = self.span(start, end.saturating_sub(1));
        self.table.enter_scope(type_name, ScopeKind::Class, range);

        let mut k = start + 1;
        if self.is_punct_at(k, "(") {
            k = self.group_end(k).map_or(end, |close| close + 1);
        }
        while k < end {
            let token = self.token(k)?;
            if token.is_any_keyword(ROUTINE_WORDS) && self.tok(k + 1).is_some_and(|t| t.is_identifier()) {
                let name = k + 1;
                let (params, after) = self.pascal_params_after(name + 1)?;
                let mut entry = self.entry_at(name, SymbolKind::Method)?;
                entry.parameters = self.param_infos(&params);
                if self.is_punct_at(after, ":") {
                    let semicolon = self.find_at_depth(after, |t| t.is_punct(";"));
                    entry.return_type = Some(self.text_between(after + 1, semicolon));
                }
                entry.forward = true;
                self.declare(entry);
                k = self.find_at_depth(name, |t| t.is_punct(";")) + 1;
            } else if token.is_word("property") {
                k = self.find_at_depth(k, |t| t.is_punct(";")) + 1;
            } else if let Some(names) = self.pascal_name_list(k) {
                let colon = names.last().map_or(k, |&n| n + 1);
                let semicolon = self.pascal_type_end(colon + 1).min(end);
                let data_type = self.text_between(colon + 1, semicolon);
                for name in names {
                    let entry = self
                        .entry_at(name, SymbolKind::Variable)?
                        .with_type(data_type.as_str())
                        .initialized(true);
                    self.declare(entry);
                }
                k = semicolon + 1;
            } else {
                k += 1;
            }
        }
        self.table.set_current_scope(outer);
        Ok(())
    }

    /// Parameter list starting at `at` if there is one, and the index
    /// just after it.
    fn pascal_params_after(&mut self, at: usize) -> Result<(Vec<Param>, usize), AnalysisFault> {
        if !self.is_punct_at(at, "(") {
            return Ok((Vec::new(), at));
        }
        let Some(close) = self.group_end(at) else {
            return Ok((Vec::new(), self.tokens.len()));
        };
        Ok((self.pascal_params(at, close)?, close + 1))
    }

    /// `(var a, b: Integer; const s: string = '')`: groups are split by
    /// `;` and share one type.
    fn pascal_params(&mut self, open: usize, close: usize) -> Result<Vec<Param>, AnalysisFault> {
        let mut params = Vec::new();
        let mut k = open + 1;
        while k < close {
            let group_end = self.find_at_depth(k, |t| t.is_punct(";")).min(close);
            while self
                .tok(k)
                .is_some_and(|t| t.is_any_keyword(&["var", "const"]) || t.is_word("out") || t.is_word("constref"))
            {
                k += 1;
            }
            let colon = self.find_at_depth(k, |t| t.is_punct(":")).min(group_end);
            let data_type = if colon < group_end {
                let default = self
                    .find_at_depth(colon + 1, |t| t.is_punct("="))
                    .min(group_end);
                self.mark_opaque(colon + 1, default.saturating_sub(1));
                Some(self.text_between(colon + 1, default))
            } else {
                None
            };
            for name in k..colon {
                if self.token(name)?.is_identifier() {
                    params.push((name, data_type.clone()));
                }
            }
            k = group_end + 1;
        }
        Ok(params)
    }

    /// Whether `i` lies in the interface part of a unit, where routine
    /// headers are declarations without bodies.
    fn pascal_in_interface(&self, i: usize) -> bool {
        (0..i)
            .rev()
            .find(|&k| {
                self.tokens[k].is_any_keyword(&["interface", "implementation"])
                    && !self.previous(k).is_some_and(|p| p.is_punct("="))
            })
            .is_some_and(|k| self.tokens[k].is_keyword("interface"))
    }

    /// `procedure Name(params);`, `function TFoo.Name(params): T;` and
    /// their bodies.
    fn pascal_routine(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let is_function = self.token(i)?.is_keyword("function");
        if !self.tok(i + 1).is_some_and(|t| t.is_identifier()) {
            return Ok(i + 1);
        }
        let (owner, name) = if self.is_punct_at(i + 2, ".") && self.tok(i + 3).is_some_and(|t| t.is_identifier()) {
            (Some(i + 1), i + 3)
        } else {
            (None, i + 1)
        };

        let (params, after) = self.pascal_params_after(name + 1)?;
        let mut return_type = None;
        let mut header_end = self.find_at_depth(after, |t| t.is_punct(";"));
        if self.is_punct_at(after, ":") {
            self.mark_opaque(after + 1, header_end.saturating_sub(1));
            return_type = Some(self.text_between(after + 1, header_end));
        }

        let mut forward = self.pascal_in_interface(i);
        while let Some(directive) = self.tok(header_end + 1)
            && DIRECTIVES.iter().any(|d| directive.is_word(d))
        {
            if directive.is_word("forward") || directive.is_word("external") {
                forward = true;
            }
            header_end = self.find_at_depth(header_end + 1, |t| t.is_punct(";"));
        }

        let current = self.table.current_scope();
        let class_scope = match owner {
            Some(index) => {
                let owner_name = self.token(index)?.text.clone();
                self.table.find_child_scope(current, &owner_name)
            }
            None => None,
        };
        let kind = if owner.is_some() {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };
        let mut entry = self.entry_at(name, kind)?;
        entry.parameters = self.param_infos(&params);
        entry.data_type = return_type.clone();
        entry.return_type = return_type.clone();
        entry.forward = forward;
        let routine_name = entry.name.clone();
        self.declare_in(class_scope.unwrap_or(current), entry);

        let end = if forward {
            header_end
        } else {
            self.routine_end(header_end + 1)
        };
        let range = self.span(name, end);
        self.table.enter_scope_under(
            class_scope.unwrap_or(current),
            routine_name,
            ScopeKind::Function,
            range,
        );
        self.declare_params(&params)?;
        if is_function && !forward {
            let mut result = SymbolEntry::new("Result", SymbolKind::Variable, self.position_of(name)).initialized(true);
            result.data_type = return_type;
            result.builtin = true;
            // A parameter may already be called `Result`.
            let _ = self.table.define(result);
        }
        Ok(header_end + 1)
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::Severity;
    use crate::language::Language;
    use crate::semantic::tests::run;
    use crate::semantic::SymbolKind;

    #[test]
    fn test_program_sections_and_function() {
        let source = "program Hello;\nvar\n  x, y: integer;\n  name: string;\nconst\n  Limit = 10;\n\nfunction Add(a, b: integer): integer;\nbegin\n  Add := a + b;\nend;\n\nbegin\n  x := 5;\n  y := Add(x, Limit);\n  readln(name);\n  writeln(name, y);\nend.\n";
        let (diags, symbols) = run(source, Language::Pascal);
        assert!(diags.is_empty(), "{diags:?}");
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Hello", "x", "y", "name", "Limit", "Add", "a", "b"]);
        assert_eq!(symbols[0].kind, SymbolKind::Keyword);
        assert_eq!(symbols[1].data_type.as_deref(), Some("integer"));
        assert_eq!(symbols[4].kind, SymbolKind::Constant);
        assert_eq!(symbols[4].data_type.as_deref(), Some("integer"));
        assert_eq!(symbols[5].return_type.as_deref(), Some("integer"));
        assert_eq!(symbols[6].scope, "Add");
    }

    #[test]
    fn test_local_sections_and_nested_routines() {
        let source = "program Nest;\n\nprocedure Outer;\nvar\n  count: integer;\n\n  procedure Inner;\n  begin\n    count := count + 1;\n  end;\n\nbegin\n  count := 0;\n  Inner;\nend;\n\nbegin\n  Outer;\nend.\n";
        let (diags, symbols) = run(source, Language::Pascal);
        assert!(diags.is_empty(), "{diags:?}");
        let count = symbols.iter().find(|s| s.name == "count").unwrap();
        assert_eq!(count.scope, "Outer");
        let inner = symbols.iter().find(|s| s.name == "Inner").unwrap();
        assert_eq!(inner.scope, "Outer");
    }

    #[test]
    fn test_records_and_enums() {
        let source = "program Shapes;\ntype\n  TColor = (Red, Green);\n  TPoint = record\n    x, y: integer;\n  end;\nvar\n  p: TPoint;\n  c: TColor;\nbegin\n  c := Green;\n  p.x := 1;\n  writeln(p.x, Red, ord(c));\nend.\n";
        let (diags, symbols) = run(source, Language::Pascal);
        assert!(diags.is_empty(), "{diags:?}");
        let green = symbols.iter().find(|s| s.name == "Green").unwrap();
        assert_eq!(green.kind, SymbolKind::Constant);
        assert_eq!(green.data_type.as_deref(), Some("TColor"));
        let field = symbols.iter().find(|s| s.name == "x").unwrap();
        assert_eq!(field.scope, "TPoint");
        let p = symbols.iter().find(|s| s.name == "p").unwrap();
        assert_eq!(p.data_type.as_deref(), Some("TPoint"));
    }

    #[test]
    fn test_class_method_implementation() {
        let source = "program Objects;\ntype\n  TCounter = class\n  private\n    FCount: integer;\n  public\n    procedure Bump;\n  end;\n\nprocedure TCounter.Bump;\nbegin\n  FCount := FCount + 1;\nend;\n\nvar\n  c: TCounter;\nbegin\n  c := TCounter.Create;\n  c.Bump;\nend.\n";
        let (diags, symbols) = run(source, Language::Pascal);
        assert!(diags.is_empty(), "{diags:?}");
        let bump: Vec<_> = symbols.iter().filter(|s| s.name == "Bump").collect();
        assert_eq!(bump.len(), 1);
        assert_eq!(bump[0].kind, SymbolKind::Method);
        assert!(!bump[0].forward);
    }

    #[test]
    fn test_undeclared_assignment_is_error() {
        let source = "program Bad;\nbegin\n  total := 1;\nend.\n";
        let (diags, _) = run(source, Language::Pascal);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert_eq!(diags[0].severity, Severity::Error);
        assert!(diags[0].message.contains("total"));
    }
}
