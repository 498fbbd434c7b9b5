//! SQL declarations for both dialects.
//!
//! T-SQL declares `@variables` with `DECLARE` and splits a script into
//! batches at `GO`; each batch gets its own scope. PL/SQL declares
//! variables in the section between `IS`/`AS`/`DECLARE` and `BEGIN`.
//!
//! `CREATE TABLE` and `CREATE VIEW` names are global. Their column lists
//! are opaque: column names are not resolved.

use crate::diagnostics::AnalysisFault;
use crate::language::Language;
use crate::lexer::{Token, TokenCategory};
use crate::semantic::{ScopeId, ScopeKind, SemanticAnalyzer, SymbolEntry, SymbolKind};

type Param = (usize, Option<String>);

fn is_word(token: &Token) -> bool {
    matches!(
        token.category,
        TokenCategory::ReservedWord | TokenCategory::Identifier
    )
}

impl<'a> SemanticAnalyzer<'a> {
    // ==================== T-SQL ====================

    pub(super) fn tsql_declaration(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        if self.batch_starts_at(i) {
            let end = (i..self.tokens.len())
                .find(|&k| self.tokens[k].is_keyword("go"))
                .unwrap_or(self.tokens.len().saturating_sub(1));
            let range = self.span(i, end);
            self.table
                .enter_scope_under(ScopeId::GLOBAL, "batch", ScopeKind::Block, range);
        }
        let token = self.token(i)?;
        if token.is_keyword("declare") {
            return self.tsql_declare(i + 1);
        }
        if token.is_keyword("create") {
            return self.sql_create(i);
        }
        Ok(i + 1)
    }

    /// A script with `GO` separators starts a batch at its first token
    /// and after each `GO`.
    fn batch_starts_at(&self, i: usize) -> bool {
        if self.is_keyword_at(i, "go") {
            return false;
        }
        let after_go = match self.previous(i) {
            None => true,
            Some(previous) => previous.is_keyword("go"),
        };
        after_go && self.tokens.iter().any(|t| t.is_keyword("go"))
    }

    /// Index just past a type name with an optional `(n)` or `(p, s)`.
    fn sql_type_end(&self, start: usize) -> usize {
        let mut k = start;
        if !self.tok(k).is_some_and(is_word) {
            return k;
        }
        k += 1;
        while self.is_punct_at(k, ".") && self.tok(k + 1).is_some_and(is_word) {
            k += 2;
        }
        if self.is_punct_at(k, "(") {
            k = self.group_end(k).map_or(self.tokens.len(), |close| close + 1);
        }
        k
    }

    /// End of a default or initial value: the next `,` or `;`, or the
    /// keyword that starts the next statement.
    fn sql_value_end(&self, from: usize) -> usize {
        self.find_at_depth(from, |t| {
            t.is_punct(",")
                || t.is_punct(";")
                || (t.category == TokenCategory::ReservedWord
                    && (self.profile.is_statement_keyword(&t.text)
                        || t.is_any_keyword(&["output", "as", "returns", "with"])))
        })
    }

    /// `DECLARE @a INT = 1, @b VARCHAR(20), c CURSOR FOR ...`
    fn tsql_declare(&mut self, mut k: usize) -> Result<usize, AnalysisFault> {
        loop {
            if !self.tok(k).is_some_and(|t| t.is_identifier()) {
                return Ok(k);
            }
            let name = k;
            let mut type_start = k + 1;
            if self.is_keyword_at(type_start, "as") {
                type_start += 1;
            }

            if self.is_keyword_at(type_start, "cursor") {
                let entry = self
                    .entry_at(name, SymbolKind::Variable)?
                    .with_type("cursor")
                    .initialized(true);
                self.declare(entry);
                return Ok(type_start + 1);
            }
            if self.is_keyword_at(type_start, "table") {
                let entry = self
                    .entry_at(name, SymbolKind::Variable)?
                    .with_type("table")
                    .initialized(true);
                self.declare(entry);
                let close = if self.is_punct_at(type_start + 1, "(") {
                    self.group_end(type_start + 1).unwrap_or(self.tokens.len())
                } else {
                    type_start
                };
                self.mark_opaque(type_start, close);
                k = close + 1;
            } else {
                let type_end = self.sql_type_end(type_start);
                let data_type = self.text_between(type_start, type_end);
                self.mark_opaque(type_start, type_end.saturating_sub(1));
                let assigned = self.is_punct_at(type_end, "=");
                let entry = self
                    .entry_at(name, SymbolKind::Variable)?
                    .with_type(data_type.as_str())
                    .initialized(assigned);
                if assigned {
                    self.check_initializer(&entry.name, entry.position(), &data_type, type_end + 1);
                }
                self.declare(entry);
                k = if assigned {
                    self.sql_value_end(type_end + 1)
                } else {
                    type_end
                };
            }

            if !self.is_punct_at(k, ",") {
                return Ok(k);
            }
            k += 1;
        }
    }

    /// T-SQL parameters: `@id INT, @name VARCHAR(50) = NULL OUTPUT`,
    /// optionally parenthesized.
    fn tsql_params(&mut self, mut k: usize, limit: usize) -> Vec<Param> {
        let mut params = Vec::new();
        while k < limit && self.tok(k).is_some_and(|t| t.is_identifier() && t.text.starts_with('@')) {
            let name = k;
            let mut type_start = k + 1;
            if self.is_keyword_at(type_start, "as") {
                type_start += 1;
            }
            let type_end = self.sql_type_end(type_start).min(limit);
            self.mark_opaque(type_start, type_end.saturating_sub(1));
            params.push((name, Some(self.text_between(type_start, type_end))));
            k = type_end;
            if self.is_punct_at(k, "=") {
                k = self.sql_value_end(k + 1).min(limit);
            }
            while self
                .tok(k)
                .is_some_and(|t| t.is_keyword("output") || t.is_word("out") || t.is_word("readonly"))
            {
                k += 1;
            }
            if !self.is_punct_at(k, ",") {
                break;
            }
            k += 1;
        }
        params
    }

    // ==================== Shared ====================

    /// `CREATE [OR ALTER | OR REPLACE] TABLE | VIEW | PROCEDURE | ...`
    fn sql_create(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let mut j = i + 1;
        if self.is_keyword_at(j, "or") {
            j += 2;
        }
        let Some(object) = self.tok(j) else {
            return Ok(j);
        };
        if object.is_any_keyword(&["procedure", "proc", "function", "trigger"]) {
            return self.sql_routine(j);
        }
        if !object.is_any_keyword(&["table", "view"]) {
            return Ok(j);
        }
        let kind = object.text.to_ascii_lowercase();
        let Some(name) = self.qualified_name(j + 1) else {
            return Ok(j + 1);
        };
        let entry = self
            .entry_at(name, SymbolKind::Class)?
            .with_type(kind.as_str());
        self.declare_in(ScopeId::GLOBAL, entry);
        self.mark_opaque(j + 1, name);
        if kind == "table"
            && self.is_punct_at(name + 1, "(")
            && let Some(close) = self.group_end(name + 1)
        {
            self.mark_opaque(name + 1, close);
            return Ok(close + 1);
        }
        Ok(name + 1)
    }

    /// Index of the last part of a dotted name starting at `start`.
    fn qualified_name(&self, start: usize) -> Option<usize> {
        if !self.tok(start).is_some_and(|t| t.is_identifier()) {
            return None;
        }
        let mut name = start;
        while self.is_punct_at(name + 1, ".") && self.tok(name + 2).is_some_and(|t| t.is_identifier()) {
            name += 2;
        }
        Some(name)
    }

    /// Procedures, functions and triggers of both dialects. `k` is the
    /// index of the object keyword.
    fn sql_routine(&mut self, k: usize) -> Result<usize, AnalysisFault> {
        let Some(name) = self.qualified_name(k + 1) else {
            return Ok(k + 1);
        };
        let trigger = self.token(k)?.is_keyword("trigger");
        let (params, header_from) = match self.language {
            Language::PlSql => self.plsql_params(name + 1)?,
            _ if self.is_punct_at(name + 1, "(") => match self.group_end(name + 1) {
                Some(close) => (self.tsql_params(name + 2, close), close + 1),
                None => return Ok(name + 1),
            },
            _ if trigger => (Vec::new(), name + 1),
            _ => {
                let limit = self.find_at_depth(name + 1, |t| t.is_any_keyword(&["as", "returns", "with"]));
                (self.tsql_params(name + 1, limit), limit)
            }
        };

        let body_keyword = self.find_at_depth(header_from, |t| t.is_any_keyword(&["as", "is"]));
        let return_word = if self.language == Language::PlSql { "return" } else { "returns" };
        let return_type = (header_from..body_keyword)
            .find(|&r| self.tokens[r].is_keyword(return_word))
            .map(|r| {
                let end = self.sql_type_end(r + 1).min(body_keyword);
                self.mark_opaque(r + 1, end.saturating_sub(1));
                self.text_between(r + 1, end)
            });

        let forward = body_keyword >= self.tokens.len()
            || (self.language == Language::PlSql
                && self.find_at_depth(header_from, |t| t.is_punct(";")) < body_keyword);
        let end = if forward {
            self.find_at_depth(header_from, |t| t.is_punct(";"))
        } else if self.language == Language::PlSql || self.is_keyword_at(body_keyword + 1, "begin") {
            self.routine_end(body_keyword + 1)
        } else {
            (body_keyword..self.tokens.len())
                .find(|&g| self.tokens[g].is_keyword("go"))
                .unwrap_or(self.tokens.len().saturating_sub(1))
        };

        let mut entry = self.entry_at(name, SymbolKind::Function)?;
        entry.parameters = self.param_infos(&params);
        entry.data_type = return_type.clone().or_else(|| trigger.then(|| "trigger".to_string()));
        entry.return_type = return_type;
        entry.forward = forward;
        let routine_name = entry.name.clone();
        let outer = self.table.current_scope();
        let parent = if self.language == Language::PlSql {
            outer
        } else {
            ScopeId::GLOBAL
        };
        self.declare_in(parent, entry);
        self.mark_opaque(k + 1, name.saturating_sub(1));

        let range = self.span(name, end);
        self.table
            .enter_scope_under(outer, routine_name, ScopeKind::Function, range);
        self.declare_params(&params)?;
        Ok(if forward { end + 1 } else { body_keyword + 1 })
    }

    // ==================== PL/SQL ====================

    pub(super) fn plsql_declaration(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let token = self.token(i)?;
        if token.is_keyword("declare") {
            let end = self.routine_end(i + 1);
            let range = self.span(i, end);
            self.table.enter_scope("block", ScopeKind::Block, range);
            return Ok(i + 1);
        }
        if token.is_keyword("create") {
            return self.sql_create(i);
        }
        if token.is_keyword("for")
            && self.tok(i + 1).is_some_and(|t| t.is_identifier())
            && self.is_keyword_at(i + 2, "in")
        {
            return self.plsql_loop(i);
        }
        if !self.plsql_section_start(i) {
            return Ok(i + 1);
        }
        if token.is_any_keyword(&["procedure", "function"]) {
            return self.sql_routine(i);
        }
        if token.is_keyword("cursor") {
            return self.plsql_cursor(i);
        }
        if token.is_keyword("type") || token.is_keyword("pragma") {
            let semicolon = self.find_at_depth(i, |t| t.is_punct(";"));
            if token.is_keyword("type") && self.tok(i + 1).is_some_and(|t| t.is_identifier()) {
                let entry = self.entry_at(i + 1, SymbolKind::Class)?.with_type("type");
                self.declare(entry);
            }
            self.mark_opaque(i + 2, semicolon);
            return Ok(semicolon + 1);
        }
        if token.is_identifier() && self.plsql_item_follows(i) {
            return self.plsql_variable(i);
        }
        Ok(i + 1)
    }

    /// After `;`, `IS`, `AS` or `DECLARE`.
    fn plsql_section_start(&self, i: usize) -> bool {
        self.previous(i).is_none_or(|p| {
            p.is_punct(";") || p.is_any_keyword(&["is", "as", "declare"])
        })
    }

    /// `name type`, `name CONSTANT type` or `name EXCEPTION`; statements
    /// in a body start with a keyword or a name followed by `:=`, `(`,
    /// `.` or `;`.
    fn plsql_item_follows(&self, i: usize) -> bool {
        self.tok(i + 1).is_some_and(|next| {
            next.is_any_keyword(&["constant", "exception"])
                || (next.category == TokenCategory::ReservedWord
                    && !next.is_any_keyword(&["is", "as", "in", "then", "loop"]))
                || next.is_identifier()
        })
    }

    /// `name [CONSTANT] type [NOT NULL] [:= value | DEFAULT value];`
    fn plsql_variable(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let semicolon = self.find_at_depth(i, |t| t.is_punct(";"));
        if self.is_keyword_at(i + 1, "exception") {
            let entry = self
                .entry_at(i, SymbolKind::Constant)?
                .with_type("exception")
                .initialized(true);
            self.declare(entry);
            return Ok(semicolon + 1);
        }
        let constant = self.is_keyword_at(i + 1, "constant");
        let type_start = if constant { i + 2 } else { i + 1 };
        let value = (type_start..semicolon)
            .find(|&k| self.tokens[k].is_punct(":=") || self.tokens[k].is_keyword("default"));
        let type_end = (type_start..value.unwrap_or(semicolon))
            .find(|&k| self.tokens[k].is_keyword("not"))
            .or(value)
            .unwrap_or(semicolon);
        let data_type = self.text_between(type_start, type_end);
        self.mark_opaque(type_start, type_end.saturating_sub(1));

        let kind = if constant {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };
        let entry = self
            .entry_at(i, kind)?
            .with_type(data_type.as_str())
            .initialized(value.is_some());
        if let Some(value) = value {
            self.check_initializer(&entry.name, entry.position(), &data_type, value + 1);
        }
        self.declare(entry);
        Ok(value.map_or(semicolon + 1, |v| v + 1))
    }

    /// `CURSOR name [(params)] IS SELECT ...`
    fn plsql_cursor(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        if !self.tok(i + 1).is_some_and(|t| t.is_identifier()) {
            return Ok(i + 1);
        }
        let entry = self
            .entry_at(i + 1, SymbolKind::Variable)?
            .with_type("cursor")
            .initialized(true);
        self.declare(entry);
        if self.is_punct_at(i + 2, "(")
            && let Some(close) = self.group_end(i + 2)
        {
            self.mark_opaque(i + 2, close);
            return Ok(close + 1);
        }
        Ok(i + 2)
    }

    /// `(p IN NUMBER, q OUT VARCHAR2 := 'x')`: returns the parameters and
    /// the index after the list.
    fn plsql_params(&mut self, at: usize) -> Result<(Vec<Param>, usize), AnalysisFault> {
        if !self.is_punct_at(at, "(") {
            return Ok((Vec::new(), at));
        }
        let Some(close) = self.group_end(at) else {
            return Ok((Vec::new(), self.tokens.len()));
        };
        let mut params = Vec::new();
        let mut k = at + 1;
        while k < close {
            let segment_end = self.find_at_depth(k, |t| t.is_punct(",")).min(close);
            if self.token(k)?.is_identifier() {
                let mut type_start = k + 1;
                while self
                    .tok(type_start)
                    .is_some_and(|t| t.is_any_keyword(&["in", "out"]) || t.is_word("nocopy"))
                {
                    type_start += 1;
                }
                let type_end = (type_start..segment_end)
                    .find(|&d| self.tokens[d].is_punct(":=") || self.tokens[d].is_keyword("default"))
                    .unwrap_or(segment_end);
                self.mark_opaque(type_start, type_end.saturating_sub(1));
                params.push((k, Some(self.text_between(type_start, type_end))));
            }
            k = segment_end + 1;
        }
        Ok((params, close + 1))
    }

    /// `FOR i IN 1..10 LOOP ... END LOOP;` and cursor loops. The loop
    /// variable exists only inside the loop.
    fn plsql_loop(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let Some(start) = (i + 3..self.tokens.len()).find(|&k| self.tokens[k].is_keyword("loop")) else {
            return Ok(i + 1);
        };
        let mut depth = 0usize;
        let mut end = self.tokens.len().saturating_sub(1);
        for k in start..self.tokens.len() {
            let token = self.tokens[k];
            if !token.is_keyword("loop") {
                continue;
            }
            if self.previous(k).is_some_and(|p| p.is_keyword("end")) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    end = k;
                    break;
                }
            } else {
                depth += 1;
            }
        }

        let mut source = i + 3;
        if self.tok(source).is_some_and(|t| t.is_word("reverse")) {
            source += 1;
        }
        let numeric = self
            .tok(source)
            .is_some_and(|t| !(t.is_punct("(") || (t.is_identifier() && self.is_keyword_at(source + 1, "loop"))));
        let data_type = if numeric { "integer" } else { "record" };

        let range = self.span(i, end);
        self.table.enter_scope("loop", ScopeKind::Block, range);
        let mut entry = SymbolEntry::new(
            self.token(i + 1)?.text.as_str(),
            SymbolKind::Variable,
            self.position_of(i + 1),
        )
        .with_type(data_type)
        .initialized(true);
        entry.is_used = true;
        self.declare(entry);
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
    fn test_tsql_declare_and_table() {
        let source = "CREATE TABLE Users (id INT PRIMARY KEY, name VARCHAR(50));\nDECLARE @count INT = 0, @label VARCHAR(20);\nSET @label = 'users';\nSELECT @count = COUNT(*) FROM Users;\nPRINT @label;\nPRINT @count;\n";
        let (diags, symbols) = run(source, Language::TSql);
        assert!(diags.is_empty(), "{diags:?}");
        let names: Vec<_> = symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert_eq!(
            names,
            [
                ("Users", SymbolKind::Class),
                ("@count", SymbolKind::Variable),
                ("@label", SymbolKind::Variable),
            ]
        );
        assert_eq!(symbols[2].data_type.as_deref(), Some("VARCHAR(20)"));
    }

    #[test]
    fn test_tsql_procedure_parameters() {
        let source = "CREATE PROCEDURE GetUser @id INT, @verbose BIT = 0\nAS\nBEGIN\n    SELECT name FROM Users WHERE id = @id AND @verbose = 1;\nEND\n";
        let (diags, symbols) = run(source, Language::TSql);
        assert!(diags.is_empty(), "{diags:?}");
        let proc = &symbols[0];
        assert_eq!(proc.name, "GetUser");
        assert_eq!(proc.parameters.len(), 2);
        assert_eq!(proc.parameters[0].data_type.as_deref(), Some("INT"));
        assert_eq!(symbols[1].kind, SymbolKind::Parameter);
        assert_eq!(symbols[1].scope, "GetUser");
    }

    #[test]
    fn test_tsql_batches_are_scopes() {
        let source = "DECLARE @x INT = 1;\nPRINT @x;\nGO\nPRINT @x;\n";
        let (diags, _) = run(source, Language::TSql);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].line, 4);
    }

    #[test]
    fn test_plsql_procedure_and_loop() {
        let source = "CREATE OR REPLACE PROCEDURE raise_salary (p_id IN NUMBER, p_pct IN NUMBER) IS\n  v_total NUMBER := 0;\n  c_limit CONSTANT NUMBER := 100;\nBEGIN\n  FOR i IN 1..10 LOOP\n    v_total := v_total + i * p_pct;\n  END LOOP;\n  IF v_total > c_limit THEN\n    dbms_output.put_line(p_id);\n  END IF;\nEND;\n";
        let (diags, symbols) = run(source, Language::PlSql);
        assert!(diags.is_empty(), "{diags:?}");
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["raise_salary", "p_id", "p_pct", "v_total", "c_limit", "i"]);
        assert_eq!(symbols[4].kind, SymbolKind::Constant);
        assert_eq!(symbols[5].scope, "loop");
        assert_eq!(symbols[5].data_type.as_deref(), Some("integer"));
    }

    #[test]
    fn test_plsql_anonymous_block() {
        let source = "DECLARE\n  v_name VARCHAR2(30);\nBEGIN\n  SELECT ename INTO v_name FROM emp WHERE empno = 1;\n  dbms_output.put_line(v_name);\nEND;\n";
        let (diags, symbols) = run(source, Language::PlSql);
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].scope, "block");
        assert_eq!(symbols[0].data_type.as_deref(), Some("VARCHAR2(30)"));
    }
}
