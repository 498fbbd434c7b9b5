//! T-SQL and PL/SQL statements.
//!
//! Both dialects share the data statements (`SELECT`, `INSERT`, `UPDATE`,
//! `DELETE`, `CREATE`). They differ in procedural code: T-SQL uses
//! `@variables`, `SET` and single-statement `IF`/`WHILE` bodies, while
//! PL/SQL uses `:=`, `IF ... END IF` and `LOOP ... END LOOP`.
//!
//! Statement terminators are optional. An expression ends at the next
//! statement keyword, so consecutive statements need no `;` between them.

use crate::ast::{NodeKind, ParseNode};
use crate::language::Language;
use crate::lexer::{Token, TokenCategory};

use super::expressions::{expression_node, is_closer, is_opener, span_text};
use super::{Parser, StatementResult, SyntaxError};

/// Clause words that end a column or table list.
const SELECT_STOPS: &[&str] = &[
    "from", "into", "where", "group", "order", "having", "union", "except", "intersect",
];

const TABLE_STOPS: &[&str] = &["where", "group", "order", "having", "union", "except", "intersect"];

const ORDER_STOPS: &[&str] = &["having", "order", "union"];

/// Words that start a table constraint rather than a column.
const CONSTRAINT_WORDS: &[&str] = &[
    "constraint", "primary", "foreign", "unique", "check", "index", "key",
];

/// Statements kept as a verb and raw clause.
const OPAQUE_VERBS: &[&str] = &[
    "drop", "alter", "truncate", "grant", "revoke", "use", "commit", "rollback", "save", "open",
    "close", "fetch", "deallocate", "raiserror", "throw", "merge", "with", "null", "raise",
    "pragma", "waitfor", "goto", "exit", "savepoint", "lock",
];

impl<'a> Parser<'a> {
    // ==================== Dialect Entry Points ====================

    pub(super) fn tsql_statement(&mut self) -> StatementResult {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        if token.is_keyword("go") {
            self.advance();
            return Ok(Some(ParseNode::leaf(NodeKind::Statement, "GO", token.position())));
        }
        if token.is_keyword("declare") {
            return self.tsql_declare().map(Some);
        }
        if token.is_keyword("set") {
            return self.tsql_set().map(Some);
        }
        if token.is_keyword("if") || token.is_keyword("while") {
            return self.tsql_conditional().map(Some);
        }
        if token.is_keyword("begin") {
            return self.tsql_begin();
        }
        if token.is_keyword("print") {
            self.advance();
            let mut call = ParseNode::leaf(NodeKind::Call, "PRINT", token.position());
            match self.expression(&[]) {
                Some(value) => call.push(value),
                None => {
                    self.error_here("value after PRINT");
                    return Err(());
                }
            }
            self.match_punct(";");
            return Ok(Some(call));
        }
        if token.is_any_keyword(&["exec", "execute"]) {
            self.advance();
            let name = self.expect_name("procedure name")?;
            let mut call = ParseNode::leaf(NodeKind::Call, name.text.clone(), token.position());
            if let Some(args) = self.expression_list(&[]) {
                call.push(args);
            }
            self.match_punct(";");
            return Ok(Some(call));
        }
        self.sql_common_statement()
    }

    pub(super) fn plsql_statement(&mut self) -> StatementResult {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        if token.is_punct("/") {
            // SQL*Plus block terminator.
            self.advance();
            return Ok(None);
        }
        if token.is_keyword("declare") {
            return self.plsql_declare().map(Some);
        }
        if token.is_keyword("begin") {
            let block = self.plsql_block()?;
            self.match_punct(";");
            return Ok(Some(block));
        }
        if token.is_keyword("if") {
            return self.plsql_if().map(Some);
        }
        if token.is_any_keyword(&["loop", "while", "for"]) {
            return self.plsql_loop().map(Some);
        }
        if token.is_identifier() && self.peek_ahead(1).is_some_and(|t| t.is_punct(":=")) {
            return self.expression_statement();
        }
        if token.is_keyword("execute") && self.peek_ahead(1).is_some_and(|t| t.is_keyword("immediate")) {
            self.advance();
            self.advance();
            let mut node = ParseNode::leaf(NodeKind::Statement, "EXECUTE IMMEDIATE", token.position());
            if let Some(sql) = self.expression_list(&[]) {
                node.push(sql);
            }
            self.match_punct(";");
            return Ok(Some(node));
        }
        self.sql_common_statement()
    }

    /// Statements both dialects share.
    fn sql_common_statement(&mut self) -> StatementResult {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        if token.is_punct(";") || is_closer(token) {
            self.advance();
            return Ok(None);
        }
        if token.category == TokenCategory::ReservedWord {
            let word = token.text.to_ascii_lowercase();
            let node = match word.as_str() {
                "select" => Some(self.sql_select()?),
                "insert" => Some(self.sql_insert()?),
                "update" => Some(self.sql_update()?),
                "delete" => Some(self.sql_delete()?),
                "create" => Some(self.sql_create()?),
                "return" => {
                    self.advance();
                    let mut node = ParseNode::leaf(NodeKind::Return, "RETURN", token.position());
                    if let Some(value) = self.expression(&[]) {
                        node.push(value);
                    }
                    Some(node)
                }
                w if OPAQUE_VERBS.contains(&w) => {
                    self.advance();
                    let mut node = ParseNode::leaf(NodeKind::Statement, w.to_ascii_uppercase(), token.position());
                    let rest = self.sql_clause_tokens();
                    if let Some(rest) = expression_node(rest) {
                        node.push(rest);
                    }
                    Some(node)
                }
                "end" => {
                    // Unpaired END; the BEGIN/END balance check reports it.
                    self.advance();
                    None
                }
                _ => None,
            };
            if let Some(node) = node {
                self.match_punct(";");
                return Ok(Some(node));
            }
            if token.is_keyword("end") {
                return Ok(None);
            }
        }
        self.expression_statement()
    }

    /// Consumes the rest of an opaque statement.
    fn sql_clause_tokens(&mut self) -> &[&'a Token] {
        let start = self.current;
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if depth == 0
                && (token.is_punct(";")
                    || is_closer(token)
                    || (self.at_line_start()
                        && token.category == TokenCategory::ReservedWord
                        && self.profile.is_statement_keyword(&token.text)))
            {
                break;
            }
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                depth -= 1;
            }
            self.advance();
        }
        &self.tokens[start..self.current]
    }

    // ==================== Data Statements ====================

    fn sql_select(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("select", "SELECT")?;
        let mut node = ParseNode::leaf(NodeKind::SelectStatement, "SELECT", keyword.position());
        self.match_any_word(&["distinct", "all"]);
        if self.match_word("top") {
            if self.check_punct("(") {
                self.skip_balanced("(", ")");
            } else {
                self.advance();
            }
            self.match_word("percent");
        }

        let Some(columns) = self.expression_list(SELECT_STOPS) else {
            self.error_here("column list after SELECT");
            return Err(());
        };
        node.push(columns);

        if let Some(into) = self.peek().filter(|t| t.is_keyword("into")) {
            self.advance();
            let targets = self.expression_list(SELECT_STOPS);
            node.push(clause(NodeKind::Statement, "INTO", into, targets));
        }
        if let Some(from) = self.peek().filter(|t| t.is_keyword("from")) {
            self.advance();
            let Some(tables) = self.expression_list(TABLE_STOPS) else {
                self.error_here("table after FROM");
                return Err(());
            };
            node.push(clause(NodeKind::Statement, "FROM", from, Some(tables)));
        }
        self.sql_where(&mut node)?;
        if let Some(group) = self.peek().filter(|t| t.is_keyword("group")) {
            self.advance();
            self.expect_word("by", "BY after GROUP")?;
            let keys = self.expression_list(ORDER_STOPS);
            node.push(clause(NodeKind::Statement, "GROUP BY", group, keys));
        }
        if let Some(having) = self.peek().filter(|t| t.is_keyword("having")) {
            self.advance();
            let condition = self.expression(ORDER_STOPS);
            node.push(clause(NodeKind::Condition, "HAVING", having, condition));
        }
        if let Some(order) = self.peek().filter(|t| t.is_keyword("order")) {
            self.advance();
            self.expect_word("by", "BY after ORDER")?;
            let keys = self.expression_list(&["union"]);
            node.push(clause(NodeKind::Statement, "ORDER BY", order, keys));
        }
        if self.match_any_word(&["union", "except", "intersect"]) {
            self.match_word("all");
            if self.check_keyword("select") {
                node.push(self.sql_select()?);
            }
        }
        Ok(node)
    }

    fn sql_where(&mut self, node: &mut ParseNode) -> Result<(), ()> {
        if let Some(keyword) = self.peek().filter(|t| t.is_keyword("where")) {
            self.advance();
            let Some(condition) = self.expression(TABLE_STOPS) else {
                self.error_here("condition after WHERE");
                return Err(());
            };
            node.push(clause(NodeKind::Condition, "WHERE", keyword, Some(condition)));
        }
        Ok(())
    }

    fn sql_insert(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("insert", "INSERT")?;
        self.match_word("into");
        let table = self.sql_qualified_name("table name after INSERT INTO")?;
        let mut node = ParseNode::leaf(NodeKind::DataManipulation, "INSERT", keyword.position());
        node.push(table);

        if self.check_punct("(") && !self.peek_ahead(1).is_some_and(|t| t.is_keyword("select")) {
            if let Some(columns) = self.parenthesized("table name")? {
                node.push(columns);
            }
        }
        if self.match_word("values") {
            loop {
                if let Some(row) = self.parenthesized("VALUES")? {
                    node.push(row);
                }
                if !self.match_punct(",") {
                    break;
                }
            }
        } else if self.check_keyword("select") {
            node.push(self.sql_select()?);
        } else if self.match_word("default") {
            self.expect_word("values", "VALUES after DEFAULT")?;
        } else if self.check_keyword("exec") || self.check_keyword("execute") {
            if let Some(exec) = self.tsql_statement()? {
                node.push(exec);
            }
        } else {
            self.error_here("VALUES or SELECT");
            return Err(());
        }
        Ok(node)
    }

    fn sql_update(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("update", "UPDATE")?;
        let table = self.sql_qualified_name("table name after UPDATE")?;
        let mut node = ParseNode::leaf(NodeKind::DataManipulation, "UPDATE", keyword.position());
        node.push(table);
        let set = self.expect_word("set", "SET")?;
        let Some(assignments) = self.expression_list(&["where", "from"]) else {
            self.error_here("assignments after SET");
            return Err(());
        };
        node.push(clause(NodeKind::Statement, "SET", set, Some(assignments)));
        if let Some(from) = self.peek().filter(|t| t.is_keyword("from")) {
            self.advance();
            let tables = self.expression_list(TABLE_STOPS);
            node.push(clause(NodeKind::Statement, "FROM", from, tables));
        }
        self.sql_where(&mut node)?;
        Ok(node)
    }

    fn sql_delete(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("delete", "DELETE")?;
        self.match_word("from");
        let table = self.sql_qualified_name("table name after DELETE")?;
        let mut node = ParseNode::leaf(NodeKind::DataManipulation, "DELETE", keyword.position());
        node.push(table);
        self.sql_where(&mut node)?;
        Ok(node)
    }

    /// `schema.table` or `[dbo].[table]` as one identifier node.
    fn sql_qualified_name(&mut self, expected: &str) -> Result<ParseNode, ()> {
        let start = self.current;
        loop {
            if self.check_punct("[") {
                self.skip_balanced("[", "]");
            } else {
                self.expect_name(expected)?;
            }
            if !self.match_punct(".") {
                break;
            }
        }
        let tokens = &self.tokens[start..self.current];
        let name: String = tokens
            .iter()
            .filter(|t| !t.is_punct("[") && !t.is_punct("]"))
            .map(|t| t.text.as_str())
            .collect();
        let position = tokens.first().map_or(self.current_position(), |t| t.position());
        Ok(ParseNode::leaf(NodeKind::Identifier, name, position))
    }

    // ==================== CREATE ====================

    fn sql_create(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("create", "CREATE")?;
        if self.match_word("or") {
            self.expect_any_word(&["replace", "alter"], "REPLACE or ALTER after OR")?;
        }
        self.match_any_word(&["unique", "clustered", "nonclustered", "global", "temporary"]);

        let Some(object) = self.peek().filter(|t| {
            matches!(t.category, TokenCategory::ReservedWord | TokenCategory::Identifier)
        }) else {
            self.error_here("object type after CREATE");
            return Err(());
        };
        self.advance();
        let kind = object.text.to_ascii_uppercase();
        let mut node = ParseNode::leaf(NodeKind::CreateStatement, kind.as_str(), keyword.position());

        match kind.as_str() {
            "TABLE" => {
                let name = self.sql_qualified_name("table name")?;
                let table = name.value().unwrap_or_default().to_string();
                node.push(name);
                if self.check_punct("(") {
                    node.push(self.sql_column_definitions()?);
                } else if self.match_word("as") {
                    if self.check_keyword("select") {
                        node.push(self.sql_select()?);
                    }
                } else if self.language == Language::TSql {
                    self.errors.push(SyntaxError::MissingColumnDefinitions {
                        table,
                        position: keyword.position(),
                    });
                }
            }
            "VIEW" => {
                node.push(self.sql_qualified_name("view name")?);
                if self.check_punct("(") {
                    self.skip_balanced("(", ")");
                }
                self.expect_word("as", "AS after view name")?;
                if self.check_keyword("select") {
                    node.push(self.sql_select()?);
                }
            }
            "PROCEDURE" | "PROC" | "FUNCTION" => self.sql_routine(&mut node)?,
            "TRIGGER" => {
                node.push(self.sql_qualified_name("trigger name")?);
                let header = self.sql_clause_until(&["as", "begin", "declare"]);
                if let Some(header) = expression_node(header) {
                    node.push(header);
                }
                self.sql_routine_body(&mut node)?;
            }
            _ => {
                let rest = self.sql_clause_tokens();
                if let Some(rest) = expression_node(rest) {
                    node.push(rest);
                }
            }
        }
        Ok(node)
    }

    /// Consumes tokens until one of `words` at depth zero (not consumed).
    fn sql_clause_until(&mut self, words: &[&str]) -> &[&'a Token] {
        let start = self.current;
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if depth == 0 && words.iter().any(|w| token.is_keyword(w)) {
                break;
            }
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            self.advance();
        }
        &self.tokens[start..self.current]
    }

    /// `( id INT PRIMARY KEY, name VARCHAR(50) NOT NULL, PRIMARY KEY (id) )`
    fn sql_column_definitions(&mut self) -> Result<ParseNode, ()> {
        let open = self.expect_punct("(", "`(` to start column definitions")?;
        let mut list = ParseNode::new(NodeKind::ColumnDefinitions, open.position());

        let mut segment: Vec<&'a Token> = Vec::new();
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if depth == 0 && is_closer(token) {
                break;
            }
            if depth == 0 && token.is_punct(",") {
                let Some(column) = column_definition(&segment) else {
                    self.error_here("column definition");
                    return Err(());
                };
                list.push(column);
                segment.clear();
                self.advance();
                continue;
            }
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                depth -= 1;
            }
            segment.push(token);
            self.advance();
        }
        if let Some(column) = column_definition(&segment) {
            list.push(column);
        }
        self.match_punct(")");
        Ok(list)
    }

    fn sql_routine(&mut self, node: &mut ParseNode) -> Result<(), ()> {
        node.push(self.sql_qualified_name("routine name")?);
        if self.check_punct("(") {
            node.push(self.parameter_list()?);
        } else if self.language == Language::TSql && self.peek().is_some_and(|t| t.text.starts_with('@')) {
            // T-SQL parameters may be listed without parentheses.
            let position = self.current_position();
            let header = self.sql_clause_until(&["as", "returns", "with"]);
            let mut params = ParseNode::new(NodeKind::Parameters, position);
            for param in header.iter().filter(|t| t.is_identifier() && t.text.starts_with('@')) {
                params.push(ParseNode::leaf(NodeKind::Parameter, param.text.clone(), param.position()));
            }
            node.push(params);
        }
        if self.match_any_word(&["return", "returns"]) {
            let result = self.sql_clause_until(&["as", "is", "begin", "with"]);
            if let Some(result) = expression_node(result) {
                node.push(result);
            }
        }
        if self.match_word("with") {
            self.sql_clause_until(&["as"]);
        }
        self.sql_routine_body(node)
    }

    /// `AS|IS [declarations] BEGIN ... END`, or T-SQL statements up to GO.
    fn sql_routine_body(&mut self, node: &mut ParseNode) -> Result<(), ()> {
        let has_intro = self.match_any_word(&["as", "is"]);
        if !self.enter_nested() {
            self.sql_clause_until(&["go"]);
            return Ok(());
        }
        let mut body = ParseNode::new(NodeKind::Body, self.current_position());
        if self.language == Language::PlSql {
            if has_intro && !self.check_keyword("begin") {
                body.push(self.plsql_declarations(None));
            }
            if self.check_keyword("begin") {
                match self.plsql_block() {
                    Ok(block) => body.push(block),
                    Err(()) => {
                        self.leave_nested();
                        return Err(());
                    }
                }
                self.match_punct(";");
            }
        } else {
            body.children = self.statements_until(|t| t.is_keyword("go"));
        }
        self.leave_nested();
        node.push(body);
        Ok(())
    }

    // ==================== T-SQL ====================

    /// `DECLARE @a INT = 1, @b VARCHAR(10)`
    fn tsql_declare(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("declare", "DECLARE")?;
        let mut declarations = Vec::new();
        loop {
            let Some(name) = self.peek().filter(|t| t.is_identifier()) else {
                self.error_here("variable name after DECLARE");
                return Err(());
            };
            self.advance();
            self.match_word("as");
            let mut decl = ParseNode::new(NodeKind::VariableDeclaration, name.position());
            decl.push(ParseNode::leaf(NodeKind::Identifier, name.text.clone(), name.position()));

            if self.match_word("cursor") {
                decl.value = Some("CURSOR".to_string());
                self.match_word("for");
                if self.check_keyword("select") {
                    decl.push(self.sql_select()?);
                }
            } else if self.check_keyword("table") {
                self.advance();
                decl.value = Some("TABLE".to_string());
                if self.check_punct("(") {
                    decl.push(self.sql_column_definitions()?);
                }
            } else {
                let data_type = self.expect_name("data type")?;
                let mut type_text = data_type.text.clone();
                if self.check_punct("(") {
                    let start = self.current;
                    self.skip_balanced("(", ")");
                    type_text.push_str(&span_text(&self.tokens[start..self.current]));
                }
                decl.value = Some(type_text);
                if self.match_punct("=")
                    && let Some(value) = self.expression(&[])
                {
                    decl.push(value);
                }
            }
            declarations.push(decl);
            if !self.match_punct(",") {
                break;
            }
        }
        self.match_punct(";");

        if declarations.len() == 1 {
            return declarations.pop().ok_or(());
        }
        let mut group = ParseNode::leaf(NodeKind::Block, "DECLARE", keyword.position());
        group.children = declarations;
        Ok(group)
    }

    /// `SET @x = expr` or a session option such as `SET NOCOUNT ON`.
    fn tsql_set(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("set", "SET")?;
        match self.peek() {
            Some(target) if target.is_identifier() && target.text.starts_with('@') => {
                self.advance();
                let Some(op) = self.peek().filter(|t| super::expressions::is_assignment_operator(t)) else {
                    self.error_here("`=` after variable");
                    return Err(());
                };
                self.advance();
                let mut node = ParseNode::leaf(NodeKind::Assignment, target.text.clone(), target.position());
                node.push(ParseNode::leaf(NodeKind::Operator, op.text.clone(), op.position()));
                match self.expression(&[]) {
                    Some(value) => node.push(value),
                    None => {
                        self.error_here("value after `=`");
                        return Err(());
                    }
                }
                self.match_punct(";");
                Ok(node)
            }
            _ => {
                let mut node = ParseNode::leaf(NodeKind::Statement, "SET", keyword.position());
                let rest = self.sql_clause_tokens();
                if let Some(rest) = expression_node(rest) {
                    node.push(rest);
                }
                self.match_punct(";");
                Ok(node)
            }
        }
    }

    /// `IF cond stmt [ELSE stmt]` and `WHILE cond stmt`.
    fn tsql_conditional(&mut self) -> Result<ParseNode, ()> {
        let Some(keyword) = self.advance() else {
            return Err(());
        };
        let word = keyword.text.to_ascii_uppercase();
        let mut node = ParseNode::leaf(NodeKind::ControlStructure, word.as_str(), keyword.position());
        let position = self.current_position();
        let Some(condition) = self.expression(&[]) else {
            self.error_here(&format!("condition after {word}"));
            return Err(());
        };
        node.push(ParseNode::new(NodeKind::Condition, position).with_child(condition));

        let mut body = ParseNode::new(NodeKind::Body, self.current_position());
        if let Some(statement) = self.nested_statement() {
            body.push(statement);
        }
        node.push(body);
        if word == "IF" && self.match_word("else") {
            let mut otherwise = ParseNode::leaf(NodeKind::Body, "ELSE", self.current_position());
            if let Some(statement) = self.nested_statement() {
                otherwise.push(statement);
            }
            node.push(otherwise);
        }
        Ok(node)
    }

    /// `BEGIN ... END`, `BEGIN TRY ... END TRY`, `BEGIN TRAN`.
    fn tsql_begin(&mut self) -> StatementResult {
        let keyword = self.expect_word("begin", "BEGIN")?;
        let begin_index = self.current - 1;
        if self.match_any_word(&["tran", "transaction", "distributed"]) {
            self.match_any_word(&["tran", "transaction"]);
            if self.check_identifier() {
                self.advance();
            }
            self.match_punct(";");
            return Ok(Some(ParseNode::leaf(NodeKind::Statement, "BEGIN TRANSACTION", keyword.position())));
        }

        let section = self
            .peek()
            .filter(|t| t.is_keyword("try") || t.is_keyword("catch"))
            .map(|t| t.text.to_ascii_uppercase());
        if section.is_some() {
            self.advance();
        }
        let mut block = ParseNode::new(NodeKind::Block, keyword.position());
        block.value = section.clone();

        if !self.enter_nested() {
            self.current = begin_index;
            self.skip_sql_block();
            return Ok(Some(block));
        }
        block.children = self.statements_until(|t| t.is_keyword("end"));
        self.leave_nested();
        if self.match_word("end")
            && let Some(section) = &section
        {
            self.match_word(section);
        }
        self.match_punct(";");
        Ok(Some(block))
    }

    /// Consumes `BEGIN ... END` with nested pairs.
    fn skip_sql_block(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.advance() {
            if token.is_keyword("begin") || token.is_keyword("case") {
                depth += 1;
            } else if token.is_keyword("end") {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
        }
    }

    // ==================== PL/SQL ====================

    /// `DECLARE` followed by declarations up to `BEGIN`.
    fn plsql_declare(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("declare", "DECLARE")?;
        Ok(self.plsql_declarations(Some(keyword)))
    }

    /// `name [CONSTANT] type [NOT NULL] [:= value];` lines up to `BEGIN`.
    fn plsql_declarations(&mut self, keyword: Option<&'a Token>) -> ParseNode {
        let position = keyword.map_or(self.current_position(), Token::position);
        let mut section = ParseNode::leaf(NodeKind::Block, "DECLARE", position);

        while let Some(token) = self.peek() {
            if self.aborted || token.is_keyword("begin") || token.is_keyword("end") {
                break;
            }
            if token.is_any_keyword(&["procedure", "function"]) {
                self.advance();
                let mut routine = ParseNode::leaf(NodeKind::CreateStatement, token.text.to_ascii_uppercase(), token.position());
                if self.sql_routine(&mut routine).is_err() {
                    self.synchronize();
                }
                section.push(routine);
                continue;
            }
            if token.is_any_keyword(&["cursor", "type", "pragma"]) {
                self.advance();
                let mut node = ParseNode::leaf(NodeKind::TypeDeclaration, token.text.to_ascii_uppercase(), token.position());
                let rest = self.sql_clause_until(&[]);
                if let Some(rest) = expression_node(rest) {
                    node.push(rest);
                }
                self.match_punct(";");
                section.push(node);
                continue;
            }
            match self.plsql_variable() {
                Ok(node) => section.push(node),
                Err(()) => self.synchronize(),
            }
        }
        section
    }

    fn plsql_variable(&mut self) -> Result<ParseNode, ()> {
        let name = self.expect_identifier("variable name")?;
        let constant = self.match_word("constant");
        let kind = if constant {
            NodeKind::ConstantDeclaration
        } else {
            NodeKind::VariableDeclaration
        };
        let data_type = self.expect_name("data type")?;
        let mut type_text = data_type.text.clone();
        while self.check_punct("%") || self.check_punct(".") {
            // `emp.salary%TYPE`
            self.advance();
            if let Some(part) = self.advance() {
                type_text.push('.');
                type_text.push_str(&part.text);
            }
        }
        if self.check_punct("(") {
            let start = self.current;
            self.skip_balanced("(", ")");
            type_text.push_str(&span_text(&self.tokens[start..self.current]));
        }
        let mut node = ParseNode::leaf(kind, type_text, name.position());
        node.push(ParseNode::leaf(NodeKind::Identifier, name.text.clone(), name.position()));
        if self.match_word("not") {
            self.expect_word("null", "NULL after NOT")?;
        }
        if (self.match_punct(":=") || self.match_word("default"))
            && let Some(value) = self.expression(&[])
        {
            node.push(value);
        }
        self.match_punct(";");
        Ok(node)
    }

    /// `BEGIN statements [EXCEPTION WHEN ... THEN statements] END [name];`
    fn plsql_block(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("begin", "BEGIN")?;
        let mut block = ParseNode::new(NodeKind::Block, keyword.position());
        if !self.enter_nested() {
            self.current -= 1;
            self.skip_sql_block();
            return Ok(block);
        }
        block.children = self.statements_until(|t| t.is_keyword("end") || t.is_keyword("exception"));
        if let Some(exception) = self.peek().filter(|t| t.is_keyword("exception")) {
            self.advance();
            let mut handlers = ParseNode::leaf(NodeKind::Body, "EXCEPTION", exception.position());
            while let Some(when) = self.peek().filter(|t| t.is_keyword("when")) {
                self.advance();
                let names = self.expression(&["then"]);
                if self.expect_word("then", "THEN after exception name").is_err() {
                    self.leave_nested();
                    return Err(());
                }
                let mut handler = clause(NodeKind::Body, "WHEN", when, names);
                handler
                    .children
                    .extend(self.statements_until(|t| t.is_keyword("when") || t.is_keyword("end")));
                handlers.push(handler);
            }
            block.push(handlers);
        }
        self.leave_nested();
        self.expect_word("end", "END to close BEGIN")?;
        if self.check_identifier() {
            self.advance();
        }
        Ok(block)
    }

    /// `IF c THEN ... [ELSIF c THEN ...] [ELSE ...] END IF;`
    fn plsql_if(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("if", "IF")?;
        let mut node = ParseNode::leaf(NodeKind::ControlStructure, "IF", keyword.position());
        if !self.enter_nested() {
            self.skip_until_end_of("if");
            return Ok(node);
        }

        let mut branch_keyword = keyword;
        loop {
            let condition = self.expression(&["then"]);
            let Some(condition) = condition else {
                self.error_here("condition after IF");
                self.leave_nested();
                return Err(());
            };
            if self.expect_word("then", "THEN").is_err() {
                self.leave_nested();
                return Err(());
            }
            let mut branch = clause(NodeKind::Body, "THEN", branch_keyword, Some(condition));
            branch.children.extend(self.statements_until(|t| {
                t.is_keyword("elsif") || t.is_keyword("else") || t.is_keyword("end")
            }));
            node.push(branch);
            match self.peek().filter(|t| t.is_keyword("elsif")) {
                Some(elsif) => {
                    self.advance();
                    branch_keyword = elsif;
                }
                None => break,
            }
        }
        if let Some(otherwise) = self.peek().filter(|t| t.is_keyword("else")) {
            self.advance();
            let mut branch = ParseNode::leaf(NodeKind::Body, "ELSE", otherwise.position());
            branch.children = self.statements_until(|t| t.is_keyword("end"));
            node.push(branch);
        }
        self.leave_nested();
        self.expect_word("end", "END IF")?;
        self.expect_word("if", "IF after END")?;
        self.match_punct(";");
        Ok(node)
    }

    /// `LOOP`, `WHILE c LOOP` and `FOR i IN a..b LOOP`, each ending `END LOOP;`.
    fn plsql_loop(&mut self) -> Result<ParseNode, ()> {
        let Some(keyword) = self.advance() else {
            return Err(());
        };
        let word = keyword.text.to_ascii_uppercase();
        let mut node = ParseNode::leaf(NodeKind::ControlStructure, word.as_str(), keyword.position());

        if word != "LOOP" {
            let position = self.current_position();
            let Some(condition) = self.expression(&["loop"]) else {
                self.error_here(&format!("condition after {word}"));
                return Err(());
            };
            node.push(ParseNode::new(NodeKind::Condition, position).with_child(condition));
            self.expect_word("loop", "LOOP")?;
        }
        if !self.enter_nested() {
            self.skip_until_end_of("loop");
            return Ok(node);
        }
        let mut body = ParseNode::new(NodeKind::Body, self.current_position());
        body.children = self.statements_until(|t| t.is_keyword("end"));
        node.push(body);
        self.leave_nested();
        self.expect_word("end", "END LOOP")?;
        self.expect_word("loop", "LOOP after END")?;
        self.match_punct(";");
        Ok(node)
    }

    /// Consumes up to and including `END <word>`.
    fn skip_until_end_of(&mut self, word: &str) {
        while let Some(token) = self.advance() {
            if token.is_keyword("end") && self.check_word(word) {
                self.advance();
                return;
            }
        }
    }

    fn expect_any_word(&mut self, words: &[&str], expected_desc: &str) -> Result<(), ()> {
        if self.match_any_word(words) {
            Ok(())
        } else {
            self.error_here(expected_desc);
            Err(())
        }
    }
}

/// A clause node labelled `label`, positioned at its keyword.
fn clause(kind: NodeKind, label: &str, keyword: &Token, content: Option<ParseNode>) -> ParseNode {
    let mut node = ParseNode::leaf(kind, label, keyword.position());
    if let Some(content) = content {
        node.push(content);
    }
    node
}

/// One entry of a CREATE TABLE column list.
fn column_definition(segment: &[&Token]) -> Option<ParseNode> {
    let first = segment.first()?;
    if CONSTRAINT_WORDS.iter().any(|w| first.is_keyword(w)) {
        let mut node = ParseNode::leaf(NodeKind::Statement, "CONSTRAINT", first.position());
        if let Some(body) = expression_node(segment) {
            node.push(body);
        }
        return Some(node);
    }

    let mut column = ParseNode::leaf(NodeKind::ColumnDefinition, first.text.clone(), first.position());
    if let Some(data_type) = segment.get(1) {
        let mut end = 2;
        if segment.get(2).is_some_and(|t| t.is_punct("(")) {
            end = segment
                .iter()
                .position(|t| t.is_punct(")"))
                .map_or(segment.len(), |i| i + 1);
        }
        column.push(ParseNode::leaf(
            NodeKind::Identifier,
            span_text(&segment[1..end]),
            data_type.position(),
        ));
        if let Some(rest) = expression_node(&segment[end..]) {
            column.push(rest);
        }
    }
    Some(column)
}

#[cfg(test)]
mod tests {
    use crate::ast::{NodeKind, ParseNode};
    use crate::diagnostics::Diagnostic;
    use crate::language::Language;
    use crate::lexer::lex;
    use crate::parser::analyze;

    fn parse(source: &str, language: Language) -> (Vec<ParseNode>, Vec<Diagnostic>) {
        let tokens = lex(source, language);
        analyze(&tokens, language)
    }

    #[test]
    fn test_select_clauses() {
        let source = "SELECT name, COUNT(*) AS total FROM users u JOIN orders o ON u.id = o.user_id WHERE u.active = 1 GROUP BY name ORDER BY total DESC;";
        let (nodes, diagnostics) = parse(source, Language::TSql);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(nodes.len(), 1);
        let select = &nodes[0];
        assert_eq!(select.kind, NodeKind::SelectStatement);
        let labels: Vec<_> = select.children[1..].iter().filter_map(|c| c.value()).collect();
        assert_eq!(labels, ["FROM", "WHERE", "GROUP BY", "ORDER BY"]);
    }

    #[test]
    fn test_create_table_columns() {
        let source = "CREATE TABLE users (\n  id INT PRIMARY KEY,\n  name VARCHAR(50) NOT NULL,\n  CONSTRAINT uq UNIQUE (name)\n);";
        let (nodes, diagnostics) = parse(source, Language::TSql);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let columns = nodes[0].find_all(NodeKind::ColumnDefinition);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[1].children[0].value(), Some("VARCHAR(50)"));
    }

    #[test]
    fn test_tsql_create_table_without_columns() {
        let (_, diagnostics) = parse("CREATE TABLE users;", Language::TSql);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_error());
        assert!(diagnostics[0].message.contains("column definitions"));
    }

    #[test]
    fn test_plsql_create_table_without_columns_is_deferred() {
        let (_, diagnostics) = parse("CREATE TABLE users;", Language::PlSql);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_tsql_procedure_and_control() {
        let source = "DECLARE @count INT = 0, @name VARCHAR(20);\nSET @count = @count + 1;\nIF @count > 0\nBEGIN\n  PRINT 'positive';\nEND\nELSE\n  PRINT 'zero';\nWHILE @count < 10 SET @count = @count + 1;\nGO\nCREATE PROCEDURE GetUser @id INT\nAS\nBEGIN\n  SELECT * FROM users WHERE id = @id;\nEND\nGO\n";
        let (nodes, diagnostics) = parse(source, Language::TSql);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(nodes[0].value(), Some("DECLARE"));
        assert_eq!(nodes[0].children.len(), 2);
        let procedure = nodes.iter().find(|n| n.kind == NodeKind::CreateStatement).unwrap();
        assert_eq!(procedure.find_all(NodeKind::Parameter)[0].value(), Some("@id"));
    }

    #[test]
    fn test_plsql_block() {
        let source = "DECLARE\n  v_total NUMBER := 0;\n  c_rate CONSTANT NUMBER := 2;\nBEGIN\n  FOR i IN 1..10 LOOP\n    v_total := v_total + i * c_rate;\n  END LOOP;\n  IF v_total > 50 THEN\n    dbms_output.put_line('big');\n  ELSIF v_total > 10 THEN\n    dbms_output.put_line('medium');\n  ELSE\n    NULL;\n  END IF;\nEXCEPTION\n  WHEN OTHERS THEN\n    ROLLBACK;\nEND;\n/\n";
        let (nodes, diagnostics) = parse(source, Language::PlSql);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].find_all(NodeKind::ConstantDeclaration).len(), 1);
        assert_eq!(nodes[1].find_all(NodeKind::ControlStructure).len(), 2);
    }

    #[test]
    fn test_dml_statements() {
        let source = "INSERT INTO users (id, name) VALUES (1, 'a'), (2, 'b');\nUPDATE users SET name = 'c' WHERE id = 1;\nDELETE FROM users WHERE id = 2;\n";
        let (nodes, diagnostics) = parse(source, Language::TSql);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let verbs: Vec<_> = nodes.iter().filter_map(|n| n.value()).collect();
        assert_eq!(verbs, ["INSERT", "UPDATE", "DELETE"]);
    }
}
