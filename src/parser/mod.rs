//! Recursive-descent parser over a trivia-filtered, one-token-lookahead
//! stream of [`Token`]s, producing a [`Schema`].
//!
//! The cursor is a materialized `Vec<Token>` with an index rather than an
//! adapter over the lexer's iterator: both satisfy "one-token lookahead",
//! and a buffer is the simpler of the two to get right.

use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::schema::{
    Check, Collation, Column, ColumnConstraint, Default as ColumnDefault, Deferrable, Enforcement,
    ForeignKey, Generated, GeneratedKind, Index, Indexed, Item, MatchKind, NotNull, OnConflict,
    QualifiedName, ReferentialAction, Schema, Sorting, Table, TableConstraint, TableOptions, Type,
    Uniqueness,
};
use crate::token::{Token, TokenKind};

/// Parse a complete sequence of `CREATE TABLE`/`CREATE INDEX` statements.
pub fn parse_schema(src: &str) -> Result<Schema> {
    let tokens: Vec<Token> = Lexer::new(src).filter(Token::is_not_trivia).collect();
    let mut parser = Parser { tokens, pos: 0 };
    let mut items = Vec::new();
    loop {
        while parser.consume_punct(";") {}
        if parser.peek().is_none() {
            break;
        }
        if parser.check_keyword("CREATE")
            && parser
                .peek_nth(1)
                .is_some_and(|t| t.is_keyword("UNIQUE") || t.is_keyword("INDEX"))
        {
            log::trace!("dispatching CREATE INDEX at token {}", parser.pos);
            items.push(Item::Index(parser.parse_create_index()?));
        } else {
            log::trace!("dispatching CREATE TABLE at token {}", parser.pos);
            items.push(Item::Table(parser.parse_create_table()?));
        }
    }
    Ok(Schema::new(items))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    // -- cursor primitives --------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eof_pos(&self) -> usize {
        self.tokens.last().map(|t| t.span.end).unwrap_or(0)
    }

    fn unexpected(&self, expected: &str) -> Error {
        match self.peek() {
            Some(t) => Error::unexpected_token(expected, t.text().to_string(), t.span),
            None => Error::unexpected_eof(self.eof_pos()),
        }
    }

    fn check_keyword(&self, kw: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(kw))
    }

    fn consume_keyword(&mut self, kw: &str) -> bool {
        if self.check_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<Token> {
        if self.consume_keyword(kw) {
            Ok(self.tokens[self.pos - 1].clone())
        } else {
            Err(self.unexpected(kw))
        }
    }

    fn check_punct(&self, p: &str) -> bool {
        self.peek().is_some_and(|t| t.is_punct(p))
    }

    fn consume_punct(&mut self, p: &str) -> bool {
        if self.check_punct(p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: &str) -> Result<Token> {
        if self.consume_punct(p) {
            Ok(self.tokens[self.pos - 1].clone())
        } else {
            Err(self.unexpected(p))
        }
    }

    /// Case-insensitive text match, for the handful of grammar words that
    /// are not catalog keywords at all (`STORED`, `PARTIAL`, `SIMPLE`) or
    /// are catalog raw-ids rather than keywords (`STRICT`, `ROWID`,
    /// `IDENTITY`): a keyword lives in the catalog upper-cased regardless
    /// of source casing, but these do not, so the lexer preserves their
    /// original case when it fails the keyword lookup.
    fn check_word_ci(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.text().eq_ignore_ascii_case(word))
    }

    fn consume_word_ci(&mut self, word: &str) -> bool {
        if self.check_word_ci(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_word_ci(&mut self, word: &str) -> Result<Token> {
        if self.consume_word_ci(word) {
            Ok(self.tokens[self.pos - 1].clone())
        } else {
            Err(self.unexpected(word))
        }
    }

    fn expect_kind(&mut self, kind: TokenKind, label: &str) -> Result<Token> {
        match self.peek() {
            Some(t) if t.kind.intersects(kind) => Ok(self.advance().unwrap()),
            _ => Err(self.unexpected(label)),
        }
    }

    // -- shared grammar fragments ----------------------------------------

    /// An identifier: a non-keyword identifier-shaped token. Keywords are
    /// never identifiers in this grammar, which is what lets the table
    /// body's column/constraint boundary be decided by a single token of
    /// lookahead.
    fn parse_identifier(&mut self) -> Result<String> {
        match self.peek() {
            Some(t) if t.kind.intersects(TokenKind::NON_KW_ID) => Ok(self.advance().unwrap().text().to_string()),
            Some(t) => Err(Error::expected_identifier(t.text().to_string(), t.span)),
            None => Err(Error::unexpected_eof(self.eof_pos())),
        }
    }

    fn parse_qualified_name(&mut self) -> Result<QualifiedName> {
        let mut parts = vec![self.parse_identifier()?];
        while self.consume_punct(".") {
            parts.push(self.parse_identifier()?);
        }
        parts.reverse();
        Ok(QualifiedName::new(parts))
    }

    fn parse_int_literal(&mut self) -> Result<i64> {
        let tok = self.expect_kind(TokenKind::INT, "an integer")?;
        tok.text()
            .parse()
            .map_err(|_| Error::internal_invariant(format!("'{}' is not a valid integer literal", tok.text())))
    }

    fn parse_parenthesized_names(&mut self) -> Result<Vec<String>> {
        self.expect_punct("(")?;
        let mut names = vec![self.parse_identifier()?];
        while self.consume_punct(",") {
            names.push(self.parse_identifier()?);
        }
        self.expect_punct(")")?;
        Ok(names)
    }

    fn parse_indexed_entry(&mut self) -> Result<Indexed> {
        let column = self.parse_identifier()?;
        let mut entry = Indexed::new(column);
        if self.consume_keyword("COLLATE") {
            entry.collation = Some(self.parse_identifier()?);
        }
        if self.consume_keyword("ASC") {
            entry.sorting = Some(Sorting::Asc);
        } else if self.consume_keyword("DESC") {
            entry.sorting = Some(Sorting::Desc);
        }
        Ok(entry)
    }

    /// Shared by table-level `PRIMARY KEY`/`UNIQUE` and `CREATE INDEX`.
    /// Column-level `PRIMARY KEY` builds its single `Indexed` separately
    /// since it has no surrounding parens to read a list from.
    fn parse_indexed_list(&mut self) -> Result<Vec<Indexed>> {
        self.expect_punct("(")?;
        let mut result = vec![self.parse_indexed_entry()?];
        while self.consume_punct(",") {
            result.push(self.parse_indexed_entry()?);
        }
        self.expect_punct(")")?;
        Ok(result)
    }

    /// Tokens strictly between a balanced `(...)` pair, excluding both
    /// parens. Used for `CHECK`, `GENERATED ... AS (...)`, and `WHERE`.
    fn parse_parenthesized_tokens(&mut self) -> Result<Vec<Token>> {
        self.expect_punct("(")?;
        let mut depth = 0usize;
        let mut tokens = Vec::new();
        loop {
            let tok = self.advance().ok_or_else(|| Error::unexpected_eof(self.eof_pos()))?;
            if tok.is_punct("(") {
                depth += 1;
                tokens.push(tok);
            } else if tok.is_punct(")") {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                tokens.push(tok);
            } else {
                tokens.push(tok);
            }
        }
        Ok(tokens)
    }

    /// Tokens of a balanced `(...)` pair, including both parens. Used for
    /// `DEFAULT`'s function-call and parenthesized-group forms, where the
    /// parens are part of the expression rather than delimiter syntax.
    fn collect_balanced_parens_inclusive(&mut self) -> Result<Vec<Token>> {
        let open = self.expect_punct("(")?;
        let mut tokens = vec![open];
        let mut depth = 0usize;
        loop {
            let tok = self.advance().ok_or_else(|| Error::unexpected_eof(self.eof_pos()))?;
            if tok.is_punct("(") {
                depth += 1;
                tokens.push(tok);
            } else if tok.is_punct(")") {
                tokens.push(tok);
                if depth == 0 {
                    break;
                }
                depth -= 1;
            } else {
                tokens.push(tok);
            }
        }
        Ok(tokens)
    }

    fn collect_tokens_until_semicolon(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(t) = self.peek() {
            if t.is_punct(";") {
                break;
            }
            tokens.push(self.advance().unwrap());
        }
        tokens
    }

    fn skip_until_semicolon(&mut self) {
        while let Some(t) = self.peek() {
            if t.is_punct(";") {
                break;
            }
            self.advance();
        }
    }

    fn parse_optional_constraint_name(&mut self) -> Result<Option<String>> {
        if self.consume_keyword("CONSTRAINT") {
            Ok(Some(self.parse_identifier()?))
        } else {
            Ok(None)
        }
    }

    fn parse_optional_on_conflict(&mut self) -> Result<Option<OnConflict>> {
        if !self.consume_keyword("ON") {
            return Ok(None);
        }
        self.expect_keyword("CONFLICT")?;
        let tok = self.advance().ok_or_else(|| Error::unexpected_eof(self.eof_pos()))?;
        let kind = match tok.text() {
            "ABORT" => OnConflict::Abort,
            "FAIL" => OnConflict::Fail,
            "IGNORE" => OnConflict::Ignore,
            "REPLACE" => OnConflict::Replace,
            "ROLLBACK" => OnConflict::Rollback,
            other => return Err(Error::invalid_on_conflict_target(other.to_string(), tok.span)),
        };
        Ok(Some(kind))
    }

    fn parse_referential_action(&mut self) -> Result<ReferentialAction> {
        if self.consume_keyword("CASCADE") {
            return Ok(ReferentialAction::Cascade);
        }
        if self.consume_keyword("NO") {
            self.expect_keyword("ACTION")?;
            return Ok(ReferentialAction::NoAction);
        }
        if self.consume_keyword("SET") {
            if self.consume_keyword("NULL") {
                return Ok(ReferentialAction::SetNull);
            }
            if self.consume_keyword("DEFAULT") {
                return Ok(ReferentialAction::SetDefault);
            }
            return Err(self.unexpected("NULL or DEFAULT"));
        }
        if self.consume_keyword("RESTRICT") {
            return Ok(ReferentialAction::Restrict);
        }
        Err(self.unexpected("a referential action"))
    }

    fn parse_deferrable_state(&mut self) -> Result<Deferrable> {
        if self.consume_keyword("DEFERRED") {
            return Ok(Deferrable::Deferred);
        }
        if self.consume_keyword("IMMEDIATE") {
            return Ok(Deferrable::Immediate);
        }
        Err(self.unexpected("DEFERRED or IMMEDIATE"))
    }

    /// `[NOT] DEFERRABLE [INITIALLY DEFERRED|IMMEDIATE]?`, also accepting a
    /// leading `INITIALLY ...` ahead of the deferrability keyword. Returns
    /// `None` when no deferrability keyword appeared at all.
    fn parse_optional_enforcement(&mut self) -> Result<Option<Enforcement>> {
        let mut initially = None;
        let mut not_deferrable = false;
        let mut seen = false;

        if self.consume_keyword("INITIALLY") {
            seen = true;
            initially = Some(self.parse_deferrable_state()?);
            if self.consume_keyword("NOT") {
                self.expect_keyword("DEFERRABLE")?;
                not_deferrable = true;
            } else {
                self.consume_keyword("DEFERRABLE");
            }
        } else {
            if self.consume_keyword("NOT") {
                self.expect_keyword("DEFERRABLE")?;
                not_deferrable = true;
                seen = true;
            } else if self.consume_keyword("DEFERRABLE") {
                seen = true;
            }
            if seen && self.consume_keyword("INITIALLY") {
                initially = Some(self.parse_deferrable_state()?);
            }
        }

        if !seen {
            return Ok(None);
        }
        Ok(Some(Enforcement { initially, not_deferrable }))
    }

    fn parse_foreign_key_clause(
        &mut self,
        columns: Vec<String>,
        name: Option<String>,
        is_table_constraint: bool,
    ) -> Result<ForeignKey> {
        self.expect_keyword("REFERENCES")?;
        let foreign_table = self.parse_qualified_name()?;
        let referred_columns = if self.check_punct("(") {
            Some(self.parse_parenthesized_names()?)
        } else {
            None
        };

        let mut on_delete = None;
        let mut on_update = None;
        let mut r#match = None;
        loop {
            if self.consume_keyword("ON") {
                if self.consume_keyword("DELETE") {
                    on_delete = Some(self.parse_referential_action()?);
                } else if self.consume_keyword("UPDATE") {
                    on_update = Some(self.parse_referential_action()?);
                } else {
                    return Err(self.unexpected("DELETE or UPDATE"));
                }
            } else if self.consume_keyword("MATCH") {
                let tok = self.advance().ok_or_else(|| Error::unexpected_eof(self.eof_pos()))?;
                let upper = tok.text().to_uppercase();
                r#match = Some(match upper.as_str() {
                    "FULL" => MatchKind::Full,
                    "PARTIAL" => MatchKind::Partial,
                    "SIMPLE" => MatchKind::Simple,
                    _ => return Err(Error::invalid_match_clause(tok.text().to_string(), tok.span)),
                });
            } else {
                break;
            }
        }

        let enforcement = self.parse_optional_enforcement()?;
        Ok(ForeignKey {
            name,
            columns,
            foreign_table,
            referred_columns,
            on_delete,
            on_update,
            r#match,
            enforcement,
            is_table_constraint,
        })
    }

    /// `DEFAULT` captures its expression verbatim, unlike `CHECK`/
    /// `GENERATED`: a parenthesized group or function call keeps its
    /// parens as part of the expression since they are not always there.
    fn parse_default_expr(&mut self) -> Result<Vec<Token>> {
        self.expect_keyword("DEFAULT")?;
        let tok = self.peek().cloned().ok_or_else(|| Error::unexpected_eof(self.eof_pos()))?;

        if tok.kind.intersects(TokenKind::LITERAL) {
            return Ok(vec![self.advance().unwrap()]);
        }
        if tok.is_punct("+") || tok.is_punct("-") {
            let sign = self.advance().unwrap();
            let int_tok = self.expect_kind(TokenKind::INT, "an integer")?;
            return Ok(vec![sign, int_tok]);
        }
        if tok.kind.intersects(TokenKind::NON_KW_ID) && self.peek_nth(1).is_some_and(|n| n.is_punct("(")) {
            let name = self.advance().unwrap();
            let mut tokens = vec![name];
            tokens.extend(self.collect_balanced_parens_inclusive()?);
            return Ok(tokens);
        }
        if tok.is_punct("(") {
            return self.collect_balanced_parens_inclusive();
        }
        Err(Error::invalid_default_expression(tok.span))
    }

    fn parse_generated(&mut self, name: Option<String>) -> Result<ColumnConstraint> {
        if self.consume_keyword("GENERATED") {
            if self.consume_keyword("ALWAYS") {
            } else if self.consume_keyword("BY") {
                self.expect_keyword("DEFAULT")?;
            } else {
                return Err(self.unexpected("ALWAYS or BY DEFAULT"));
            }
            self.expect_keyword("AS")?;
        } else {
            self.expect_keyword("AS")?;
        }
        self.consume_word_ci("IDENTITY");
        let expr = self.parse_parenthesized_tokens()?;
        let kind = if self.consume_word_ci("STORED") {
            Some(GeneratedKind::Stored)
        } else if self.consume_keyword("VIRTUAL") {
            Some(GeneratedKind::Virtual)
        } else {
            None
        };
        Ok(ColumnConstraint::Generated(Generated { name, expr, kind }))
    }

    // -- column constraints ------------------------------------------------

    fn parse_column_constraint(&mut self, col_name: &str) -> Result<ColumnConstraint> {
        let name = self.parse_optional_constraint_name()?;

        if self.consume_keyword("PRIMARY") {
            self.expect_keyword("KEY")?;
            let mut indexed = Indexed::new(col_name);
            if self.consume_keyword("ASC") {
                indexed.sorting = Some(Sorting::Asc);
            } else if self.consume_keyword("DESC") {
                indexed.sorting = Some(Sorting::Desc);
            }
            let on_conflict = self.parse_optional_on_conflict()?;
            let autoincrement = self.consume_keyword("AUTOINCREMENT") || self.consume_keyword("AUTO_INCREMENT");
            return Ok(ColumnConstraint::Uniqueness(Uniqueness {
                name,
                indexed: vec![indexed],
                is_primary: true,
                autoincrement,
                on_conflict,
                is_table_constraint: false,
            }));
        }
        if self.consume_keyword("UNIQUE") {
            let on_conflict = self.parse_optional_on_conflict()?;
            return Ok(ColumnConstraint::Uniqueness(Uniqueness {
                name,
                indexed: vec![Indexed::new(col_name)],
                is_primary: false,
                autoincrement: false,
                on_conflict,
                is_table_constraint: false,
            }));
        }
        if self.consume_keyword("NOT") {
            self.expect_keyword("NULL")?;
            let on_conflict = self.parse_optional_on_conflict()?;
            return Ok(ColumnConstraint::NotNull(NotNull { name, on_conflict }));
        }
        if self.consume_keyword("CHECK") {
            let expr = self.parse_parenthesized_tokens()?;
            return Ok(ColumnConstraint::Check(Check {
                name,
                expr,
                is_table_constraint: false,
            }));
        }
        if self.check_keyword("REFERENCES") {
            let fk = self.parse_foreign_key_clause(vec![col_name.to_string()], name, false)?;
            return Ok(ColumnConstraint::ForeignKey(fk));
        }
        if self.check_keyword("DEFAULT") {
            let expr = self.parse_default_expr()?;
            return Ok(ColumnConstraint::Default(ColumnDefault { name, expr }));
        }
        if self.consume_keyword("COLLATE") {
            let value = self.parse_identifier()?;
            return Ok(ColumnConstraint::Collation(Collation { name, value }));
        }
        if self.check_keyword("GENERATED") || self.check_keyword("AS") {
            return self.parse_generated(name);
        }
        Err(self.unexpected("a column constraint"))
    }

    fn parse_type(&mut self) -> Result<Type> {
        let mut words = Vec::new();
        while self.peek().is_some_and(|t| t.kind.intersects(TokenKind::NON_KW_ID)) {
            words.push(self.advance().unwrap().text().to_uppercase());
        }
        if words.is_empty() {
            return Ok(Type::empty());
        }
        let name = words.join(" ");
        let mut params = Vec::new();
        if self.consume_punct("(") {
            params.push(self.parse_int_literal()?);
            if self.consume_punct(",") {
                params.push(self.parse_int_literal()?);
            }
            self.expect_punct(")")?;
        }
        Ok(Type { name, params })
    }

    fn parse_column_def(&mut self) -> Result<Column> {
        let name = self.parse_identifier()?;
        let r#type = self.parse_type()?;
        let mut constraints = Vec::new();
        while !self.check_punct(",") && !self.check_punct(")") {
            constraints.push(self.parse_column_constraint(&name)?);
        }
        Ok(Column { name, r#type, constraints })
    }

    // -- table constraints -------------------------------------------------

    fn parse_table_constraint(&mut self) -> Result<TableConstraint> {
        let name = self.parse_optional_constraint_name()?;

        if self.consume_keyword("PRIMARY") {
            self.expect_keyword("KEY")?;
            let indexed = self.parse_indexed_list()?;
            let on_conflict = self.parse_optional_on_conflict()?;
            return Ok(TableConstraint::Uniqueness(Uniqueness {
                name,
                indexed,
                is_primary: true,
                autoincrement: false,
                on_conflict,
                is_table_constraint: true,
            }));
        }
        if self.consume_keyword("UNIQUE") {
            let indexed = self.parse_indexed_list()?;
            let on_conflict = self.parse_optional_on_conflict()?;
            return Ok(TableConstraint::Uniqueness(Uniqueness {
                name,
                indexed,
                is_primary: false,
                autoincrement: false,
                on_conflict,
                is_table_constraint: true,
            }));
        }
        if self.consume_keyword("FOREIGN") {
            self.expect_keyword("KEY")?;
            let columns = self.parse_parenthesized_names()?;
            let fk = self.parse_foreign_key_clause(columns, name, true)?;
            return Ok(TableConstraint::ForeignKey(fk));
        }
        if self.consume_keyword("CHECK") {
            let expr = self.parse_parenthesized_tokens()?;
            return Ok(TableConstraint::Check(Check {
                name,
                expr,
                is_table_constraint: true,
            }));
        }
        Err(self.unexpected("a table constraint"))
    }

    fn parse_table_options(&mut self) -> Result<TableOptions> {
        let mut strict = false;
        let mut without_rowid = false;
        loop {
            if self.consume_word_ci("STRICT") {
                strict = true;
            } else if self.consume_keyword("WITHOUT") {
                self.expect_word_ci("ROWID")?;
                without_rowid = true;
            } else {
                break;
            }
            if !self.consume_punct(",") {
                break;
            }
        }
        Ok(TableOptions { strict, without_rowid })
    }

    // -- top-level statements ------------------------------------------------

    fn parse_create_table(&mut self) -> Result<Table> {
        self.expect_keyword("CREATE")?;
        let mut or_replace = false;
        if self.consume_keyword("OR") {
            self.expect_keyword("REPLACE")?;
            or_replace = true;
        }
        let temporary = self.consume_keyword("TEMPORARY") || self.consume_keyword("TEMP");
        self.expect_keyword("TABLE")?;
        let mut if_not_exists = false;
        if self.consume_keyword("IF") {
            self.expect_keyword("NOT")?;
            self.expect_keyword("EXISTS")?;
            if_not_exists = true;
        }
        let name = self.parse_qualified_name()?;

        if self.check_keyword("LIKE") {
            let tok = self.peek().unwrap().clone();
            return Err(Error::unsupported("CREATE TABLE ... LIKE", tok.span));
        }
        if self.consume_keyword("AS") {
            if !self.check_keyword("SELECT") {
                let span = self.peek().map(|t| t.span).unwrap_or_else(|| Error::unexpected_eof(self.eof_pos()).span().unwrap());
                return Err(Error::unsupported("CREATE TABLE ... AS <non-SELECT>", span));
            }
            self.skip_until_semicolon();
            self.expect_punct(";")?;
            return Ok(Table {
                name,
                columns: Vec::new(),
                constraints: Vec::new(),
                options: TableOptions::default(),
                if_not_exists,
                or_replace,
                temporary,
            });
        }

        self.expect_punct("(")?;
        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        if !self.check_punct(")") {
            columns.push(self.parse_column_def()?);
            while self.check_punct(",") && !self.peek_nth(1).is_some_and(|t| t.kind.contains(TokenKind::KEYWORD)) {
                self.advance();
                columns.push(self.parse_column_def()?);
            }
            if self.check_punct(",") {
                log::trace!("column/table-constraint boundary reached after {} columns", columns.len());
            }
            while self.consume_punct(",") {
                constraints.push(self.parse_table_constraint()?);
            }
        }
        self.expect_punct(")")?;

        let options = self.parse_table_options()?;
        if self.consume_keyword("AS") {
            self.expect_keyword("SELECT")?;
        }
        if self.check_keyword("SELECT") {
            self.skip_until_semicolon();
        }
        self.expect_punct(";")?;

        Ok(Table {
            name,
            columns,
            constraints,
            options,
            if_not_exists,
            or_replace,
            temporary,
        })
    }

    fn parse_create_index(&mut self) -> Result<Index> {
        self.expect_keyword("CREATE")?;
        let unique = self.consume_keyword("UNIQUE");
        self.expect_keyword("INDEX")?;
        let mut if_not_exists = false;
        if self.consume_keyword("IF") {
            self.expect_keyword("NOT")?;
            self.expect_keyword("EXISTS")?;
            if_not_exists = true;
        }
        let name = self.parse_qualified_name()?;
        self.expect_keyword("ON")?;
        let table = self.parse_identifier()?;
        let indexed = self.parse_indexed_list()?;
        let r#where = if self.consume_keyword("WHERE") {
            Some(self.collect_tokens_until_semicolon())
        } else {
            None
        };
        self.expect_punct(";")?;
        Ok(Index {
            name,
            table,
            indexed,
            r#where,
            if_not_exists,
            unique,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::helpers;

    #[test]
    fn empty_input_yields_empty_schema() {
        let schema = parse_schema("").unwrap();
        assert!(schema.items.is_empty());
    }

    #[test]
    fn bare_semicolons_are_skipped() {
        let schema = parse_schema(";;;").unwrap();
        assert!(schema.items.is_empty());
    }

    #[test]
    fn simple_table_with_primary_key() {
        let schema = parse_schema("CREATE TABLE t(a INT PRIMARY KEY);").unwrap();
        assert_eq!(schema.items.len(), 1);
        let table = schema.tables().next().unwrap();
        assert_eq!(table.name.local(), "t");
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.columns[0].name, "a");
        assert_eq!(table.columns[0].r#type.name, "INT");
        let pk = table.primary_key().unwrap();
        assert!(pk.is_primary);
        assert_eq!(pk.indexed, vec![Indexed::new("a")]);
    }

    #[test]
    fn table_level_foreign_key_on_delete_cascade() {
        let schema =
            parse_schema("CREATE TABLE c(a, b, FOREIGN KEY(a) REFERENCES A(a) ON DELETE CASCADE);").unwrap();
        let table = schema.tables().next().unwrap();
        let fk = table.foreign_keys().next().unwrap();
        assert_eq!(fk.columns, vec!["a".to_string()]);
        assert_eq!(fk.foreign_table.local(), "A");
        assert_eq!(fk.referred_columns, Some(vec!["a".to_string()]));
        assert_eq!(fk.on_delete, Some(ReferentialAction::Cascade));
    }

    #[test]
    fn create_unique_index_with_where_clause() {
        let schema =
            parse_schema("CREATE UNIQUE INDEX IF NOT EXISTS i ON t(a COLLATE NOCASE DESC) WHERE a > 0;").unwrap();
        let idx = schema.indexes().next().unwrap();
        assert!(idx.unique);
        assert!(idx.if_not_exists);
        assert_eq!(idx.indexed.len(), 1);
        assert_eq!(idx.indexed[0].column, "a");
        assert_eq!(idx.indexed[0].collation.as_deref(), Some("NOCASE"));
        assert_eq!(idx.indexed[0].sorting, Some(Sorting::Desc));
        let where_tokens = idx.r#where.as_ref().unwrap();
        let rendered: Vec<&str> = where_tokens.iter().map(|t| t.text()).collect();
        assert_eq!(rendered, vec!["a", ">", "0"]);
    }

    #[test]
    fn table_constraint_boundary_is_comma_then_keyword() {
        let schema = parse_schema("CREATE TABLE t(a INT, b INT, PRIMARY KEY(a, b));").unwrap();
        let table = schema.tables().next().unwrap();
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.constraints.len(), 1);
        let pk = table.primary_key().unwrap();
        assert_eq!(pk.indexed.len(), 2);
    }

    #[test]
    fn default_forms() {
        let schema = parse_schema(
            "CREATE TABLE t(a INT DEFAULT 1, b INT DEFAULT -1, c INT DEFAULT (1+2), d TEXT DEFAULT now());",
        )
        .unwrap();
        let table = schema.tables().next().unwrap();
        let default_expr = |i: usize| match &table.columns[i].constraints[0] {
            ColumnConstraint::Default(d) => d.expr.iter().map(|t| t.text().to_string()).collect::<Vec<_>>(),
            other => panic!("expected Default, got {other:?}"),
        };
        assert_eq!(default_expr(0), vec!["1"]);
        assert_eq!(default_expr(1), vec!["-", "1"]);
        assert_eq!(default_expr(2), vec!["(", "1", "+", "2", ")"]);
        assert_eq!(default_expr(3), vec!["NOW", "(", ")"]);
    }

    #[test]
    fn generated_always_as_stored() {
        let schema = parse_schema("CREATE TABLE t(a INT, b INT GENERATED ALWAYS AS (a + 1) STORED);").unwrap();
        let table = schema.tables().next().unwrap();
        match &table.columns[1].constraints[0] {
            ColumnConstraint::Generated(g) => {
                assert_eq!(g.kind, Some(GeneratedKind::Stored));
                assert_eq!(g.expr.iter().map(|t| t.text()).collect::<Vec<_>>(), vec!["a", "+", "1"]);
            }
            other => panic!("expected Generated, got {other:?}"),
        }
    }

    #[test]
    fn foreign_key_match_and_enforcement() {
        let schema = parse_schema(
            "CREATE TABLE t(a INT REFERENCES p(id) MATCH SIMPLE NOT DEFERRABLE INITIALLY IMMEDIATE);",
        )
        .unwrap();
        let table = schema.tables().next().unwrap();
        match &table.columns[0].constraints[0] {
            ColumnConstraint::ForeignKey(fk) => {
                assert_eq!(fk.r#match, Some(MatchKind::Simple));
                let enforcement = fk.enforcement.unwrap();
                assert!(enforcement.not_deferrable);
                assert_eq!(enforcement.initially, Some(Deferrable::Immediate));
            }
            other => panic!("expected ForeignKey, got {other:?}"),
        }
    }

    #[test]
    fn invalid_match_value_is_rejected() {
        let err = parse_schema("CREATE TABLE t(a INT REFERENCES p(id) MATCH WEIRD);").unwrap_err();
        assert!(matches!(err.kind(), crate::error::ErrorKind::InvalidMatchClause { .. }));
    }

    #[test]
    fn invalid_on_conflict_target_is_rejected() {
        let err = parse_schema("CREATE TABLE t(a INT UNIQUE ON CONFLICT WEIRD);").unwrap_err();
        assert!(matches!(err.kind(), crate::error::ErrorKind::InvalidOnConflictTarget { .. }));
    }

    #[test]
    fn resolve_foreign_key_chain_from_parsed_schema() {
        let schema = parse_schema(
            "CREATE TABLE a(a_col INT PRIMARY KEY);\
             CREATE TABLE b(b_col INT PRIMARY KEY);\
             CREATE TABLE c(a_col INT, b_col INT, PRIMARY KEY(a_col, b_col), \
                FOREIGN KEY(a_col) REFERENCES a(a_col), FOREIGN KEY(b_col) REFERENCES b(b_col));\
             CREATE TABLE d(x INT, y INT, FOREIGN KEY(x, y) REFERENCES c(b_col, a_col));",
        )
        .unwrap();
        let symbols = helpers::symbols(&schema);
        let d = symbols["d"];
        let fk_d = d.foreign_keys().next().unwrap();
        let chain: Vec<_> = helpers::resolve_foreign_key(fk_d, "x", &symbols)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn strict_and_without_rowid_options() {
        let schema = parse_schema("CREATE TABLE t(a INT) STRICT, WITHOUT ROWID;").unwrap();
        let table = schema.tables().next().unwrap();
        assert!(table.options.strict);
        assert!(table.options.without_rowid);
    }

    #[test]
    fn create_table_as_select_tail_is_discarded() {
        let schema = parse_schema("CREATE TABLE t AS SELECT * FROM other;").unwrap();
        let table = schema.tables().next().unwrap();
        assert!(table.columns.is_empty());
    }

    #[test]
    fn create_table_like_is_rejected() {
        let err = parse_schema("CREATE TABLE t LIKE other;").unwrap_err();
        assert!(matches!(err.kind(), crate::error::ErrorKind::UnsupportedConstruct { .. }));
    }

    #[test]
    fn schema_items_preserve_source_order() {
        let schema = parse_schema(
            "CREATE TABLE t1(a INT); CREATE INDEX i1 ON t1(a); CREATE TABLE t2(b INT);",
        )
        .unwrap();
        let names: Vec<&str> = schema
            .items
            .iter()
            .map(|item| match item {
                Item::Table(t) => t.name.local(),
                Item::Index(i) => i.name.local(),
            })
            .collect();
        assert_eq!(names, vec!["t1", "i1", "t2"]);
    }
}
