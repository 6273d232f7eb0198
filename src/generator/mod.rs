//! Deterministic pretty-printer: `Schema` -> SQLite-dialect DDL text.
//!
//! The output is not obliged to byte-reproduce any original source; it is
//! obliged to re-parse into a structurally equal `Schema`. Opaque expression
//! token sequences (`DEFAULT`, `CHECK`, `GENERATED`, `WHERE`) are re-emitted
//! from their stored tokens, never from source substrings.

use std::fmt::Write;

use crate::schema::{
    Check, Collation, Column, ColumnConstraint, Default as ColumnDefault, Deferrable, Enforcement,
    ForeignKey, Generated, GeneratedKind, Index, Indexed, Item, MatchKind, NotNull, OnConflict,
    ReferentialAction, Schema, Sorting, Table, TableConstraint, Type, Uniqueness,
};
use crate::token::{Token, TokenKind};

const BODY_INDENT: &str = "            "; // twelve spaces

/// Render `schema` as SQLite DDL text, one statement per item in source order.
pub fn generate(schema: &Schema) -> String {
    let mut out = String::new();
    for item in &schema.items {
        match item {
            Item::Table(t) => generate_table(t, &mut out),
            Item::Index(i) => generate_index(i, &mut out),
        }
    }
    out.trim_end().to_string()
}

fn generate_table(table: &Table, out: &mut String) {
    let or_replace = if table.or_replace { " OR REPLACE" } else { "" };
    let temp = if table.temporary { " TEMPORARY" } else { "" };
    let if_not_exists = if table.if_not_exists { " IF NOT EXISTS" } else { "" };
    let name = table.name.render_quoted();

    let mut lines: Vec<String> = table.columns.iter().map(render_column).collect();
    lines.extend(table.constraints.iter().map(render_table_constraint));
    let body = lines
        .iter()
        .map(|l| format!("{BODY_INDENT}{l}"))
        .collect::<Vec<_>>()
        .join(",\n");

    let mut option_list = Vec::new();
    if table.options.strict {
        option_list.push(" STRICT".to_string());
    }
    if table.options.without_rowid {
        option_list.push(" WITHOUT ROWID".to_string());
    }
    let options = option_list.join(",");

    let _ = writeln!(
        out,
        "CREATE{or_replace}{temp} TABLE{if_not_exists} {name}(\n{body}\n){options};"
    );
}

fn generate_index(index: &Index, out: &mut String) {
    let unique = if index.unique { " UNIQUE" } else { "" };
    let if_not_exists = if index.if_not_exists { " IF NOT EXISTS" } else { "" };
    let name = index.name.render_quoted();
    let indexed = index
        .indexed
        .iter()
        .map(render_indexed)
        .collect::<Vec<_>>()
        .join(", ");
    let where_clause = index
        .r#where
        .as_ref()
        .map(|toks| format!(" WHERE {}", render_tokens(toks)))
        .unwrap_or_default();

    let _ = writeln!(
        out,
        "CREATE{unique} INDEX{if_not_exists} {name} ON \"{table}\"({indexed}){where_clause};",
        table = index.table,
    );
}

fn render_column(col: &Column) -> String {
    let mut s = format!("\"{}\"", col.name);
    if !col.r#type.is_empty() {
        s.push(' ');
        s.push_str(&render_type(&col.r#type));
    }
    for c in &col.constraints {
        s.push(' ');
        s.push_str(&render_column_constraint(c));
    }
    s
}

fn render_type(t: &Type) -> String {
    let mut s = t.name.to_lowercase();
    if !t.params.is_empty() {
        let params = t.params.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
        let _ = write!(s, "({params})");
    }
    s
}

fn render_indexed(idx: &Indexed) -> String {
    let mut s = format!("\"{}\"", idx.column);
    if let Some(collation) = &idx.collation {
        let _ = write!(s, " COLLATE {collation}");
    }
    if let Some(sorting) = idx.sorting {
        s.push(' ');
        s.push_str(render_sorting(sorting));
    }
    s
}

fn render_sorting(s: Sorting) -> &'static str {
    match s {
        Sorting::Asc => "ASC",
        Sorting::Desc => "DESC",
    }
}

fn render_on_conflict(on_conflict: Option<OnConflict>) -> String {
    match on_conflict {
        Some(o) => format!(
            " ON CONFLICT {}",
            match o {
                OnConflict::Abort => "ABORT",
                OnConflict::Fail => "FAIL",
                OnConflict::Ignore => "IGNORE",
                OnConflict::Replace => "REPLACE",
                OnConflict::Rollback => "ROLLBACK",
            }
        ),
        None => String::new(),
    }
}

fn render_referential_action(action: ReferentialAction) -> &'static str {
    match action {
        ReferentialAction::Cascade => "CASCADE",
        ReferentialAction::NoAction => "NO ACTION",
        ReferentialAction::Restrict => "RESTRICT",
        ReferentialAction::SetDefault => "SET DEFAULT",
        ReferentialAction::SetNull => "SET NULL",
    }
}

fn render_match_kind(m: MatchKind) -> &'static str {
    match m {
        MatchKind::Full => "FULL",
        MatchKind::Partial => "PARTIAL",
        MatchKind::Simple => "SIMPLE",
    }
}

fn render_enforcement(enforcement: Option<Enforcement>) -> String {
    let Some(e) = enforcement else {
        return String::new();
    };
    let mut s = if e.not_deferrable {
        " NOT DEFERRABLE".to_string()
    } else {
        " DEFERRABLE".to_string()
    };
    if let Some(initially) = e.initially {
        let _ = write!(
            s,
            " INITIALLY {}",
            match initially {
                Deferrable::Deferred => "DEFERRED",
                Deferrable::Immediate => "IMMEDIATE",
            }
        );
    }
    s
}

fn constraint_name_prefix(name: &Option<String>) -> String {
    match name {
        Some(n) => format!("CONSTRAINT \"{n}\" "),
        None => String::new(),
    }
}

fn render_uniqueness(u: &Uniqueness) -> String {
    let name = constraint_name_prefix(&u.name);
    let keyword = if u.is_primary { "PRIMARY KEY" } else { "UNIQUE" };
    let on_conflict = render_on_conflict(u.on_conflict);

    if u.is_table_constraint {
        let indexed = u.indexed.iter().map(render_indexed).collect::<Vec<_>>().join(", ");
        format!("{name}{keyword} ({indexed}){on_conflict}")
    } else {
        let single = u.indexed.first();
        let sorting = single
            .and_then(|i| i.sorting)
            .map(|s| format!(" {}", render_sorting(s)))
            .unwrap_or_default();
        let autoincrement = if u.autoincrement { " AUTOINCREMENT" } else { "" };
        format!("{name}{keyword}{sorting}{on_conflict}{autoincrement}")
    }
}

fn render_foreign_key(fk: &ForeignKey) -> String {
    let name = constraint_name_prefix(&fk.name);
    let foreign_table = fk.foreign_table.render_quoted();
    let referred_columns = fk
        .referred_columns
        .as_ref()
        .map(|cols| {
            format!(
                "({})",
                cols.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(", ")
            )
        })
        .unwrap_or_default();
    let on_delete = fk
        .on_delete
        .map(|a| format!(" ON DELETE {}", render_referential_action(a)))
        .unwrap_or_default();
    let on_update = fk
        .on_update
        .map(|a| format!(" ON UPDATE {}", render_referential_action(a)))
        .unwrap_or_default();
    let r#match = fk
        .r#match
        .map(|m| format!(" MATCH {}", render_match_kind(m)))
        .unwrap_or_default();
    let enforcement = render_enforcement(fk.enforcement);

    if fk.is_table_constraint {
        let cols = fk.columns.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(", ");
        format!("{name}FOREIGN KEY ({cols}) REFERENCES {foreign_table}{referred_columns}{on_update}{on_delete}{r#match}{enforcement}")
    } else {
        format!("{name}REFERENCES {foreign_table}{referred_columns}{on_update}{on_delete}{r#match}{enforcement}")
    }
}

fn render_check(c: &Check) -> String {
    let name = constraint_name_prefix(&c.name);
    format!("{name}CHECK ({})", render_tokens(&c.expr))
}

fn render_not_null(n: &NotNull) -> String {
    let name = constraint_name_prefix(&n.name);
    format!("{name}NOT NULL{}", render_on_conflict(n.on_conflict))
}

fn render_default(d: &ColumnDefault) -> String {
    let name = constraint_name_prefix(&d.name);
    format!("{name}DEFAULT {}", render_tokens(&d.expr))
}

fn render_collation(c: &Collation) -> String {
    let name = constraint_name_prefix(&c.name);
    format!("{name}COLLATE {}", c.value)
}

fn render_generated(g: &Generated) -> String {
    let name = constraint_name_prefix(&g.name);
    let kind = match g.kind {
        Some(GeneratedKind::Stored) => " STORED",
        Some(GeneratedKind::Virtual) => " VIRTUAL",
        None => "",
    };
    format!("{name}GENERATED ALWAYS AS ({}){kind}", render_tokens(&g.expr))
}

fn render_column_constraint(c: &ColumnConstraint) -> String {
    match c {
        ColumnConstraint::Uniqueness(u) => render_uniqueness(u),
        ColumnConstraint::ForeignKey(fk) => render_foreign_key(fk),
        ColumnConstraint::Check(c) => render_check(c),
        ColumnConstraint::NotNull(n) => render_not_null(n),
        ColumnConstraint::Default(d) => render_default(d),
        ColumnConstraint::Collation(c) => render_collation(c),
        ColumnConstraint::Generated(g) => render_generated(g),
    }
}

fn render_table_constraint(c: &TableConstraint) -> String {
    match c {
        TableConstraint::Uniqueness(u) => render_uniqueness(u),
        TableConstraint::ForeignKey(fk) => render_foreign_key(fk),
        TableConstraint::Check(c) => render_check(c),
    }
}

/// A single expression token, re-emitted per its kind rather than its
/// original source substring: delimited identifiers and string/blob/binary/
/// hex literals get their delimiters/prefixes normalized back on.
fn render_token(t: &Token) -> String {
    if t.kind.intersects(TokenKind::DELIMITED_ID) {
        format!("\"{}\"", t.text())
    } else if t.kind.contains(TokenKind::STD_STR) {
        format!("'{}'", t.text())
    } else if t.kind.contains(TokenKind::BLOB) {
        format!("X'{}'", t.text())
    } else if t.kind.contains(TokenKind::BINARY) {
        format!("B'{}'", t.text())
    } else if t.kind.contains(TokenKind::HEX) {
        format!("0x{}", t.text())
    } else if t.kind.intersects(TokenKind::TRIVIA) {
        String::new()
    } else {
        t.text().to_string()
    }
}

fn render_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(render_token).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_schema;

    fn roundtrip(src: &str) {
        let schema = parse_schema(src).unwrap_or_else(|e| panic!("failed to parse {src:?}: {e}"));
        let generated = generate(&schema);
        let reparsed = parse_schema(&generated)
            .unwrap_or_else(|e| panic!("failed to reparse generated {generated:?}: {e}"));
        assert_eq!(schema, reparsed, "generated:\n{generated}");
    }

    #[test]
    fn simple_primary_key_table_round_trips() {
        roundtrip("CREATE TABLE t(a INT PRIMARY KEY);");
    }

    #[test]
    fn foreign_key_with_on_delete_round_trips() {
        roundtrip("CREATE TABLE c(a, b, FOREIGN KEY(a) REFERENCES A(a) ON DELETE CASCADE);");
    }

    #[test]
    fn unique_index_with_where_clause_round_trips() {
        roundtrip(
            "CREATE UNIQUE INDEX IF NOT EXISTS i ON t(a COLLATE NOCASE DESC) WHERE a > 0;",
        );
    }

    #[test]
    fn strict_and_without_rowid_round_trip() {
        roundtrip("CREATE TABLE t(a INTEGER PRIMARY KEY) STRICT, WITHOUT ROWID;");
    }

    #[test]
    fn default_check_collate_generated_round_trip() {
        roundtrip(
            r#"CREATE TABLE t(
                a INT DEFAULT 0,
                b TEXT COLLATE NOCASE,
                c INT CHECK (c > 0),
                d INT GENERATED ALWAYS AS (a + 1) STORED
            );"#,
        );
    }

    #[test]
    fn generated_table_body_is_indented_twelve_spaces() {
        let schema = parse_schema("CREATE TABLE t(a INT);").unwrap();
        let out = generate(&schema);
        assert!(out.lines().any(|l| l == "            \"a\" int"));
    }

    #[test]
    fn type_params_render_lowercase_with_parens() {
        let schema = parse_schema("CREATE TABLE t(a DECIMAL(10, 2));").unwrap();
        let out = generate(&schema);
        assert!(out.contains("decimal(10, 2)"));
    }

    #[test]
    fn output_has_no_trailing_whitespace() {
        let schema = parse_schema("CREATE TABLE t(a INT);").unwrap();
        let out = generate(&schema);
        assert_eq!(out, out.trim_end());
    }
}
