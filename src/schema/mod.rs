//! The schema data model: immutable values describing `CREATE TABLE` and
//! `CREATE INDEX` statements, plus the query helpers in [`helpers`].
//!
//! Every type here is a plain, structurally-equal value. Nothing is
//! constructed except by the parser or by direct literal construction in
//! tests; nothing is ever mutated after construction.

pub mod helpers;

use crate::token::Token;

/// An ordered, most-specific-first identifier path: `database.schema.table`
/// is stored as `["table", "schema", "database"]`, so `name.local()` always
/// denotes the local name regardless of how many parts are qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName(pub Vec<String>);

impl QualifiedName {
    pub fn new(parts: Vec<String>) -> Self {
        Self(parts)
    }

    pub fn single(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// The table's local (unqualified) name: `name[0]`.
    pub fn local(&self) -> &str {
        &self.0[0]
    }

    /// Render as `database.schema.table`: reverse the most-specific-first
    /// order and join with `.`.
    pub fn render(&self) -> String {
        self.0.iter().rev().cloned().collect::<Vec<_>>().join(".")
    }

    /// Render with every component double-quoted, per the generator's
    /// identifier rendering rule.
    pub fn render_quoted(&self) -> String {
        self.0
            .iter()
            .rev()
            .map(|p| format!("\"{p}\""))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// A column or parameter type: a bare name plus 0, 1, or 2 integer
/// parameters (e.g. `VARCHAR(255)`, `DECIMAL(10, 2)`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Type {
    pub name: String,
    pub params: Vec<i64>,
}

impl Type {
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            params: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sorting {
    Asc,
    Desc,
}

/// One entry of a `UNIQUE` / `PRIMARY KEY` / `CREATE INDEX` column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexed {
    pub column: String,
    pub collation: Option<String>,
    pub sorting: Option<Sorting>,
}

impl Indexed {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            collation: None,
            sorting: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    Abort,
    Fail,
    Ignore,
    Replace,
    Rollback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Cascade,
    NoAction,
    Restrict,
    SetDefault,
    SetNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Full,
    Partial,
    Simple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferrable {
    Deferred,
    Immediate,
}

/// `[NOT] DEFERRABLE [INITIALLY DEFERRED|IMMEDIATE]`, present only when at
/// least a deferrability keyword appeared in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enforcement {
    pub initially: Option<Deferrable>,
    pub not_deferrable: bool,
}

/// A `UNIQUE` / `PRIMARY KEY` constraint, at column or table scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uniqueness {
    pub name: Option<String>,
    pub indexed: Vec<Indexed>,
    pub is_primary: bool,
    pub autoincrement: bool,
    pub on_conflict: Option<OnConflict>,
    pub is_table_constraint: bool,
}

/// A `FOREIGN KEY` / `REFERENCES` constraint, at column or table scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub foreign_table: QualifiedName,
    pub referred_columns: Option<Vec<String>>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
    pub r#match: Option<MatchKind>,
    pub enforcement: Option<Enforcement>,
    pub is_table_constraint: bool,
}

/// A `CHECK (...)` constraint, at column or table scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub name: Option<String>,
    pub expr: Vec<Token>,
    pub is_table_constraint: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedKind {
    Stored,
    Virtual,
}

/// `GENERATED [ALWAYS] AS (expr) [STORED|VIRTUAL]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub name: Option<String>,
    pub expr: Vec<Token>,
    pub kind: Option<GeneratedKind>,
}

/// `DEFAULT value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Default {
    pub name: Option<String>,
    pub expr: Vec<Token>,
}

/// `COLLATE name` as a column constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collation {
    pub name: Option<String>,
    pub value: String,
}

/// `NOT NULL [ON CONFLICT ...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotNull {
    pub name: Option<String>,
    pub on_conflict: Option<OnConflict>,
}

/// A constraint attached to a single column definition. Shares the
/// `Uniqueness` / `ForeignKey` / `Check` payloads with [`TableConstraint`];
/// `is_table_constraint` on each payload says which scope it was declared
/// at (always `false` here unless promoted).
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnConstraint {
    Uniqueness(Uniqueness),
    ForeignKey(ForeignKey),
    Check(Check),
    NotNull(NotNull),
    Default(Default),
    Collation(Collation),
    Generated(Generated),
}

/// A constraint declared at table scope: the subset of [`ColumnConstraint`]
/// that table-level syntax accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    Uniqueness(Uniqueness),
    ForeignKey(ForeignKey),
    Check(Check),
}

/// A single column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub r#type: Type,
    pub constraints: Vec<ColumnConstraint>,
}

impl Column {
    pub fn primary_key(&self) -> Option<&Uniqueness> {
        self.constraints.iter().find_map(|c| match c {
            ColumnConstraint::Uniqueness(u) if u.is_primary => Some(u),
            _ => None,
        })
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> {
        self.constraints.iter().filter_map(|c| match c {
            ColumnConstraint::ForeignKey(fk) => Some(fk),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableOptions {
    pub strict: bool,
    pub without_rowid: bool,
}

/// `CREATE [OR REPLACE] [TEMP|TEMPORARY] TABLE [IF NOT EXISTS] name (...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: QualifiedName,
    pub columns: Vec<Column>,
    pub constraints: Vec<TableConstraint>,
    pub options: TableOptions,
    pub if_not_exists: bool,
    pub or_replace: bool,
    pub temporary: bool,
}

impl Table {
    /// All constraints visible at table scope: explicit table constraints
    /// plus every column constraint promoted from column scope (in column,
    /// then per-column constraint order).
    pub fn all_constraints(&self) -> Vec<PromotedConstraint<'_>> {
        let mut result: Vec<PromotedConstraint<'_>> = self
            .constraints
            .iter()
            .map(PromotedConstraint::Table)
            .collect();
        for column in &self.columns {
            for constraint in &column.constraints {
                if let Some(promoted) = PromotedConstraint::from_column(constraint) {
                    result.push(promoted);
                }
            }
        }
        result
    }

    pub fn primary_key(&self) -> Option<&Uniqueness> {
        self.all_constraints().into_iter().find_map(|c| match c {
            PromotedConstraint::Table(TableConstraint::Uniqueness(u)) if u.is_primary => Some(u),
            PromotedConstraint::Column(ColumnConstraint::Uniqueness(u)) if u.is_primary => Some(u),
            _ => None,
        })
    }

    /// All foreign keys reachable from this table, table-level and
    /// column-promoted alike.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> + '_ {
        self.all_constraints().into_iter().filter_map(|c| match c {
            PromotedConstraint::Table(TableConstraint::ForeignKey(fk)) => Some(fk),
            PromotedConstraint::Column(ColumnConstraint::ForeignKey(fk)) => Some(fk),
            _ => None,
        })
    }
}

/// A constraint reachable from table scope, whether declared there directly
/// or promoted from a column definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PromotedConstraint<'a> {
    Table(&'a TableConstraint),
    Column(&'a ColumnConstraint),
}

impl<'a> PromotedConstraint<'a> {
    fn from_column(c: &'a ColumnConstraint) -> Option<Self> {
        match c {
            ColumnConstraint::Uniqueness(_) | ColumnConstraint::ForeignKey(_) | ColumnConstraint::Check(_) => {
                Some(PromotedConstraint::Column(c))
            }
            _ => None,
        }
    }
}

/// `CREATE [UNIQUE] INDEX [IF NOT EXISTS] name ON table (...) [WHERE expr]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub name: QualifiedName,
    pub table: String,
    pub indexed: Vec<Indexed>,
    pub r#where: Option<Vec<Token>>,
    pub if_not_exists: bool,
    pub unique: bool,
}

/// A top-level schema item.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Table(Table),
    Index(Index),
}

/// An ordered sequence of `CREATE TABLE`/`CREATE INDEX` items, in source
/// order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub items: Vec<Item>,
}

impl Schema {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.items.iter().filter_map(|i| match i {
            Item::Table(t) => Some(t),
            Item::Index(_) => None,
        })
    }

    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.items.iter().filter_map(|i| match i {
            Item::Index(idx) => Some(idx),
            Item::Table(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_renders_most_specific_first_reversed() {
        let q = QualifiedName::new(vec!["t".into(), "s".into(), "d".into()]);
        assert_eq!(q.local(), "t");
        assert_eq!(q.render(), "d.s.t");
        assert_eq!(q.render_quoted(), "\"d\".\"s\".\"t\"");
    }

    #[test]
    fn table_all_constraints_includes_promoted_column_constraints() {
        let pk = Uniqueness {
            name: None,
            indexed: vec![Indexed::new("a")],
            is_primary: true,
            autoincrement: false,
            on_conflict: None,
            is_table_constraint: false,
        };
        let table = Table {
            name: QualifiedName::single("t"),
            columns: vec![Column {
                name: "a".into(),
                r#type: Type {
                    name: "INT".into(),
                    params: vec![],
                },
                constraints: vec![ColumnConstraint::Uniqueness(pk.clone())],
            }],
            constraints: vec![],
            options: TableOptions::default(),
            if_not_exists: false,
            or_replace: false,
            temporary: false,
        };
        assert_eq!(table.all_constraints().len(), 1);
        assert_eq!(table.primary_key(), Some(&pk));
    }
}
