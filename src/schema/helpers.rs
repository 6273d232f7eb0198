//! Pure functions over a parsed [`Schema`]: a symbol table and foreign-key
//! reference resolution. None of these touch the parser or lexer; they only
//! read already-constructed schema values.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::schema::{ForeignKey, Schema, Table};

/// A symbol table keyed by unqualified (local) table name.
pub type Symbols<'a> = HashMap<&'a str, &'a Table>;

/// Build the symbol table for `schema`. Duplicate table names overwrite
/// earlier bindings (last-wins), by construction of the single forward
/// pass over `schema.tables()` in source order.
pub fn symbols(schema: &Schema) -> Symbols<'_> {
    let mut map = Symbols::new();
    for table in schema.tables() {
        map.insert(table.name.local(), table);
    }
    map
}

/// The columns a foreign key refers to: `fk.referred_columns` when present,
/// otherwise the referenced table's primary key column list.
pub fn referred_columns(fk: &ForeignKey, symbols: &Symbols<'_>) -> Result<Vec<String>> {
    if let Some(cols) = &fk.referred_columns {
        return Ok(cols.clone());
    }
    let table_name = fk.foreign_table.local();
    let table = symbols
        .get(table_name)
        .ok_or_else(|| Error::internal_invariant(format!("foreign table '{table_name}' not found in symbols")))?;
    let pk = table
        .primary_key()
        .ok_or_else(|| Error::internal_invariant(format!("table '{table_name}' has no primary key")))?;
    Ok(pk.indexed.iter().map(|i| i.column.clone()).collect())
}

/// One step of a resolved foreign-key chain: either another foreign key to
/// keep following, or a terminal column name with no further foreign key
/// pointing at it.
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignKeyChainLink<'a> {
    Key(&'a ForeignKey),
    Terminal(String),
}

/// Walk the foreign-key chain starting at `fk`/`col`. Preconditions (caller
/// errors, not input errors): `col` is among `fk.columns`; the referenced
/// table is present in `symbols`; `fk.columns` and its referred columns have
/// equal arity. Violating any of these yields `Err` from the iterator's
/// first `next()` call rather than a panic.
pub fn resolve_foreign_key<'a>(
    fk: &'a ForeignKey,
    col: &str,
    symbols: &'a Symbols<'a>,
) -> ForeignKeyChain<'a> {
    ForeignKeyChain {
        symbols,
        pending: Some((fk, col.to_string())),
        done: false,
    }
}

/// Lazy iterator produced by [`resolve_foreign_key`].
pub struct ForeignKeyChain<'a> {
    symbols: &'a Symbols<'a>,
    pending: Option<(&'a ForeignKey, String)>,
    done: bool,
}

impl<'a> Iterator for ForeignKeyChain<'a> {
    type Item = Result<ForeignKeyChainLink<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (fk, col) = self.pending.take()?;

        let Some(pos) = fk.columns.iter().position(|c| c == &col) else {
            self.done = true;
            return Some(Err(Error::internal_invariant(format!(
                "'{col}' is not among the foreign key's columns"
            ))));
        };

        let referred = match referred_columns(fk, self.symbols) {
            Ok(r) => r,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if referred.len() != fk.columns.len() {
            self.done = true;
            return Some(Err(Error::foreign_key_arity_mismatch(fk.columns.len(), referred.len())));
        }

        let f_col = referred[pos].clone();
        let table_name = fk.foreign_table.local();
        let Some(foreign_table) = self.symbols.get(table_name) else {
            self.done = true;
            return Some(Err(Error::internal_invariant(format!(
                "foreign table '{table_name}' not found in symbols"
            ))));
        };

        match foreign_table.foreign_keys().find(|next_fk| next_fk.columns.iter().any(|c| c == &f_col)) {
            Some(next_fk) => {
                self.pending = Some((next_fk, f_col));
                Some(Ok(ForeignKeyChainLink::Key(next_fk)))
            }
            None => {
                self.done = true;
                Some(Ok(ForeignKeyChainLink::Terminal(f_col)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, Indexed, Item, QualifiedName, Table, TableOptions, Type, Uniqueness};
    use crate::schema::{ColumnConstraint, TableConstraint};

    fn pk_uniqueness(col: &str) -> Uniqueness {
        Uniqueness {
            name: None,
            indexed: vec![Indexed::new(col)],
            is_primary: true,
            autoincrement: false,
            on_conflict: None,
            is_table_constraint: true,
        }
    }

    fn fk(columns: &[&str], foreign_table: &str, referred: &[&str]) -> ForeignKey {
        ForeignKey {
            name: None,
            columns: columns.iter().map(|s| s.to_string()).collect(),
            foreign_table: QualifiedName::single(foreign_table),
            referred_columns: Some(referred.iter().map(|s| s.to_string()).collect()),
            on_delete: None,
            on_update: None,
            r#match: None,
            enforcement: None,
            is_table_constraint: true,
        }
    }

    fn bare_column(name: &str) -> Column {
        Column {
            name: name.into(),
            r#type: Type::empty(),
            constraints: vec![],
        }
    }

    fn table(name: &str, pk_cols: &[&str], fks: Vec<ForeignKey>) -> Table {
        Table {
            name: QualifiedName::single(name),
            columns: pk_cols.iter().map(|c| bare_column(c)).collect(),
            constraints: std::iter::once(TableConstraint::Uniqueness(Uniqueness {
                indexed: pk_cols.iter().map(|c| Indexed::new(*c)).collect(),
                ..pk_uniqueness(pk_cols[0])
            }))
            .chain(fks.into_iter().map(TableConstraint::ForeignKey))
            .collect(),
            options: TableOptions::default(),
            if_not_exists: false,
            or_replace: false,
            temporary: false,
        }
    }

    /// A(a PK), B(b PK), C(a,b PK; FK a->A.a; FK b->B.b), D(x,y PK; FK (x,y)->C(b,a))
    fn chain_schema() -> Schema {
        let a = table("A", &["a"], vec![]);
        let b = table("B", &["b"], vec![]);
        let c = table(
            "C",
            &["a", "b"],
            vec![fk(&["a"], "A", &["a"]), fk(&["b"], "B", &["b"])],
        );
        let d = table("D", &["x", "y"], vec![fk(&["x", "y"], "C", &["b", "a"])]);
        Schema::new(vec![
            Item::Table(a),
            Item::Table(b),
            Item::Table(c),
            Item::Table(d),
        ])
    }

    #[test]
    fn symbols_indexes_by_local_name() {
        let schema = chain_schema();
        let syms = symbols(&schema);
        assert_eq!(syms.len(), 4);
        assert!(syms.contains_key("A"));
        assert!(syms.contains_key("D"));
    }

    #[test]
    fn symbols_last_wins_on_duplicate_names() {
        let one = table("T", &["a"], vec![]);
        let mut two = table("T", &["b"], vec![]);
        two.columns[0].name = "b".into();
        let schema = Schema::new(vec![Item::Table(one), Item::Table(two.clone())]);
        let syms = symbols(&schema);
        assert_eq!(syms["T"].columns[0].name, two.columns[0].name);
    }

    #[test]
    fn referred_columns_falls_back_to_primary_key() {
        let schema = chain_schema();
        let syms = symbols(&schema);
        let fk_no_referred = ForeignKey {
            referred_columns: None,
            ..fk(&["a"], "A", &[])
        };
        let cols = referred_columns(&fk_no_referred, &syms).unwrap();
        assert_eq!(cols, vec!["a".to_string()]);
    }

    #[test]
    fn resolve_foreign_key_chain_example() {
        let schema = chain_schema();
        let syms = symbols(&schema);
        let d = syms["D"];
        let fk_d = d.foreign_keys().next().unwrap();

        let chain_x: Vec<_> = resolve_foreign_key(fk_d, "x", &syms)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(chain_x.len(), 2);
        match &chain_x[0] {
            ForeignKeyChainLink::Key(fk) => assert_eq!(fk.foreign_table.local(), "B"),
            _ => panic!("expected a foreign key link first"),
        }
        match &chain_x[1] {
            ForeignKeyChainLink::Terminal(col) => assert_eq!(col, "b"),
            _ => panic!("expected a terminal column last"),
        }

        let chain_y: Vec<_> = resolve_foreign_key(fk_d, "y", &syms)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(chain_y.len(), 2);
        match &chain_y[0] {
            ForeignKeyChainLink::Key(fk) => assert_eq!(fk.foreign_table.local(), "A"),
            _ => panic!("expected a foreign key link first"),
        }
        match &chain_y[1] {
            ForeignKeyChainLink::Terminal(col) => assert_eq!(col, "a"),
            _ => panic!("expected a terminal column last"),
        }
    }

    #[test]
    fn resolve_foreign_key_rejects_column_not_in_fk() {
        let schema = chain_schema();
        let syms = symbols(&schema);
        let d = syms["D"];
        let fk_d = d.foreign_keys().next().unwrap();
        let result: Result<Vec<_>> = resolve_foreign_key(fk_d, "z", &syms).collect();
        assert!(result.is_err());
    }

    #[test]
    fn resolve_foreign_key_reports_arity_mismatch() {
        let a = table("A", &["a"], vec![]);
        let mismatched = fk(&["x", "y"], "A", &["a"]);
        let mut d = table("D", &["x", "y"], vec![]);
        d.constraints.push(TableConstraint::ForeignKey(mismatched));
        let schema = Schema::new(vec![Item::Table(a), Item::Table(d)]);
        let syms = symbols(&schema);
        let d = syms["D"];
        let fk_d = d.foreign_keys().next().unwrap();
        let err = resolve_foreign_key(fk_d, "x", &syms).next().unwrap().unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::error::ErrorKind::ForeignKeyArityMismatch { columns: 2, referred: 1 }
        ));
    }
}
