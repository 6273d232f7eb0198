//! # sqlitedll-schema
//!
//! A tokenizer, recursive-descent parser, and deterministic pretty-printer
//! for the SQLite dialect of `CREATE TABLE`/`CREATE INDEX` DDL.
//!
//! This library never touches a database engine and performs no semantic
//! validation beyond what the grammar enforces: it does not, for instance,
//! verify that a foreign key's referenced columns exist in the referenced
//! table. What it does provide is a faithful round trip between DDL source
//! text and a strongly-typed [`schema::Schema`] value, plus a small set of
//! [`schema::helpers`] for resolving foreign-key references across tables.
//!
//! ## Pipeline
//!
//! - [`token`]: the `TokenKind` bitmask and the interned catalog of every
//!   fixed-string token (keywords, operators, punctuation, whitespace).
//! - [`lexer`]: a pull-based tokenizer producing a lazy sequence of
//!   [`token::Token`]s; malformed input becomes `UNKNOWN`, never a panic.
//! - [`parser`]: [`parser::parse_schema`] turns source text into a
//!   [`schema::Schema`].
//! - [`generator`]: [`generator::generate`] turns a [`schema::Schema`] back
//!   into SQLite DDL text.
//! - [`schema::helpers`]: `symbols`, `referred_columns`, and
//!   `resolve_foreign_key` walk a parsed schema's foreign-key graph.
//!
//! ## Quick start
//!
//! ```rust
//! use sqlitedll_schema::{generate, parse_schema};
//!
//! let schema = parse_schema("CREATE TABLE t(a INT PRIMARY KEY);").unwrap();
//! let table = schema.tables().next().unwrap();
//! assert_eq!(table.name.local(), "t");
//!
//! let regenerated = generate(&schema);
//! assert_eq!(parse_schema(&regenerated).unwrap(), schema);
//! ```

pub mod error;
pub mod generator;
pub mod lexer;
pub mod parser;
pub mod schema;
pub mod token;

pub use error::{Error, ErrorKind, Result};
pub use generator::generate;
pub use lexer::Lexer;
pub use parser::parse_schema;
pub use schema::{Item, Schema};
pub use token::{Token, TokenKind};
