//! Token catalog: the `TokenKind` bitmask, `Token` values, and the table of
//! every fixed-string token (keywords, operators, punctuation, whitespace).
//!
//! Interning gives two things: the lexer avoids allocating for fixed strings
//! (a `TokenText::Static` is a pointer-and-length copy), and the parser can
//! dispatch on a token's text without worrying that two spellings of the same
//! keyword ever disagree on `kind`.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::error::Span;

bitflags::bitflags! {
    /// Category bitmask for a [`Token`]. Composite categories are bitwise
    /// unions of the atoms, so membership tests are a single `AND`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenKind: u32 {
        const KEYWORD = 1 << 0;
        const RAW_ID = 1 << 1;
        const STD_DELIMITED_ID = 1 << 2;
        const NON_STD_DELIMITED_ID = 1 << 3;
        const STD_STR = 1 << 4;
        const PREDEF_LITERAL = 1 << 5;
        const BLOB = 1 << 6;
        const BINARY = 1 << 7;
        const FLOAT = 1 << 8;
        const HEX = 1 << 9;
        const INT = 1 << 10;
        const BIN_OP = 1 << 11;
        const CMP_OP = 1 << 12;
        const NUM_OP = 1 << 13;
        const STR_OP = 1 << 14;
        const PUNCTUATION = 1 << 15;
        const SINGLE_LINE_COMMENT = 1 << 16;
        const MULTI_LINE_COMMENT = 1 << 17;
        const WHITESPACE = 1 << 18;
        const UNKNOWN = 1 << 19;

        const DELIMITED_ID = Self::STD_DELIMITED_ID.bits() | Self::NON_STD_DELIMITED_ID.bits();
        const STR = Self::STD_STR.bits() | Self::STD_DELIMITED_ID.bits();
        const NON_KW_ID = Self::RAW_ID.bits() | Self::DELIMITED_ID.bits() | Self::STD_STR.bits();
        const ID = Self::NON_KW_ID.bits() | Self::KEYWORD.bits();
        const KEYWORD_LITERAL = Self::KEYWORD.bits() | Self::PREDEF_LITERAL.bits();
        const RAW_ID_LITERAL = Self::RAW_ID.bits() | Self::PREDEF_LITERAL.bits();
        const NUMERIC = Self::FLOAT.bits() | Self::HEX.bits() | Self::INT.bits();
        const LITERAL = Self::BLOB.bits() | Self::BINARY.bits() | Self::NUMERIC.bits()
            | Self::STR.bits() | Self::PREDEF_LITERAL.bits();
        const OPERATOR = Self::BIN_OP.bits() | Self::CMP_OP.bits() | Self::NUM_OP.bits()
            | Self::STR_OP.bits();
        const COMMENT = Self::SINGLE_LINE_COMMENT.bits() | Self::MULTI_LINE_COMMENT.bits();
        const TRIVIA = Self::WHITESPACE.bits() | Self::COMMENT.bits();
    }
}

/// A token's text: a borrowed static string for every interned fixed-string
/// token, or an owned string for anything the lexer computed at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenText {
    Static(&'static str),
    Owned(String),
}

impl TokenText {
    pub fn as_str(&self) -> &str {
        match self {
            TokenText::Static(s) => s,
            TokenText::Owned(s) => s,
        }
    }
}

impl fmt::Display for TokenText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&'static str> for TokenText {
    fn from(s: &'static str) -> Self {
        TokenText::Static(s)
    }
}

impl From<String> for TokenText {
    fn from(s: String) -> Self {
        TokenText::Owned(s)
    }
}

/// A single lexical token: a category, its text, and the source span it
/// came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub val: TokenText,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, val: impl Into<TokenText>, span: Span) -> Self {
        Self {
            kind,
            val: val.into(),
            span,
        }
    }

    pub fn text(&self) -> &str {
        self.val.as_str()
    }

    /// `is_not_trivia(t) <-> (t.kind & TRIVIA) = 0`.
    pub fn is_not_trivia(&self) -> bool {
        !self.kind.intersects(TokenKind::TRIVIA)
    }

    /// Whether this token is the keyword `kw` (already upper-cased).
    pub fn is_keyword(&self, kw: &str) -> bool {
        self.kind.contains(TokenKind::KEYWORD) && self.val.as_str() == kw
    }

    /// Whether this token is the punctuation/operator spelled `p`.
    pub fn is_punct(&self, p: &str) -> bool {
        self.kind.intersects(TokenKind::PUNCTUATION | TokenKind::OPERATOR) && self.val.as_str() == p
    }
}

/// `like(a, b) <-> a.kind & b.kind != 0 && a.val == b.val`.
pub fn like(a: &Token, b: &Token) -> bool {
    a.kind.intersects(b.kind) && a.val.as_str() == b.val.as_str()
}

type Catalog = HashMap<&'static str, (TokenKind, &'static str)>;

static INTERNED: OnceLock<Catalog> = OnceLock::new();

/// Look up a fixed string in the interned catalog, returning its kind and
/// canonical (static) spelling. Lookup of identifier-shaped keys is
/// case-insensitive by convention of the caller upper-casing first; this
/// function itself does exact matching against the upper-cased keys stored
/// below.
pub fn lookup(key: &str) -> Option<(TokenKind, &'static str)> {
    interned().get(key).copied()
}

/// Build a [`Token`] for an entry found via [`lookup`], attaching `span`.
pub fn interned_token(kind: TokenKind, canonical: &'static str, span: Span) -> Token {
    Token::new(kind, canonical, span)
}

fn interned() -> &'static Catalog {
    INTERNED.get_or_init(build_catalog)
}

macro_rules! catalog_entries {
    ($map:ident, $kind:expr, [$($s:literal),+ $(,)?]) => {
        $(
            $map.insert($s, ($kind, $s));
        )+
    };
}

fn build_catalog() -> Catalog {
    let mut m: Catalog = HashMap::new();

    // Whitespace
    catalog_entries!(m, TokenKind::WHITESPACE, ["\n", "\r", " ", "\t", "\x0b", "\x0c"]);

    // Operators: binary
    catalog_entries!(m, TokenKind::BIN_OP, ["~", "&", "|", "<<", ">>"]);
    // Operators: numeric
    catalog_entries!(m, TokenKind::NUM_OP, ["+", "-", "/", "*", "%", "^"]);
    // Operators: string
    catalog_entries!(m, TokenKind::STR_OP, ["||"]);
    // Operators: comparison
    catalog_entries!(
        m,
        TokenKind::CMP_OP,
        ["=", "==", "<>", "<", "<=", ">", ">=", "!=", "!<", "!>"]
    );
    // Punctuation (including the bare `!` and `#`, which are UNKNOWN atoms on
    // their own but participate in two-char lookahead for `!=`/`# `)
    catalog_entries!(m, TokenKind::UNKNOWN, ["!", "#"]);
    catalog_entries!(m, TokenKind::PUNCTUATION, [".", ",", ":", "::", ";", "(", ")"]);

    // Known raw identifiers (not reserved keywords, but fixed spellings)
    m.insert("ROWID", (TokenKind::RAW_ID, "ROWID"));
    m.insert("STRICT", (TokenKind::RAW_ID, "STRICT"));
    m.insert("IDENTITY", (TokenKind::RAW_ID, "IDENTITY"));
    m.insert("FALSE", (TokenKind::RAW_ID_LITERAL, "FALSE"));
    m.insert("TRUE", (TokenKind::RAW_ID_LITERAL, "TRUE"));

    // Predefined keyword literals
    m.insert("NULL", (TokenKind::KEYWORD_LITERAL, "NULL"));
    m.insert("CURRENT_DATE", (TokenKind::KEYWORD_LITERAL, "CURRENT_DATE"));
    m.insert("CURRENT_TIME", (TokenKind::KEYWORD_LITERAL, "CURRENT_TIME"));
    m.insert(
        "CURRENT_TIMESTAMP",
        (TokenKind::KEYWORD_LITERAL, "CURRENT_TIMESTAMP"),
    );

    // Keywords
    catalog_entries!(
        m,
        TokenKind::KEYWORD,
        [
            "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS",
            "ASC", "ATTACH", "AUTOINCREMENT", "AUTO_INCREMENT", "BEFORE", "BEGIN", "BETWEEN",
            "BY", "CASCADE", "CASE", "CAST", "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT",
            "CONSTRAINT", "CREATE", "CROSS", "CURRENT", "DATABASE", "DEFAULT", "DEFERRABLE",
            "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH", "ELSE",
            "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
            "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
            "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
            "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL",
            "JOIN", "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL",
            "NO", "NOT", "NOTHING", "NOTNULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER",
            "OTHERS", "OUTER", "OVER", "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY",
            "QUERY", "RAISE", "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE",
            "RENAME", "REPLACE", "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS",
            "SAVEPOINT", "SELECT", "SET", "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO",
            "TRANSACTION", "TRIGGER", "UNBOUNDED", "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM",
            "VALUES", "VIEW", "VIRTUAL", "WHEN", "WHERE", "WINDOW", "WITH", "WITHOUT",
        ]
    );

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivia_filter_matches_whitespace_and_comments() {
        let ws = Token::new(TokenKind::WHITESPACE, " ", Span::empty(0));
        assert!(!ws.is_not_trivia());
        let comment = Token::new(TokenKind::SINGLE_LINE_COMMENT, "hi", Span::empty(0));
        assert!(!comment.is_not_trivia());
        let kw = Token::new(TokenKind::KEYWORD, "SELECT", Span::empty(0));
        assert!(kw.is_not_trivia());
    }

    #[test]
    fn composite_categories_match_atoms() {
        assert!(TokenKind::STR.contains(TokenKind::STD_STR));
        assert!(TokenKind::STR.contains(TokenKind::STD_DELIMITED_ID));
        assert!(TokenKind::ID.contains(TokenKind::KEYWORD));
        assert!(TokenKind::LITERAL.contains(TokenKind::HEX));
        assert!(TokenKind::NUMERIC.contains(TokenKind::FLOAT));
        assert!(!TokenKind::NUMERIC.contains(TokenKind::STD_STR));
    }

    #[test]
    fn every_catalog_entry_round_trips_through_lookup() {
        for key in ["SELECT", "CREATE", "(", ")", "<=", "||", "ROWID", "TRUE", "NULL"] {
            let (_, canonical) = lookup(key).unwrap_or_else(|| panic!("missing entry for {key}"));
            assert_eq!(canonical, key);
        }
    }

    #[test]
    fn like_requires_overlapping_kind_and_equal_value() {
        let a = Token::new(TokenKind::KEYWORD, "SELECT", Span::empty(0));
        let b = Token::new(TokenKind::ID, "SELECT", Span::empty(5));
        assert!(like(&a, &b));
        let c = Token::new(TokenKind::KEYWORD, "CREATE", Span::empty(0));
        assert!(!like(&a, &c));
    }
}
