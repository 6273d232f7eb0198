//! Error handling for the DDL tokenizer, parser, and schema helpers.
//!
//! This module provides error types and utilities for representing and
//! displaying parsing errors with source location information.

use thiserror::Error;

/// A span in the source code, represented as byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span from start and end offsets.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a span for a single position.
    pub fn point(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Create an empty span at a position.
    pub fn empty(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Get the length of this span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// The kind of error that occurred while parsing DDL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("expected identifier, found {found}")]
    ExpectedIdentifier { found: String },

    #[error("unsupported construct: {what}")]
    UnsupportedConstruct { what: String },

    #[error("invalid MATCH clause: {found} is not FULL, PARTIAL, or SIMPLE")]
    InvalidMatchClause { found: String },

    #[error("invalid ON CONFLICT target: {found} is not ABORT, FAIL, IGNORE, REPLACE, or ROLLBACK")]
    InvalidOnConflictTarget { found: String },

    #[error("invalid DEFAULT expression")]
    InvalidDefaultExpression,

    #[error("foreign key arity mismatch: {columns} column(s) but {referred} referred column(s)")]
    ForeignKeyArityMismatch { columns: usize, referred: usize },

    #[error("{0}")]
    InternalInvariant(String),
}

/// An error with source location information.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}", span.map(|s| format!(" at byte {}", s.start)).unwrap_or_default())]
pub struct Error {
    /// The kind of error.
    pub kind: ErrorKind,
    /// The source span where the error occurred, if known.
    span: Option<Span>,
}

impl Error {
    /// Create a new error with the given kind and no location.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, span: None }
    }

    /// Create a new error with source location.
    pub fn with_span(kind: ErrorKind, span: Span) -> Self {
        Self {
            kind,
            span: Some(span),
        }
    }

    /// Get the span of this error, if any.
    pub fn span(&self) -> Option<Span> {
        self.span
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn unexpected_token(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        Self::with_span(
            ErrorKind::UnexpectedToken {
                expected: expected.into(),
                found: found.into(),
            },
            span,
        )
    }

    pub fn unexpected_eof(pos: usize) -> Self {
        Self::with_span(ErrorKind::UnexpectedEof, Span::point(pos))
    }

    pub fn expected_identifier(found: impl Into<String>, span: Span) -> Self {
        Self::with_span(
            ErrorKind::ExpectedIdentifier { found: found.into() },
            span,
        )
    }

    pub fn unsupported(what: impl Into<String>, span: Span) -> Self {
        Self::with_span(ErrorKind::UnsupportedConstruct { what: what.into() }, span)
    }

    pub fn invalid_match_clause(found: impl Into<String>, span: Span) -> Self {
        Self::with_span(
            ErrorKind::InvalidMatchClause { found: found.into() },
            span,
        )
    }

    pub fn invalid_on_conflict_target(found: impl Into<String>, span: Span) -> Self {
        Self::with_span(
            ErrorKind::InvalidOnConflictTarget { found: found.into() },
            span,
        )
    }

    pub fn invalid_default_expression(span: Span) -> Self {
        Self::with_span(ErrorKind::InvalidDefaultExpression, span)
    }

    /// A caller-checked assertion failure: `fk.columns` and its referred
    /// columns have unequal arity (§4.5's precondition on `resolve_foreign_key`).
    pub fn foreign_key_arity_mismatch(columns: usize, referred: usize) -> Self {
        Self::new(ErrorKind::ForeignKeyArityMismatch { columns, referred })
    }

    /// A caller-checked assertion failure (programming error, not an input error).
    pub fn internal_invariant(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalInvariant(msg.into()))
    }
}

/// A specialized Result type for this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let span1 = Span::new(10, 20);
        let span2 = Span::new(15, 30);
        let merged = span1.merge(span2);
        assert_eq!(merged.start, 10);
        assert_eq!(merged.end, 30);
    }

    #[test]
    fn test_error_display() {
        let err = Error::unexpected_token("TABLE", "SELECT", Span::new(7, 13));
        let msg = format!("{}", err);
        assert!(msg.contains("expected TABLE"));
        assert!(msg.contains("found SELECT"));
    }

    #[test]
    fn test_internal_invariant_has_no_span() {
        let err = Error::internal_invariant("column not among fk.columns");
        assert!(err.span().is_none());
    }
}
