//! Pull-based tokenizer.
//!
//! Implements a single-character lookahead cursor (`item`/`next_item`,
//! primed by two advances) over the source's characters, and an
//! [`Iterator`] of [`Token`] built on top of it. The lexer never fails:
//! malformed input becomes an `UNKNOWN` token and lexing continues.

use crate::error::Span;
use crate::token::{self, Token, TokenKind};

/// Single-character lookahead cursor over a source string's characters,
/// tracking the byte offset of `item` as it advances.
struct ItemCursor<'a> {
    chars: std::str::CharIndices<'a>,
    item: Option<(usize, char)>,
    next_item: Option<(usize, char)>,
    len: usize,
}

impl<'a> ItemCursor<'a> {
    fn new(src: &'a str) -> Self {
        let chars = src.char_indices();
        let mut cursor = Self {
            chars,
            item: None,
            next_item: None,
            len: src.len(),
        };
        cursor.forth();
        cursor.forth();
        cursor
    }

    fn forth(&mut self) {
        self.item = self.next_item;
        self.next_item = self.chars.next();
    }

    fn item_char(&self) -> Option<char> {
        self.item.map(|(_, c)| c)
    }

    fn next_char(&self) -> Option<char> {
        self.next_item.map(|(_, c)| c)
    }

    fn pos(&self) -> usize {
        self.item.map(|(i, _)| i).unwrap_or(self.len)
    }
}

/// A streaming tokenizer over a borrowed source string.
pub struct Lexer<'a> {
    cs: ItemCursor<'a>,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            cs: ItemCursor::new(src),
            done: false,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let Some(c) = self.cs.item_char() else {
            self.done = true;
            return None;
        };

        let start = self.cs.pos();

        if c.is_whitespace() {
            self.cs.forth();
            let (kind, canonical) =
                token::lookup(&c.to_string()).unwrap_or((TokenKind::WHITESPACE, " "));
            return Some(Token::new(kind, canonical, Span::new(start, self.cs.pos())));
        }

        if c.is_ascii_digit() || (c == '.' && self.cs.next_char().is_some_and(|n| n.is_ascii_digit()))
        {
            return Some(self.numeric_token(start));
        }

        if is_identifier_start(c) {
            let id = self.identifier();
            let id_upper = id.to_uppercase();
            return Some(match self.cs.item_char() {
                Some('\'') | Some('"') if id_upper == "B" => self.prefixed_literal(start, true),
                Some('\'') | Some('"') if id_upper == "X" => self.prefixed_literal(start, false),
                _ => match token::lookup(&id_upper) {
                    Some((kind, canonical)) => {
                        Token::new(kind, canonical, Span::new(start, self.cs.pos()))
                    }
                    None => Token::new(TokenKind::RAW_ID, id, Span::new(start, self.cs.pos())),
                },
            });
        }

        if c == '\'' || c == '"' {
            return Some(self.string_token(start));
        }

        if c == '`' || c == '[' {
            return Some(self.enclosed_id_token(start));
        }

        let single = c.to_string();
        if let Some((kind, canonical)) = token::lookup(&single) {
            let pair: String = match self.cs.next_char() {
                Some(n) => [c, n].iter().collect(),
                None => single.clone(),
            };
            if pair == "--" || pair == "# " {
                return Some(self.single_line_comment(start));
            }
            if pair == "/*" {
                return Some(self.multi_line_comment(start));
            }
            if let Some((pair_kind, pair_canonical)) = token::lookup(&pair) {
                self.cs.forth();
                self.cs.forth();
                return Some(Token::new(
                    pair_kind,
                    pair_canonical,
                    Span::new(start, self.cs.pos()),
                ));
            }
            self.cs.forth();
            return Some(Token::new(kind, canonical, Span::new(start, self.cs.pos())));
        }

        self.cs.forth();
        log::trace!("unrecognized character {c:?} at byte {start}, emitting UNKNOWN");
        Some(Token::new(
            TokenKind::UNKNOWN,
            c.to_string(),
            Span::new(start, self.cs.pos()),
        ))
    }
}

impl<'a> Lexer<'a> {
    fn identifier(&mut self) -> String {
        let mut s = String::new();
        while let Some(c) = self.cs.item_char() {
            if c == '_' || c == '$' || c.is_alphanumeric() {
                s.push(c);
                self.cs.forth();
            } else {
                break;
            }
        }
        s
    }

    fn int_literal(&mut self) -> String {
        let mut s = String::new();
        while let Some(c) = self.cs.item_char() {
            if c.is_ascii_digit() {
                s.push(c);
                self.cs.forth();
            } else {
                break;
            }
        }
        s
    }

    fn hex_literal(&mut self) -> String {
        let mut s = String::new();
        while let Some(c) = self.cs.item_char() {
            if c.is_ascii_hexdigit() {
                s.push(c);
                self.cs.forth();
            } else {
                break;
            }
        }
        s
    }

    fn bin_literal(&mut self) -> String {
        let mut s = String::new();
        while matches!(self.cs.item_char(), Some('0') | Some('1')) {
            s.push(self.cs.item_char().unwrap());
            self.cs.forth();
        }
        s
    }

    fn fractional_literal(&mut self) -> String {
        let decimal = self.int_literal();
        if matches!(self.cs.item_char(), Some('e') | Some('E')) {
            self.cs.forth();
            let mut sign = String::new();
            if matches!(self.cs.item_char(), Some('+') | Some('-')) {
                sign.push(self.cs.item_char().unwrap());
                self.cs.forth();
            }
            let exponent = self.int_literal();
            return format!("{decimal}e{sign}{exponent}");
        }
        decimal
    }

    fn numeric_token(&mut self, start: usize) -> Token {
        let first_part = self.fractional_literal();
        if first_part.contains('e') {
            return Token::new(TokenKind::FLOAT, first_part, Span::new(start, self.cs.pos()));
        }
        if self.cs.item_char() == Some('.') {
            self.cs.forth();
            let val = format!("{first_part}.{}", self.fractional_literal());
            return Token::new(TokenKind::FLOAT, val, Span::new(start, self.cs.pos()));
        }
        if first_part == "0" && matches!(self.cs.item_char(), Some('x') | Some('X')) {
            let x = self.cs.item_char().unwrap();
            self.cs.forth();
            if self.cs.item_char().is_some_and(|c| c.is_ascii_hexdigit()) {
                return Token::new(
                    TokenKind::HEX,
                    self.hex_literal(),
                    Span::new(start, self.cs.pos()),
                );
            }
            return Token::new(
                TokenKind::UNKNOWN,
                format!("0{x}"),
                Span::new(start, self.cs.pos()),
            );
        }
        Token::new(TokenKind::INT, first_part, Span::new(start, self.cs.pos()))
    }

    /// `X'hex'`/`X"hex"` blob literals and `B'01'`/`B"01"` binary literals.
    fn prefixed_literal(&mut self, start: usize, binary: bool) -> Token {
        let delim = self.cs.item_char().expect("caller checked ' or \"");
        self.cs.forth();
        let body = if binary {
            self.bin_literal()
        } else {
            self.hex_literal()
        };
        if self.cs.item_char() != Some(delim) {
            return Token::new(
                TokenKind::UNKNOWN,
                format!("{delim}{body}"),
                Span::new(start, self.cs.pos()),
            );
        }
        self.cs.forth();
        let kind = if binary { TokenKind::BINARY } else { TokenKind::BLOB };
        Token::new(kind, body, Span::new(start, self.cs.pos()))
    }

    fn single_line_comment(&mut self, start: usize) -> Token {
        self.cs.forth();
        self.cs.forth();
        let mut content = String::new();
        while let Some(c) = self.cs.item_char() {
            if c == '\n' {
                break;
            }
            content.push(c);
            self.cs.forth();
        }
        self.cs.forth(); // consume newline or run off the end
        Token::new(
            TokenKind::SINGLE_LINE_COMMENT,
            content,
            Span::new(start, self.cs.pos()),
        )
    }

    fn multi_line_comment(&mut self, start: usize) -> Token {
        self.cs.forth();
        self.cs.forth();
        let mut content = String::new();
        while self.cs.item_char().is_some() && self.cs.next_char().is_some() {
            if self.cs.item_char() == Some('*') && self.cs.next_char() == Some('/') {
                break;
            }
            content.push(self.cs.item_char().unwrap());
            self.cs.forth();
        }
        if self.cs.item_char().is_none() || self.cs.next_char().is_none() {
            if let Some(c) = self.cs.item_char() {
                content.push(c);
                self.cs.forth();
            }
            return Token::new(TokenKind::UNKNOWN, format!("/*{content}"), Span::new(start, self.cs.pos()));
        }
        self.cs.forth();
        self.cs.forth();
        Token::new(
            TokenKind::MULTI_LINE_COMMENT,
            content,
            Span::new(start, self.cs.pos()),
        )
    }

    fn string_token(&mut self, start: usize) -> Token {
        let delim = self.cs.item_char().expect("caller checked ' or \"");
        self.cs.forth();
        let mut s = String::new();
        loop {
            match self.cs.item_char() {
                None => {
                    return Token::new(
                        TokenKind::UNKNOWN,
                        format!("{delim}{s}"),
                        Span::new(start, self.cs.pos()),
                    );
                }
                Some(c) if c == delim && self.cs.next_char() != Some(delim) => break,
                Some(c) if c == delim => {
                    // doubled delimiter: one literal delimiter character
                    self.cs.forth();
                    s.push(delim);
                    self.cs.forth();
                }
                Some(c) => {
                    s.push(c);
                    self.cs.forth();
                }
            }
        }
        self.cs.forth();
        let kind = if delim == '\'' {
            TokenKind::STD_STR
        } else {
            TokenKind::STD_DELIMITED_ID
        };
        Token::new(kind, s, Span::new(start, self.cs.pos()))
    }

    fn enclosed_id_token(&mut self, start: usize) -> Token {
        self.cs.forth();
        let s = self.identifier();
        // unconditionally consumes one character after the identifier body,
        // whether or not it is the matching closing delimiter (there is no
        // escape sequence to misread either way)
        if self.cs.item_char().is_some() {
            self.cs.forth();
        }
        Token::new(
            TokenKind::NON_STD_DELIMITED_ID,
            s,
            Span::new(start, self.cs.pos()),
        )
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        Lexer::new(src).collect()
    }

    #[test]
    fn newline_alone() {
        let toks = lex("\n");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::WHITESPACE);
        assert_eq!(toks[0].text(), "\n");
    }

    #[test]
    fn hex_literal() {
        let toks = lex("0x7f");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::HEX);
        assert_eq!(toks[0].text(), "7f");
    }

    #[test]
    fn unterminated_hex_prefix_is_unknown() {
        let toks = lex("0x");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::UNKNOWN);
        assert_eq!(toks[0].text(), "0x");
    }

    #[test]
    fn float_boundary_forms() {
        for src in [".0", "0.", "0.e-5", "1e-3"] {
            let toks = lex(src);
            assert_eq!(toks.len(), 1, "expected single token for {src}");
            assert_eq!(toks[0].kind, TokenKind::FLOAT, "{src}");
        }
    }

    #[test]
    fn doubled_delimiter_escape_in_quoted_identifier() {
        let toks = lex(r#""a ""quoted"" id""#);
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::STD_DELIMITED_ID);
        assert_eq!(toks[0].text(), r#"a "quoted" id"#);
    }

    #[test]
    fn unterminated_string_is_single_unknown() {
        let toks = lex("'abc");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::UNKNOWN);
        assert_eq!(toks[0].text(), "'abc");
    }

    #[test]
    fn unterminated_multiline_comment_is_single_unknown() {
        let toks = lex("/* never closes");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::UNKNOWN);
        assert!(toks[0].text().starts_with("/*"));
    }

    #[test]
    fn keyword_is_interned_and_upper_cased() {
        let toks = lex("select");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::KEYWORD);
        assert_eq!(toks[0].text(), "SELECT");
    }

    #[test]
    fn two_char_operator_preferred_over_one_char() {
        let toks = lex("<>");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].text(), "<>");
    }

    #[test]
    fn blob_and_binary_literals() {
        let toks = lex("X'7f' B'0110'");
        assert_eq!(toks[0].kind, TokenKind::BLOB);
        assert_eq!(toks[0].text(), "7f");
        let binary = toks.iter().find(|t| t.kind == TokenKind::BINARY).unwrap();
        assert_eq!(binary.text(), "0110");
    }

    #[test]
    fn single_line_comment_stops_at_newline() {
        let toks = lex("-- hi\nSELECT");
        assert_eq!(toks[0].kind, TokenKind::SINGLE_LINE_COMMENT);
        assert_eq!(toks[0].text(), " hi");
        assert_eq!(toks[1].kind, TokenKind::WHITESPACE);
        assert_eq!(toks[2].kind, TokenKind::KEYWORD);
    }

    #[test]
    fn enclosed_id_unconditionally_consumes_one_trailing_character() {
        // matches the original tokenizer's `_enclosed_id_token`: the character
        // after the identifier body is always swallowed, whether or not it is
        // the matching closing delimiter.
        let toks = lex("`abc)x");
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[0].kind, TokenKind::NON_STD_DELIMITED_ID);
        assert_eq!(toks[0].text(), "abc");
        assert_eq!(toks[0].span.end, 5); // consumed through ')', leaving "x"
        assert_eq!(toks[1].kind, TokenKind::RAW_ID);
        assert_eq!(toks[1].text(), "x");
    }

    #[test]
    fn lexing_never_panics_on_arbitrary_bytes() {
        for src in ["", "@@@", "\u{0}", "'''", "[abc", "`abc", "1.2.3", "NULL"] {
            let _ = lex(src);
        }
    }
}
