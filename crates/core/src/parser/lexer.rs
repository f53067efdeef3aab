//! PDF tokenizer.
//!
//! Splits a byte buffer into PostScript-style tokens. The buffer is a
//! shared `Bytes`, so stream bodies can later be sliced out without copying.

use crate::error::{PdfError, Result};
use bytes::Bytes;

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum PSToken {
    /// Integer value
    Int(i64),
    /// Floating point value
    Real(f64),
    /// Boolean value
    Bool(bool),
    /// Literal name (e.g., /Name)
    Literal(String),
    /// Keyword/operator (e.g., obj, xref, <<)
    Keyword(Vec<u8>),
    /// String (literal or hex)
    String(Vec<u8>),
}

impl PSToken {
    /// True when the token is the given keyword.
    pub fn is_keyword(&self, kw: &[u8]) -> bool {
        matches!(self, Self::Keyword(k) if k == kw)
    }
}

/// Check if byte is PDF whitespace
pub const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
}

/// Check if byte is delimiter
pub const fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Base tokenizer over a shared buffer.
pub struct PSBaseParser {
    data: Bytes,
    pos: usize,
    /// Start of the most recently returned token
    token_pos: usize,
}

impl PSBaseParser {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            token_pos: 0,
        }
    }

    /// Current position in the buffer
    pub const fn tell(&self) -> usize {
        self.pos
    }

    /// Set current position. Positions past the end clamp to the end.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
        self.token_pos = self.pos;
    }

    /// Start of the most recently returned token.
    pub const fn token_pos(&self) -> usize {
        self.token_pos
    }

    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Get remaining unparsed data
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Skip whitespace and comments
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while let Some(c) = self.advance() {
                    if c == b'\r' || c == b'\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Parse a literal name (/Name)
    fn parse_literal(&mut self) -> PSToken {
        self.pos += 1; // '/'
        let mut name = Vec::new();

        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
            if b == b'#' {
                // #XX escape; an invalid escape drops the '#'
                if let (Some(h), Some(l)) = (
                    self.peek().and_then(hex_nibble),
                    self.peek_at(1).and_then(hex_nibble),
                ) {
                    self.pos += 2;
                    name.push((h << 4) | l);
                }
                continue;
            }
            name.push(b);
        }

        PSToken::Literal(String::from_utf8_lossy(&name).into_owned())
    }

    /// Parse a number (integer or real)
    fn parse_number(&mut self) -> Result<PSToken> {
        let start = self.pos;
        let mut has_dot = false;

        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }

        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                self.pos += 1;
            } else if b == b'.' && !has_dot {
                has_dot = true;
                self.pos += 1;
            } else {
                break;
            }
        }

        let s = std::str::from_utf8(&self.data[start..self.pos]).map_err(|_| {
            PdfError::TokenError {
                pos: start,
                msg: "invalid number".into(),
            }
        })?;

        if has_dot {
            // "5." and "-.5" are valid PDF reals
            let normalized = if s.ends_with('.') {
                format!("{s}0")
            } else {
                s.to_string()
            };
            let val: f64 = normalized.parse().map_err(|_| PdfError::TokenError {
                pos: start,
                msg: format!("invalid real: {s}"),
            })?;
            Ok(PSToken::Real(val))
        } else {
            let val: i64 = s.parse().map_err(|_| PdfError::TokenError {
                pos: start,
                msg: format!("invalid int: {s}"),
            })?;
            Ok(PSToken::Int(val))
        }
    }

    /// Parse a literal string (...)
    fn parse_string(&mut self) -> Result<PSToken> {
        self.pos += 1; // '('
        let mut result = Vec::new();
        let mut depth = 1;

        while depth > 0 {
            match self.advance() {
                Some(b'(') => {
                    depth += 1;
                    result.push(b'(');
                }
                Some(b')') => {
                    depth -= 1;
                    if depth > 0 {
                        result.push(b')');
                    }
                }
                Some(b'\\') => match self.advance() {
                    Some(b'n') => result.push(b'\n'),
                    Some(b'r') => result.push(b'\r'),
                    Some(b't') => result.push(b'\t'),
                    Some(b'b') => result.push(0x08),
                    Some(b'f') => result.push(0x0c),
                    Some(b'\r') => {
                        if self.peek() == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    Some(b'\n') => {}
                    Some(c @ b'0'..=b'7') => {
                        let mut octal = u32::from(c - b'0');
                        for _ in 0..2 {
                            match self.peek() {
                                Some(d @ b'0'..=b'7') => {
                                    self.pos += 1;
                                    octal = octal * 8 + u32::from(d - b'0');
                                }
                                _ => break,
                            }
                        }
                        result.push((octal & 0xFF) as u8);
                    }
                    Some(c) => result.push(c),
                    None => return Err(PdfError::UnexpectedEof),
                },
                Some(c) => result.push(c),
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        Ok(PSToken::String(result))
    }

    /// Parse a hex string <...>
    fn parse_hex_string(&mut self) -> Result<PSToken> {
        self.pos += 1; // '<'
        let mut result = Vec::new();
        let mut pending: Option<u8> = None;

        loop {
            match self.advance() {
                Some(b'>') => break,
                Some(c) if is_whitespace(c) => {}
                Some(c) => {
                    let nibble = hex_nibble(c).ok_or_else(|| PdfError::TokenError {
                        pos: self.pos - 1,
                        msg: format!("invalid hex digit: {:?}", c as char),
                    })?;
                    match pending.take() {
                        Some(high) => result.push((high << 4) | nibble),
                        None => pending = Some(nibble),
                    }
                }
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        // An odd trailing digit behaves as if followed by 0
        if let Some(high) = pending {
            result.push(high << 4);
        }

        Ok(PSToken::String(result))
    }

    /// Parse a keyword
    fn parse_keyword(&mut self) -> PSToken {
        let start = self.pos;

        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
        }

        // A stray delimiter (')' or '}' out of context) becomes a one-byte keyword
        if self.pos == start {
            self.pos += 1;
        }

        let keyword = &self.data[start..self.pos];
        match keyword {
            b"true" => PSToken::Bool(true),
            b"false" => PSToken::Bool(false),
            _ => PSToken::Keyword(keyword.to_vec()),
        }
    }

    /// Get next token
    pub fn next_token(&mut self) -> Option<Result<(usize, PSToken)>> {
        self.skip_whitespace();

        if self.at_end() {
            return None;
        }

        self.token_pos = self.pos;
        let b = self.peek()?;

        let result = match b {
            b'/' => Ok(self.parse_literal()),
            b'(' => self.parse_string(),
            b'<' if self.peek_at(1) == Some(b'<') => {
                self.pos += 2;
                Ok(PSToken::Keyword(b"<<".to_vec()))
            }
            b'<' => self.parse_hex_string(),
            b'>' if self.peek_at(1) == Some(b'>') => {
                self.pos += 2;
                Ok(PSToken::Keyword(b">>".to_vec()))
            }
            b'[' | b']' | b'{' | b'}' | b'>' => {
                self.pos += 1;
                Ok(PSToken::Keyword(vec![b]))
            }
            b'+' | b'-' | b'.'
                if matches!(self.peek_at(1), Some(c) if c.is_ascii_digit() || c == b'.') =>
            {
                self.parse_number()
            }
            c if c.is_ascii_digit() => self.parse_number(),
            _ => Ok(self.parse_keyword()),
        };

        Some(result.map(|token| (self.token_pos, token)))
    }
}

const fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(data: &'static [u8]) -> Vec<PSToken> {
        let mut parser = PSBaseParser::new(data);
        let mut out = Vec::new();
        while let Some(tok) = parser.next_token() {
            out.push(tok.unwrap().1);
        }
        out
    }

    #[test]
    fn splits_xref_header_line() {
        assert_eq!(
            tokens(b"xref\n0 6\n"),
            vec![
                PSToken::Keyword(b"xref".to_vec()),
                PSToken::Int(0),
                PSToken::Int(6)
            ]
        );
    }

    #[test]
    fn reads_names_with_hex_escapes() {
        assert_eq!(
            tokens(b"/Obj#53tm"),
            vec![PSToken::Literal("ObjStm".into())]
        );
    }

    #[test]
    fn reads_strings_and_hex_strings() {
        assert_eq!(
            tokens(b"(a\\(b\\)c) <41 42 4>"),
            vec![
                PSToken::String(b"a(b)c".to_vec()),
                PSToken::String(vec![0x41, 0x42, 0x40])
            ]
        );
    }

    #[test]
    fn reads_reals_and_signs() {
        assert_eq!(
            tokens(b"-12 +3.5 .25 4."),
            vec![
                PSToken::Int(-12),
                PSToken::Real(3.5),
                PSToken::Real(0.25),
                PSToken::Real(4.0)
            ]
        );
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            tokens(b"%PDF-1.7\n%\xe2\xe3\n1"),
            vec![PSToken::Int(1)]
        );
    }

    #[test]
    fn stray_delimiter_does_not_stall() {
        assert_eq!(
            tokens(b") x"),
            vec![
                PSToken::Keyword(b")".to_vec()),
                PSToken::Keyword(b"x".to_vec())
            ]
        );
    }

    #[test]
    fn set_pos_clamps_to_end() {
        let mut parser = PSBaseParser::new(&b"abc"[..]);
        parser.set_pos(99);
        assert_eq!(parser.tell(), 3);
        assert!(parser.next_token().is_none());
    }
}
