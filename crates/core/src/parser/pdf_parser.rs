//! PDF value parser.
//!
//! Builds PDF values from lexer tokens. The parser owns the single cursor
//! over the document buffer: callers that read at a known offset must
//! `seek` (or `reset`) first and must not assume the cursor survives a
//! nested lookup.

use super::lexer::{PSBaseParser, PSToken, is_whitespace};
use crate::error::{PdfError, Result};
use crate::model::objects::{IndirectObject, PDFObjRef, PDFObject, PDFStream, PdfDict};
use bytes::Bytes;
use std::ops::Range;

const HEADER_SEARCH_LENGTH: usize = 1024;

/// Expected shape of the next value, see [`PDFParser::read_value_of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    Keyword,
    Dictionary,
    Indirect,
}

impl ValueKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Keyword => "keyword",
            Self::Dictionary => "dict",
            Self::Indirect => "indirect object",
        }
    }
}

/// A top-level value: a direct object, a bare keyword, or an indirect object.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Object(PDFObject),
    Keyword(Vec<u8>),
    Indirect(IndirectObject),
}

impl PdfValue {
    pub fn matches(&self, kind: ValueKind) -> bool {
        match kind {
            ValueKind::Numeric => {
                matches!(self, Self::Object(PDFObject::Int(_) | PDFObject::Real(_)))
            }
            ValueKind::Keyword => matches!(self, Self::Keyword(_)),
            ValueKind::Dictionary => matches!(self, Self::Object(PDFObject::Dict(_))),
            ValueKind::Indirect => matches!(self, Self::Indirect(_)),
        }
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Object(obj) => obj.type_name(),
            Self::Keyword(_) => "keyword",
            Self::Indirect(_) => "indirect object",
        }
    }

    pub fn is_keyword(&self, kw: &[u8]) -> bool {
        matches!(self, Self::Keyword(k) if k == kw)
    }

    pub fn into_object(self) -> Result<PDFObject> {
        match self {
            Self::Object(obj) => Ok(obj),
            other => Err(PdfError::TypeError {
                expected: "object",
                got: other.type_name(),
            }),
        }
    }

    pub fn into_indirect(self) -> Result<IndirectObject> {
        match self {
            Self::Indirect(obj) => Ok(obj),
            other => Err(PdfError::TypeError {
                expected: "indirect object",
                got: other.type_name(),
            }),
        }
    }
}

/// Position of `%PDF-` within the first kilobyte, or 0 when absent.
///
/// Files wrapped in another container carry a prefix before the header;
/// their cross-reference offsets may be relative to the header.
pub fn find_header_offset(data: &[u8]) -> usize {
    let window = &data[..data.len().min(HEADER_SEARCH_LENGTH)];
    window
        .windows(5)
        .position(|w| w == b"%PDF-")
        .unwrap_or(0)
}

/// PDF Parser - parses PDF value syntax over a shared buffer.
pub struct PDFParser {
    base: PSBaseParser,
    /// Pushed-back tokens with their positions (stack order)
    lookahead: Vec<(usize, PSToken)>,
}

impl PDFParser {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            base: PSBaseParser::new(data),
            lookahead: Vec::new(),
        }
    }

    /// Current cursor position, accounting for pushed-back tokens.
    pub fn tell(&self) -> usize {
        self.lookahead
            .iter()
            .map(|(pos, _)| *pos)
            .min()
            .unwrap_or_else(|| self.base.tell())
    }

    /// Move the cursor. Pending lookahead is left alone; see [`Self::reset`].
    pub fn seek(&mut self, pos: usize) {
        self.base.set_pos(pos);
    }

    /// Drop pushed-back tokens.
    pub fn clear_lookahead(&mut self) {
        self.lookahead.clear();
    }

    /// Seek and clear lookahead in one step.
    pub fn reset(&mut self, pos: usize) {
        self.clear_lookahead();
        self.seek(pos);
    }

    pub fn len(&self) -> usize {
        self.base.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.data().is_empty()
    }

    pub const fn data(&self) -> &Bytes {
        self.base.data()
    }

    /// Bytes from the cursor to the end of the buffer.
    pub fn remaining(&self) -> &[u8] {
        self.base.remaining()
    }

    /// Zero-copy view of a byte range, clamped to the buffer.
    pub fn slice(&self, range: Range<usize>) -> Bytes {
        let len = self.len();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        self.base.data().slice(start..end)
    }

    /// The trailing `window` bytes and the absolute offset they start at.
    pub fn tail(&self, window: usize) -> (usize, &[u8]) {
        let data = self.base.data();
        let start = data.len().saturating_sub(window);
        (start, &data[start..])
    }

    fn next_token(&mut self) -> Result<Option<(usize, PSToken)>> {
        if let Some(tok) = self.lookahead.pop() {
            return Ok(Some(tok));
        }
        self.base.next_token().transpose()
    }

    /// Next token for speculative lookahead past the end of a value.
    ///
    /// Bytes the lexer rejects end the lookahead instead of failing: they
    /// are not part of the value being read.
    fn lookahead_token(&mut self) -> Option<(usize, PSToken)> {
        if let Some(tok) = self.lookahead.pop() {
            return Some(tok);
        }
        let saved = self.base.tell();
        match self.base.next_token().transpose() {
            Ok(tok) => tok,
            Err(_) => {
                self.base.set_pos(saved);
                None
            }
        }
    }

    fn push_back(&mut self, pos: usize, tok: PSToken) {
        self.lookahead.push((pos, tok));
    }

    /// Parse the next top-level value.
    pub fn read_value(&mut self) -> Result<PdfValue> {
        let (pos, token) = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;
        match token {
            PSToken::Int(n) => {
                if let Some(indirect) = self.try_indirect(n)? {
                    return Ok(PdfValue::Indirect(indirect));
                }
                Ok(PdfValue::Object(self.token_to_object(pos, PSToken::Int(n))?))
            }
            PSToken::Keyword(kw)
                if !matches!(kw.as_slice(), b"[" | b"<<" | b"null") =>
            {
                Ok(PdfValue::Keyword(kw))
            }
            other => Ok(PdfValue::Object(self.token_to_object(pos, other)?)),
        }
    }

    /// Parse the next value and require it to be of `kind`.
    pub fn read_value_of(&mut self, kind: ValueKind) -> Result<PdfValue> {
        let value = self.read_value()?;
        if value.matches(kind) {
            Ok(value)
        } else {
            Err(PdfError::TypeError {
                expected: kind.name(),
                got: value.type_name(),
            })
        }
    }

    /// Parse the next direct PDF object
    pub fn parse_object(&mut self) -> Result<PDFObject> {
        let (pos, token) = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;
        self.token_to_object(pos, token)
    }

    /// Look past `n` for `G obj`; restores the lookahead when absent.
    fn try_indirect(&mut self, n: i64) -> Result<Option<IndirectObject>> {
        let Some((pos2, tok2)) = self.lookahead_token() else {
            return Ok(None);
        };
        let PSToken::Int(genno) = tok2 else {
            self.push_back(pos2, tok2);
            return Ok(None);
        };
        let Some((pos3, tok3)) = self.lookahead_token() else {
            self.push_back(pos2, PSToken::Int(genno));
            return Ok(None);
        };
        if !tok3.is_keyword(b"obj") {
            self.push_back(pos3, tok3);
            self.push_back(pos2, PSToken::Int(genno));
            return Ok(None);
        }

        let objid = u32::try_from(n).map_err(|_| PdfError::TokenError {
            pos: pos2,
            msg: format!("invalid object number: {n}"),
        })?;
        let genno = u32::try_from(genno).map_err(|_| PdfError::TokenError {
            pos: pos2,
            msg: format!("invalid generation number: {genno}"),
        })?;
        self.read_indirect_body(objid, genno).map(Some)
    }

    fn read_indirect_body(&mut self, objid: u32, genno: u32) -> Result<IndirectObject> {
        let value = match self.parse_object()? {
            PDFObject::Dict(dict) if self.consume_stream_keyword() => {
                PDFObject::Stream(Box::new(self.read_stream_body(dict)?))
            }
            other => other,
        };

        // `endobj` is optional in practice
        match self.lookahead_token() {
            Some((_, tok)) if tok.is_keyword(b"endobj") => {}
            Some((pos, tok)) => self.push_back(pos, tok),
            None => {}
        }

        Ok(IndirectObject::new(objid, genno, value))
    }

    /// Consume a `stream` keyword directly after a dictionary.
    fn consume_stream_keyword(&mut self) -> bool {
        if !self.lookahead.is_empty() {
            return false;
        }
        let saved = self.base.tell();
        self.base.skip_whitespace();
        let rest = self.base.remaining();
        let is_stream = rest.starts_with(b"stream")
            && rest.get(6).is_none_or(|&b| is_whitespace(b));
        if is_stream {
            self.base.set_pos(self.base.tell() + 6);
        } else {
            self.base.set_pos(saved);
        }
        is_stream
    }

    /// Read the body following `stream`; leaves the cursor after `endstream`.
    fn read_stream_body(&mut self, dict: PdfDict) -> Result<PDFStream> {
        let data = self.base.data().clone();
        let mut start = self.base.tell();
        if data.get(start) == Some(&b'\r') {
            start += 1;
        }
        if data.get(start) == Some(&b'\n') {
            start += 1;
        }

        // A direct /Length is trusted only when it lands on `endstream`.
        let declared = dict
            .get("Length")
            .and_then(|len| len.as_int().ok())
            .and_then(|len| usize::try_from(len).ok())
            .map(|len| start.saturating_add(len))
            .filter(|&end| end <= data.len() && endstream_at(&data, end).is_some());

        let end = declared
            .or_else(|| find_endstream(&data[start..]).map(|rel| start + rel))
            .unwrap_or(data.len());

        let after = endstream_at(&data, end).unwrap_or(data.len());
        self.base.set_pos(after);

        Ok(PDFStream::new(dict, data.slice(start..end)))
    }

    /// Convert a token to a PDF object
    fn token_to_object(&mut self, pos: usize, token: PSToken) -> Result<PDFObject> {
        match token {
            PSToken::Int(n) => {
                // Could be start of indirect reference: objid genno R
                if let Some((pos2, tok2)) = self.lookahead_token() {
                    if let PSToken::Int(m) = tok2 {
                        if let Some((pos3, tok3)) = self.lookahead_token() {
                            if tok3.is_keyword(b"R")
                                && let (Ok(objid), Ok(genno)) =
                                    (u32::try_from(n), u32::try_from(m))
                            {
                                return Ok(PDFObject::Ref(PDFObjRef::new(objid, genno)));
                            }
                            self.push_back(pos3, tok3);
                        }
                        self.push_back(pos2, PSToken::Int(m));
                    } else {
                        self.push_back(pos2, tok2);
                    }
                }
                Ok(PDFObject::Int(n))
            }
            PSToken::Real(n) => Ok(PDFObject::Real(n)),
            PSToken::Bool(b) => Ok(PDFObject::Bool(b)),
            PSToken::Literal(s) => Ok(PDFObject::Name(s)),
            PSToken::String(s) => Ok(PDFObject::String(s)),
            PSToken::Keyword(kw) => match kw.as_slice() {
                b"null" => Ok(PDFObject::Null),
                b"[" => self.parse_array(),
                b"<<" => self.parse_dict(),
                _ => Err(PdfError::TokenError {
                    pos,
                    msg: format!("unexpected keyword: {}", String::from_utf8_lossy(&kw)),
                }),
            },
        }
    }

    /// Parse array contents until ]
    fn parse_array(&mut self) -> Result<PDFObject> {
        let mut arr = Vec::new();

        loop {
            let (pos, token) = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;
            if token.is_keyword(b"]") {
                break;
            }
            arr.push(self.token_to_object(pos, token)?);
        }

        Ok(PDFObject::Array(arr))
    }

    /// Parse dict contents until >>
    fn parse_dict(&mut self) -> Result<PDFObject> {
        let mut dict = PdfDict::new();

        loop {
            let (pos, token) = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;
            if token.is_keyword(b">>") {
                break;
            }

            let PSToken::Literal(key) = token else {
                return Err(PdfError::TokenError {
                    pos,
                    msg: "expected name as dict key".into(),
                });
            };

            let value = self.parse_object()?;
            dict.insert(key, value);
        }

        Ok(PDFObject::Dict(dict))
    }
}

/// If `endstream` follows `pos` after optional whitespace, the offset just past it.
fn endstream_at(data: &[u8], pos: usize) -> Option<usize> {
    let mut i = pos;
    while i < data.len() && is_whitespace(data[i]) {
        i += 1;
    }
    data[i..].starts_with(b"endstream").then_some(i + 9)
}

/// Offset of the stream body end: first `endstream` minus one trailing EOL.
fn find_endstream(data: &[u8]) -> Option<usize> {
    let needle = b"endstream";
    let pos = data.windows(needle.len()).position(|w| w == needle)?;
    let body = &data[..pos];
    let trimmed = if body.ends_with(b"\r\n") {
        pos - 2
    } else if body.ends_with(b"\n") || body.ends_with(b"\r") {
        pos - 1
    } else {
        pos
    };
    Some(trimmed)
}
