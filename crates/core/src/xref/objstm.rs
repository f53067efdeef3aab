//! Object streams (`/Type /ObjStm`).
//!
//! The decoded body starts with `N` pairs of `objnum offset` integers,
//! followed at byte `First` by the object bodies. Offsets are relative
//! to `First`.

use crate::error::{PdfError, Result};
use crate::filter::decode_stream;
use crate::model::objects::{IndirectObject, PDFObjRef, PDFObject, PDFStream};
use std::ops::Range;
use tracing::debug;

/// Parsed `objnum offset` pairs of an object stream header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectStreamHeader {
    pairs: Vec<(u32, usize)>,
}

impl ObjectStreamHeader {
    /// Parse at most `n` pairs from `header`.
    ///
    /// Integers may be separated by whitespace or commas. Parsing stops at
    /// the first token that is not a non-negative integer.
    pub fn parse(header: &[u8], n: usize) -> Self {
        let mut numbers = header
            .split(|&b| b == b',' || b.is_ascii_whitespace() || b == 0)
            .filter(|token| !token.is_empty())
            .map_while(|token| std::str::from_utf8(token).ok()?.parse::<u64>().ok());

        let mut pairs = Vec::new();
        while pairs.len() < n {
            let (Some(objnum), Some(offset)) = (numbers.next(), numbers.next()) else {
                break;
            };
            let (Ok(objnum), Ok(offset)) = (u32::try_from(objnum), usize::try_from(offset))
            else {
                break;
            };
            pairs.push((objnum, offset));
        }
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(u32, usize)> {
        self.pairs.get(index).copied()
    }

    pub fn pairs(&self) -> &[(u32, usize)] {
        &self.pairs
    }

    /// Byte range of the object at `index` within a body of `total` bytes.
    ///
    /// The object runs up to the next pair's offset, or to the end of the
    /// body for the last pair.
    pub fn span(&self, index: usize, first: usize, total: usize) -> Option<Range<usize>> {
        let (_, offset) = self.get(index)?;
        let start = first.saturating_add(offset).min(total);
        let end = match self.get(index + 1) {
            Some((_, next)) => first.saturating_add(next).min(total),
            None => total,
        };
        Some(start..end.max(start))
    }
}

/// A decoded object stream container.
#[derive(Debug, Clone)]
pub struct ObjectStream {
    objid: u32,
    first: usize,
    extends: Option<PDFObjRef>,
    data: Vec<u8>,
    header: ObjectStreamHeader,
}

impl ObjectStream {
    /// Decode `container` if it is an object stream.
    ///
    /// Returns `Ok(None)` when the object is not a stream or its `/Type`
    /// is not `ObjStm`.
    pub fn from_object(container: &IndirectObject) -> Result<Option<Self>> {
        let PDFObject::Stream(stream) = &container.value else {
            debug!(objid = container.objid, "container is not a stream");
            return Ok(None);
        };
        if stream.type_name() != Some("ObjStm") {
            debug!(
                objid = container.objid,
                kind = ?stream.type_name(),
                "container is not an object stream"
            );
            return Ok(None);
        }
        Self::from_stream(container.objid, stream).map(Some)
    }

    fn from_stream(objid: u32, stream: &PDFStream) -> Result<Self> {
        let n = non_negative(stream, "N", objid)?;
        let first = non_negative(stream, "First", objid)?;
        let extends = match stream.get("Extends") {
            None | Some(PDFObject::Null) => None,
            Some(PDFObject::Ref(r)) => Some(*r),
            Some(other) => {
                debug!(objid, kind = other.type_name(), "ignoring malformed /Extends");
                None
            }
        };

        let data = decode_stream(stream)?;
        let header = ObjectStreamHeader::parse(&data[..first.min(data.len())], n);
        Ok(Self {
            objid,
            first,
            extends,
            data,
            header,
        })
    }

    pub const fn objid(&self) -> u32 {
        self.objid
    }

    pub const fn first(&self) -> usize {
        self.first
    }

    pub const fn extends(&self) -> Option<PDFObjRef> {
        self.extends
    }

    pub const fn header(&self) -> &ObjectStreamHeader {
        &self.header
    }

    /// Decoded body, header included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Wrapped bytes of `objnum`, declared at position `index`.
    ///
    /// Returns the object's absolute position in the decoded body with
    /// the synthesized `objnum 0 obj ... endobj` text, or `None` when the
    /// index is out of range or names a different object.
    pub fn extract(&self, objnum: u32, index: usize) -> Option<(usize, Vec<u8>)> {
        let (declared, _) = self.header.get(index)?;
        if declared != objnum {
            debug!(
                container = self.objid,
                index, declared, objnum, "object stream index names another object"
            );
            return None;
        }
        let span = self.header.span(index, self.first, self.data.len())?;
        let start = span.start;
        Some((start, wrap_object(objnum, &self.data[span])))
    }
}

/// `"N 0 obj\r\n<body>\r\nendobj\r\n"`
pub fn wrap_object(objnum: u32, body: &[u8]) -> Vec<u8> {
    let head = format!("{objnum} 0 obj\r\n");
    let mut out = Vec::with_capacity(head.len() + body.len() + 10);
    out.extend_from_slice(head.as_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(b"\r\nendobj\r\n");
    out
}

fn non_negative(stream: &PDFStream, key: &str, objid: u32) -> Result<usize> {
    stream
        .get(key)
        .and_then(|v| v.as_int().ok())
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| {
            PdfError::InvalidData(format!("object stream {objid} has no usable /{key}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::PdfDict;

    #[test]
    fn header_pairs_accept_commas_and_newlines() {
        let header = ObjectStreamHeader::parse(b"5 0,7 15\n9 30 ", 3);
        assert_eq!(header.pairs(), &[(5, 0), (7, 15), (9, 30)]);
        assert_eq!(ObjectStreamHeader::parse(b"5 0 7 15", 1).len(), 1);
        assert_eq!(ObjectStreamHeader::parse(b"5 0 7", 4).len(), 1);
    }

    #[test]
    fn spans_run_to_next_offset_or_end() {
        let header = ObjectStreamHeader::parse(b"5 0 7 15", 2);
        assert_eq!(header.span(0, 20, 50), Some(20..35));
        assert_eq!(header.span(1, 20, 50), Some(35..50));
        assert_eq!(header.span(2, 20, 50), None);
        assert_eq!(header.span(1, 20, 30), Some(30..30));
    }

    fn container(body: &[u8], first: i64) -> IndirectObject {
        let mut attrs = PdfDict::new();
        attrs.insert("Type".into(), PDFObject::Name("ObjStm".into()));
        attrs.insert("N".into(), PDFObject::Int(2));
        attrs.insert("First".into(), PDFObject::Int(first));
        let stream = PDFStream::new(attrs, body.to_vec());
        IndirectObject::new(12, 0, PDFObject::Stream(Box::new(stream)))
    }

    #[test]
    fn extracts_and_wraps_declared_object() {
        let body = b"5 0 7 15            << /A 1 >>     [1 2 3]";
        let objstm = ObjectStream::from_object(&container(body, 20))
            .unwrap()
            .unwrap();
        assert_eq!(objstm.extends(), None);
        let (at, wrapped) = objstm.extract(7, 1).unwrap();
        assert_eq!(at, 35);
        assert_eq!(wrapped, b"7 0 obj\r\n[1 2 3]\r\nendobj\r\n");
        assert!(objstm.extract(5, 1).is_none());
        assert!(objstm.extract(7, 2).is_none());
    }

    #[test]
    fn non_objstm_container_is_skipped() {
        let obj = IndirectObject::new(3, 0, PDFObject::Int(1));
        assert!(ObjectStream::from_object(&obj).unwrap().is_none());
    }
}
