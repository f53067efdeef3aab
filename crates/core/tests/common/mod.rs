//! In-memory PDF assembly for integration tests.
//!
//! Offsets recorded by the builder are real byte positions, relative to
//! the `%PDF-` header unless `absolute_offsets` is set.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;

pub struct PdfBuilder {
    buf: Vec<u8>,
    base: usize,
    absolute_offsets: bool,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::with_prefix(b"")
    }

    /// Start with `prefix` before the `%PDF-` header.
    pub fn with_prefix(prefix: &[u8]) -> Self {
        let mut buf = prefix.to_vec();
        let base = buf.len();
        buf.extend_from_slice(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n");
        Self {
            buf,
            base,
            absolute_offsets: false,
        }
    }

    /// Write offsets as absolute file positions, ignoring the prefix.
    pub fn absolute_offsets(mut self) -> Self {
        self.absolute_offsets = true;
        self
    }

    /// Offset the next write will land at.
    pub fn pos(&self) -> u64 {
        let base = if self.absolute_offsets { 0 } else { self.base };
        (self.buf.len() - base) as u64
    }

    pub fn raw(&mut self, bytes: &[u8]) -> u64 {
        let at = self.pos();
        self.buf.extend_from_slice(bytes);
        at
    }

    pub fn object(&mut self, objid: u32, body: &str) -> u64 {
        self.raw(format!("{objid} 0 obj\n{body}\nendobj\n").as_bytes())
    }

    /// A stream object; `dict` is the dictionary content without `/Length`.
    pub fn stream_object(&mut self, objid: u32, dict: &str, data: &[u8]) -> u64 {
        let at = self.raw(
            format!("{objid} 0 obj\n<< {dict} /Length {} >>\nstream\n", data.len()).as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
        at
    }

    /// A classic table. `None` entries are written free.
    pub fn classic_xref(&mut self, subsections: &[(u32, Vec<Option<u64>>)], trailer: &str) -> u64 {
        let at = self.raw(b"xref\n");
        for (start, entries) in subsections {
            self.buf
                .extend_from_slice(format!("{start} {}\n", entries.len()).as_bytes());
            for entry in entries {
                let line = match entry {
                    Some(offset) => format!("{offset:010} 00000 n\r\n"),
                    None => "0000000000 65535 f\r\n".to_string(),
                };
                self.buf.extend_from_slice(line.as_bytes());
            }
        }
        self.buf
            .extend_from_slice(format!("trailer\n<< {trailer} >>\n").as_bytes());
        at
    }

    pub fn finish(mut self, startxref: u64) -> Vec<u8> {
        self.buf
            .extend_from_slice(format!("startxref\n{startxref}\n%%EOF\n").as_bytes());
        self.buf
    }
}

/// One `W [1 2 1]` row.
pub fn row(kind: u8, field1: u16, field2: u8) -> Vec<u8> {
    let [hi, lo] = field1.to_be_bytes();
    vec![kind, hi, lo, field2]
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// PNG `Up` prediction of fixed-width rows, as producers write xref streams.
pub fn png_up(data: &[u8], columns: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut prev = vec![0u8; columns];
    for chunk in data.chunks(columns) {
        out.push(2);
        for (i, &b) in chunk.iter().enumerate() {
            out.push(b.wrapping_sub(prev[i]));
        }
        prev[..chunk.len()].copy_from_slice(chunk);
    }
    out
}
