//! PDF document facade over the cross-reference engine.

use crate::config::XRefConfig;
use crate::error::{PdfError, Result};
use crate::model::objects::{IndirectObject, PDFObject, PdfDict};
use crate::parser::PDFParser;
use crate::xref::{CrossReference, Trailer};
use bytes::Bytes;
use memmap2::Mmap;
use rustc_hash::FxHashSet;

/// An opened PDF: the file bytes and their cross-reference chain.
///
/// Objects are not cached; every lookup parses them again with a fresh
/// parser over the shared buffer.
#[derive(Debug)]
pub struct PDFDocument {
    data: Bytes,
    xref: CrossReference,
}

impl PDFDocument {
    /// Create a new PDFDocument from raw PDF data.
    pub fn new<D: AsRef<[u8]>>(data: D) -> Result<Self> {
        Self::new_with_config(data, &XRefConfig::default())
    }

    pub fn new_with_config<D: AsRef<[u8]>>(data: D, config: &XRefConfig) -> Result<Self> {
        Self::new_from_bytes_with_config(Bytes::copy_from_slice(data.as_ref()), config)
    }

    /// Create a new PDFDocument from a memory-mapped PDF.
    pub fn new_from_mmap(mmap: Mmap) -> Result<Self> {
        Self::new_from_mmap_with_config(mmap, &XRefConfig::default())
    }

    pub fn new_from_mmap_with_config(mmap: Mmap, config: &XRefConfig) -> Result<Self> {
        Self::new_from_bytes_with_config(Bytes::from_owner(mmap), config)
    }

    /// Create a new PDFDocument from shared bytes (zero-copy).
    pub fn new_from_bytes(data: Bytes) -> Result<Self> {
        Self::new_from_bytes_with_config(data, &XRefConfig::default())
    }

    pub fn new_from_bytes_with_config(data: Bytes, config: &XRefConfig) -> Result<Self> {
        let mut parser = PDFParser::new(data.clone());
        let xref = CrossReference::new(&mut parser, config)?;
        Ok(Self { data, xref })
    }

    /// Returns the raw PDF bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub const fn xref(&self) -> &CrossReference {
        &self.xref
    }

    /// Trailer of the newest revision.
    pub fn trailer(&self) -> &Trailer {
        self.xref.trailer()
    }

    pub fn size(&self) -> Option<u32> {
        self.xref.size()
    }

    /// In-use object numbers over every revision, ascending.
    pub fn object_numbers(&self) -> Vec<u32> {
        self.xref.object_numbers()
    }

    /// Read object `objid` from the file.
    pub fn getobj(&self, objid: u32) -> Result<IndirectObject> {
        let mut parser = PDFParser::new(self.data.clone());
        self.xref.get_indirect_object(&mut parser, objid)
    }

    /// Follow references until a direct object is reached.
    pub fn resolve(&self, obj: &PDFObject) -> Result<PDFObject> {
        let mut seen = FxHashSet::default();
        let mut current = obj.clone();
        while let PDFObject::Ref(r) = current {
            if !seen.insert(r.objid) {
                return Err(PdfError::CircularReference(r.objid));
            }
            current = self.getobj(r.objid)?.into_value();
        }
        Ok(current)
    }

    /// The document catalog named by `/Root`.
    pub fn catalog(&self) -> Result<PdfDict> {
        let root = self
            .trailer()
            .root()
            .ok_or_else(|| PdfError::KeyError("Root".into()))?;
        match self.resolve(root)? {
            PDFObject::Dict(dict) => Ok(dict),
            other => Err(PdfError::TypeError {
                expected: "dict",
                got: other.type_name(),
            }),
        }
    }
}
