//! The cross-reference chain of a document and object resolution over it.

use super::entry::{LocationEntry, RawEntry};
use super::fixed::read_fixed;
use super::line::read_lines;
use super::objstm::ObjectStream;
use super::section::{SectionReader, SectionTable, XRefSection};
use super::stream::StreamTable;
use super::trailer::{PrevLink, Trailer};
use crate::config::XRefConfig;
use crate::error::{PdfError, Result};
use crate::model::objects::{IndirectObject, PDFObject};
use crate::parser::{PDFParser, PdfValue, ValueKind, find_header_offset};
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// All cross-reference sections of a document, newest first.
///
/// The parser is not stored: every operation that reads the file takes
/// it as an argument and seeks before reading. Nested lookups move the
/// cursor, so callers must seek again after any call into this type.
#[derive(Debug, Clone)]
pub struct CrossReference {
    sections: Vec<XRefSection>,
    header_offset: usize,
    max_object_stream_depth: usize,
}

impl CrossReference {
    /// Locate `startxref` and read every section reachable through `/Prev`.
    pub fn new(parser: &mut PDFParser, config: &XRefConfig) -> Result<Self> {
        let header_offset = config
            .file_header_offset
            .unwrap_or_else(|| find_header_offset(parser.data()));
        let start = find_startxref(parser, config.trailer_search_length)?;
        debug!(start, header_offset, "found startxref");

        let mut xref = Self {
            sections: Vec::new(),
            header_offset,
            max_object_stream_depth: config.max_object_stream_depth,
        };
        xref.load_chain(parser, start)?;
        Ok(xref)
    }

    /// Base added to every offset read from the file.
    ///
    /// May differ from the configured value when the header-offset retry fired.
    pub const fn header_offset(&self) -> usize {
        self.header_offset
    }

    pub fn sections(&self) -> &[XRefSection] {
        &self.sections
    }

    /// Trailer of the newest section.
    pub fn trailer(&self) -> &Trailer {
        // never empty once constructed
        self.sections[0].trailer()
    }

    /// `/Size` of the newest trailer.
    pub fn size(&self) -> Option<u32> {
        self.trailer().size()
    }

    /// Offset of the first in-use uncompressed entry for `objnum` in chain order.
    pub fn offset_for(&self, objnum: u32) -> Option<u64> {
        self.sections.iter().find_map(|s| s.offset_for(objnum))
    }

    /// Raw row for `objnum` from the first cross-reference stream that has one.
    ///
    /// Classic tables cannot express compressed entries and are skipped.
    pub fn location_data_for(&self, objnum: u32) -> Option<RawEntry> {
        self.sections
            .iter()
            .filter(|s| s.is_stream())
            .find_map(|s| s.raw_data_for(objnum))
    }

    /// The entry that shadows all others for `objnum`, free entries included.
    pub fn location_for(&self, objnum: u32) -> Option<LocationEntry> {
        self.sections.iter().find_map(|s| s.location_for(objnum))
    }

    /// Every in-use object number known to any section, ascending.
    pub fn object_numbers(&self) -> Vec<u32> {
        let nums: BTreeSet<u32> = self
            .sections
            .iter()
            .flat_map(XRefSection::object_numbers)
            .collect();
        nums.into_iter().collect()
    }

    /// Read and parse object `objnum`.
    ///
    /// Uncompressed objects are read from the file at their offset;
    /// compressed ones are cut out of their object stream and parsed with
    /// a separate parser.
    pub fn get_indirect_object(
        &self,
        parser: &mut PDFParser,
        objnum: u32,
    ) -> Result<IndirectObject> {
        let mut containers = Vec::new();
        self.resolve_object(parser, objnum, &mut containers)
    }

    fn resolve_object(
        &self,
        parser: &mut PDFParser,
        objnum: u32,
        containers: &mut Vec<u32>,
    ) -> Result<IndirectObject> {
        if let Some(offset) = self.offset_for(objnum) {
            return self.read_object_at(parser, objnum, offset);
        }

        if let Some(raw) = self.location_data_for(objnum)
            && let Some(LocationEntry::Compressed { container, index }) =
                LocationEntry::from_raw(raw)
            && let Some(obj) =
                self.read_compressed(parser, objnum, container, index, containers)?
        {
            return Ok(obj);
        }

        Err(PdfError::ObjectNotFound(objnum))
    }

    fn read_object_at(
        &self,
        parser: &mut PDFParser,
        objnum: u32,
        offset: u64,
    ) -> Result<IndirectObject> {
        let pos = usize::try_from(offset)
            .ok()
            .and_then(|o| o.checked_add(self.header_offset))
            .unwrap_or(usize::MAX);
        parser.reset(pos);

        let obj = parser
            .read_value_of(ValueKind::Indirect)
            .and_then(PdfValue::into_indirect)
            .map_err(|source| PdfError::ObjectNotFoundAt {
                objid: objnum,
                offset,
                source: Box::new(source),
            })?;

        if obj.objid != objnum {
            return Err(PdfError::WrongObjectFound {
                expected: objnum,
                found: obj.objid,
            });
        }
        Ok(obj)
    }

    /// Resolve `objnum` stored at `index` inside object stream `container`.
    ///
    /// `Ok(None)` means the container does not hold the object where the
    /// cross-reference says it does.
    fn read_compressed(
        &self,
        parser: &mut PDFParser,
        objnum: u32,
        container: u32,
        index: u32,
        containers: &mut Vec<u32>,
    ) -> Result<Option<IndirectObject>> {
        if containers.contains(&container) {
            return Err(PdfError::CircularObjectStream(container));
        }
        if containers.len() >= self.max_object_stream_depth {
            return Err(PdfError::InvalidData(format!(
                "object streams nested deeper than {} levels",
                self.max_object_stream_depth
            )));
        }

        containers.push(container);
        let resolved = self.resolve_object(parser, container, containers);
        containers.pop();
        let container_obj = resolved?;

        let Some(objstm) = ObjectStream::from_object(&container_obj)? else {
            return Ok(None);
        };
        let Some((at, wrapped)) = objstm.extract(objnum, index as usize) else {
            return Ok(None);
        };

        let mut sub = PDFParser::new(wrapped);
        let obj = sub
            .read_value_of(ValueKind::Indirect)
            .and_then(PdfValue::into_indirect)
            .map_err(|source| PdfError::ObjectNotFoundAt {
                objid: objnum,
                offset: at as u64,
                source: Box::new(source),
            })?;

        if obj.objid != objnum {
            return Err(PdfError::WrongObjectFound {
                expected: objnum,
                found: obj.objid,
            });
        }
        Ok(Some(obj))
    }

    fn load_chain(&mut self, parser: &mut PDFParser, start: u64) -> Result<()> {
        let mut visited = FxHashSet::default();
        let mut link = if start == 0 {
            PrevLink::End
        } else {
            PrevLink::Offset(start)
        };
        let mut last_primary = None;

        while let PrevLink::Offset(offset) = link {
            if !visited.insert(offset) {
                warn!(offset, "cross-reference chain loops back, stopping");
                break;
            }

            let section = self.read_section_with_retry(parser, offset)?;
            check_encryption(section.trailer())?;
            debug!(
                offset,
                kind = section.kind().as_str(),
                entries = section.len(),
                "read cross-reference section"
            );

            link = section.trailer().prev();
            let hybrid = section
                .classic()
                .and_then(|t| t.trailer().xref_stm())
                .filter(|stm| visited.insert(*stm));
            self.sections.push(section);
            last_primary = Some(self.sections.len() - 1);

            if let Some(stm) = hybrid {
                match self.read_section(parser, stm) {
                    Ok(section) if section.is_stream() => {
                        check_encryption(section.trailer())?;
                        debug!(offset = stm, "read hybrid xref stream");
                        self.sections.push(section);
                    }
                    Ok(_) => debug!(offset = stm, "/XRefStm does not point at a stream"),
                    Err(err) => debug!(offset = stm, %err, "ignoring unreadable /XRefStm"),
                }
            }
        }

        if let Some(table) = last_primary
            .and_then(|i| self.sections.get_mut(i))
            .and_then(XRefSection::classic_mut)
            && table.fix_faulty_subsection_shift()
        {
            warn!("shifted faulty subsection header down by one");
        }

        if self.sections.is_empty() {
            return Err(PdfError::NoXrefFound);
        }
        Ok(())
    }

    /// Read a section; on `InvalidData` retry once with the header offset at 0.
    fn read_section_with_retry(
        &mut self,
        parser: &mut PDFParser,
        offset: u64,
    ) -> Result<XRefSection> {
        match self.read_section(parser, offset) {
            Err(err) if err.is_invalid_data() && self.header_offset != 0 => {
                warn!(
                    offset,
                    header_offset = self.header_offset,
                    %err,
                    "retrying cross-reference read without header offset"
                );
                self.header_offset = 0;
                self.read_section(parser, offset)
            }
            other => other,
        }
    }

    fn read_section(&self, parser: &mut PDFParser, offset: u64) -> Result<XRefSection> {
        let pos = usize::try_from(offset)
            .ok()
            .and_then(|o| o.checked_add(self.header_offset))
            .filter(|&p| p < parser.len())
            .ok_or_else(|| {
                PdfError::InvalidData(format!("cross-reference offset {offset} is outside the file"))
            })?;

        parser.reset(pos);
        let value = parser.read_value().map_err(|e| invalid_at(pos, &e))?;

        let table = match value {
            PdfValue::Keyword(kw) if kw == b"xref" => {
                let body = parser.tell();
                match read_fixed(parser) {
                    Ok(table) => SectionTable::Fixed(table),
                    Err(err) => {
                        debug!(pos, %err, "strict xref table failed, reading line by line");
                        parser.reset(body);
                        let table = read_lines(parser).map_err(|e| invalid_at(pos, &e))?;
                        SectionTable::Line(table)
                    }
                }
            }
            PdfValue::Indirect(obj) => {
                let PDFObject::Stream(stream) = &obj.value else {
                    return Err(PdfError::InvalidData(format!(
                        "invalid object type at xref reference offset {pos}"
                    )));
                };
                if stream.type_name() != Some("XRef") {
                    return Err(PdfError::InvalidData(format!(
                        "the xref position {pos} points to an incorrect object type"
                    )));
                }
                SectionTable::Stream(StreamTable::from_stream(stream)?)
            }
            other => {
                return Err(PdfError::InvalidData(format!(
                    "the xref position {pos} points to an incorrect object type ({})",
                    other.type_name()
                )));
            }
        };

        Ok(XRefSection::new(offset, table))
    }
}

fn check_encryption(trailer: &Trailer) -> Result<()> {
    if trailer.has_encrypt() {
        return Err(PdfError::Encrypted);
    }
    Ok(())
}

fn invalid_at(pos: usize, err: &PdfError) -> PdfError {
    match err {
        PdfError::InvalidData(msg) => PdfError::InvalidData(msg.clone()),
        other => PdfError::InvalidData(format!("at offset {pos}: {other}")),
    }
}

/// Offset written after the last `startxref` (or `startref`) in the trailing window.
pub fn find_startxref(parser: &mut PDFParser, window: usize) -> Result<u64> {
    let (base, tail) = parser.tail(window);
    let (found, keyword_len) = match rfind(tail, b"startxref") {
        Some(pos) => (pos, b"startxref".len()),
        None => match rfind(tail, b"startref") {
            Some(pos) => (pos, b"startref".len()),
            None => return Err(PdfError::NoStartXrefFound),
        },
    };

    parser.reset(base + found + keyword_len);
    let value = parser
        .read_value_of(ValueKind::Numeric)
        .map_err(|e| PdfError::InvalidData(format!("invalid data after startxref keyword: {e}")))?;

    match value {
        PdfValue::Object(PDFObject::Int(n)) if n >= 0 => Ok(n as u64),
        PdfValue::Object(PDFObject::Real(r)) if r >= 0.0 => Ok(r as u64),
        other => Err(PdfError::InvalidData(format!(
            "invalid startxref value: {other:?}"
        ))),
    }
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
