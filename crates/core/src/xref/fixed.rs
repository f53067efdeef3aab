//! Classic `xref` tables with fixed 20-byte entries.
//!
//! ```text
//! xref
//! 0 3
//! 0000000000 65535 f
//! 0000000017 00000 n
//! 0000000081 00000 n
//! trailer
//! << /Size 3 /Root 1 0 R >>
//! ```

use super::entry::{LocationEntry, RawEntry};
use super::trailer::Trailer;
use crate::error::{PdfError, Result};
use crate::model::objects::PDFObject;
use crate::parser::{PDFParser, PdfValue, ValueKind};

/// Byte length of one table entry, EOL included.
pub const ENTRY_LEN: usize = 20;

/// Longest subsection header line considered.
const HEADER_LINE_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassicEntry {
    pub offset: u64,
    pub generation: u32,
    pub in_use: bool,
}

impl ClassicEntry {
    pub const fn location(self) -> LocationEntry {
        if self.in_use {
            LocationEntry::Uncompressed {
                offset: self.offset,
                generation: self.generation,
            }
        } else {
            LocationEntry::Free
        }
    }
}

/// A run of consecutive object numbers starting at `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subsection {
    pub start: u32,
    pub entries: Vec<ClassicEntry>,
}

impl Subsection {
    pub fn get(&self, objnum: u32) -> Option<&ClassicEntry> {
        let idx = objnum.checked_sub(self.start)?;
        self.entries.get(idx as usize)
    }
}

/// A parsed plain-text cross-reference table and its trailer.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassicTable {
    subsections: Vec<Subsection>,
    trailer: Trailer,
}

impl ClassicTable {
    pub const fn new(subsections: Vec<Subsection>, trailer: Trailer) -> Self {
        Self {
            subsections,
            trailer,
        }
    }

    pub fn subsections(&self) -> &[Subsection] {
        &self.subsections
    }

    pub const fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    /// The entry for `objnum` from the first subsection covering it.
    pub fn entry_for(&self, objnum: u32) -> Option<ClassicEntry> {
        self.subsections
            .iter()
            .find_map(|sub| sub.get(objnum))
            .copied()
    }

    pub fn location_for(&self, objnum: u32) -> Option<LocationEntry> {
        self.entry_for(objnum).map(ClassicEntry::location)
    }

    pub fn raw_data_for(&self, objnum: u32) -> Option<RawEntry> {
        self.location_for(objnum).map(LocationEntry::to_raw)
    }

    /// Offset of an in-use entry; free entries answer `None`.
    pub fn offset_for(&self, objnum: u32) -> Option<u64> {
        self.location_for(objnum).and_then(LocationEntry::offset)
    }

    /// Total number of entries over all subsections.
    pub fn len(&self) -> usize {
        self.subsections.iter().map(|s| s.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Object numbers of in-use entries.
    pub fn object_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.subsections.iter().flat_map(|sub| {
            sub.entries
                .iter()
                .zip(sub.start..)
                .filter(|(entry, _)| entry.in_use)
                .map(|(_, objnum)| objnum)
        })
    }

    /// Repair a table whose only subsection header is off by one.
    ///
    /// Some producers write `1 N` above a table that starts with the
    /// object 0 free-list head. Returns true when the shift was applied.
    pub fn fix_faulty_subsection_shift(&mut self) -> bool {
        let [only] = self.subsections.as_slice() else {
            return false;
        };
        if only.start != 1 || self.offset_for(1).is_some() {
            return false;
        }
        for sub in &mut self.subsections {
            sub.start = sub.start.saturating_sub(1);
        }
        true
    }
}

/// Read a table in strict fixed-width form.
///
/// The parser must sit just after the `xref` keyword. Any deviation from
/// 20-byte entries fails with `InvalidData`.
pub fn read_fixed(parser: &mut PDFParser) -> Result<ClassicTable> {
    let data = parser.data().clone();
    let mut pos = parser.tell();
    let mut headers: Vec<(u32, usize, usize)> = Vec::new();
    let mut last_line_start = pos;
    let mut validity_checked = false;

    while let Some((line, next)) = read_line(&data, pos, HEADER_LINE_LEN) {
        if contains(line, b"trailer") {
            break;
        }
        pos = next;
        let Some((start, count)) = parse_header_line(line) else {
            continue;
        };

        if !validity_checked && count > 0 {
            check_entry_width(&data, pos)?;
            validity_checked = true;
        }

        headers.push((start, pos, count));
        last_line_start = count
            .checked_mul(ENTRY_LEN)
            .and_then(|len| pos.checked_add(len))
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                PdfError::InvalidData(format!(
                    "subsection {start} {count} runs past the end of the file"
                ))
            })?;
        pos = last_line_start;
    }

    if headers.is_empty() {
        return Err(PdfError::InvalidData(
            "no entries found in cross-reference".into(),
        ));
    }

    let subsections = headers
        .into_iter()
        .map(|(start, at, count)| {
            let entries = (0..count)
                .map(|i| parse_entry(&data[at + i * ENTRY_LEN..at + (i + 1) * ENTRY_LEN]))
                .collect::<Result<Vec<_>>>()?;
            Ok(Subsection { start, entries })
        })
        .collect::<Result<Vec<_>>>()?;

    parser.reset(last_line_start);
    let trailer = read_trailer(parser)?;
    Ok(ClassicTable::new(subsections, trailer))
}

/// Read `trailer << ... >>` at the cursor.
pub(crate) fn read_trailer(parser: &mut PDFParser) -> Result<Trailer> {
    let keyword = parser.read_value()?;
    if !keyword.is_keyword(b"trailer") {
        return Err(PdfError::InvalidData(format!(
            "unexpected end of cross reference, 'trailer' keyword expected, got {}",
            keyword.type_name()
        )));
    }
    match parser.read_value_of(ValueKind::Dictionary)? {
        PdfValue::Object(PDFObject::Dict(dict)) => Ok(Trailer::new(dict)),
        other => Err(PdfError::TypeError {
            expected: "dict",
            got: other.type_name(),
        }),
    }
}

/// One line of at most `max` bytes starting at `pos`, and the position after it.
fn read_line(data: &[u8], pos: usize, max: usize) -> Option<(&[u8], usize)> {
    if pos >= data.len() {
        return None;
    }
    let mut end = pos;
    loop {
        match data.get(end) {
            None => return Some((&data[pos..end], end)),
            Some(b'\n') => return Some((&data[pos..end], end + 1)),
            Some(b'\r') => {
                let next = if data.get(end + 1) == Some(&b'\n') {
                    end + 2
                } else {
                    end + 1
                };
                return Some((&data[pos..end], next));
            }
            Some(_) => {
                end += 1;
                if end - pos >= max {
                    return Some((&data[pos..end], end));
                }
            }
        }
    }
}

/// `start count`, leading whitespace allowed.
fn parse_header_line(line: &[u8]) -> Option<(u32, usize)> {
    let text = std::str::from_utf8(line).ok()?;
    let mut parts = text.split_ascii_whitespace();
    let start = parts.next()?.parse().ok()?;
    let count = parts.next()?.parse().ok()?;
    Some((start, count))
}

/// The first entry must be exactly 20 bytes: 18 visible plus a 2-byte EOL.
fn check_entry_width(data: &[u8], pos: usize) -> Result<()> {
    let probe = &data[pos..data.len().min(pos + ENTRY_LEN + 1)];
    if trim(probe).len() != ENTRY_LEN + 1 {
        return Err(PdfError::InvalidData(
            "cross-reference entries are larger than 20 bytes".into(),
        ));
    }
    if trim(&probe[..ENTRY_LEN]).len() != 18 {
        return Err(PdfError::InvalidData(
            "cross-reference entries are less than 20 bytes".into(),
        ));
    }
    Ok(())
}

fn parse_entry(raw: &[u8]) -> Result<ClassicEntry> {
    let invalid = || {
        PdfError::InvalidData(format!(
            "malformed cross-reference entry: {:?}",
            String::from_utf8_lossy(raw)
        ))
    };
    let offset = parse_digits(&raw[0..10]).ok_or_else(invalid)?;
    let generation = parse_digits(&raw[11..16])
        .and_then(|g| u32::try_from(g).ok())
        .ok_or_else(invalid)?;
    let in_use = match raw[17] {
        b'n' => true,
        b'f' => false,
        _ => return Err(invalid()),
    };
    Ok(ClassicEntry {
        offset,
        generation,
        in_use,
    })
}

fn parse_digits(field: &[u8]) -> Option<u64> {
    if field.is_empty() || !field.iter().all(u8::is_ascii_digit) {
        return None;
    }
    field
        .iter()
        .try_fold(0u64, |acc, &d| acc.checked_mul(10)?.checked_add(u64::from(d - b'0')))
}

fn trim(bytes: &[u8]) -> &[u8] {
    let is_space = |b: &u8| matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\0' | b'\x0b');
    let start = bytes.iter().position(|b| !is_space(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_space(b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
