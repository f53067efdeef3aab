//! Cross-reference streams (`/Type /XRef`).

use super::entry::{LocationEntry, RawEntry};
use super::trailer::Trailer;
use crate::error::{PdfError, Result};
use crate::filter::decode_stream;
use crate::model::objects::{PDFObject, PDFStream};
use rustc_hash::FxHashMap;
use tracing::warn;

/// Widest field accepted in `/W`.
const MAX_FIELD_WIDTH: usize = 8;

/// Decoded rows of one cross-reference stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamTable {
    widths: [usize; 3],
    entries: FxHashMap<u32, RawEntry>,
    trailer: Trailer,
}

impl StreamTable {
    /// Decode an already-parsed cross-reference stream.
    pub fn from_stream(stream: &PDFStream) -> Result<Self> {
        let widths = read_widths(stream.get("W"))?;
        let trailer = Trailer::new(stream.attrs.clone());
        let ranges = read_index(stream.get("Index"), trailer.size())?;
        let data = decode_stream(stream)
            .map_err(|e| PdfError::InvalidData(format!("cannot decode xref stream: {e}")))?;
        let entries = decode_rows(&data, widths, &ranges)?;
        Ok(Self {
            widths,
            entries,
            trailer,
        })
    }

    pub const fn widths(&self) -> [usize; 3] {
        self.widths
    }

    pub const fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    /// The raw row for `objnum`, whatever its type.
    pub fn data_for(&self, objnum: u32) -> Option<RawEntry> {
        self.entries.get(&objnum).copied()
    }

    pub fn location_for(&self, objnum: u32) -> Option<LocationEntry> {
        self.data_for(objnum).and_then(LocationEntry::from_raw)
    }

    /// Offset of a type 1 row. Free and compressed rows answer `None`.
    pub fn offset_for(&self, objnum: u32) -> Option<u64> {
        match self.data_for(objnum)? {
            (1, offset, _) => Some(offset),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Object numbers of rows that are not free, in ascending order.
    pub fn object_numbers(&self) -> Vec<u32> {
        let mut nums: Vec<u32> = self
            .entries
            .iter()
            .filter(|(_, (kind, _, _))| *kind != 0)
            .map(|(objnum, _)| *objnum)
            .collect();
        nums.sort_unstable();
        nums
    }
}

fn read_widths(w: Option<&PDFObject>) -> Result<[usize; 3]> {
    let invalid = || PdfError::InvalidData("xref stream /W must hold three field widths".into());
    let arr = w.ok_or_else(invalid)?.as_array().map_err(|_| invalid())?;
    let [w0, w1, w2] = arr.as_slice() else {
        return Err(invalid());
    };
    let mut widths = [0usize; 3];
    for (slot, value) in widths.iter_mut().zip([w0, w1, w2]) {
        *slot = value
            .as_int()
            .ok()
            .and_then(|n| usize::try_from(n).ok())
            .filter(|&n| n <= MAX_FIELD_WIDTH)
            .ok_or_else(|| {
                PdfError::InvalidData(format!("invalid xref stream field width: {value:?}"))
            })?;
    }
    if widths.iter().sum::<usize>() == 0 {
        return Err(PdfError::InvalidData("xref stream rows have zero width".into()));
    }
    Ok(widths)
}

/// `(first object number, count)` ranges; `[0 Size]` when `/Index` is absent or empty.
fn read_index(index: Option<&PDFObject>, size: Option<u32>) -> Result<Vec<(u32, u64)>> {
    let items = match index {
        Some(PDFObject::Array(items)) if !items.is_empty() => items,
        Some(PDFObject::Array(_)) | Some(PDFObject::Null) | None => {
            let size = size.ok_or_else(|| {
                PdfError::InvalidData("xref stream without /Index needs /Size".into())
            })?;
            return Ok(vec![(0, u64::from(size))]);
        }
        Some(other) => {
            return Err(PdfError::InvalidData(format!(
                "xref stream /Index must be an array, got {}",
                other.type_name()
            )));
        }
    };

    if items.len() % 2 != 0 {
        return Err(PdfError::InvalidData(
            "xref stream /Index must hold pairs".into(),
        ));
    }
    items
        .chunks_exact(2)
        .map(|pair| {
            let base = pair[0].as_int().ok().and_then(|n| u32::try_from(n).ok());
            let count = pair[1].as_int().ok().and_then(|n| u64::try_from(n).ok());
            base.zip(count).ok_or_else(|| {
                PdfError::InvalidData(format!("invalid xref stream /Index pair {pair:?}"))
            })
        })
        .collect()
}

fn decode_rows(
    data: &[u8],
    widths: [usize; 3],
    ranges: &[(u32, u64)],
) -> Result<FxHashMap<u32, RawEntry>> {
    let row_width: usize = widths.iter().sum();
    let mut entries = FxHashMap::default();
    let mut rows = data.chunks_exact(row_width);

    'ranges: for &(base, count) in ranges {
        for i in 0..count {
            let Some(row) = rows.next() else {
                warn!(
                    base,
                    count,
                    decoded = i,
                    "xref stream body ends before the declared rows"
                );
                break 'ranges;
            };
            let Some(objnum) = u32::try_from(i).ok().and_then(|i| base.checked_add(i)) else {
                break 'ranges;
            };
            entries.insert(objnum, decode_row(row, widths));
        }
    }

    Ok(entries)
}

fn decode_row(row: &[u8], widths: [usize; 3]) -> RawEntry {
    let (f0, rest) = row.split_at(widths[0]);
    let (f1, f2) = rest.split_at(widths[1]);
    let kind = if widths[0] == 0 { 1 } else { be_uint(f0) };
    (kind, be_uint(f1), be_uint(&f2[..widths[2]]))
}

/// Big-endian unsigned integer; an empty field is 0.
fn be_uint(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}
