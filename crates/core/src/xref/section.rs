//! One revision's cross-reference section.

use super::entry::{LocationEntry, RawEntry};
use super::fixed::ClassicTable;
use super::stream::StreamTable;
use super::trailer::Trailer;

/// Lookups every section kind answers.
pub trait SectionReader {
    /// Location of `objnum` in this section, free entries included.
    fn location_for(&self, objnum: u32) -> Option<LocationEntry>;

    /// Raw `(type, field1, field2)` row for `objnum`.
    fn raw_data_for(&self, objnum: u32) -> Option<RawEntry> {
        self.location_for(objnum).map(LocationEntry::to_raw)
    }

    fn trailer(&self) -> &Trailer;

    /// Byte offset of an in-use, uncompressed `objnum`.
    fn offset_for(&self, objnum: u32) -> Option<u64> {
        self.location_for(objnum).and_then(LocationEntry::offset)
    }
}

impl SectionReader for ClassicTable {
    fn location_for(&self, objnum: u32) -> Option<LocationEntry> {
        ClassicTable::location_for(self, objnum)
    }

    fn trailer(&self) -> &Trailer {
        ClassicTable::trailer(self)
    }
}

impl SectionReader for StreamTable {
    fn location_for(&self, objnum: u32) -> Option<LocationEntry> {
        StreamTable::location_for(self, objnum)
    }

    fn raw_data_for(&self, objnum: u32) -> Option<RawEntry> {
        self.data_for(objnum)
    }

    fn trailer(&self) -> &Trailer {
        StreamTable::trailer(self)
    }

    fn offset_for(&self, objnum: u32) -> Option<u64> {
        StreamTable::offset_for(self, objnum)
    }
}

/// Which reader produced a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Classic table read in strict fixed-width form.
    Fixed,
    /// Classic table read by the lenient line reader.
    Line,
    /// Cross-reference stream.
    Stream,
}

impl SectionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Line => "line",
            Self::Stream => "stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionTable {
    Fixed(ClassicTable),
    Line(ClassicTable),
    Stream(StreamTable),
}

/// A section plus the offset it was found at.
#[derive(Debug, Clone, PartialEq)]
pub struct XRefSection {
    offset: u64,
    table: SectionTable,
}

impl XRefSection {
    pub const fn new(offset: u64, table: SectionTable) -> Self {
        Self { offset, table }
    }

    /// Offset as written in the file, before the header offset is applied.
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    pub const fn table(&self) -> &SectionTable {
        &self.table
    }

    pub const fn kind(&self) -> SectionKind {
        match self.table {
            SectionTable::Fixed(_) => SectionKind::Fixed,
            SectionTable::Line(_) => SectionKind::Line,
            SectionTable::Stream(_) => SectionKind::Stream,
        }
    }

    pub const fn is_stream(&self) -> bool {
        matches!(self.table, SectionTable::Stream(_))
    }

    pub const fn classic(&self) -> Option<&ClassicTable> {
        match &self.table {
            SectionTable::Fixed(t) | SectionTable::Line(t) => Some(t),
            SectionTable::Stream(_) => None,
        }
    }

    pub const fn classic_mut(&mut self) -> Option<&mut ClassicTable> {
        match &mut self.table {
            SectionTable::Fixed(t) | SectionTable::Line(t) => Some(t),
            SectionTable::Stream(_) => None,
        }
    }

    fn reader(&self) -> &dyn SectionReader {
        match &self.table {
            SectionTable::Fixed(t) | SectionTable::Line(t) => t,
            SectionTable::Stream(t) => t,
        }
    }

    /// Number of entries the section declares.
    pub fn len(&self) -> usize {
        match &self.table {
            SectionTable::Fixed(t) | SectionTable::Line(t) => t.len(),
            SectionTable::Stream(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// In-use object numbers, ascending.
    pub fn object_numbers(&self) -> Vec<u32> {
        match &self.table {
            SectionTable::Fixed(t) | SectionTable::Line(t) => {
                let mut nums: Vec<u32> = t.object_numbers().collect();
                nums.sort_unstable();
                nums.dedup();
                nums
            }
            SectionTable::Stream(t) => t.object_numbers(),
        }
    }
}

impl SectionReader for XRefSection {
    fn location_for(&self, objnum: u32) -> Option<LocationEntry> {
        self.reader().location_for(objnum)
    }

    fn raw_data_for(&self, objnum: u32) -> Option<RawEntry> {
        self.reader().raw_data_for(objnum)
    }

    fn trailer(&self) -> &Trailer {
        self.reader().trailer()
    }

    fn offset_for(&self, objnum: u32) -> Option<u64> {
        self.reader().offset_for(objnum)
    }
}
