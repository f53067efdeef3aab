//! Object location entries.

/// Raw `(type, field1, field2)` row as stored in a cross-reference stream.
pub type RawEntry = (u64, u64, u64);

/// Where an object lives in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationEntry {
    Free,
    /// Byte offset of `N G obj`, relative to the header offset.
    Uncompressed { offset: u64, generation: u32 },
    /// Stored inside the object stream `container` at position `index`.
    Compressed { container: u32, index: u32 },
}

impl LocationEntry {
    /// Interpret a raw row. Unknown types and out-of-range fields give `None`.
    pub fn from_raw((kind, field1, field2): RawEntry) -> Option<Self> {
        match kind {
            0 => Some(Self::Free),
            1 => Some(Self::Uncompressed {
                offset: field1,
                generation: u32::try_from(field2).ok()?,
            }),
            2 => Some(Self::Compressed {
                container: u32::try_from(field1).ok()?,
                index: u32::try_from(field2).ok()?,
            }),
            _ => None,
        }
    }

    pub fn to_raw(self) -> RawEntry {
        match self {
            Self::Free => (0, 0, 0),
            Self::Uncompressed { offset, generation } => (1, offset, u64::from(generation)),
            Self::Compressed { container, index } => (2, u64::from(container), u64::from(index)),
        }
    }

    pub const fn offset(self) -> Option<u64> {
        match self {
            Self::Uncompressed { offset, .. } => Some(offset),
            _ => None,
        }
    }

    pub const fn is_in_use(self) -> bool {
        !matches!(self, Self::Free)
    }
}
