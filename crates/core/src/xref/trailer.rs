//! Trailer dictionaries.

use crate::model::objects::{PDFObject, PdfDict};
use tracing::warn;

/// Link from a trailer to the previous revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrevLink {
    /// No earlier revision. An absent `/Prev` and `/Prev 0` both end up here.
    End,
    Offset(u64),
}

/// The trailer of one cross-reference section.
///
/// For classic tables this is the dictionary after `trailer`; for
/// cross-reference streams it is the stream dictionary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trailer {
    dict: PdfDict,
}

impl Trailer {
    pub const fn new(dict: PdfDict) -> Self {
        Self { dict }
    }

    pub const fn dict(&self) -> &PdfDict {
        &self.dict
    }

    pub fn get(&self, key: &str) -> Option<&PDFObject> {
        self.dict.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.dict.contains_key(key)
    }

    /// `/Size`, when present and non-negative.
    pub fn size(&self) -> Option<u32> {
        self.int("Size").and_then(|n| u32::try_from(n).ok())
    }

    pub fn root(&self) -> Option<&PDFObject> {
        self.get("Root")
    }

    pub fn has_encrypt(&self) -> bool {
        self.contains("Encrypt")
    }

    pub fn prev(&self) -> PrevLink {
        match self.get("Prev") {
            None => PrevLink::End,
            Some(PDFObject::Int(0)) => PrevLink::End,
            Some(PDFObject::Int(n)) if *n > 0 => PrevLink::Offset(*n as u64),
            Some(other) => {
                warn!(value = ?other, "ignoring unusable /Prev");
                PrevLink::End
            }
        }
    }

    /// `/XRefStm` of a hybrid-reference file.
    pub fn xref_stm(&self) -> Option<u64> {
        self.int("XRefStm")
            .filter(|&n| n > 0)
            .and_then(|n| u64::try_from(n).ok())
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.dict.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_int().ok())
    }
}

impl From<PdfDict> for Trailer {
    fn from(dict: PdfDict) -> Self {
        Self::new(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trailer(entries: &[(&str, PDFObject)]) -> Trailer {
        Trailer::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn prev_zero_is_end() {
        assert_eq!(trailer(&[]).prev(), PrevLink::End);
        assert_eq!(trailer(&[("Prev", PDFObject::Int(0))]).prev(), PrevLink::End);
        assert_eq!(
            trailer(&[("Prev", PDFObject::Int(116))]).prev(),
            PrevLink::Offset(116)
        );
        assert_eq!(
            trailer(&[("Prev", PDFObject::Name("x".into()))]).prev(),
            PrevLink::End
        );
    }

    #[test]
    fn size_and_encrypt() {
        let t = trailer(&[
            ("Size", PDFObject::Int(6)),
            ("Encrypt", PDFObject::Null),
        ]);
        assert_eq!(t.size(), Some(6));
        assert!(t.has_encrypt());
        assert_eq!(t.keys(), vec!["Encrypt", "Size"]);
    }
}
