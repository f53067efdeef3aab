//! Error types for the xrefscope cross-reference engine.

use thiserror::Error;

/// Primary error type for cross-reference and object resolution.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: usize, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("key not found: {0}")]
    KeyError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("unable to find pointer to xref table")]
    NoStartXrefFound,

    #[error("invalid cross-reference data: {0}")]
    InvalidData(String),

    #[error("object {0} not found")]
    ObjectNotFound(u32),

    #[error("object {objid} not found at location {offset}: {source}")]
    ObjectNotFoundAt {
        objid: u32,
        offset: u64,
        #[source]
        source: Box<PdfError>,
    },

    #[error("wrong object found, got {found} while {expected} was expected")]
    WrongObjectFound { expected: u32, found: u32 },

    #[error("document is encrypted and cannot be processed")]
    Encrypted,

    #[error("no cross-reference found")]
    NoXrefFound,

    #[error("object stream {0} references itself through nested containers")]
    CircularObjectStream(u32),

    #[error("circular reference detected for obj {0}")]
    CircularReference(u32),
}

impl PdfError {
    /// True for both the plain and the located form of "object not found".
    pub const fn is_object_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound(_) | Self::ObjectNotFoundAt { .. })
    }

    /// True when the error reports malformed data at a cross-reference position.
    pub const fn is_invalid_data(&self) -> bool {
        matches!(self, Self::InvalidData(_))
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
