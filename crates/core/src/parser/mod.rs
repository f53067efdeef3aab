//! PDF parsing modules.
//!
//! - `lexer`: byte tokenizer
//! - `pdf_parser`: PDF value parser (direct objects, keywords, indirect objects)

pub mod lexer;
pub mod pdf_parser;

// Re-export main types for convenience
pub use lexer::{PSBaseParser, PSToken};
pub use pdf_parser::{PDFParser, PdfValue, ValueKind, find_header_offset};
