//! xrefscope - PDF cross-reference resolution.
//!
//! Locates every indirect object of a PDF file through its chain of
//! classic tables and cross-reference streams, and parses objects stored
//! directly in the file or inside object streams.
//!
//! ```no_run
//! use xrefscope_core::PDFDocument;
//!
//! let data = std::fs::read("document.pdf")?;
//! let doc = PDFDocument::new(&data)?;
//! for objid in doc.object_numbers() {
//!     let obj = doc.getobj(objid)?;
//!     println!("{} {} obj: {}", obj.objid, obj.genno, obj.value.type_name());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod model;
pub mod parser;
pub mod xref;

// Re-export parser modules for convenience
pub use parser::lexer as psparser;
pub use parser::pdf_parser as pdfparser;

// Re-export model modules for convenience
pub use model::objects as pdftypes;

pub use config::XRefConfig;
pub use document::PDFDocument;
pub use error::{PdfError, Result};
pub use xref::CrossReference;
