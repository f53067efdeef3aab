//! PDF model types.
//!
//! - `objects` - PDF object types (PDFObject, PDFStream, PDFObjRef, IndirectObject)

pub mod objects;

pub use objects::{IndirectObject, PDFObjRef, PDFObject, PDFStream, PdfDict};
