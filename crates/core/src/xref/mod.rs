//! Cross-reference tables, streams and object resolution.
//!
//! - `fixed` / `line` - classic `xref` tables, strict and lenient
//! - `stream` - `/Type /XRef` streams
//! - `objstm` - `/Type /ObjStm` containers
//! - `resolver` - the `/Prev` chain and object lookup

pub mod entry;
pub mod fixed;
pub mod line;
pub mod objstm;
pub mod resolver;
pub mod section;
pub mod stream;
pub mod trailer;

pub use entry::{LocationEntry, RawEntry};
pub use fixed::{ClassicEntry, ClassicTable, Subsection};
pub use objstm::{ObjectStream, ObjectStreamHeader};
pub use resolver::{CrossReference, find_startxref};
pub use section::{SectionKind, SectionReader, SectionTable, XRefSection};
pub use stream::StreamTable;
pub use trailer::{PrevLink, Trailer};
