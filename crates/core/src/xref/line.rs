//! Lenient reader for classic tables that are not fixed-width.
//!
//! Producers write entries with missing or doubled EOL bytes, or with
//! mixed line endings. This reader splits the table into lines and
//! interprets each one by its number of fields.

use super::fixed::{ClassicEntry, ClassicTable, Subsection, read_trailer};
use crate::error::{PdfError, Result};
use crate::parser::PDFParser;

/// Read a classic table line by line.
///
/// The parser must sit just after the `xref` keyword.
pub fn read_lines(parser: &mut PDFParser) -> Result<ClassicTable> {
    let start = parser.tell();
    let rest = &parser.data()[start..];
    let trailer_pos = rest
        .windows(b"trailer".len())
        .position(|w| w == b"trailer")
        .ok_or_else(|| {
            PdfError::InvalidData("unexpected end of cross reference, no trailer found".into())
        })?;

    let subsections = parse_lines(&rest[..trailer_pos])?;

    parser.reset(start + trailer_pos);
    let trailer = read_trailer(parser)?;
    Ok(ClassicTable::new(subsections, trailer))
}

fn parse_lines(content: &[u8]) -> Result<Vec<Subsection>> {
    if !content.iter().any(|&b| b == b'\r' || b == b'\n') {
        return Err(PdfError::InvalidData(
            "no data found in cross-reference".into(),
        ));
    }

    let mut subsections: Vec<Subsection> = Vec::new();
    let lines = content
        .split(|&b| b == b'\r' || b == b'\n')
        .map(|line| line.trim_ascii())
        .filter(|line| !line.is_empty());

    for line in lines {
        let text = String::from_utf8_lossy(line);
        let pieces: Vec<&str> = text.split_ascii_whitespace().collect();
        match pieces.as_slice() {
            [start, _count] => {
                let start = start.parse().map_err(|_| unexpected(&text))?;
                subsections.push(Subsection {
                    start,
                    entries: Vec::new(),
                });
            }
            [offset, generation, kind @ ("n" | "f")] => {
                let entry = ClassicEntry {
                    offset: offset.parse().map_err(|_| unexpected(&text))?,
                    generation: generation.parse().map_err(|_| unexpected(&text))?,
                    in_use: *kind == "n",
                };
                match subsections.last_mut() {
                    Some(sub) => sub.entries.push(entry),
                    // entries before any header count from object 0
                    None => subsections.push(Subsection {
                        start: 0,
                        entries: vec![entry],
                    }),
                }
            }
            _ => return Err(unexpected(&text)),
        }
    }

    Ok(subsections)
}

fn unexpected(line: &str) -> PdfError {
    PdfError::InvalidData(format!("unexpected data in xref table ({line})"))
}
