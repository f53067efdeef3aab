//! xrefdump - Inspect the cross-reference chain of PDF files
//!
//! Prints each section of the chain, newest first, followed by the
//! resolved location of the requested objects.

use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use memmap2::Mmap;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use xrefscope_core::xref::{LocationEntry, SectionReader, XRefSection};
use xrefscope_core::{CrossReference, PDFDocument, XRefConfig};

#[derive(Parser, Debug)]
#[command(name = "xrefdump")]
#[command(author, version, about = "Inspect PDF cross-reference chains", long_about = None)]
#[command(disable_version_flag = true)]
struct Args {
    /// One or more paths to PDF files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print version information
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: (),

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Comma-separated list of object numbers to locate
    #[arg(short = 'i', long = "objects", value_delimiter = ',')]
    objects: Vec<u32>,

    /// Locate every in-use object of the chain
    #[arg(short = 'a', long = "all", action = ArgAction::SetTrue)]
    all: bool,

    /// Write one JSON document per file instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Byte offset of the `%PDF-` header, overriding detection
    #[arg(long = "header-offset")]
    header_offset: Option<usize>,

    /// Bytes scanned backwards from the end for `startxref`
    #[arg(long = "search-length")]
    search_length: Option<usize>,
}

impl Args {
    fn config(&self) -> XRefConfig {
        let mut config = XRefConfig::default();
        if let Some(len) = self.search_length {
            config = config.with_trailer_search_length(len);
        }
        if let Some(offset) = self.header_offset {
            config = config.with_file_header_offset(offset);
        }
        config
    }
}

#[derive(Serialize)]
struct FileReport {
    path: String,
    header_offset: usize,
    size: Option<u32>,
    sections: Vec<SectionReport>,
    objects: Vec<ObjectReport>,
}

#[derive(Serialize)]
struct SectionReport {
    kind: &'static str,
    offset: u64,
    entries: usize,
    trailer_keys: Vec<String>,
}

#[derive(Serialize)]
struct ObjectReport {
    objnum: u32,
    #[serde(flatten)]
    location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "location", rename_all = "snake_case")]
enum Location {
    Missing,
    Free,
    Uncompressed { offset: u64, generation: u32 },
    Compressed { container: u32, index: u32 },
}

impl From<Option<LocationEntry>> for Location {
    fn from(entry: Option<LocationEntry>) -> Self {
        match entry {
            None => Self::Missing,
            Some(LocationEntry::Free) => Self::Free,
            Some(LocationEntry::Uncompressed { offset, generation }) => {
                Self::Uncompressed { offset, generation }
            }
            Some(LocationEntry::Compressed { container, index }) => {
                Self::Compressed { container, index }
            }
        }
    }
}

impl SectionReport {
    fn new(section: &XRefSection) -> Self {
        Self {
            kind: section.kind().as_str(),
            offset: section.offset(),
            entries: section.len(),
            trailer_keys: section
                .trailer()
                .keys()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// The entry `getobj` follows: an uncompressed offset anywhere in the
/// chain first, then a compressed entry, then whatever the newest section says.
fn resolved_location(xref: &CrossReference, objnum: u32) -> Location {
    let uncompressed = xref.sections().iter().find_map(|s| {
        s.location_for(objnum)
            .filter(|e| matches!(e, LocationEntry::Uncompressed { .. }))
    });
    let compressed = || {
        xref.location_data_for(objnum)
            .and_then(LocationEntry::from_raw)
            .filter(|e| matches!(e, LocationEntry::Compressed { .. }))
    };
    Location::from(
        uncompressed
            .or_else(compressed)
            .or_else(|| xref.location_for(objnum)),
    )
}

fn locate(doc: &PDFDocument, objnum: u32) -> ObjectReport {
    let location = resolved_location(doc.xref(), objnum);
    let (value_type, error) = match location {
        Location::Missing | Location::Free => (None, None),
        _ => match doc.getobj(objnum) {
            Ok(obj) => (Some(obj.value.type_name()), None),
            Err(e) => {
                tracing::debug!(objnum, error = %e, "object failed to load");
                (None, Some(e.to_string()))
            }
        },
    };
    ObjectReport {
        objnum,
        location,
        value_type,
        error,
    }
}

fn build_report(path: &Path, doc: &PDFDocument, args: &Args) -> FileReport {
    let objnums = if args.all {
        doc.object_numbers()
    } else {
        args.objects.clone()
    };
    FileReport {
        path: path.display().to_string(),
        header_offset: doc.xref().header_offset(),
        size: doc.size(),
        sections: doc.xref().sections().iter().map(SectionReport::new).collect(),
        objects: objnums.into_iter().map(|n| locate(doc, n)).collect(),
    }
}

fn write_text<W: Write>(out: &mut W, report: &FileReport) -> io::Result<()> {
    writeln!(out, "{}", report.path)?;
    writeln!(out, "  header offset: {}", report.header_offset)?;
    match report.size {
        Some(size) => writeln!(out, "  size: {size}")?,
        None => writeln!(out, "  size: (none)")?,
    }
    for (i, section) in report.sections.iter().enumerate() {
        writeln!(
            out,
            "  section {i}: {} at {} ({} entries) trailer [{}]",
            section.kind,
            section.offset,
            section.entries,
            section.trailer_keys.join(" ")
        )?;
    }
    for obj in &report.objects {
        let loc = match obj.location {
            Location::Missing => "missing".to_string(),
            Location::Free => "free".to_string(),
            Location::Uncompressed { offset, generation } => {
                format!("offset {offset} gen {generation}")
            }
            Location::Compressed { container, index } => {
                format!("in {container} index {index}")
            }
        };
        write!(out, "  obj {}: {loc}", obj.objnum)?;
        if let Some(t) = obj.value_type {
            write!(out, " -> {t}")?;
        }
        if let Some(e) = &obj.error {
            write!(out, " !! {e}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let config = args.config();
    let mut output = BufWriter::new(io::stdout());

    for path in &args.files {
        if !path.exists() {
            bail!("file not found: {}", path.display());
        }
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mmap = unsafe { Mmap::map(&file) }?;
        let doc = PDFDocument::new_from_mmap_with_config(mmap, &config)
            .with_context(|| format!("reading cross-references of {}", path.display()))?;

        let report = build_report(path, &doc, &args);
        if args.json {
            serde_json::to_writer(&mut output, &report)?;
            writeln!(output)?;
        } else {
            write_text(&mut output, &report)?;
        }
    }

    output.flush()?;
    Ok(())
}
