//! PDFDocument facade: construction, reference resolution and catalog access.

mod common;

use bytes::Bytes;
use common::PdfBuilder;
use xrefscope_core::error::PdfError;
use xrefscope_core::pdftypes::{PDFObjRef, PDFObject};
use xrefscope_core::PDFDocument;

fn linked_pdf() -> Vec<u8> {
    let mut b = PdfBuilder::new();
    let o1 = b.object(1, "<< /Type /Catalog /Pages 2 0 R /Extra 3 0 R >>");
    let o2 = b.object(2, "<< /Type /Pages /Count 1 >>");
    let o3 = b.object(3, "4 0 R");
    let o4 = b.object(4, "(end of chain)");
    let o5 = b.object(5, "6 0 R");
    let o6 = b.object(6, "5 0 R");
    let xref = b.classic_xref(
        &[(
            0,
            vec![None, Some(o1), Some(o2), Some(o3), Some(o4), Some(o5), Some(o6)],
        )],
        "/Size 7 /Root 1 0 R",
    );
    b.finish(xref)
}

#[test]
fn test_resolve_follows_reference_chains() {
    let doc = PDFDocument::new(linked_pdf()).expect("parse");
    let value = doc
        .resolve(&PDFObject::Ref(PDFObjRef::new(3, 0)))
        .expect("resolve");
    assert_eq!(value, PDFObject::String(b"end of chain".to_vec()));
}

#[test]
fn test_resolve_returns_direct_objects_unchanged() {
    let doc = PDFDocument::new(linked_pdf()).expect("parse");
    assert_eq!(
        doc.resolve(&PDFObject::Int(12)).unwrap(),
        PDFObject::Int(12)
    );
}

#[test]
fn test_resolve_detects_reference_loops() {
    let doc = PDFDocument::new(linked_pdf()).expect("parse");
    let result = doc.resolve(&PDFObject::Ref(PDFObjRef::new(5, 0)));
    assert!(matches!(result, Err(PdfError::CircularReference(5))));
}

#[test]
fn test_catalog_and_trailer() {
    let doc = PDFDocument::new(linked_pdf()).expect("parse");
    let catalog = doc.catalog().expect("catalog");
    assert_eq!(catalog["Type"].as_name().unwrap(), "Catalog");
    assert_eq!(doc.trailer().keys(), vec!["Root", "Size"]);
    assert_eq!(doc.size(), Some(7));
}

#[test]
fn test_missing_root_is_key_error() {
    let mut b = PdfBuilder::new();
    let o1 = b.object(1, "null");
    let xref = b.classic_xref(&[(0, vec![None, Some(o1)])], "/Size 2");
    let doc = PDFDocument::new(b.finish(xref)).expect("parse");
    assert!(matches!(doc.catalog(), Err(PdfError::KeyError(_))));
}

#[test]
fn test_from_shared_bytes() {
    let data = Bytes::from(linked_pdf());
    let doc = PDFDocument::new_from_bytes(data.clone()).expect("parse");
    assert_eq!(doc.bytes(), &data[..]);
    assert_eq!(doc.object_numbers(), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_repeated_lookups_are_independent() {
    let doc = PDFDocument::new(linked_pdf()).expect("parse");
    let first = doc.getobj(2).unwrap();
    let _ = doc.getobj(4).unwrap();
    assert_eq!(doc.getobj(2).unwrap(), first);
}

#[test]
fn test_from_mmap() {
    let path = std::env::temp_dir().join(format!("xrefscope-mmap-{}.pdf", std::process::id()));
    std::fs::write(&path, linked_pdf()).unwrap();
    let file = std::fs::File::open(&path).unwrap();
    let mmap = unsafe { memmap2::Mmap::map(&file) }.unwrap();
    let doc = PDFDocument::new_from_mmap(mmap).expect("parse");
    assert_eq!(doc.getobj(4).unwrap().objid, 4);
    drop(doc);
    let _ = std::fs::remove_file(&path);
}
