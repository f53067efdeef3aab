//! Cross-reference streams and objects stored in object streams.

mod common;

use common::{PdfBuilder, deflate, png_up, row};
use xrefscope_core::error::PdfError;
use xrefscope_core::pdftypes::PDFObject;
use xrefscope_core::xref::{LocationEntry, SectionKind};
use xrefscope_core::{PDFDocument, XRefConfig};

const OBJSTM_BODY: &[u8] = b"5 0 7 15            << /A 1 >>     [1 2 3]";

/// Layout of an object stream document built by [`objstm_pdf`].
struct Layout {
    data: Vec<u8>,
    catalog: u64,
    container: u64,
}

/// Objects 5 and 7 live in object stream 10, the xref stream is object 11.
///
/// `overrides` replaces the row of any object number.
fn objstm_pdf(container_dict: &str, container_body: &[u8], overrides: &[(u32, Vec<u8>)]) -> Layout {
    let mut b = PdfBuilder::new();
    let catalog = b.object(1, "<< /Type /Catalog /Pages 7 0 R >>");
    let container = b.stream_object(10, container_dict, container_body);
    let xref_at = b.pos();

    let mut rows = Vec::new();
    for objnum in 0u32..12 {
        let default = match objnum {
            1 => row(1, catalog as u16, 0),
            5 => row(2, 10, 0),
            7 => row(2, 10, 1),
            10 => row(1, container as u16, 0),
            11 => row(1, xref_at as u16, 0),
            _ => row(0, 0, 0),
        };
        let chosen = overrides
            .iter()
            .find(|(n, _)| *n == objnum)
            .map_or(default, |(_, r)| r.clone());
        rows.extend(chosen);
    }
    b.stream_object(
        11,
        "/Type /XRef /W [1 2 1] /Index [0 12] /Size 12 /Root 1 0 R",
        &rows,
    );
    Layout {
        data: b.finish(xref_at),
        catalog,
        container,
    }
}

const FLATE_OBJSTM: &str = "/Type /ObjStm /N 2 /First 20 /Filter /FlateDecode";

#[test]
fn test_stream_rows_by_type() {
    let mut b = PdfBuilder::new();
    let rows = hex::decode("010064000000000002003203").unwrap();
    let xref = b.stream_object(9, "/Type /XRef /W [1 2 1] /Index [0 3] /Size 3", &rows);
    let doc = PDFDocument::new(b.finish(xref)).expect("parse");

    let xref = doc.xref();
    assert_eq!(xref.sections()[0].kind(), SectionKind::Stream);
    assert_eq!(xref.offset_for(0), Some(100));
    assert_eq!(xref.offset_for(1), None);
    assert_eq!(xref.offset_for(2), None);
    assert_eq!(xref.location_data_for(2), Some((2, 50, 3)));
    assert_eq!(xref.location_data_for(1), Some((0, 0, 0)));
    assert_eq!(xref.location_data_for(3), None);

    // container 50 is not in the table
    assert!(matches!(doc.getobj(2), Err(PdfError::ObjectNotFound(50))));
}

#[test]
fn test_compressed_objects_are_extracted() {
    let layout = objstm_pdf(FLATE_OBJSTM, &deflate(OBJSTM_BODY), &[]);
    let doc = PDFDocument::new(&layout.data).expect("parse");

    let seven = doc.getobj(7).expect("object 7");
    assert_eq!(seven.objid, 7);
    assert_eq!(
        seven.value,
        PDFObject::Array(vec![PDFObject::Int(1), PDFObject::Int(2), PDFObject::Int(3)])
    );

    let five = doc.getobj(5).expect("object 5");
    assert_eq!(five.value.as_dict().unwrap()["A"], PDFObject::Int(1));

    assert_eq!(
        doc.xref().location_for(7),
        Some(LocationEntry::Compressed {
            container: 10,
            index: 1
        })
    );
    assert_eq!(doc.xref().offset_for(10), Some(layout.container));
    assert_eq!(doc.xref().offset_for(1), Some(layout.catalog));
    assert_eq!(doc.object_numbers(), vec![1, 5, 7, 10, 11]);
}

#[test]
fn test_catalog_resolves_through_object_stream() {
    let layout = objstm_pdf(FLATE_OBJSTM, &deflate(OBJSTM_BODY), &[]);
    let doc = PDFDocument::new(&layout.data).expect("parse");
    let catalog = doc.catalog().expect("catalog");
    let pages = doc.resolve(&catalog["Pages"]).expect("pages");
    assert_eq!(pages.as_array().unwrap().len(), 3);
}

#[test]
fn test_uncompressed_object_stream() {
    let layout = objstm_pdf("/Type /ObjStm /N 2 /First 20", OBJSTM_BODY, &[]);
    let doc = PDFDocument::new(&layout.data).expect("parse");
    assert_eq!(doc.getobj(7).unwrap().objid, 7);
}

#[test]
fn test_declared_index_must_name_the_object() {
    let layout = objstm_pdf(FLATE_OBJSTM, &deflate(OBJSTM_BODY), &[(7, row(2, 10, 0))]);
    let doc = PDFDocument::new(&layout.data).expect("parse");
    assert!(matches!(doc.getobj(7), Err(PdfError::ObjectNotFound(7))));
}

#[test]
fn test_index_past_header_is_not_found() {
    let layout = objstm_pdf(FLATE_OBJSTM, &deflate(OBJSTM_BODY), &[(7, row(2, 10, 9))]);
    let doc = PDFDocument::new(&layout.data).expect("parse");
    assert!(matches!(doc.getobj(7), Err(PdfError::ObjectNotFound(7))));
}

#[test]
fn test_container_that_is_not_objstm() {
    let layout = objstm_pdf("/Type /XObject /N 2 /First 20", OBJSTM_BODY, &[]);
    let doc = PDFDocument::new(&layout.data).expect("parse");
    assert!(matches!(doc.getobj(5), Err(PdfError::ObjectNotFound(5))));
}

#[test]
fn test_unparseable_slice_reports_location() {
    let body = b"5 0 7 15            << /A 1 >>     )";
    let layout = objstm_pdf(FLATE_OBJSTM, &deflate(body), &[]);
    let doc = PDFDocument::new(&layout.data).expect("parse");
    let err = doc.getobj(7).unwrap_err();
    assert!(
        matches!(err, PdfError::ObjectNotFoundAt { objid: 7, offset: 35, .. }),
        "got {err:?}"
    );
}

#[test]
fn test_self_containing_object_stream_is_circular() {
    let layout = objstm_pdf(
        FLATE_OBJSTM,
        &deflate(OBJSTM_BODY),
        &[(10, row(2, 10, 0))],
    );
    let doc = PDFDocument::new(&layout.data).expect("parse");
    assert!(matches!(
        doc.getobj(5),
        Err(PdfError::CircularObjectStream(10))
    ));
}

#[test]
fn test_object_stream_depth_limit() {
    let layout = objstm_pdf(FLATE_OBJSTM, &deflate(OBJSTM_BODY), &[]);
    let config = XRefConfig::default().with_max_object_stream_depth(0);
    let doc = PDFDocument::new_with_config(&layout.data, &config).expect("parse");
    assert!(matches!(doc.getobj(7), Err(PdfError::InvalidData(_))));
    assert_eq!(doc.getobj(10).unwrap().objid, 10);
}

#[test]
fn test_png_predicted_flate_xref_stream() {
    let mut b = PdfBuilder::new();
    let o1 = b.object(1, "<< /Type /Catalog >>");
    let o2 = b.object(2, "(two)");
    let xref_at = b.pos();
    let rows: Vec<u8> = [
        row(0, 0, 255),
        row(1, o1 as u16, 0),
        row(1, o2 as u16, 0),
        row(1, xref_at as u16, 0),
    ]
    .concat();
    let body = deflate(&png_up(&rows, 4));
    b.stream_object(
        3,
        "/Type /XRef /W [1 2 1] /Size 4 /Root 1 0 R /Filter /FlateDecode /DecodeParms << /Predictor 12 /Columns 4 >>",
        &body,
    );
    let doc = PDFDocument::new(b.finish(xref_at)).expect("parse");

    assert_eq!(doc.xref().offset_for(2), Some(o2));
    assert_eq!(doc.xref().offset_for(3), Some(xref_at));
    assert_eq!(
        doc.getobj(2).unwrap().value,
        PDFObject::String(b"two".to_vec())
    );
    assert_eq!(doc.getobj(3).unwrap().value.as_stream().unwrap().type_name(), Some("XRef"));
}

#[test]
fn test_oversized_predictor_columns_are_invalid() {
    let mut b = PdfBuilder::new();
    let rows = deflate(&png_up(&row(1, 15, 0), 4));
    let xref = b.stream_object(
        1,
        "/Type /XRef /W [1 2 1] /Size 1 /Filter /FlateDecode /DecodeParms << /Predictor 12 /Columns 4611686018427387904 >>",
        &rows,
    );
    let result = PDFDocument::new(b.finish(xref));
    assert!(matches!(result, Err(PdfError::InvalidData(_))), "got {:?}", result.err());
}

#[test]
fn test_encrypted_xref_stream_is_rejected() {
    let mut b = PdfBuilder::new();
    let rows = hex::decode("00000000").unwrap();
    let xref = b.stream_object(1, "/Type /XRef /W [1 2 1] /Size 1 /Encrypt 4 0 R", &rows);
    let result = PDFDocument::new(b.finish(xref));
    assert!(matches!(result, Err(PdfError::Encrypted)));
}

#[test]
fn test_stream_of_other_type_at_xref_offset() {
    let mut b = PdfBuilder::new();
    let at = b.stream_object(1, "/Type /Metadata", b"<x/>");
    let result = PDFDocument::new(b.finish(at));
    assert!(matches!(result, Err(PdfError::InvalidData(_))));
}

#[test]
fn test_hybrid_reference_file() {
    let mut b = PdfBuilder::new();
    let o1 = b.object(1, "<< /Type /Catalog /Pages 3 0 R >>");
    let o2 = b.stream_object(
        2,
        "/Type /ObjStm /N 1 /First 4",
        b"3 0 << /Type /Pages /Count 0 >>",
    );
    let o4 = b.stream_object(
        4,
        "/Type /XRef /W [1 2 1] /Index [3 1] /Size 5",
        &row(2, 2, 0),
    );
    let xref = b.classic_xref(
        &[(0, vec![None, Some(o1), Some(o2), None, Some(o4)])],
        &format!("/Size 5 /Root 1 0 R /XRefStm {o4}"),
    );
    let doc = PDFDocument::new(b.finish(xref)).expect("parse");

    let kinds: Vec<SectionKind> = doc.xref().sections().iter().map(|s| s.kind()).collect();
    assert_eq!(kinds, vec![SectionKind::Fixed, SectionKind::Stream]);

    let catalog = doc.catalog().expect("catalog");
    let pages = doc.resolve(&catalog["Pages"]).expect("pages");
    assert_eq!(pages.as_dict().unwrap()["Count"], PDFObject::Int(0));
}

#[test]
fn test_classic_update_over_xref_stream() {
    let mut b = PdfBuilder::new();
    let o1 = b.object(1, "<< /Type /Catalog >>");
    let o2_old = b.object(2, "(old)");
    let xref1 = b.pos();
    let rows = [
        row(0, 0, 255),
        row(1, o1 as u16, 0),
        row(1, o2_old as u16, 0),
        row(1, xref1 as u16, 0),
    ]
    .concat();
    b.stream_object(3, "/Type /XRef /W [1 2 1] /Size 4 /Root 1 0 R", &rows);
    let o2_new = b.object(2, "(new)");
    let xref2 = b.classic_xref(
        &[(0, vec![None]), (2, vec![Some(o2_new)])],
        &format!("/Size 4 /Root 1 0 R /Prev {xref1}"),
    );
    let doc = PDFDocument::new(b.finish(xref2)).expect("parse");

    assert_eq!(doc.xref().sections().len(), 2);
    assert_eq!(
        doc.getobj(2).unwrap().value,
        PDFObject::String(b"new".to_vec())
    );
    assert_eq!(doc.getobj(1).unwrap().objid, 1);
}
