//! Stream filter pipeline: raw stream bytes to logical bytes.

use crate::codec::{
    PredictorParams, apply_predictor, ascii85decode, asciihexdecode, lzwdecode_with_earlychange,
    rldecode,
};
use crate::error::{PdfError, Result};
use crate::model::objects::{PDFObject, PDFStream, PdfDict};
use std::io::Read;

/// Decode a stream through every filter named in its dictionary.
///
/// Streams without `/Filter` come back as a copy of their raw bytes.
pub fn decode_stream(stream: &PDFStream) -> Result<Vec<u8>> {
    let filters = filter_names(stream.get_any(&["Filter", "F"]))?;
    let parms = decode_parms(stream.get_any(&["DecodeParms", "DP"]), filters.len());

    let mut output = stream.get_rawdata().to_vec();
    for (name, parms) in filters.iter().zip(parms) {
        output = apply_filter(name, output, parms)?;
    }
    Ok(output)
}

fn filter_names(filter: Option<&PDFObject>) -> Result<Vec<String>> {
    match filter {
        None | Some(PDFObject::Null) => Ok(Vec::new()),
        Some(PDFObject::Name(name)) => Ok(vec![name.clone()]),
        Some(PDFObject::Array(arr)) => arr
            .iter()
            .map(|item| item.as_name().map(str::to_string))
            .collect(),
        Some(other) => Err(PdfError::DecodeError(format!(
            "unsupported /Filter value of type {}",
            other.type_name()
        ))),
    }
}

/// One optional parameter dictionary per filter.
fn decode_parms(parms: Option<&PDFObject>, count: usize) -> Vec<Option<&PdfDict>> {
    let mut out: Vec<Option<&PdfDict>> = match parms {
        Some(PDFObject::Dict(d)) => vec![Some(d)],
        Some(PDFObject::Array(arr)) => arr
            .iter()
            .map(|item| match item {
                PDFObject::Dict(d) => Some(d),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    out.resize(count, None);
    out
}

fn apply_filter(name: &str, data: Vec<u8>, parms: Option<&PdfDict>) -> Result<Vec<u8>> {
    match name {
        "FlateDecode" | "Fl" => {
            let decoded = inflate(&data);
            apply_predictor(decoded, &predictor_params(parms))
        }
        "LZWDecode" | "LZW" => {
            let early_change = int_param(parms, "EarlyChange").unwrap_or(1);
            let decoded = lzwdecode_with_earlychange(&data, early_change)?;
            apply_predictor(decoded, &predictor_params(parms))
        }
        "ASCIIHexDecode" | "AHx" => asciihexdecode(&data),
        "ASCII85Decode" | "A85" => ascii85decode(&data),
        "RunLengthDecode" | "RL" => rldecode(&data),
        other => Err(PdfError::DecodeError(format!("unsupported filter: {other}"))),
    }
}

fn int_param(parms: Option<&PdfDict>, key: &str) -> Option<i64> {
    parms?.get(key)?.as_int().ok()
}

fn predictor_params(parms: Option<&PdfDict>) -> PredictorParams {
    let defaults = PredictorParams::default();
    let positive = |key: &str, default: usize| {
        int_param(parms, key)
            .and_then(|v| usize::try_from(v).ok())
            .filter(|&v| v > 0)
            .unwrap_or(default)
    };
    PredictorParams {
        predictor: int_param(parms, "Predictor").unwrap_or(defaults.predictor),
        colors: positive("Colors", defaults.colors),
        bits_per_component: positive("BitsPerComponent", defaults.bits_per_component),
        columns: positive("Columns", defaults.columns),
    }
}

/// zlib inflate that keeps partial output when the stream is damaged.
fn inflate(data: &[u8]) -> Vec<u8> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    if decoder.read_to_end(&mut decompressed).is_ok() {
        return decompressed;
    }
    decompress_corrupted(data)
}

/// Feed the decoder byte by byte and stop at the first error.
fn decompress_corrupted(data: &[u8]) -> Vec<u8> {
    use flate2::{Decompress, FlushDecompress, Status};
    let mut decoder = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut buf = [0u8; 4096];
    let mut i = 0usize;
    while i < data.len() {
        let before_out = decoder.total_out();
        let before_in = decoder.total_in();
        let res = decoder.decompress(&data[i..i + 1], &mut buf, FlushDecompress::None);
        let produced = (decoder.total_out() - before_out) as usize;
        out.extend_from_slice(&buf[..produced]);
        let consumed = (decoder.total_in() - before_in) as usize;
        i += consumed.max(1);
        match res {
            Ok(Status::StreamEnd) | Err(_) => break,
            Ok(_) => {}
        }
    }
    out
}
