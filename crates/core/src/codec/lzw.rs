//! LZW stream decoder using weezl crate.

use crate::error::Result;
use weezl::{BitOrder, decode::Decoder};

/// Decode LZW-encoded data with EarlyChange setting.
///
/// EarlyChange=1 is the PDF default; EarlyChange=0 uses TIFF size switching.
pub fn lzwdecode_with_earlychange(data: &[u8], early_change: i64) -> Result<Vec<u8>> {
    let mut decoder = if early_change == 0 {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    } else {
        Decoder::new(BitOrder::Msb, 8)
    };
    let mut output = Vec::new();
    // Corrupt tails are common; keep whatever decoded before the error.
    let _ = decoder.into_vec(&mut output).decode(data);
    Ok(output)
}
