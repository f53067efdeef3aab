//! ASCII85 and ASCIIHex stream decoders.

use crate::error::{PdfError, Result};

/// Decode ASCII85-encoded data (PDF variant).
/// Handles: z-encoding, <~ ~> markers, whitespace, missing EOD.
pub fn ascii85decode(data: &[u8]) -> Result<Vec<u8>> {
    let data = data.strip_prefix(b"<~").unwrap_or(data);

    // Everything from the first '~' on is the EOD marker or trailing junk
    let data = match data.iter().position(|&b| b == b'~') {
        Some(pos) => &data[..pos],
        None => data,
    };

    let mut filtered = Vec::with_capacity(data.len());
    for &byte in data {
        match byte {
            b' ' | b'\t' | b'\n' | b'\r' | b'\x00' | b'\x0c' => {}
            b'z' if filtered.len() % 5 == 0 => filtered.extend_from_slice(b"!!!!!"),
            b'!'..=b'u' => filtered.push(byte),
            other => {
                return Err(PdfError::DecodeError(format!(
                    "invalid ASCII85 byte {other:#04x}"
                )));
            }
        }
    }

    let mut result = Vec::with_capacity(filtered.len() / 5 * 4 + 4);
    for chunk in filtered.chunks(5) {
        let mut padded = [b'u'; 5];
        padded[..chunk.len()].copy_from_slice(chunk);
        let value = padded
            .iter()
            .fold(0u64, |acc, &b| acc * 85 + u64::from(b - b'!'));
        let bytes = (value as u32).to_be_bytes();
        if chunk.len() == 5 {
            result.extend_from_slice(&bytes);
        } else if chunk.len() > 1 {
            result.extend_from_slice(&bytes[..chunk.len() - 1]);
        }
    }

    Ok(result)
}

/// Decode ASCIIHex-encoded data.
pub fn asciihexdecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() / 2);
    let mut pending: Option<u8> = None;

    for &byte in data {
        if byte == b'>' {
            break;
        }
        let Some(nibble) = hex_nibble(byte) else {
            continue;
        };
        match pending.take() {
            Some(high) => result.push((high << 4) | nibble),
            None => pending = Some(nibble),
        }
    }

    if let Some(high) = pending {
        result.push(high << 4);
    }

    Ok(result)
}

const fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
