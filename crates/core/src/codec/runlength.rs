//! RunLength stream decoder.

use crate::error::Result;

/// Decode RunLength-encoded data.
///
/// - Length byte 0-127: copy next (length + 1) bytes literally
/// - Length byte 128: end of data
/// - Length byte 129-255: repeat next byte (257 - length) times
///
/// Truncated input ends decoding without error.
pub fn rldecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let length = data[i];
        i += 1;

        match length {
            128 => break,
            0..=127 => {
                let count = length as usize + 1;
                let end = (i + count).min(data.len());
                result.extend_from_slice(&data[i..end]);
                i = end;
            }
            129..=255 => {
                if let Some(&byte) = data.get(i) {
                    i += 1;
                    result.extend(std::iter::repeat_n(byte, 257 - length as usize));
                }
            }
        }
    }

    Ok(result)
}
