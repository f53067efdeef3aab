//! PNG and TIFF predictor reversal for Flate/LZW streams.

use crate::error::{PdfError, Result};

/// Parameters read from a `DecodeParms` dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorParams {
    pub predictor: i64,
    pub colors: usize,
    pub bits_per_component: usize,
    pub columns: usize,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

impl PredictorParams {
    /// Bytes in one row of samples; declared sizes that overflow or exceed
    /// the decoded data are rejected.
    fn row_bytes(&self, available: usize) -> Result<usize> {
        let bits = self
            .colors
            .checked_mul(self.columns)
            .and_then(|n| n.checked_mul(self.bits_per_component))
            .ok_or_else(|| {
                PdfError::DecodeError(format!(
                    "predictor row size overflows: {} colors x {} columns x {} bits",
                    self.colors, self.columns, self.bits_per_component
                ))
            })?;
        let row_bytes = bits.div_ceil(8);
        if row_bytes > available {
            return Err(PdfError::DecodeError(format!(
                "predictor row of {row_bytes} bytes exceeds {available} bytes of data"
            )));
        }
        Ok(row_bytes)
    }

    fn bytes_per_pixel(&self) -> usize {
        let bpp = self
            .colors
            .saturating_mul(self.bits_per_component)
            .div_ceil(8);
        if bpp == 0 { 1 } else { bpp }
    }
}

/// Undo the predictor named by `params`; predictor 1 is the identity.
pub fn apply_predictor(data: Vec<u8>, params: &PredictorParams) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(data);
    }
    match params.predictor {
        1 => Ok(data),
        2 => apply_tiff_predictor(data, params),
        p if p >= 10 => apply_png_predictor(&data, params),
        p => Err(PdfError::DecodeError(format!("unsupported predictor {p}"))),
    }
}

/// TIFF predictor 2 (horizontal differencing), 8-bit components only.
fn apply_tiff_predictor(mut data: Vec<u8>, params: &PredictorParams) -> Result<Vec<u8>> {
    if params.bits_per_component != 8 {
        return Err(PdfError::DecodeError(format!(
            "TIFF predictor with {} bits per component",
            params.bits_per_component
        )));
    }
    let row_bytes = params.row_bytes(data.len())?;
    let colors = params.colors;
    if row_bytes == 0 {
        return Ok(data);
    }
    for row in data.chunks_mut(row_bytes) {
        for i in colors..row.len() {
            row[i] = row[i].wrapping_add(row[i - colors]);
        }
    }
    Ok(data)
}

/// PNG prediction stores a filter byte at the start of each row.
fn apply_png_predictor(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    let row_bytes = params.row_bytes(data.len())?;
    let bpp = params.bytes_per_pixel();
    let row_size = row_bytes + 1;

    let mut result = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_bytes];
    let mut current_row = vec![0u8; row_bytes];

    for row in data.chunks_exact(row_size) {
        let filter_type = row[0];
        let row_data = &row[1..];

        for i in 0..row_bytes {
            let left = if i >= bpp { current_row[i - bpp] } else { 0 };
            let above = prev_row[i];
            let upper_left = if i >= bpp { prev_row[i - bpp] } else { 0 };
            let predicted = match filter_type {
                1 => left,
                2 => above,
                3 => ((u16::from(left) + u16::from(above)) / 2) as u8,
                4 => paeth_predictor(left, above, upper_left),
                // 0 and unknown filter types copy the row
                _ => 0,
            };
            current_row[i] = row_data[i].wrapping_add(predicted);
        }

        result.extend_from_slice(&current_row);
        std::mem::swap(&mut prev_row, &mut current_row);
    }

    Ok(result)
}

/// Paeth predictor function used in PNG filtering.
const fn paeth_predictor(left: u8, above: u8, upper_left: u8) -> u8 {
    let a = left as i32;
    let b = above as i32;
    let c = upper_left as i32;
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        above
    } else {
        upper_left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(columns: usize) -> PredictorParams {
        PredictorParams {
            predictor: 12,
            columns,
            ..PredictorParams::default()
        }
    }

    #[test]
    fn png_up_rows_accumulate() {
        // Typical xref stream layout: W [1 2 1], Columns 4, PNG Up
        let data = [2, 1, 0, 10, 0, 2, 0, 0, 5, 0];
        let out = apply_predictor(data.to_vec(), &png(4)).unwrap();
        assert_eq!(out, vec![1, 0, 10, 0, 1, 0, 15, 0]);
    }

    #[test]
    fn png_sub_uses_left_neighbour() {
        let data = [1, 5, 1, 1];
        let out = apply_predictor(data.to_vec(), &png(3)).unwrap();
        assert_eq!(out, vec![5, 6, 7]);
    }

    #[test]
    fn png_partial_row_is_dropped() {
        let data = [0, 1, 2, 0, 9];
        let out = apply_predictor(data.to_vec(), &png(2)).unwrap();
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn tiff_predictor_accumulates_across_row() {
        let params = PredictorParams {
            predictor: 2,
            columns: 3,
            ..PredictorParams::default()
        };
        let out = apply_predictor(vec![1, 1, 1, 5, 0, 0], &params).unwrap();
        assert_eq!(out, vec![1, 2, 3, 5, 5, 5]);
    }

    #[test]
    fn oversized_rows_are_rejected() {
        let huge = png(usize::MAX / 2);
        assert!(matches!(
            apply_predictor(vec![2, 0, 0], &huge),
            Err(PdfError::DecodeError(_))
        ));
        assert!(matches!(
            apply_predictor(vec![2, 0, 0], &png(16)),
            Err(PdfError::DecodeError(_))
        ));
    }

    #[test]
    fn paeth_prefers_left_on_ties() {
        assert_eq!(paeth_predictor(3, 3, 3), 3);
        assert_eq!(paeth_predictor(10, 0, 0), 10);
    }
}
