//! Codec modules for PDF stream decompression.
//!
//! This module contains:
//! - `ascii85`: ASCII85 and ASCIIHex decoding
//! - `lzw`: LZW decompression
//! - `predictor`: PNG/TIFF predictor reversal
//! - `runlength`: Run-length decoding

pub mod ascii85;
pub mod lzw;
pub mod predictor;
pub mod runlength;

// Re-export main functions for convenience
pub use ascii85::{ascii85decode, asciihexdecode};
pub use lzw::lzwdecode_with_earlychange;
pub use predictor::{PredictorParams, apply_predictor};
pub use runlength::rldecode;
