//! Cross-reference engine options.
//!
//! # Example
//! ```
//! use xrefscope_core::XRefConfig;
//!
//! let config = XRefConfig::default()
//!     .with_trailer_search_length(1 << 20)
//!     .with_file_header_offset(0);
//! assert_eq!(config.trailer_search_length, 1 << 20);
//! ```

/// Default size of the trailing window searched for `startxref`.
pub const DEFAULT_TRAILER_SEARCH_LENGTH: usize = 5_500_000;

/// Default bound on nested object-stream resolution.
pub const DEFAULT_MAX_OBJECT_STREAM_DEPTH: usize = 8;

/// Options controlling how the cross-reference chain is located and walked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XRefConfig {
    /// Number of trailing bytes searched for the `startxref` keyword.
    pub trailer_search_length: usize,
    /// Base added to every offset read from the file.
    ///
    /// `None` uses the position of `%PDF-` within the first kilobyte.
    pub file_header_offset: Option<usize>,
    /// How many object streams may be nested while resolving one object.
    pub max_object_stream_depth: usize,
}

impl Default for XRefConfig {
    fn default() -> Self {
        Self {
            trailer_search_length: DEFAULT_TRAILER_SEARCH_LENGTH,
            file_header_offset: None,
            max_object_stream_depth: DEFAULT_MAX_OBJECT_STREAM_DEPTH,
        }
    }
}

impl XRefConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the trailing window searched for `startxref`.
    pub fn with_trailer_search_length(mut self, len: usize) -> Self {
        self.trailer_search_length = len;
        self
    }

    /// Forces the header offset instead of detecting `%PDF-`.
    pub fn with_file_header_offset(mut self, offset: usize) -> Self {
        self.file_header_offset = Some(offset);
        self
    }

    pub fn with_max_object_stream_depth(mut self, depth: usize) -> Self {
        self.max_object_stream_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = XRefConfig::default();
        assert_eq!(config.trailer_search_length, 5_500_000);
        assert_eq!(config.file_header_offset, None);
        assert_eq!(config.max_object_stream_depth, 8);
    }

    #[test]
    fn builders_override_fields() {
        let config = XRefConfig::new()
            .with_file_header_offset(12)
            .with_max_object_stream_depth(2);
        assert_eq!(config.file_header_offset, Some(12));
        assert_eq!(config.max_object_stream_depth, 2);
    }
}
