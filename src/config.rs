//! Decoder limits and parsing options.

/// Maximum nesting of lists and dictionaries.
pub const MAX_DEPTH: usize = 64;

/// Maximum payload size of a single byte string (16 MiB).
pub const MAX_STRING_LEN: usize = 16 * 1024 * 1024;

/// Maximum number of digits in an integer, sign excluded.
pub const MAX_INTEGER_LEN: usize = 64;

/// Maximum number of list elements and dictionary entries in one top-level value.
pub const MAX_ELEMENTS: usize = 1 << 20;

/// Initial lookahead buffer size, and the minimum headroom kept before each read.
pub const MIN_BUFFER_SIZE: usize = 512;

/// Options for a [`Decoder`](crate::Decoder).
///
/// # Examples
///
/// ```
/// use rbencode::{Decoder, DecoderConfig};
///
/// let config = DecoderConfig::default().with_max_depth(8).with_strict(false);
/// let mut decoder = Decoder::with_config(&b"d1:bi1e1:ai2ee"[..], config);
/// let value: rbencode::Value = decoder.decode().unwrap();
/// assert_eq!(value.get(b"a").and_then(|v| v.as_integer()), Some(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    pub max_depth: usize,
    pub max_string_len: usize,
    pub max_integer_len: usize,
    pub max_elements: usize,
    /// Reject dictionaries whose keys are not unique and in ascending byte order.
    pub strict: bool,
    pub min_buffer_size: usize,
}

impl DecoderConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_string_len(mut self, max_string_len: usize) -> Self {
        self.max_string_len = max_string_len;
        self
    }

    pub fn with_max_integer_len(mut self, max_integer_len: usize) -> Self {
        self.max_integer_len = max_integer_len;
        self
    }

    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    /// Lenient mode accepts unsorted keys and keeps the last value of a duplicate key.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_min_buffer_size(mut self, min_buffer_size: usize) -> Self {
        self.min_buffer_size = min_buffer_size.max(1);
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_string_len: MAX_STRING_LEN,
            max_integer_len: MAX_INTEGER_LEN,
            max_elements: MAX_ELEMENTS,
            strict: true,
            min_buffer_size: MIN_BUFFER_SIZE,
        }
    }
}
