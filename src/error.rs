use thiserror::Error;

/// Errors produced while decoding or encoding bencode.
///
/// Malformed input is always reported as [`BencodeError::Syntax`], while
/// well-formed input that does not fit the requested Rust type is reported as
/// [`BencodeError::TypeMismatch`]. The two are never conflated.
#[derive(Debug, Error)]
pub enum BencodeError {
    /// The input is not valid bencode at `offset` (0-based, counted from the
    /// start of the stream).
    #[error("syntax error at offset {offset}: {kind}")]
    Syntax { offset: u64, kind: SyntaxError },

    /// The input is valid bencode but cannot be stored in the destination type.
    #[error("cannot decode {value} into a value of type {target}")]
    TypeMismatch { value: String, target: &'static str },

    /// The value cannot be represented as bencode.
    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),

    /// A configured decoder limit was exceeded.
    #[error("{limit} limit of {max} exceeded at offset {offset}")]
    LimitExceeded { offset: u64, limit: Limit, max: usize },

    /// A dictionary value was requested where the input holds a key.
    #[error("dictionary value read without a key at offset {0}")]
    MissingKey(u64),

    /// The source ended cleanly before the first byte of a value.
    #[error("end of input")]
    Eof,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The cause of a [`BencodeError::Syntax`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("unexpected byte 0x{0:02x} at start of value")]
    UnexpectedByte(u8),

    #[error("expected ':' after string length, found 0x{0:02x}")]
    InvalidLengthByte(u8),

    #[error("string length does not fit in memory")]
    LengthOverflow,

    #[error("invalid byte 0x{0:02x} in integer")]
    InvalidIntegerByte(u8),

    #[error("'-' is only allowed as the first byte of an integer")]
    MisplacedSign,

    #[error("integer has no digits")]
    EmptyInteger,

    #[error("leading zero in number")]
    LeadingZero,

    #[error("negative zero is an invalid integer")]
    NegativeZero,

    #[error("dictionary key must be a byte string, found 0x{0:02x}")]
    NonStringKey(u8),

    #[error("dictionary keys are not sorted")]
    UnsortedKey,

    #[error("duplicate dictionary key")]
    DuplicateKey,

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("trailing data after value")]
    TrailingData,
}

/// The resource bound named by [`BencodeError::LimitExceeded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Limit {
    #[error("nesting depth")]
    Depth,
    #[error("string length")]
    StringLength,
    #[error("integer length")]
    IntegerLength,
    #[error("element count")]
    Elements,
}

impl BencodeError {
    pub(crate) fn syntax(offset: u64, kind: SyntaxError) -> Self {
        BencodeError::Syntax { offset, kind }
    }

    pub(crate) fn mismatch<T: ?Sized>(value: impl Into<String>) -> Self {
        BencodeError::TypeMismatch {
            value: value.into(),
            target: std::any::type_name::<T>(),
        }
    }

    /// Type mismatch for an integer, quoting at most the first few digits.
    pub(crate) fn integer_mismatch<T: ?Sized>(digits: &str) -> Self {
        const SHOWN: usize = 24;
        if digits.len() <= SHOWN {
            return Self::mismatch::<T>(format!("integer {digits}"));
        }
        Self::mismatch::<T>(format!(
            "integer {}... ({} digits)",
            &digits[..SHOWN],
            digits.len()
        ))
    }

    /// Returns `true` for malformed-input errors, including premature end of input.
    pub fn is_syntax(&self) -> bool {
        matches!(self, BencodeError::Syntax { .. })
    }

    /// Returns `true` if well-formed input did not fit the destination type.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, BencodeError::TypeMismatch { .. })
    }

    /// Returns the stream offset the error was detected at, if it has one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            BencodeError::Syntax { offset, .. }
            | BencodeError::LimitExceeded { offset, .. }
            | BencodeError::MissingKey(offset) => Some(*offset),
            _ => None,
        }
    }

    /// Returns the syntax error cause, if this is a syntax error.
    pub fn syntax_kind(&self) -> Option<&SyntaxError> {
        match self {
            BencodeError::Syntax { kind, .. } => Some(kind),
            _ => None,
        }
    }
}
