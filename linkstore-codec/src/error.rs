use thiserror::Error;

/// Errors raised while decoding a stored record.
///
/// Every variant means the bytes are damaged or were written by something
/// other than this codec. A record that merely predates newer fields is not
/// an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("varint exceeds maximum length (10 bytes)")]
    VarintTooLong,

    #[error("varint overflow (value exceeds u64)")]
    VarintOverflow,

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("float value is NaN")]
    FloatIsNan,

    #[error("unsupported record format: {found:#04x}")]
    UnsupportedFormat { found: u8 },

    #[error(transparent)]
    Type(#[from] linkstore_types::Error),

    #[error("record belongs to {found}, expected {expected}")]
    CollectionMismatch { expected: String, found: String },

    #[error("invalid field tag: {tag:#04x}")]
    InvalidFieldTag { tag: u8 },

    #[error("field {field} has the wrong type")]
    FieldTypeMismatch { field: String },

    #[error("record at revision {version} has {found} fields, expected at least {expected}")]
    MissingFields {
        version: u32,
        found: usize,
        expected: usize,
    },

    #[error("invalid link kind: {kind:#04x}")]
    InvalidLinkKind { kind: u8 },

    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),
}
