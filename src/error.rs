//! Error types for the metabuf wire codec

use thiserror::Error;

/// Errors that can occur during schema construction, encoding or decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Field registration rejected (bad number, duplicate, unsupported flags)
    #[error("invalid field {number}: {reason}")]
    InvalidField {
        /// Offending field number
        number: u64,
        /// Why the registration was rejected
        reason: &'static str,
    },
    /// A `REQUIRED` field was absent on encode or decode
    #[error("missing required field `{0}`")]
    MissingRequiredField(String),
    /// Varint never terminated, overflowed 64 bits or ran past the input
    #[error("malformed varint")]
    MalformedVarint,
    /// A frame declares more bytes than remain in the input
    #[error("truncated buffer: need {needed} bytes, have {available}")]
    TruncatedBuffer {
        /// Bytes the frame declared
        needed: usize,
        /// Bytes actually left
        available: usize,
    },
    /// `TypeMetadata` decode could not resolve a codec name
    #[error("unknown codec name `{0}`")]
    UnknownCodecName(String),
    /// `Bool` decode saw a byte other than 0 or 1
    #[error("invalid boolean byte 0x{0:02x}")]
    InvalidBooleanByte(u8),
    /// Fixed output buffer too small for the encoded message
    #[error("buffer too small for operation")]
    ShortBuffer,
    /// `Unicode` payload was not valid UTF-8
    #[error("invalid UTF-8 in unicode payload")]
    InvalidUtf8,
    /// `TypeMetadata` carried a flags value outside the four variants
    #[error("invalid flags value {0}")]
    InvalidFlags(u64),
    /// Tag carried a wire type this codec does not understand (groups, 6, 7)
    #[error("invalid wire type {0}")]
    InvalidWireType(u8),
    /// Tag wire type disagrees with the declared field
    #[error("field {number}: expected wire type {expected}, found {found}")]
    UnexpectedWireType {
        /// Field number from the tag
        number: u32,
        /// Wire type implied by the schema
        expected: u8,
        /// Wire type observed on the wire
        found: u8,
    },
    /// Field number not present in the schema (reject policy only)
    #[error("unknown field number {0}")]
    UnknownField(u64),
    /// Field name not present in the schema
    #[error("unknown field name `{0}`")]
    UnknownFieldName(String),
    /// Assigned value does not fit the field's codec or flags
    #[error("field `{field}` expects {expected}")]
    ValueMismatch {
        /// Field name
        field: String,
        /// What the field accepts
        expected: &'static str,
    },
    /// Schema field cannot be described through `TypeMetadata`
    #[error("field `{0}` cannot be described by type metadata")]
    NotDescribable(String),
    /// Standalone codec decode left unread bytes
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
    /// Nested messages exceeded the configured depth
    #[error("nesting depth limit {0} exceeded")]
    DepthLimitExceeded(usize),
    /// Underlying byte sink or source failed
    #[error("i/o error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.kind())
    }
}

/// Result type alias for metabuf operations
pub type Result<T> = core::result::Result<T, Error>;
