//! Error types for the codec crate.

use std::io;
use thiserror::Error;

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Structural violations of a log format.
///
/// Every variant is unrecoverable for the record being decoded: the decoder
/// stops and the error propagates. Resynchronization only happens once, when
/// a window is opened, never in the middle of a stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The record did not start with the expected container magic.
    #[error("bad record magic: expected {expected:#04x}, found {found:#04x}")]
    BadMagic {
        /// The magic byte the format requires.
        expected: u8,
        /// The byte actually read.
        found: u8,
    },

    /// The embedded command did not start with the expected command magic.
    #[error("bad command magic: expected {expected:#04x}, found {found:#04x}")]
    BadInnerMagic {
        /// The magic byte the format requires.
        expected: u8,
        /// The byte actually read.
        found: u8,
    },

    /// A Redis command name outside the supported set.
    #[error("unknown command: {name:?}")]
    UnknownCommand {
        /// The command name as read from the stream.
        name: String,
    },

    /// An opcode outside the Tyrant opcode table (strict mode only).
    #[error("unknown opcode {opcode:#04x}")]
    UnknownOpcode {
        /// The opcode byte.
        opcode: u8,
    },

    /// A MISC command declared an odd number of list elements.
    #[error("misc command list length {len} is odd")]
    OddListLength {
        /// The declared list length.
        len: i32,
    },

    /// A length field was negative.
    #[error("negative {field} length: {len}")]
    NegativeLength {
        /// Which length field was negative.
        field: &'static str,
        /// The decoded value.
        len: i64,
    },

    /// A declared length exceeds the configured ceiling.
    #[error("declared size {size} exceeds limit of {limit} bytes")]
    RecordTooLarge {
        /// The declared size.
        size: u64,
        /// The configured ceiling.
        limit: u64,
    },

    /// A multibulk or bulk header line was malformed or overlong.
    #[error("invalid bulk header: {line:?}")]
    InvalidBulkHeader {
        /// The offending line.
        line: String,
    },

    /// A bulk string payload was not followed by CR-LF.
    #[error("bulk string not terminated by CRLF")]
    MissingTerminator,

    /// An EXPIREAT value was not a decimal 64-bit integer.
    #[error("invalid EXPIREAT timestamp: {value:?}")]
    InvalidExpireAt {
        /// The offending value.
        value: String,
    },
}

/// Errors that can occur while decoding a record.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The bytes violate the log format.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// A declared length exceeds the bytes remaining in the stream.
    #[error("truncated record: expected {expected} bytes, only {available} available")]
    TruncatedRecord {
        /// Bytes the record (or field) declared.
        expected: u64,
        /// Bytes that were actually available.
        available: u64,
    },

    /// I/O error from the underlying source, passed through unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DecodeError {
    /// Create a truncated record error.
    pub fn truncated(expected: u64, available: u64) -> Self {
        Self::TruncatedRecord {
            expected,
            available,
        }
    }

    /// Returns `true` for structural format violations.
    #[must_use]
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// Returns `true` if the stream ended inside a record.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::TruncatedRecord { .. })
    }
}
