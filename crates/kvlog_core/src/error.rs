//! Error types for window processing.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while reading a window.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Byte source error.
    #[error("storage error: {0}")]
    Storage(#[from] kvlog_storage::StorageError),

    /// Record decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] kvlog_codec::DecodeError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The window starts past the end of the source.
    #[error("window start {start} is beyond source size {size}")]
    InvalidWindow {
        /// Requested window start.
        start: u64,
        /// Size of the source.
        size: u64,
    },

    /// The log format could not be determined from the file name.
    #[error("cannot determine log format of {}", path.display())]
    UnknownFormat {
        /// The file path.
        path: PathBuf,
    },
}

impl CoreError {
    /// Returns `true` if this error came from a format violation in the log.
    #[must_use]
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Decode(e) if e.is_format())
    }

    /// Returns `true` if the log ended inside a record.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Decode(e) if e.is_truncated())
    }
}
