//! Log format selection and format-erased decoding.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use kvlog_codec::{
    AofDecoder, DecodeResult, Decoded, DecoderConfig, RecordDecoder, RedisCommand, ScanOutcome,
    UlogDecoder, UlogRecord,
};

use crate::error::{CoreError, CoreResult};

/// Supported log formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogFormat {
    /// Tokyo Tyrant update log.
    Ulog,
    /// Redis append-only file.
    Aof,
}

impl LogFormat {
    /// Infers the format from a file extension (`.ulog` or `.aof`).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }

    /// Like [`from_path`](Self::from_path), failing with
    /// [`CoreError::UnknownFormat`].
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is not recognized.
    pub fn detect(path: &Path) -> CoreResult<Self> {
        Self::from_path(path).ok_or_else(|| CoreError::UnknownFormat {
            path: path.to_path_buf(),
        })
    }

    /// Short lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ulog => "ulog",
            Self::Aof => "aof",
        }
    }

    /// Creates a decoder for this format.
    pub fn decoder<R: Read>(self, source: R, config: DecoderConfig) -> LogDecoder<R> {
        match self {
            Self::Ulog => LogDecoder::Ulog(UlogDecoder::with_config(source, config)),
            Self::Aof => LogDecoder::Aof(AofDecoder::with_config(source, config)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ulog") {
            Ok(Self::Ulog)
        } else if s.eq_ignore_ascii_case("aof") {
            Ok(Self::Aof)
        } else {
            Err(format!("unknown log format: {s}"))
        }
    }
}

/// A record of either format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// An update log record.
    Ulog(UlogRecord),
    /// An AOF command.
    Aof(RedisCommand),
}

impl LogRecord {
    /// The format the record came from.
    #[must_use]
    pub fn format(&self) -> LogFormat {
        match self {
            Self::Ulog(_) => LogFormat::Ulog,
            Self::Aof(_) => LogFormat::Aof,
        }
    }
}

/// Decoder for a format chosen at runtime.
#[derive(Debug)]
pub enum LogDecoder<R> {
    /// Update log decoder.
    Ulog(UlogDecoder<R>),
    /// AOF decoder.
    Aof(AofDecoder<R>),
}

impl<R: Read> RecordDecoder for LogDecoder<R> {
    type Record = LogRecord;

    fn has_next(&mut self) -> DecodeResult<bool> {
        match self {
            Self::Ulog(d) => d.has_next(),
            Self::Aof(d) => d.has_next(),
        }
    }

    fn next_record(&mut self) -> DecodeResult<Option<Decoded<LogRecord>>> {
        Ok(match self {
            Self::Ulog(d) => d.read_record()?.map(|r| r.map(LogRecord::Ulog)),
            Self::Aof(d) => d.read_record()?.map(|r| r.map(LogRecord::Aof)),
        })
    }

    fn align(&mut self, limit: Option<u64>) -> DecodeResult<ScanOutcome> {
        match self {
            Self::Ulog(d) => d.find_first_record(limit),
            Self::Aof(d) => d.find_first_record(limit),
        }
    }

    fn position(&self) -> u64 {
        match self {
            Self::Ulog(d) => d.position(),
            Self::Aof(d) => d.position(),
        }
    }
}
