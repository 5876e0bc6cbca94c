//! CLI command implementations.

pub mod count;
pub mod dump;
pub mod find_start;

use kvlog_codec::DecoderConfig;
use kvlog_core::{LogFormat, Window};
use kvlog_storage::{ByteSource, FileSource};
use std::path::Path;

/// Options shared by all commands.
pub struct Options {
    /// Explicit format, overriding detection.
    pub format: Option<String>,
    /// Decoder configuration.
    pub config: DecoderConfig,
}

impl Options {
    /// Resolves the log format for `path`.
    pub fn format_for(&self, path: &Path) -> Result<LogFormat, Box<dyn std::error::Error>> {
        match &self.format {
            Some(name) => Ok(name.parse::<LogFormat>()?),
            None => Ok(LogFormat::detect(path)?),
        }
    }
}

/// Opens a log file read-only.
pub fn open_source(path: &Path) -> Result<FileSource, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("log file not found: {}", path.display()).into());
    }
    Ok(FileSource::open(path)?)
}

/// Window from `offset` covering `length` bytes or the rest of the source.
pub fn window_for(
    source: &FileSource,
    offset: u64,
    length: Option<u64>,
) -> Result<Window, Box<dyn std::error::Error>> {
    let size = source.size()?;
    let len = length.unwrap_or_else(|| size.saturating_sub(offset));
    Ok(Window::new(offset, len))
}

/// Renders bytes for display: valid UTF-8 as is, anything else hex-encoded.
pub fn display_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => format!("0x{}", hex_encode(bytes)),
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_override_wins() {
        let options = Options {
            format: Some("aof".to_string()),
            config: DecoderConfig::default(),
        };
        assert_eq!(
            options.format_for(Path::new("x.ulog")).unwrap(),
            LogFormat::Aof
        );

        let options = Options {
            format: None,
            config: DecoderConfig::default(),
        };
        assert_eq!(
            options.format_for(Path::new("x.ulog")).unwrap(),
            LogFormat::Ulog
        );
        assert!(options.format_for(Path::new("x.bin")).is_err());
    }

    #[test]
    fn displays_bytes() {
        assert_eq!(display_bytes(b"key"), "key");
        assert_eq!(display_bytes(&[0xff, 0x00]), "0xff00");
    }
}
