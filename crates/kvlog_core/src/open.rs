//! Opening windows over byte sources.

use std::io::Read;

use kvlog_codec::{AofDecoder, DecoderConfig, UlogDecoder};
use kvlog_storage::{ByteSource, RangeReader};

use crate::error::{CoreError, CoreResult};
use crate::format::{LogDecoder, LogFormat};
use crate::window::{Window, WindowReader};

/// Positions a reader at the window start, rejecting windows past the end.
fn range_reader<S: ByteSource>(source: S, window: Window) -> CoreResult<RangeReader<S>> {
    let size = source.size()?;
    if window.start > size {
        return Err(CoreError::InvalidWindow {
            start: window.start,
            size,
        });
    }
    Ok(RangeReader::new(source, window.start))
}

/// Opens an update log window over `source`.
///
/// # Errors
///
/// Returns an error if the window starts past the end of the source or
/// alignment fails.
pub fn open_ulog<S: ByteSource>(
    source: S,
    window: Window,
    config: DecoderConfig,
) -> CoreResult<WindowReader<UlogDecoder<RangeReader<S>>>> {
    let reader = range_reader(source, window)?;
    WindowReader::new(UlogDecoder::with_config(reader, config), window)
}

/// Opens an AOF window over `source`.
///
/// # Errors
///
/// Returns an error if the window starts past the end of the source or
/// alignment fails.
pub fn open_aof<S: ByteSource>(
    source: S,
    window: Window,
    config: DecoderConfig,
) -> CoreResult<WindowReader<AofDecoder<RangeReader<S>>>> {
    let reader = range_reader(source, window)?;
    WindowReader::new(AofDecoder::with_config(reader, config), window)
}

impl<S: ByteSource> WindowReader<LogDecoder<RangeReader<S>>> {
    /// Opens a window of a log whose format is chosen at runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the window starts past the end of the source or
    /// alignment fails.
    pub fn open(
        source: S,
        format: LogFormat,
        window: Window,
        config: DecoderConfig,
    ) -> CoreResult<Self> {
        let reader = range_reader(source, window)?;
        WindowReader::new(format.decoder(reader, config), window)
    }
}

impl<R: Read> WindowReader<LogDecoder<R>> {
    /// Opens a window over a caller-supplied stream, such as a decompressor.
    ///
    /// `reader` must already be positioned at `window.start`. Streams that
    /// cannot seek only support windows starting at 0.
    ///
    /// # Errors
    ///
    /// Returns an error if alignment fails.
    pub fn from_reader(
        reader: R,
        format: LogFormat,
        window: Window,
        config: DecoderConfig,
    ) -> CoreResult<Self> {
        WindowReader::new(format.decoder(reader, config), window)
    }
}
