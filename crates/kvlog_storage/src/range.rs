//! `std::io::Read` adapter over a byte source.

use crate::backend::ByteSource;
use std::io::{self, Read};

/// Sequential reader over a [`ByteSource`], starting at an absolute offset.
///
/// This is the "seekable byte-range source" handed to a window reader: it is
/// opened at the window start and reads on past the window end if a record
/// straddles it, up to the end of the source.
///
/// The reader performs no buffering of its own; decoders wrap it in their
/// own buffer.
#[derive(Debug)]
pub struct RangeReader<S> {
    source: S,
    position: u64,
}

impl<S: ByteSource> RangeReader<S> {
    /// Creates a reader positioned at `start` that reads to the end of the source.
    pub fn new(source: S, start: u64) -> Self {
        Self {
            source,
            position: start,
        }
    }

    /// Returns the absolute offset of the next byte to be read.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl<S: ByteSource> Read for RangeReader<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.source.read_into(self.position, buf)?;
        self.position += n as u64;
        Ok(n)
    }
}
