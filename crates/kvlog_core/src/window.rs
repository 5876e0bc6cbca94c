//! Split-aware window reading.
//!
//! A window is a byte range of a larger log chosen without regard to record
//! framing. Reading a window means:
//!
//! 1. Start at the window's first byte.
//! 2. Unless that is the start of the file, skip to the first valid record
//!    boundary (at most once, never mid-stream).
//! 3. Read records while the current position is before the window end. The
//!    last record may extend past the end; it is read in full, and the next
//!    window skips it.
//!
//! Reading a file as consecutive windows this way yields every record exactly
//! once, in file order.

use std::time::{Duration, Instant};

use kvlog_codec::{Decoded, RecordDecoder, ScanOutcome};
use tracing::{debug, info};

use crate::error::CoreResult;

/// A contiguous byte range of a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    /// Absolute offset of the first byte.
    pub start: u64,
    /// Length in bytes.
    pub len: u64,
}

impl Window {
    /// Creates a window.
    #[must_use]
    pub const fn new(start: u64, len: u64) -> Self {
        Self { start, len }
    }

    /// A window covering a whole file of `len` bytes.
    #[must_use]
    pub const fn whole(len: u64) -> Self {
        Self { start: 0, len }
    }

    /// Absolute offset one past the last byte.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.start.saturating_add(self.len)
    }

    /// Returns `true` if `offset` lies inside the window.
    #[must_use]
    pub const fn contains(&self, offset: u64) -> bool {
        offset >= self.start && offset < self.end()
    }

    /// Cuts `[0, total)` into consecutive windows of `size` bytes.
    ///
    /// The last window may be shorter. A `size` of zero yields one window
    /// covering everything.
    #[must_use]
    pub fn split(total: u64, size: u64) -> Vec<Self> {
        if size == 0 || total <= size {
            return vec![Self::whole(total)];
        }
        (0..total)
            .step_by(usize::try_from(size).unwrap_or(usize::MAX))
            .map(|start| Self::new(start, size.min(total - start)))
            .collect()
    }
}

/// Counters reported when a window is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStats {
    /// Records read.
    pub records: u64,
    /// Bytes skipped while aligning to the first record.
    pub skipped: u64,
    /// Bytes consumed, skipped bytes included.
    pub bytes: u64,
    /// Time since the window was opened.
    pub elapsed: Duration,
}

/// Reads the records of one window.
///
/// The decoder must be positioned at the window start. Offsets in returned
/// records are absolute.
#[derive(Debug)]
pub struct WindowReader<D> {
    decoder: D,
    window: Window,
    skipped: u64,
    records: u64,
    opened: Instant,
    finished: bool,
}

impl<D: RecordDecoder> WindowReader<D> {
    /// Opens a window over `decoder`, aligning it when the window does not
    /// start at the beginning of the file.
    ///
    /// # Errors
    ///
    /// Returns an error if alignment fails to read from the source.
    pub fn new(mut decoder: D, window: Window) -> CoreResult<Self> {
        info!(start = window.start, end = window.end(), "opening window");

        let mut skipped = 0;
        let mut finished = false;
        if window.start != 0 {
            let outcome = decoder.align(Some(window.len))?;
            skipped = outcome.skipped();
            match outcome {
                ScanOutcome::Found { offset } => {
                    debug!(record_start = window.start + offset, "aligned to record");
                }
                ScanOutcome::Exhausted { .. } | ScanOutcome::LimitReached { .. } => {
                    debug!(skipped, "no record starts in window");
                    finished = true;
                }
            }
        }

        Ok(Self {
            decoder,
            window,
            skipped,
            records: 0,
            opened: Instant::now(),
            finished,
        })
    }

    /// Reads the next record that starts inside the window.
    ///
    /// # Errors
    ///
    /// Decode errors end the window: later calls return `Ok(None)`.
    pub fn next_record(&mut self) -> CoreResult<Option<Decoded<D::Record>>> {
        if self.finished || Self::position(self) >= self.window.end() {
            self.finished = true;
            return Ok(None);
        }

        match self.decoder.next_record() {
            Ok(Some(decoded)) => {
                self.records += 1;
                Ok(Some(Decoded {
                    offset: self.window.start + decoded.offset,
                    len: decoded.len,
                    record: decoded.record,
                }))
            }
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(e.into())
            }
        }
    }

    /// Returns `true` if another record may follow. Advisory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails.
    pub fn has_next(&mut self) -> CoreResult<bool> {
        if self.finished || Self::position(self) >= self.window.end() {
            return Ok(false);
        }
        Ok(self.decoder.has_next()?)
    }

    /// Absolute offset of the next unread byte.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.window.start + self.decoder.position()
    }

    /// Fraction of the window consumed, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.window.len == 0 {
            return 1.0;
        }
        let consumed = self.decoder.position().min(self.window.len);
        (consumed as f64 / self.window.len as f64) as f32
    }

    /// The window being read.
    #[must_use]
    pub fn window(&self) -> Window {
        self.window
    }

    /// Records read so far.
    #[must_use]
    pub fn records_read(&self) -> u64 {
        self.records
    }

    /// Bytes skipped by alignment.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> WindowStats {
        WindowStats {
            records: self.records,
            skipped: self.skipped,
            bytes: self.decoder.position(),
            elapsed: self.opened.elapsed(),
        }
    }

    /// Finishes the window, logging and returning its counters.
    pub fn close(self) -> WindowStats {
        let stats = self.stats();
        info!(
            start = self.window.start,
            end = self.window.end(),
            records = stats.records,
            bytes = stats.bytes,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "closing window"
        );
        stats
    }
}

impl<D: RecordDecoder> Iterator for WindowReader<D> {
    type Item = CoreResult<Decoded<D::Record>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvlog_codec::{AofDecoder, UlogDecoder, COMMAND_MAGIC, ULOG_MAGIC};

    fn ulog_put(timestamp: i64, key: &[u8], value: &[u8]) -> Vec<u8> {
        let mut payload = vec![COMMAND_MAGIC, 0x10];
        payload.extend_from_slice(&(key.len() as i32).to_be_bytes());
        payload.extend_from_slice(&(value.len() as i32).to_be_bytes());
        payload.extend_from_slice(key);
        payload.extend_from_slice(value);
        payload.push(0);

        let mut buf = vec![ULOG_MAGIC];
        buf.extend_from_slice(&timestamp.to_be_bytes());
        buf.extend_from_slice(&1i32.to_be_bytes());
        buf.extend_from_slice(&(payload.len() as i32).to_be_bytes());
        buf.extend_from_slice(&payload);
        buf
    }

    fn three_records() -> (Vec<u8>, Vec<u64>) {
        let mut data = Vec::new();
        let mut offsets = Vec::new();
        for (ts, key) in [(1, b"a"), (2, b"b"), (3, b"c")] {
            offsets.push(data.len() as u64);
            data.extend(ulog_put(ts, key, b"value"));
        }
        (data, offsets)
    }

    fn read_window(data: &[u8], window: Window) -> Vec<u64> {
        let start = window.start as usize;
        let decoder = UlogDecoder::new(&data[start..]);
        WindowReader::new(decoder, window)
            .unwrap()
            .map(|r| r.unwrap().offset)
            .collect()
    }

    #[test]
    fn window_helpers() {
        let window = Window::new(10, 5);
        assert_eq!(window.end(), 15);
        assert!(window.contains(10));
        assert!(window.contains(14));
        assert!(!window.contains(15));
        assert_eq!(Window::whole(3), Window::new(0, 3));
    }

    #[test]
    fn split_covers_everything() {
        let windows = Window::split(10, 4);
        assert_eq!(
            windows,
            vec![Window::new(0, 4), Window::new(4, 4), Window::new(8, 2)]
        );
        assert_eq!(Window::split(10, 0), vec![Window::whole(10)]);
        assert_eq!(Window::split(3, 10), vec![Window::whole(3)]);
    }

    #[test]
    fn whole_file_window() {
        let (data, offsets) = three_records();
        assert_eq!(read_window(&data, Window::whole(data.len() as u64)), offsets);
    }

    #[test]
    fn record_crossing_end_belongs_to_first_window() {
        let (data, offsets) = three_records();
        // Cut one byte into the second record.
        let cut = offsets[1] + 1;
        let first = read_window(&data, Window::new(0, cut));
        let second = read_window(&data, Window::new(cut, data.len() as u64 - cut));
        assert_eq!(first, offsets[..2]);
        assert_eq!(second, offsets[2..]);
    }

    #[test]
    fn record_at_window_start_belongs_to_that_window() {
        let (data, offsets) = three_records();
        let cut = offsets[1];
        let first = read_window(&data, Window::new(0, cut));
        let second = read_window(&data, Window::new(cut, data.len() as u64 - cut));
        assert_eq!(first, offsets[..1]);
        assert_eq!(second, offsets[1..]);
    }

    #[test]
    fn window_inside_one_record_is_empty() {
        let (data, offsets) = three_records();
        let window = Window::new(offsets[1] + 2, 4);
        assert!(read_window(&data, window).is_empty());
    }

    #[test]
    fn tail_window_without_records() {
        let (data, _) = three_records();
        let window = Window::new(data.len() as u64 - 3, 3);
        let decoder = UlogDecoder::new(&data[data.len() - 3..]);
        let mut reader = WindowReader::new(decoder, window).unwrap();
        assert!(!reader.has_next().unwrap());
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.skipped(), 3);
    }

    #[test]
    fn progress_and_stats() {
        let (data, _) = three_records();
        let mut reader =
            WindowReader::new(UlogDecoder::new(data.as_slice()), Window::whole(data.len() as u64))
                .unwrap();
        assert_eq!(reader.progress(), 0.0);
        while reader.next_record().unwrap().is_some() {}
        assert_eq!(reader.progress(), 1.0);

        let stats = reader.close();
        assert_eq!(stats.records, 3);
        assert_eq!(stats.bytes, data.len() as u64);
        assert_eq!(stats.skipped, 0);
    }

    #[test]
    fn decode_error_ends_window() {
        let (mut data, offsets) = three_records();
        data[offsets[1] as usize] = 0x00;
        let mut reader =
            WindowReader::new(UlogDecoder::new(data.as_slice()), Window::whole(data.len() as u64))
                .unwrap();
        assert!(reader.next_record().unwrap().is_some());
        assert!(reader.next_record().unwrap_err().is_format());
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn aof_window_alignment() {
        let record = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n";
        let data = [record.as_slice(), record.as_slice()].concat();
        let cut = 5u64;
        let window = Window::new(cut, data.len() as u64 - cut);
        let reader = WindowReader::new(AofDecoder::new(&data[cut as usize..]), window).unwrap();
        let offsets: Vec<u64> = reader.map(|r| r.unwrap().offset).collect();
        assert_eq!(offsets, vec![record.len() as u64]);
    }
}
