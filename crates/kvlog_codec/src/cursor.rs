//! Pushback-capable byte cursor.
//!
//! The boundary scanner needs exactly two capabilities from a stream: read
//! bytes, and give some of them back. [`PushbackRead`] is that contract;
//! [`PushbackReader`] implements it over any [`Read`] with a bounded
//! pushback area and owns the decoder's read buffer.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read};

/// A reader that can return previously read bytes to the front of the stream.
pub trait PushbackRead: Read {
    /// Pushes `bytes` back so the next reads return them, in order.
    ///
    /// # Errors
    ///
    /// Fails if the pushback area cannot hold the bytes.
    fn unread(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl<T: PushbackRead + ?Sized> PushbackRead for &mut T {
    fn unread(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).unread(bytes)
    }
}

/// Buffered reader with a bounded pushback area and position accounting.
///
/// `position` counts bytes handed out minus bytes pushed back, so after any
/// sequence of reads and unreads it is the offset of the next byte relative
/// to where the reader was created.
#[derive(Debug)]
pub struct PushbackReader<R> {
    inner: BufReader<R>,
    pushback: VecDeque<u8>,
    capacity: usize,
    position: u64,
}

impl<R: Read> PushbackReader<R> {
    /// Wraps `inner` with a read buffer of `buffer_size` bytes and room for
    /// `pushback_capacity` unread bytes.
    pub fn new(inner: R, buffer_size: usize, pushback_capacity: usize) -> Self {
        Self {
            inner: BufReader::with_capacity(buffer_size, inner),
            pushback: VecDeque::with_capacity(pushback_capacity),
            capacity: pushback_capacity,
            position: 0,
        }
    }

    /// Offset of the next byte, relative to where the reader was created.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns `true` if at least one more byte can be read.
    ///
    /// Refills the read buffer when it is empty, so this may block.
    ///
    /// # Errors
    ///
    /// Returns an error if refilling the buffer fails.
    pub fn has_remaining(&mut self) -> io::Result<bool> {
        if !self.pushback.is_empty() {
            return Ok(true);
        }
        Ok(!self.inner.fill_buf()?.is_empty())
    }

    /// Consumes the cursor, returning the underlying reader.
    ///
    /// Buffered and pushed-back bytes are lost.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R: Read> Read for PushbackReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = if self.pushback.is_empty() {
            self.inner.read(buf)?
        } else {
            let n = buf.len().min(self.pushback.len());
            for (slot, byte) in buf.iter_mut().zip(self.pushback.drain(..n)) {
                *slot = byte;
            }
            n
        };
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: Read> BufRead for PushbackReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pushback.is_empty() {
            self.inner.fill_buf()
        } else {
            Ok(self.pushback.as_slices().0)
        }
    }

    fn consume(&mut self, amt: usize) {
        if self.pushback.is_empty() {
            self.inner.consume(amt);
        } else {
            let amt = amt.min(self.pushback.len());
            self.pushback.drain(..amt);
        }
        self.position += amt as u64;
    }
}

impl<R: Read> PushbackRead for PushbackReader<R> {
    fn unread(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.pushback.len() + bytes.len() > self.capacity {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!(
                    "pushback overflow: {} bytes pending, {} more requested, capacity {}",
                    self.pushback.len(),
                    bytes.len(),
                    self.capacity
                ),
            ));
        }
        for &byte in bytes.iter().rev() {
            self.pushback.push_front(byte);
        }
        self.position = self.position.saturating_sub(bytes.len() as u64);
        Ok(())
    }
}

/// Reads until `buf` is full or the stream ends, returning the bytes read.
///
/// Unlike [`Read::read_exact`] a short count is not an error, so callers can
/// tell a clean end of stream (0) from a truncated field. Source errors,
/// `UnexpectedEof` included, are returned unchanged.
pub(crate) fn fill<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Returns `true` for the error a source raises when it ends early, such as
/// a cut-off compressed stream.
pub(crate) fn is_early_eof(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::UnexpectedEof
}

/// Like [`fill`], for a field inside a record that has already started.
///
/// An `UnexpectedEof` from the source ends the read like a clean end of
/// stream, so the caller reports the short count as a truncated record.
pub(crate) fn fill_record<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if is_early_eof(&e) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Reads up to `len` bytes of a record field into a fresh buffer, growing it
/// as data arrives.
///
/// Declared lengths are untrusted, so the buffer is never preallocated to
/// `len` up front. An `UnexpectedEof` from the source keeps the bytes read so
/// far, as [`fill_record`] does.
pub(crate) fn read_declared<R: Read + ?Sized>(reader: &mut R, len: u64) -> io::Result<Vec<u8>> {
    const INITIAL_CAPACITY: u64 = 64 * 1024;
    let mut data = Vec::with_capacity(len.min(INITIAL_CAPACITY) as usize);
    match reader.take(len).read_to_end(&mut data) {
        Ok(_) => Ok(data),
        Err(e) if is_early_eof(&e) => Ok(data),
        Err(e) => Err(e),
    }
}

/// Test source that serves `data` and then fails every read with `kind`.
#[cfg(test)]
pub(crate) struct FailingSource {
    data: Vec<u8>,
    read: usize,
    kind: io::ErrorKind,
}

#[cfg(test)]
impl FailingSource {
    pub(crate) fn new(data: &[u8], kind: io::ErrorKind) -> Self {
        Self {
            data: data.to_vec(),
            read: 0,
            kind,
        }
    }
}

#[cfg(test)]
impl Read for FailingSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rest = &self.data[self.read..];
        if rest.is_empty() {
            return Err(io::Error::new(self.kind, "source failed"));
        }
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.read += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(data: &[u8]) -> PushbackReader<&[u8]> {
        PushbackReader::new(data, 4, 8)
    }

    #[test]
    fn reads_through_to_inner() {
        let mut reader = cursor(b"hello world");
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello world");
        assert_eq!(reader.position(), 11);
    }

    #[test]
    fn unread_bytes_come_back_in_order() {
        let mut reader = cursor(b"abcdef");
        let mut buf = [0u8; 3];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");
        assert_eq!(reader.position(), 3);

        reader.unread(b"bc").unwrap();
        assert_eq!(reader.position(), 1);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"bcdef");
        assert_eq!(reader.position(), 6);
    }

    #[test]
    fn repeated_unread_stacks_in_front() {
        let mut reader = cursor(b"xyz");
        let mut one = [0u8; 1];
        reader.read_exact(&mut one).unwrap();
        reader.unread(&one).unwrap();
        reader.read_exact(&mut [0u8; 2]).unwrap();
        reader.unread(b"xy").unwrap();

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"xyz");
    }

    #[test]
    fn unread_beyond_capacity_fails() {
        let mut reader = cursor(b"0123456789");
        let mut buf = [0u8; 10];
        reader.read_exact(&mut buf).unwrap();
        assert!(reader.unread(&buf[..8]).is_ok());
        assert!(reader.unread(&buf[8..]).is_err());
    }

    #[test]
    fn buf_read_sees_pushback_first() {
        let mut reader = cursor(b"line one\r\nline two\r\n");
        let mut line = Vec::new();
        reader.read_until(b'\n', &mut line).unwrap();
        reader.unread(b"\r\n").unwrap();

        let mut rest = Vec::new();
        reader.read_until(b'\n', &mut rest).unwrap();
        assert_eq!(rest, b"\r\n");
        assert_eq!(reader.position(), 10);
    }

    #[test]
    fn has_remaining_tracks_eof() {
        let mut reader = cursor(b"a");
        assert!(reader.has_remaining().unwrap());
        reader.read_exact(&mut [0u8; 1]).unwrap();
        assert!(!reader.has_remaining().unwrap());
        reader.unread(b"a").unwrap();
        assert!(reader.has_remaining().unwrap());
    }

    #[test]
    fn fill_reports_short_reads() {
        let mut data: &[u8] = b"abc";
        let mut buf = [0u8; 5];
        assert_eq!(fill(&mut data, &mut buf).unwrap(), 3);
        assert_eq!(fill(&mut data, &mut buf).unwrap(), 0);
    }

    #[test]
    fn read_declared_stops_at_eof() {
        let mut data: &[u8] = b"abc";
        let out = read_declared(&mut data, u64::from(u32::MAX)).unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn fill_passes_source_errors_through() {
        let mut source = FailingSource::new(b"ab", io::ErrorKind::UnexpectedEof);
        let mut buf = [0u8; 4];
        let err = fill(&mut source, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn fill_record_treats_early_eof_as_end() {
        let mut source = FailingSource::new(b"ab", io::ErrorKind::UnexpectedEof);
        let mut buf = [0u8; 4];
        assert_eq!(fill_record(&mut source, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ab");
    }

    #[test]
    fn fill_record_keeps_other_errors() {
        let mut source = FailingSource::new(b"ab", io::ErrorKind::ConnectionReset);
        let mut buf = [0u8; 4];
        let err = fill_record(&mut source, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn read_declared_keeps_bytes_before_early_eof() {
        let mut source = FailingSource::new(b"abcd", io::ErrorKind::UnexpectedEof);
        let out = read_declared(&mut source, 100).unwrap();
        assert_eq!(out, b"abcd");

        let mut source = FailingSource::new(b"abcd", io::ErrorKind::PermissionDenied);
        let err = read_declared(&mut source, 100).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
