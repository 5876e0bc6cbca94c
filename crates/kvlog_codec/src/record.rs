//! Sequential record reader protocol.
//!
//! Both decoders implement [`RecordDecoder`], so window processing and the
//! CLI can drive either format through the same cursor contract.

use crate::error::DecodeResult;
use crate::scanner::ScanOutcome;

/// A decoded record together with its position in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<T> {
    /// Stream position of the record's first byte.
    pub offset: u64,
    /// Exact number of bytes the record occupied.
    pub len: u64,
    /// The record itself.
    pub record: T,
}

impl<T> Decoded<T> {
    /// Stream position just past the record.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }

    /// Maps the record, keeping its position.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        Decoded {
            offset: self.offset,
            len: self.len,
            record: f(self.record),
        }
    }
}

/// Cursor contract shared by the log decoders.
///
/// Positions are relative to where the decoder was opened and advance by
/// exactly the bytes each record occupied (plus any bytes skipped by
/// [`align`](Self::align)).
pub trait RecordDecoder {
    /// The record type this decoder produces.
    type Record;

    /// Returns `true` if more input may be available.
    ///
    /// This is advisory: it only checks for buffered bytes. `Ok(None)` from
    /// [`next_record`](Self::next_record) is the authoritative end signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source fails.
    fn has_next(&mut self) -> DecodeResult<bool>;

    /// Decodes the next record, or returns `Ok(None)` at the end of input.
    ///
    /// # Errors
    ///
    /// Format violations, truncation and I/O failures. After an error the
    /// stream position is unspecified and decoding should stop.
    fn next_record(&mut self) -> DecodeResult<Option<Decoded<Self::Record>>>;

    /// Skips forward to the first valid record start, at most `limit` bytes
    /// away.
    ///
    /// # Errors
    ///
    /// Only I/O errors; not finding a record is a [`ScanOutcome`].
    fn align(&mut self, limit: Option<u64>) -> DecodeResult<ScanOutcome>;

    /// Bytes consumed since the decoder was opened.
    fn position(&self) -> u64;

    /// Turns the decoder into an iterator over its records.
    fn records(self) -> Records<Self>
    where
        Self: Sized,
    {
        Records::new(self)
    }
}

/// Iterator adapter over a [`RecordDecoder`].
///
/// Yields records until the end of input. The first error is yielded once and
/// ends iteration.
#[derive(Debug)]
pub struct Records<D> {
    decoder: D,
    done: bool,
}

impl<D: RecordDecoder> Records<D> {
    /// Wraps a decoder.
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            done: false,
        }
    }

    /// Returns the wrapped decoder.
    pub fn into_inner(self) -> D {
        self.decoder
    }
}

impl<D: RecordDecoder> Iterator for Records<D> {
    type Item = DecodeResult<Decoded<D::Record>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.decoder.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<D: RecordDecoder> std::iter::FusedIterator for Records<D> {}
