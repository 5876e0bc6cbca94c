//! Record boundary scanner.
//!
//! A window handed out by an external splitter usually starts in the middle
//! of a record. [`find_record_start`] walks forward one byte at a time until
//! a format-specific predicate accepts a header, leaving the cursor on the
//! first byte of that record. Every byte it inspected past that point is
//! pushed back, never consumed.

use std::io;

use tracing::debug;

use crate::cursor::{fill, PushbackRead};

/// Number of scanned bytes between progress messages.
pub const SCAN_PROGRESS_INTERVAL: u64 = 100_000;

/// Format-specific header check used by the scanner.
pub trait HeaderValidator {
    /// The byte every record of the format starts with.
    fn magic(&self) -> u8;

    /// Number of bytes the predicate needs to see, magic included.
    fn header_len(&self) -> usize;

    /// Returns `true` if `header` (exactly [`header_len`](Self::header_len)
    /// bytes) starts a structurally valid record.
    fn is_valid_header(&self, header: &[u8]) -> bool;
}

impl<V: HeaderValidator + ?Sized> HeaderValidator for &V {
    fn magic(&self) -> u8 {
        (**self).magic()
    }

    fn header_len(&self) -> usize {
        (**self).header_len()
    }

    fn is_valid_header(&self, header: &[u8]) -> bool {
        (**self).is_valid_header(header)
    }
}

/// Result of a boundary scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A valid header starts `offset` bytes after where the scan began.
    Found {
        /// Bytes skipped before the record.
        offset: u64,
    },
    /// The stream ended without a valid header.
    Exhausted {
        /// Bytes discarded.
        scanned: u64,
    },
    /// The scan limit was reached without a valid header; any record from
    /// here on belongs to the next window.
    LimitReached {
        /// Bytes discarded.
        scanned: u64,
    },
}

impl ScanOutcome {
    /// Returns `true` if a record start was found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// Number of bytes skipped, whether or not a record was found.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        match *self {
            Self::Found { offset } => offset,
            Self::Exhausted { scanned } | Self::LimitReached { scanned } => scanned,
        }
    }
}

/// Advances `cursor` to the first byte of a valid record.
///
/// `limit` bounds the number of bytes that may be skipped: a record starting
/// at or beyond it is not reported. On [`ScanOutcome::Found`] the cursor is
/// positioned on the record's magic byte. Running out of input is reported as
/// [`ScanOutcome::Exhausted`], not as an error.
///
/// The cursor must be able to push back at least `validator.header_len()`
/// bytes.
///
/// # Errors
///
/// Only I/O errors from the cursor are returned.
pub fn find_record_start<C, V>(
    cursor: &mut C,
    validator: &V,
    limit: Option<u64>,
) -> io::Result<ScanOutcome>
where
    C: PushbackRead + ?Sized,
    V: HeaderValidator + ?Sized,
{
    let magic = validator.magic();
    let header_len = validator.header_len().max(1);
    let mut header = vec![0u8; header_len];
    let mut scanned: u64 = 0;

    loop {
        if limit.is_some_and(|limit| scanned >= limit) {
            debug!(scanned, "scan limit reached without a record start");
            return Ok(ScanOutcome::LimitReached { scanned });
        }

        if fill(cursor, &mut header[..1])? == 0 {
            debug!(scanned, "stream exhausted without a record start");
            return Ok(ScanOutcome::Exhausted { scanned });
        }

        if header[0] == magic {
            let available = 1 + fill(cursor, &mut header[1..])?;
            cursor.unread(&header[..available])?;
            if available == header_len && validator.is_valid_header(&header) {
                debug!(offset = scanned, "found record start");
                return Ok(ScanOutcome::Found { offset: scanned });
            }
            // Drop only the magic byte; the rest of the lookahead is rescanned.
            fill(cursor, &mut header[..1])?;
        }

        scanned += 1;
        if scanned % SCAN_PROGRESS_INTERVAL == 0 {
            debug!(scanned, "scanning for record start");
        }
    }
}
