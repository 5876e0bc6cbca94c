//! Byte source trait definition.

use crate::error::{StorageError, StorageResult};
use std::sync::Arc;

/// A read-only, positionally addressable byte store.
///
/// Sources are **opaque**: they return bytes, never records. Every decoder
/// reads through a [`crate::RangeReader`] built on top of one of these.
///
/// # Invariants
///
/// - `read_at` returns exactly `len` bytes or fails with
///   [`StorageError::ReadPastEnd`]
/// - `read_into` never fails at end of data; it returns `0` instead
/// - Sources must be `Send + Sync` so that several windows of the same file
///   can be read from different threads
pub trait ByteSource: Send + Sync {
    /// Reads exactly `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range extends beyond the current size or an
    /// I/O error occurs.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Returns the current size of the source in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Reads up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes copied, which is `0` at or past the end.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn read_into(&self, offset: u64, buf: &mut [u8]) -> StorageResult<usize> {
        let size = self.size()?;
        if offset >= size || buf.is_empty() {
            return Ok(0);
        }
        let available = usize::try_from(size - offset).unwrap_or(usize::MAX);
        let len = buf.len().min(available);
        let data = self.read_at(offset, len)?;
        buf[..len].copy_from_slice(&data);
        Ok(len)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &T {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        (**self).read_at(offset, len)
    }

    fn size(&self) -> StorageResult<u64> {
        (**self).size()
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> StorageResult<usize> {
        (**self).read_into(offset, buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Arc<T> {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        (**self).read_at(offset, len)
    }

    fn size(&self) -> StorageResult<u64> {
        (**self).size()
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> StorageResult<usize> {
        (**self).read_into(offset, buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Box<T> {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        (**self).read_at(offset, len)
    }

    fn size(&self) -> StorageResult<u64> {
        (**self).size()
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> StorageResult<usize> {
        (**self).read_into(offset, buf)
    }
}

/// Validates that `offset..offset + len` fits in `size`.
pub(crate) fn check_range(offset: u64, len: usize, size: u64) -> StorageResult<()> {
    let end = offset.saturating_add(len as u64);
    if offset > size || end > size {
        return Err(StorageError::ReadPastEnd { offset, len, size });
    }
    Ok(())
}
