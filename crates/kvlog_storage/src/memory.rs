//! In-memory byte source.

use crate::backend::{check_range, ByteSource};
use crate::error::StorageResult;
use bytes::Bytes;

/// An in-memory byte source.
///
/// Suitable for unit tests, fixtures built with `kvlog_testkit`, and logs
/// that were already loaded (or decompressed) into memory. Cloning is cheap:
/// clones share the same buffer.
///
/// # Example
///
/// ```rust
/// use kvlog_storage::{ByteSource, InMemorySource};
///
/// let source = InMemorySource::with_data(b"test data".to_vec());
/// assert_eq!(source.size().unwrap(), 9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    data: Bytes,
}

impl InMemorySource {
    /// Creates a new empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source over the given bytes.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(data),
        }
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for InMemorySource {
    fn from(data: Vec<u8>) -> Self {
        Self::with_data(data)
    }
}

impl ByteSource for InMemorySource {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = &self.data[..];
        check_range(offset, len, data.len() as u64)?;
        let start = offset as usize;
        Ok(data[start..start + len].to_vec())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.len() as u64)
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> StorageResult<usize> {
        let data = &self.data[..];
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= data.len() {
            return Ok(0);
        }
        let len = buf.len().min(data.len() - start);
        buf[..len].copy_from_slice(&data[start..start + len]);
        Ok(len)
    }
}
