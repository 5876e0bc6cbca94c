//! File-based byte source.

use crate::backend::{check_range, ByteSource};
use crate::error::StorageResult;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A read-only byte source backed by an OS file.
///
/// The file is opened read-only and never modified. Its size is queried on
/// every [`ByteSource::size`] call, so a log that is still being appended to
/// is seen at its current length.
///
/// # Thread Safety
///
/// Reads seek a shared handle under an internal lock, so one `FileSource`
/// can serve several windows. Independent workers may just as well open
/// their own instance.
///
/// # Example
///
/// ```no_run
/// use kvlog_storage::{ByteSource, FileSource};
/// use std::path::Path;
///
/// let source = FileSource::open(Path::new("0000001.ulog")).unwrap();
/// let header = source.read_at(0, 18).unwrap();
/// ```
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSource {
    /// Opens an existing file for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let mut file = self.file.lock();
        let size = file.metadata()?.len();
        check_range(offset, len, size)?;

        if len == 0 {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.file.lock().metadata()?.len())
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> StorageResult<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        loop {
            match file.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(data).unwrap();
        file.sync_all().unwrap();
        path
    }

    #[test]
    fn file_open_missing_fails() {
        let dir = tempdir().unwrap();
        let result = FileSource::open(&dir.path().join("missing.ulog"));
        assert!(matches!(result, Err(StorageError::Io(_))));
    }

    #[test]
    fn file_read_at() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "test.bin", b"hello world");

        let source = FileSource::open(&path).unwrap();
        assert_eq!(source.size().unwrap(), 11);
        assert_eq!(&source.read_at(0, 11).unwrap(), b"hello world");
        assert_eq!(&source.read_at(6, 5).unwrap(), b"world");
    }

    #[test]
    fn file_read_past_end_fails() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "test.bin", b"hello");

        let source = FileSource::open(&path).unwrap();
        let result = source.read_at(10, 5);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));
    }

    #[test]
    fn file_read_into_stops_at_eof() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "test.bin", b"hello");

        let source = FileSource::open(&path).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(source.read_into(1, &mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], b"ello");
        assert_eq!(source.read_into(5, &mut buf).unwrap(), 0);
    }

    #[test]
    fn file_sees_appended_data() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "live.ulog", b"abc");
        let source = FileSource::open(&path).unwrap();
        assert_eq!(source.size().unwrap(), 3);

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"def").unwrap();
        file.sync_all().unwrap();

        assert_eq!(source.size().unwrap(), 6);
        assert_eq!(&source.read_at(3, 3).unwrap(), b"def");
    }

    #[test]
    fn file_path() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "test.bin", b"");

        let source = FileSource::open(&path).unwrap();
        assert_eq!(source.path(), path);
    }
}
