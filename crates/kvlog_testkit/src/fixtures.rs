//! Log framing helpers.
//!
//! The decoders never write logs; these builders exist so tests and
//! benchmarks can produce byte-exact inputs. Each builder records the offset
//! of every record it frames.

use std::io::Write;
use std::path::{Path, PathBuf};

use kvlog_codec::{Opcode, COMMAND_MAGIC, ULOG_MAGIC};
use tempfile::TempDir;

/// Builds a Tokyo Tyrant update log.
#[derive(Debug, Clone, Default)]
pub struct UlogBuilder {
    buf: Vec<u8>,
    offsets: Vec<u64>,
    session_id: i32,
}

impl UlogBuilder {
    /// Creates an empty log with session id 1.
    pub fn new() -> Self {
        Self {
            session_id: 1,
            ..Self::default()
        }
    }

    /// Sets the session id used for following records.
    pub fn session_id(mut self, session_id: i32) -> Self {
        self.session_id = session_id;
        self
    }

    /// Appends a `put` record.
    pub fn put(self, timestamp: i64, key: &[u8], value: &[u8]) -> Self {
        let payload = put_payload(Opcode::Put, key, value);
        self.record(timestamp, &payload)
    }

    /// Appends a `putkeep` record.
    pub fn putkeep(self, timestamp: i64, key: &[u8], value: &[u8]) -> Self {
        let payload = put_payload(Opcode::PutKeep, key, value);
        self.record(timestamp, &payload)
    }

    /// Appends a `misc` record with the given element pairs.
    pub fn misc(self, timestamp: i64, name: &[u8], pairs: &[(&[u8], &[u8])]) -> Self {
        let payload = misc_payload(name, (pairs.len() * 2) as i32, pairs);
        self.record(timestamp, &payload)
    }

    /// Appends a record with an arbitrary opcode and raw field bytes.
    pub fn command(self, timestamp: i64, opcode: u8, fields: &[u8]) -> Self {
        let mut payload = vec![COMMAND_MAGIC, opcode];
        payload.extend_from_slice(fields);
        self.record(timestamp, &payload)
    }

    /// Appends a record around an arbitrary payload.
    pub fn record(mut self, timestamp: i64, payload: &[u8]) -> Self {
        self.offsets.push(self.buf.len() as u64);
        self.buf.extend_from_slice(&frame(timestamp, self.session_id, payload));
        self
    }

    /// Appends raw bytes that are not a record.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Offsets of the framed records.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Current length of the log.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the log bytes.
    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

/// Frames `payload` as one ulog record.
pub fn frame(timestamp: i64, session_id: i32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(17 + payload.len());
    buf.push(ULOG_MAGIC);
    buf.extend_from_slice(&timestamp.to_be_bytes());
    buf.extend_from_slice(&session_id.to_be_bytes());
    buf.extend_from_slice(&(payload.len() as i32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Encodes a `put`-style command payload.
pub fn put_payload(opcode: Opcode, key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut buf = vec![COMMAND_MAGIC, opcode.as_byte()];
    buf.extend_from_slice(&(key.len() as i32).to_be_bytes());
    buf.extend_from_slice(&(value.len() as i32).to_be_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);
    buf.push(0);
    buf
}

/// Encodes a `misc` command payload with an explicit list length.
///
/// The list length is written as given so malformed payloads can be built.
pub fn misc_payload(name: &[u8], list_len: i32, pairs: &[(&[u8], &[u8])]) -> Vec<u8> {
    let mut buf = vec![COMMAND_MAGIC, Opcode::Misc.as_byte()];
    buf.extend_from_slice(&(name.len() as i32).to_be_bytes());
    buf.extend_from_slice(&list_len.to_be_bytes());
    buf.extend_from_slice(name);
    for (key, value) in pairs {
        buf.extend_from_slice(&(key.len() as i32).to_be_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(&(value.len() as i32).to_be_bytes());
        buf.extend_from_slice(value);
    }
    buf.push(0);
    buf
}

/// Builds a Redis append-only file.
#[derive(Debug, Clone, Default)]
pub struct AofBuilder {
    buf: Vec<u8>,
    offsets: Vec<u64>,
}

impl AofBuilder {
    /// Creates an empty file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a three-bulk command.
    pub fn command(mut self, name: &str, key: &[u8], value: &[u8]) -> Self {
        self.offsets.push(self.buf.len() as u64);
        self.buf.extend_from_slice(b"*3\r\n");
        for field in [name.as_bytes(), key, value] {
            bulk(&mut self.buf, field);
        }
        self
    }

    /// Appends a `SET`.
    pub fn set(self, key: &[u8], value: &[u8]) -> Self {
        self.command("SET", key, value)
    }

    /// Appends an `EXPIREAT`.
    pub fn expireat(self, key: &[u8], timestamp: i64) -> Self {
        self.command("EXPIREAT", key, timestamp.to_string().as_bytes())
    }

    /// Appends raw bytes that are not a command.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Offsets of the framed commands.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Returns the file bytes.
    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

fn bulk(buf: &mut Vec<u8>, field: &[u8]) {
    buf.extend_from_slice(format!("${}\r\n", field.len()).as_bytes());
    buf.extend_from_slice(field);
    buf.extend_from_slice(b"\r\n");
}

/// A log written to a temporary directory, removed on drop.
pub struct TempLog {
    path: PathBuf,
    _dir: TempDir,
}

impl TempLog {
    /// Writes `bytes` to a file named `name` in a fresh temporary directory.
    pub fn new(name: &str, bytes: &[u8]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("Failed to create log file");
        file.write_all(bytes).expect("Failed to write log file");
        Self { path, _dir: dir }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvlog_codec::{AofDecoder, Pair, RecordDecoder, RedisCommandType, UlogDecoder};

    #[test]
    fn ulog_builder_records_offsets() {
        let log = UlogBuilder::new()
            .put(1, b"k", b"v")
            .misc(
                2,
                b"putlist",
                &[
                    (b"a".as_slice(), b"1".as_slice()),
                    (b"b".as_slice(), b"2".as_slice()),
                ],
            )
            .command(3, 0x72, &[]);
        let offsets = log.offsets().to_vec();
        let data = log.build();

        let records: Vec<_> = UlogDecoder::new(data.as_slice())
            .records()
            .map(Result::unwrap)
            .collect();
        assert_eq!(records.iter().map(|r| r.offset).collect::<Vec<_>>(), offsets);
        assert_eq!(records[1].record.elements()[1], Pair::new("b", "2"));
        assert_eq!(records[2].record.name(), "vanish");
    }

    #[test]
    fn aof_builder_round_trips() {
        let data = AofBuilder::new().set(b"k", b"v").expireat(b"k", 99).build();
        let records: Vec<_> = AofDecoder::new(data.as_slice())
            .records()
            .map(Result::unwrap)
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].record.command_type, RedisCommandType::ExpireAt);
        assert_eq!(records[1].record.expire_at, 99);
    }

    #[test]
    fn temp_log_is_written() {
        let log = TempLog::new("x.ulog", b"abc");
        assert_eq!(std::fs::read(log.path()).unwrap(), b"abc");
    }
}
