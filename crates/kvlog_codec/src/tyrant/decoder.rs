//! Tokyo Tyrant update log decoder.

use std::io::Read;

use tracing::debug;

use super::command::{Pair, TyrantCommand, COMMAND_MAGIC};
use super::opcode::Opcode;
use crate::config::DecoderConfig;
use crate::cursor::{fill, fill_record, read_declared, PushbackReader};
use crate::error::{DecodeError, DecodeResult, FormatError};
use crate::record::{Decoded, RecordDecoder};
use crate::scanner::{find_record_start, HeaderValidator, ScanOutcome};

/// Magic byte at the start of every ulog record.
pub const ULOG_MAGIC: u8 = 0xC9;

/// Size of the fixed record header: magic, timestamp, session id, size.
pub const RECORD_HEADER_LEN: usize = 17;

/// Bytes the scanner inspects: the record header plus the command magic.
pub const SCAN_HEADER_LEN: usize = RECORD_HEADER_LEN + 1;

/// One decoded update log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UlogRecord {
    /// Server timestamp in microseconds.
    pub timestamp: i64,
    /// Originating server id.
    pub session_id: i32,
    /// Declared payload size.
    pub payload_size: u32,
    /// The embedded command.
    pub command: TyrantCommand,
}

impl UlogRecord {
    /// Total bytes the record occupies on the wire.
    #[must_use]
    pub fn wire_len(&self) -> u64 {
        RECORD_HEADER_LEN as u64 + u64::from(self.payload_size)
    }

    /// The command's opcode.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        self.command.opcode()
    }

    /// The command's name.
    #[must_use]
    pub fn name(&self) -> std::borrow::Cow<'_, str> {
        self.command.name()
    }

    /// The command's decoded elements.
    #[must_use]
    pub fn elements(&self) -> &[Pair] {
        self.command.elements()
    }
}

/// Header predicate for ulog records.
///
/// Cross-checks the outer magic against the command magic that must follow
/// the 17 byte record header.
#[derive(Debug, Clone, Copy, Default)]
pub struct UlogHeader;

impl HeaderValidator for UlogHeader {
    fn magic(&self) -> u8 {
        ULOG_MAGIC
    }

    fn header_len(&self) -> usize {
        SCAN_HEADER_LEN
    }

    fn is_valid_header(&self, header: &[u8]) -> bool {
        header.len() >= SCAN_HEADER_LEN
            && header[0] == ULOG_MAGIC
            && header[SCAN_HEADER_LEN - 1] == COMMAND_MAGIC
    }
}

/// Fixed-size fields of a record header, magic excluded.
struct Header {
    timestamp: i64,
    session_id: i32,
    size: i32,
}

impl Header {
    fn parse(raw: &[u8; RECORD_HEADER_LEN - 1]) -> Self {
        let mut timestamp = [0u8; 8];
        let mut session_id = [0u8; 4];
        let mut size = [0u8; 4];
        timestamp.copy_from_slice(&raw[0..8]);
        session_id.copy_from_slice(&raw[8..12]);
        size.copy_from_slice(&raw[12..16]);
        Self {
            timestamp: i64::from_be_bytes(timestamp),
            session_id: i32::from_be_bytes(session_id),
            size: i32::from_be_bytes(size),
        }
    }

    fn payload_size(&self, config: &DecoderConfig) -> Result<u32, FormatError> {
        let size = u32::try_from(self.size).map_err(|_| FormatError::NegativeLength {
            field: "payload",
            len: i64::from(self.size),
        })?;
        config.check_size(u64::from(size))?;
        Ok(size)
    }
}

/// Sequential decoder over a ulog byte stream.
///
/// The decoder owns its read buffer but not the stream's lifetime beyond
/// its own: [`into_inner`](Self::into_inner) hands the source back.
#[derive(Debug)]
pub struct UlogDecoder<R> {
    cursor: PushbackReader<R>,
    config: DecoderConfig,
    records_read: u64,
}

impl<R: Read> UlogDecoder<R> {
    /// Creates a decoder with the default configuration.
    pub fn new(source: R) -> Self {
        Self::with_config(source, DecoderConfig::default())
    }

    /// Creates a decoder with the given configuration.
    pub fn with_config(source: R, config: DecoderConfig) -> Self {
        let cursor = PushbackReader::new(source, config.effective_buffer_size(), SCAN_HEADER_LEN);
        Self {
            cursor,
            config,
            records_read: 0,
        }
    }

    /// Decodes the next record.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly on a record boundary.
    ///
    /// # Errors
    ///
    /// [`FormatError::BadMagic`] and the other format errors, or
    /// [`DecodeError::TruncatedRecord`] if the stream ends inside a record,
    /// whether it reports that with a short read or with `UnexpectedEof`.
    /// Any other source error is returned as [`DecodeError::Io`].
    pub fn read_record(&mut self) -> DecodeResult<Option<Decoded<UlogRecord>>> {
        let offset = self.cursor.position();

        let mut magic = [0u8; 1];
        if fill(&mut self.cursor, &mut magic)? == 0 {
            return Ok(None);
        }
        if magic[0] != ULOG_MAGIC {
            return Err(FormatError::BadMagic {
                expected: ULOG_MAGIC,
                found: magic[0],
            }
            .into());
        }

        let mut raw = [0u8; RECORD_HEADER_LEN - 1];
        let n = fill_record(&mut self.cursor, &mut raw)?;
        if n < raw.len() {
            return Err(DecodeError::truncated(
                RECORD_HEADER_LEN as u64,
                1 + n as u64,
            ));
        }
        let header = Header::parse(&raw);
        let payload_size = header.payload_size(&self.config)?;
        debug!(
            offset,
            timestamp = header.timestamp,
            session_id = header.session_id,
            size = payload_size,
            "ulog record header"
        );

        let payload = read_declared(&mut self.cursor, u64::from(payload_size))?;
        if payload.len() < payload_size as usize {
            return Err(DecodeError::truncated(
                u64::from(payload_size),
                payload.len() as u64,
            ));
        }

        let command = TyrantCommand::parse(&payload, self.config.strict_opcodes)?;
        let record = UlogRecord {
            timestamp: header.timestamp,
            session_id: header.session_id,
            payload_size,
            command,
        };
        self.records_read += 1;

        Ok(Some(Decoded {
            offset,
            len: record.wire_len(),
            record,
        }))
    }

    /// Skips to the first valid record start, at most `limit` bytes away.
    ///
    /// # Errors
    ///
    /// Only I/O errors from the source.
    pub fn find_first_record(&mut self, limit: Option<u64>) -> DecodeResult<ScanOutcome> {
        Ok(find_record_start(&mut self.cursor, &UlogHeader, limit)?)
    }

    /// Returns `true` if buffered bytes remain. Advisory only.
    ///
    /// # Errors
    ///
    /// Returns an error if refilling the buffer fails.
    pub fn has_next(&mut self) -> DecodeResult<bool> {
        Ok(self.cursor.has_remaining()?)
    }

    /// Bytes consumed since the decoder was created.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Number of records decoded so far.
    #[must_use]
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Returns the underlying source. Buffered bytes are lost.
    pub fn into_inner(self) -> R {
        self.cursor.into_inner()
    }
}

impl<R: Read> RecordDecoder for UlogDecoder<R> {
    type Record = UlogRecord;

    fn has_next(&mut self) -> DecodeResult<bool> {
        UlogDecoder::has_next(self)
    }

    fn next_record(&mut self) -> DecodeResult<Option<Decoded<UlogRecord>>> {
        self.read_record()
    }

    fn align(&mut self, limit: Option<u64>) -> DecodeResult<ScanOutcome> {
        self.find_first_record(limit)
    }

    fn position(&self) -> u64 {
        UlogDecoder::position(self)
    }
}

/// Decodes one complete record from an in-memory buffer.
///
/// With `check_magic` the buffer starts at the record's magic byte;
/// without it the buffer starts at the timestamp. Bytes after the payload
/// are ignored.
///
/// # Errors
///
/// The same errors as [`UlogDecoder::read_record`].
pub fn decode_record(buffer: &[u8], check_magic: bool) -> DecodeResult<UlogRecord> {
    let mut data = buffer;
    if check_magic {
        match data.split_first() {
            Some((&ULOG_MAGIC, rest)) => data = rest,
            Some((&found, _)) => {
                return Err(FormatError::BadMagic {
                    expected: ULOG_MAGIC,
                    found,
                }
                .into())
            }
            None => return Err(DecodeError::truncated(RECORD_HEADER_LEN as u64, 0)),
        }
    }

    let header_len = RECORD_HEADER_LEN - 1;
    if data.len() < header_len {
        return Err(DecodeError::truncated(
            header_len as u64,
            data.len() as u64,
        ));
    }
    let mut raw = [0u8; RECORD_HEADER_LEN - 1];
    raw.copy_from_slice(&data[..header_len]);
    let header = Header::parse(&raw);
    // Detached decoding sees the whole buffer already, so no ceiling applies.
    let payload_size = header.payload_size(&DecoderConfig::new().max_record_size(0))?;

    let payload = &data[header_len..];
    if payload.len() < payload_size as usize {
        return Err(DecodeError::truncated(
            u64::from(payload_size),
            payload.len() as u64,
        ));
    }

    let command = TyrantCommand::parse(&payload[..payload_size as usize], false)?;
    Ok(UlogRecord {
        timestamp: header.timestamp,
        session_id: header.session_id,
        payload_size,
        command,
    })
}
