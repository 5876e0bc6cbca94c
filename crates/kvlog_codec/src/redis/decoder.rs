//! Redis append-only file decoder.

use std::io::{BufRead, Read};

use bytes::Bytes;
use tracing::debug;

use super::command::{RedisCommand, RedisCommandType, NO_EXPIRY};
use super::text::latin1;
use crate::config::DecoderConfig;
use crate::cursor::{fill_record, is_early_eof, read_declared, PushbackReader};
use crate::error::{DecodeError, DecodeResult, FormatError};
use crate::record::{Decoded, RecordDecoder};
use crate::scanner::{find_record_start, HeaderValidator, ScanOutcome};

/// First byte of a multibulk record.
pub const MULTIBULK_MAGIC: u8 = b'*';

/// First byte of a bulk string header.
pub const BULK_MAGIC: u8 = b'$';

/// Bytes the scanner inspects at a candidate record start.
pub const AOF_HEADER_LEN: usize = 8;

/// Longest accepted `*N` or `$len` line, terminator excluded.
const MAX_HEADER_LINE: usize = 32;

const CRLF: &[u8; 2] = b"\r\n";

/// Header predicate for AOF records: `*<1-3 digits>\r\n$<digit>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultibulkHeader;

impl HeaderValidator for MultibulkHeader {
    fn magic(&self) -> u8 {
        MULTIBULK_MAGIC
    }

    fn header_len(&self) -> usize {
        AOF_HEADER_LEN
    }

    fn is_valid_header(&self, header: &[u8]) -> bool {
        let Some(rest) = header.strip_prefix(&[MULTIBULK_MAGIC]) else {
            return false;
        };
        let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
        if !(1..=3).contains(&digits) {
            return false;
        }
        match &rest[digits..] {
            [b'\r', b'\n', BULK_MAGIC, d, ..] => d.is_ascii_digit(),
            _ => false,
        }
    }
}

/// A line read up to CR-LF.
struct Line {
    bytes: Vec<u8>,
    terminated: bool,
}

/// Sequential decoder over an AOF byte stream.
#[derive(Debug)]
pub struct AofDecoder<R> {
    cursor: PushbackReader<R>,
    config: DecoderConfig,
    records_read: u64,
}

impl<R: Read> AofDecoder<R> {
    /// Creates a decoder with the default configuration.
    pub fn new(source: R) -> Self {
        Self::with_config(source, DecoderConfig::default())
    }

    /// Creates a decoder with the given configuration.
    pub fn with_config(source: R, config: DecoderConfig) -> Self {
        let cursor = PushbackReader::new(source, config.effective_buffer_size(), AOF_HEADER_LEN);
        Self {
            cursor,
            config,
            records_read: 0,
        }
    }

    /// Decodes the next command.
    ///
    /// Returns `Ok(None)` at the end of input or when the next line does not
    /// start a multibulk record. That line is consumed.
    ///
    /// # Errors
    ///
    /// [`FormatError::UnknownCommand`] and the other format errors, or
    /// [`DecodeError::TruncatedRecord`] if the stream ends inside a record,
    /// whether it reports that with a short read or with `UnexpectedEof`.
    /// Any other source error is returned as [`DecodeError::Io`].
    pub fn read_record(&mut self) -> DecodeResult<Option<Decoded<RedisCommand>>> {
        let offset = self.cursor.position();

        let Some(line) = self.read_line(MAX_HEADER_LINE, false)? else {
            return Ok(None);
        };
        if line.bytes.first() != Some(&MULTIBULK_MAGIC) {
            debug!(offset, line = %latin1(&line.bytes), "no multibulk header, stopping");
            return Ok(None);
        }
        if !line.terminated {
            if line.bytes.len() > MAX_HEADER_LINE {
                return Err(FormatError::InvalidBulkHeader {
                    line: latin1(&line.bytes),
                }
                .into());
            }
            let available = line.bytes.len() as u64;
            return Err(DecodeError::truncated(available + 2, available));
        }
        // The count is informational; every record is read as three bulks.
        debug!(offset, count = %latin1(&line.bytes[1..]), "multibulk record");

        let name = latin1(&self.read_bulk()?);
        let key = latin1(&self.read_bulk()?);
        let value = self.read_bulk()?;

        let Some(command_type) = RedisCommandType::from_name(&name) else {
            return Err(FormatError::UnknownCommand { name }.into());
        };
        let command = if command_type == RedisCommandType::ExpireAt {
            let text = latin1(&value);
            let expire_at = text
                .parse::<i64>()
                .map_err(|_| FormatError::InvalidExpireAt { value: text.clone() })?;
            RedisCommand {
                command_type,
                key,
                value: None,
                expire_at,
            }
        } else {
            RedisCommand {
                command_type,
                key,
                value: Some(Bytes::from(value)),
                expire_at: NO_EXPIRY,
            }
        };
        debug!(command = %command.command_type, key = %command.key, "aof command");
        self.records_read += 1;

        Ok(Some(Decoded {
            offset,
            len: self.cursor.position() - offset,
            record: command,
        }))
    }

    /// Skips to the first valid multibulk header, at most `limit` bytes away.
    ///
    /// # Errors
    ///
    /// Only I/O errors from the source.
    pub fn find_first_record(&mut self, limit: Option<u64>) -> DecodeResult<ScanOutcome> {
        Ok(find_record_start(&mut self.cursor, &MultibulkHeader, limit)?)
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

    /// Number of commands decoded so far.
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

    /// Reads one `$len\r\n<bytes>\r\n` bulk string.
    fn read_bulk(&mut self) -> DecodeResult<Vec<u8>> {
        let line = match self.read_line(MAX_HEADER_LINE, true)? {
            Some(line) if line.terminated => line,
            Some(line) if line.bytes.len() > MAX_HEADER_LINE => {
                return Err(FormatError::InvalidBulkHeader {
                    line: latin1(&line.bytes),
                }
                .into())
            }
            Some(line) => {
                let available = line.bytes.len() as u64;
                return Err(DecodeError::truncated(available + 2, available));
            }
            None => return Err(DecodeError::truncated(CRLF.len() as u64, 0)),
        };

        let invalid = || FormatError::InvalidBulkHeader {
            line: latin1(&line.bytes),
        };
        let digits = line.bytes.strip_prefix(&[BULK_MAGIC]).ok_or_else(invalid)?;
        let len: i64 = std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)?;
        let len = u64::try_from(len).map_err(|_| FormatError::NegativeLength { field: "bulk", len })?;
        self.config.check_size(len)?;

        let data = read_declared(&mut self.cursor, len)?;
        if (data.len() as u64) < len {
            return Err(DecodeError::truncated(len, data.len() as u64));
        }

        let mut terminator = [0u8; 2];
        let n = fill_record(&mut self.cursor, &mut terminator)?;
        if n < terminator.len() {
            return Err(DecodeError::truncated(2, n as u64));
        }
        if &terminator != CRLF {
            return Err(FormatError::MissingTerminator.into());
        }
        Ok(data)
    }

    /// Reads bytes up to and excluding the next CR-LF.
    ///
    /// Returns `None` at end of input. A line longer than `max` bytes is
    /// returned unterminated as soon as that is known; the rest of it stays
    /// in the stream. Once a record has started (`in_record`, or bytes of
    /// this line were read) an `UnexpectedEof` from the source counts as end
    /// of input.
    fn read_line(&mut self, max: usize, in_record: bool) -> DecodeResult<Option<Line>> {
        let mut bytes = Vec::new();
        loop {
            let available = match self.cursor.fill_buf() {
                Ok(available) => available,
                Err(e) if (in_record || !bytes.is_empty()) && is_early_eof(&e) => &[][..],
                Err(e) => return Err(e.into()),
            };
            if available.is_empty() {
                if bytes.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(Line {
                    bytes,
                    terminated: false,
                }));
            }

            // Leave room to see the CR-LF that may follow `max` line bytes.
            let room = max + CRLF.len() + 1 - bytes.len();
            let window = &available[..available.len().min(room)];
            let (used, found) = match window.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (window.len(), false),
            };
            bytes.extend_from_slice(&window[..used]);
            self.cursor.consume(used);

            if found && bytes.ends_with(CRLF) {
                bytes.truncate(bytes.len() - CRLF.len());
                return Ok(Some(Line {
                    bytes,
                    terminated: true,
                }));
            }
            if bytes.len() > max + CRLF.len() {
                return Ok(Some(Line {
                    bytes,
                    terminated: false,
                }));
            }
        }
    }
}

impl<R: Read> RecordDecoder for AofDecoder<R> {
    type Record = RedisCommand;

    fn has_next(&mut self) -> DecodeResult<bool> {
        AofDecoder::has_next(self)
    }

    fn next_record(&mut self) -> DecodeResult<Option<Decoded<RedisCommand>>> {
        self.read_record()
    }

    fn align(&mut self, limit: Option<u64>) -> DecodeResult<ScanOutcome> {
        self.find_first_record(limit)
    }

    fn position(&self) -> u64 {
        AofDecoder::position(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::FailingSource;
    use std::io;

    const SET: &[u8] = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n";

    fn decode_one(data: &[u8]) -> DecodeResult<Option<Decoded<RedisCommand>>> {
        AofDecoder::new(data).read_record()
    }

    #[test]
    fn decodes_set() {
        let decoded = decode_one(SET).unwrap().unwrap();
        assert_eq!(decoded.offset, 0);
        assert_eq!(decoded.len, SET.len() as u64);
        assert_eq!(
            decoded.record,
            RedisCommand {
                command_type: RedisCommandType::Set,
                key: "k".into(),
                value: Some(Bytes::from_static(b"v")),
                expire_at: NO_EXPIRY,
            }
        );
    }

    #[test]
    fn decodes_expireat() {
        let data = b"*3\r\n$8\r\nEXPIREAT\r\n$3\r\nkey\r\n$10\r\n1234567890\r\n";
        let record = decode_one(data).unwrap().unwrap().record;
        assert_eq!(record.command_type, RedisCommandType::ExpireAt);
        assert_eq!(record.expire_at, 1_234_567_890);
        assert_eq!(record.value, None);
    }

    #[test]
    fn invalid_expireat() {
        let data = b"*3\r\n$8\r\nEXPIREAT\r\n$3\r\nkey\r\n$3\r\nabc\r\n";
        let err = decode_one(data).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Format(FormatError::InvalidExpireAt { .. })
        ));
    }

    #[test]
    fn binary_values_round_trip() {
        let mut data = b"*3\r\n$4\r\nHSET\r\n$2\r\n\xff\x80\r\n$4\r\n".to_vec();
        data.extend_from_slice(&[0x00, b'\r', b'\n', 0xfe]);
        data.extend_from_slice(CRLF);

        let record = decode_one(&data).unwrap().unwrap().record;
        assert_eq!(record.key, "\u{ff}\u{80}");
        assert_eq!(record.value.unwrap().as_ref(), &[0x00, b'\r', b'\n', 0xfe]);
    }

    #[test]
    fn sequential_records() {
        let mut data = SET.to_vec();
        data.extend_from_slice(b"*3\r\n$5\r\nRPUSH\r\n$4\r\nlist\r\n$2\r\nab\r\n");

        let records: Vec<_> = AofDecoder::new(data.as_slice())
            .records()
            .collect::<DecodeResult<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].offset, SET.len() as u64);
        assert_eq!(records[1].record.command_type, RedisCommandType::RPush);
        assert_eq!(records[1].end(), data.len() as u64);
    }

    #[test]
    fn non_multibulk_line_ends_stream() {
        assert!(decode_one(b"+OK\r\n").unwrap().is_none());
        assert!(decode_one(b"").unwrap().is_none());
    }

    #[test]
    fn count_is_not_validated() {
        let data = b"*4\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n";
        assert!(decode_one(data).unwrap().is_some());
    }

    #[test]
    fn unknown_command() {
        let data = b"*3\r\n$3\r\nDEL\r\n$1\r\nk\r\n$1\r\nv\r\n";
        let err = decode_one(data).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Format(FormatError::UnknownCommand { ref name }) if name == "DEL"
        ));
    }

    #[test]
    fn lowercase_command() {
        let data = b"*3\r\n$4\r\nsadd\r\n$1\r\nk\r\n$1\r\nv\r\n";
        let record = decode_one(data).unwrap().unwrap().record;
        assert_eq!(record.command_type, RedisCommandType::SAdd);
    }

    #[test]
    fn truncated_bulk() {
        let err = decode_one(&SET[..SET.len() - 3]).unwrap_err();
        assert!(err.is_truncated());

        let err = decode_one(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n").unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn early_eof_inside_bulk_is_truncated() {
        let data = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$10\r\nab";
        let source = FailingSource::new(data, io::ErrorKind::UnexpectedEof);
        let err = AofDecoder::new(source).read_record().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TruncatedRecord {
                expected: 10,
                available: 2
            }
        ));
    }

    #[test]
    fn early_eof_between_bulks_is_truncated() {
        let data = b"*3\r\n$3\r\nSET\r\n";
        let source = FailingSource::new(data, io::ErrorKind::UnexpectedEof);
        let err = AofDecoder::new(source).read_record().unwrap_err();
        assert!(err.is_truncated());

        let data = b"*3\r";
        let source = FailingSource::new(data, io::ErrorKind::UnexpectedEof);
        let err = AofDecoder::new(source).read_record().unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn source_errors_pass_through() {
        let data = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$10\r\nab";
        let source = FailingSource::new(data, io::ErrorKind::ConnectionReset);
        let err = AofDecoder::new(source).read_record().unwrap_err();
        assert!(matches!(err, DecodeError::Io(ref e) if e.kind() == io::ErrorKind::ConnectionReset));

        let mut decoder = AofDecoder::new(FailingSource::new(SET, io::ErrorKind::UnexpectedEof));
        assert!(decoder.read_record().unwrap().is_some());
        let err = decoder.read_record().unwrap_err();
        assert!(matches!(err, DecodeError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn bulk_length_past_end() {
        let err = decode_one(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$100\r\nv\r\n").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TruncatedRecord { expected: 100, .. }
        ));
    }

    #[test]
    fn bad_bulk_header() {
        let err = decode_one(b"*3\r\n#3\r\nSET\r\n").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Format(FormatError::InvalidBulkHeader { .. })
        ));

        let err = decode_one(b"*3\r\n$-1\r\n").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Format(FormatError::NegativeLength { field: "bulk", .. })
        ));
    }

    #[test]
    fn overlong_bulk_header() {
        let mut data = b"*3\r\n$".to_vec();
        data.extend(std::iter::repeat(b'9').take(100));
        let err = decode_one(&data).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Format(FormatError::InvalidBulkHeader { .. })
        ));
    }

    #[test]
    fn unterminated_multibulk_line() {
        assert!(decode_one(b"*3").unwrap_err().is_truncated());
        assert!(decode_one(b"*33333333333333333333333333333333333333\r\n")
            .unwrap_err()
            .is_format());
    }

    #[test]
    fn missing_terminator() {
        let err = decode_one(b"*3\r\n$3\r\nSETxx").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Format(FormatError::MissingTerminator)
        ));
    }

    #[test]
    fn validator() {
        let v = MultibulkHeader;
        assert!(v.is_valid_header(b"*3\r\n$3\r\n"));
        assert!(v.is_valid_header(b"*123\r\n$4"));
        assert!(!v.is_valid_header(b"*1234\r\n$"));
        assert!(!v.is_valid_header(b"*\r\n$3\r\nS"));
        assert!(!v.is_valid_header(b"*3\r\n*3\r\n"));
        assert!(!v.is_valid_header(b"$3\r\n$3\r\n"));
    }

    #[test]
    fn aligns_inside_value() {
        // Starts mid-record: "1\r\nv\r\n" is the tail of a previous command.
        let mut data = b"1\r\nv\r\n".to_vec();
        let skipped = data.len() as u64;
        data.extend_from_slice(SET);

        let mut decoder = AofDecoder::new(data.as_slice());
        assert_eq!(
            decoder.find_first_record(None).unwrap(),
            ScanOutcome::Found { offset: skipped }
        );
        let decoded = decoder.read_record().unwrap().unwrap();
        assert_eq!(decoded.offset, skipped);
        assert_eq!(decoded.record.key, "k");
    }

    #[test]
    fn small_buffer_still_decodes() {
        let config = DecoderConfig::new().buffer_size(3);
        let decoded = AofDecoder::with_config(SET, config)
            .read_record()
            .unwrap()
            .unwrap();
        assert_eq!(decoded.len, SET.len() as u64);
    }
}
