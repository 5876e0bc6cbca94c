//! # kvlog Codec
//!
//! Decoders for two key-value store transaction logs:
//!
//! - Tokyo Tyrant update logs ("ulog"): binary records with an embedded
//!   command payload, see [`UlogDecoder`].
//! - Redis append-only files ("AOF"): CRLF-terminated multibulk commands,
//!   see [`AofDecoder`].
//!
//! Both decoders implement [`RecordDecoder`], a sequential cursor that
//! reports the exact byte length of every record so callers can reconcile
//! positions with absolute file offsets.
//!
//! ## Resynchronization
//!
//! A byte window of a larger file rarely starts on a record boundary.
//! [`RecordDecoder::align`] runs the boundary scanner ([`find_record_start`])
//! once before decoding begins. The ulog predicate cross-checks the record
//! magic against the command magic 17 bytes later; the AOF predicate looks
//! for `*<count>\r\n$<digit>`.
//!
//! ## Usage
//!
//! ```
//! use kvlog_codec::{AofDecoder, RecordDecoder, RedisCommandType};
//!
//! let data: &[u8] = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n";
//! let mut decoder = AofDecoder::new(data);
//!
//! let decoded = decoder.next_record().unwrap().unwrap();
//! assert_eq!(decoded.record.command_type, RedisCommandType::Set);
//! assert_eq!(decoded.len, data.len() as u64);
//! assert!(decoder.next_record().unwrap().is_none());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod cursor;
mod error;
mod record;
mod redis;
mod scanner;
mod tyrant;

pub use config::{DecoderConfig, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_RECORD_SIZE};
pub use cursor::{PushbackRead, PushbackReader};
pub use error::{DecodeError, DecodeResult, FormatError};
pub use record::{Decoded, RecordDecoder, Records};
pub use redis::{
    AofDecoder, MultibulkHeader, RedisCommand, RedisCommandType, AOF_HEADER_LEN, BULK_MAGIC,
    MULTIBULK_MAGIC, NO_EXPIRY,
};
pub use scanner::{find_record_start, HeaderValidator, ScanOutcome, SCAN_PROGRESS_INTERVAL};
pub use tyrant::{
    decode_record, Opcode, Pair, TyrantCommand, UlogDecoder, UlogHeader, UlogRecord,
    COMMAND_MAGIC, RECORD_HEADER_LEN, SCAN_HEADER_LEN, ULOG_MAGIC,
};
