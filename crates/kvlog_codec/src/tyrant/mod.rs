//! Tokyo Tyrant update log ("ulog") format.
//!
//! A record is a 17 byte big-endian header followed by a command payload:
//!
//! ```text
//! [0xC9][i64 timestamp][i32 session id][i32 size][size bytes payload]
//! payload: [0xC8][opcode][opcode fields...]
//! ```

mod command;
mod decoder;
mod opcode;

pub use command::{Pair, TyrantCommand, COMMAND_MAGIC};
pub use decoder::{
    decode_record, UlogDecoder, UlogHeader, UlogRecord, RECORD_HEADER_LEN, SCAN_HEADER_LEN,
    ULOG_MAGIC,
};
pub use opcode::Opcode;
