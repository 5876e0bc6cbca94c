//! Redis append-only file ("AOF") format.
//!
//! Rewritten AOFs are sequences of three-element multibulk commands:
//!
//! ```text
//! *3\r\n$<len>\r\n<name>\r\n$<len>\r\n<key>\r\n$<len>\r\n<value>\r\n
//! ```

mod command;
mod decoder;
mod text;

pub use command::{RedisCommand, RedisCommandType, NO_EXPIRY};
pub use decoder::{AofDecoder, MultibulkHeader, AOF_HEADER_LEN, BULK_MAGIC, MULTIBULK_MAGIC};
