//! Embedded Tyrant command payloads.

use std::borrow::Cow;

use bytes::Bytes;
use tracing::debug;

use super::opcode::Opcode;
use crate::error::{DecodeError, DecodeResult, FormatError};

/// Magic byte at the start of every embedded command.
pub const COMMAND_MAGIC: u8 = 0xC8;

/// One key/value element of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    /// Raw key bytes.
    pub key: Bytes,
    /// Raw value bytes.
    pub value: Bytes,
}

impl Pair {
    /// Creates a pair from anything convertible to [`Bytes`].
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A command decoded from a ulog record payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TyrantCommand {
    /// `put`: store a value, overwriting.
    Put(Pair),
    /// `putkeep`: store a value unless the key exists.
    PutKeep(Pair),
    /// `misc`: a named extension call with an ordered element list.
    Misc {
        /// Raw function name.
        name: Bytes,
        /// Elements in wire order; duplicate keys are kept.
        elements: Vec<Pair>,
    },
    /// An opcode whose fields are not decoded.
    Unparsed {
        /// The opcode.
        opcode: Opcode,
        /// Payload bytes following the opcode.
        payload: Bytes,
    },
}

impl TyrantCommand {
    /// Parses a complete command payload, inner magic included.
    ///
    /// With `strict` set, opcodes outside the Tyrant table are rejected
    /// instead of being returned as [`TyrantCommand::Unparsed`].
    ///
    /// # Errors
    ///
    /// [`FormatError`] on a bad magic, negative or odd length, or (strict)
    /// unknown opcode; [`DecodeError::TruncatedRecord`] when a field runs
    /// past the payload.
    pub fn parse(payload: &[u8], strict: bool) -> DecodeResult<Self> {
        let mut reader = PayloadReader::new(payload);

        let magic = reader.read_u8()?;
        if magic != COMMAND_MAGIC {
            return Err(FormatError::BadInnerMagic {
                expected: COMMAND_MAGIC,
                found: magic,
            }
            .into());
        }

        let opcode = Opcode::from_byte(reader.read_u8()?);
        let command = match opcode {
            Opcode::Put => Self::Put(parse_put(&mut reader)?),
            Opcode::PutKeep => Self::PutKeep(parse_put(&mut reader)?),
            Opcode::Misc => parse_misc(&mut reader)?,
            Opcode::Unknown(byte) if strict => {
                return Err(FormatError::UnknownOpcode { opcode: byte }.into());
            }
            other => {
                debug!(opcode = %other, "unhandled command");
                Self::Unparsed {
                    opcode: other,
                    payload: Bytes::copy_from_slice(reader.rest()),
                }
            }
        };
        Ok(command)
    }

    /// The command's opcode.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Put(_) => Opcode::Put,
            Self::PutKeep(_) => Opcode::PutKeep,
            Self::Misc { .. } => Opcode::Misc,
            Self::Unparsed { opcode, .. } => *opcode,
        }
    }

    /// Command name: the opcode name, or the function name for `misc`.
    #[must_use]
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Self::Misc { name, .. } => String::from_utf8_lossy(name),
            other => Cow::Borrowed(other.opcode().name()),
        }
    }

    /// Decoded elements; empty for unparsed commands.
    #[must_use]
    pub fn elements(&self) -> &[Pair] {
        match self {
            Self::Put(pair) | Self::PutKeep(pair) => std::slice::from_ref(pair),
            Self::Misc { elements, .. } => elements,
            Self::Unparsed { .. } => &[],
        }
    }
}

fn parse_put(reader: &mut PayloadReader<'_>) -> DecodeResult<Pair> {
    let key_len = reader.read_len("key")?;
    let value_len = reader.read_len("value")?;
    let key = reader.read_bytes(key_len)?;
    let value = reader.read_bytes(value_len)?;
    reader.read_u8()?; // status
    Ok(Pair { key, value })
}

fn parse_misc(reader: &mut PayloadReader<'_>) -> DecodeResult<TyrantCommand> {
    let name_len = reader.read_len("name")?;
    let list_len = reader.read_i32()?;
    if list_len < 0 {
        return Err(FormatError::NegativeLength {
            field: "list",
            len: i64::from(list_len),
        }
        .into());
    }
    if list_len % 2 != 0 {
        return Err(FormatError::OddListLength { len: list_len }.into());
    }
    let name = reader.read_bytes(name_len)?;

    // Each element needs at least its 4 byte length prefix.
    let pairs = (list_len / 2) as usize;
    let mut elements = Vec::with_capacity(pairs.min(reader.remaining() / 8));
    for _ in 0..pairs {
        let key_len = reader.read_len("element")?;
        let key = reader.read_bytes(key_len)?;
        let value_len = reader.read_len("element")?;
        let value = reader.read_bytes(value_len)?;
        elements.push(Pair { key, value });
    }
    reader.read_u8()?; // status

    debug!(
        name = %String::from_utf8_lossy(&name),
        elements = elements.len(),
        "parsed misc command"
    );
    Ok(TyrantCommand::Misc { name, elements })
}

/// Big-endian reader over an in-memory payload.
struct PayloadReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn take(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(DecodeError::truncated(len as u64, self.remaining() as u64));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_i32(&mut self) -> DecodeResult<i32> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(i32::from_be_bytes(raw))
    }

    fn read_len(&mut self, field: &'static str) -> DecodeResult<usize> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| {
            FormatError::NegativeLength {
                field,
                len: i64::from(len),
            }
            .into()
        })
    }

    fn read_bytes(&mut self, len: usize) -> DecodeResult<Bytes> {
        self.take(len).map(Bytes::copy_from_slice)
    }
}
