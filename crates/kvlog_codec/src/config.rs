//! Decoder configuration.

/// Default size of the read buffer a decoder wraps around its source.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Default ceiling for a single declared length (256 MB).
pub const DEFAULT_MAX_RECORD_SIZE: u64 = 256 * 1024 * 1024;

/// Configuration shared by the ulog and AOF decoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Capacity of the read buffer (0 = [`DEFAULT_BUFFER_SIZE`]).
    pub buffer_size: usize,

    /// Largest payload or bulk string accepted, in bytes (0 = unlimited).
    ///
    /// Declared lengths come from untrusted bytes; a garbage length must not
    /// turn into a multi-gigabyte read.
    pub max_record_size: u64,

    /// Reject ulog opcodes outside the known Tyrant opcode table.
    ///
    /// When `false` such commands decode as
    /// [`crate::TyrantCommand::Unparsed`]. The outer record frame is still
    /// consumed in full either way.
    pub strict_opcodes: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            strict_opcodes: false,
        }
    }
}

impl DecoderConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read buffer capacity.
    #[must_use]
    pub const fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets the largest accepted declared length.
    #[must_use]
    pub const fn max_record_size(mut self, size: u64) -> Self {
        self.max_record_size = size;
        self
    }

    /// Sets whether unknown opcodes are rejected.
    #[must_use]
    pub const fn strict_opcodes(mut self, value: bool) -> Self {
        self.strict_opcodes = value;
        self
    }

    /// Buffer capacity with the zero default resolved.
    #[must_use]
    pub(crate) fn effective_buffer_size(&self) -> usize {
        if self.buffer_size == 0 {
            DEFAULT_BUFFER_SIZE
        } else {
            self.buffer_size
        }
    }

    /// Checks a declared length against the ceiling.
    pub(crate) fn check_size(&self, size: u64) -> Result<(), crate::FormatError> {
        if self.max_record_size != 0 && size > self.max_record_size {
            return Err(crate::FormatError::RecordTooLarge {
                size,
                limit: self.max_record_size,
            });
        }
        Ok(())
    }
}
