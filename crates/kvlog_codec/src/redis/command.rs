//! Redis commands as they appear in an append-only file.

use std::fmt;

use bytes::Bytes;

/// `expire_at` value for commands other than `EXPIREAT`.
pub const NO_EXPIRY: i64 = -1;

/// Commands a rewritten AOF is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedisCommandType {
    /// `SELECT db`
    Select,
    /// `SET key value`
    Set,
    /// `RPUSH key value`
    RPush,
    /// `SADD key member`
    SAdd,
    /// `ZADD key score member`
    ZAdd,
    /// `HSET key field value`
    HSet,
    /// `EXPIREAT key timestamp`
    ExpireAt,
}

impl RedisCommandType {
    /// All supported command types.
    pub const ALL: [Self; 7] = [
        Self::Select,
        Self::Set,
        Self::RPush,
        Self::SAdd,
        Self::ZAdd,
        Self::HSet,
        Self::ExpireAt,
    ];

    /// Looks up a command by name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(name))
    }

    /// Canonical upper-case command name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Set => "SET",
            Self::RPush => "RPUSH",
            Self::SAdd => "SADD",
            Self::ZAdd => "ZADD",
            Self::HSet => "HSET",
            Self::ExpireAt => "EXPIREAT",
        }
    }
}

impl fmt::Display for RedisCommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded AOF command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisCommand {
    /// The command.
    pub command_type: RedisCommandType,
    /// Key, one character per byte.
    pub key: String,
    /// Raw value bytes; `None` for `EXPIREAT`.
    pub value: Option<Bytes>,
    /// Expiry timestamp for `EXPIREAT`, [`NO_EXPIRY`] otherwise.
    pub expire_at: i64,
}

impl RedisCommand {
    /// The expiry timestamp, if this is an `EXPIREAT`.
    #[must_use]
    pub fn expiry(&self) -> Option<i64> {
        (self.command_type == RedisCommandType::ExpireAt).then_some(self.expire_at)
    }
}
