//! Property-based test generators using proptest.
//!
//! Window partition tests need logs in which record magics appear only at
//! record starts, otherwise the boundary scanner can legitimately lock onto
//! a false start inside a record. The "sync-safe" strategies here never emit
//! the ulog magic byte or the AOF multibulk marker outside a header.

use kvlog_codec::{Opcode, ULOG_MAGIC};
use proptest::prelude::*;

use crate::fixtures::{AofBuilder, UlogBuilder};

/// A ulog command to frame.
#[derive(Debug, Clone)]
pub enum UlogEntry {
    /// `put key value`
    Put {
        /// Timestamp.
        timestamp: i64,
        /// Key bytes.
        key: Vec<u8>,
        /// Value bytes.
        value: Vec<u8>,
    },
    /// `putkeep key value`
    PutKeep {
        /// Timestamp.
        timestamp: i64,
        /// Key bytes.
        key: Vec<u8>,
        /// Value bytes.
        value: Vec<u8>,
    },
    /// `misc name pairs...`
    Misc {
        /// Timestamp.
        timestamp: i64,
        /// Function name.
        name: Vec<u8>,
        /// Element pairs.
        pairs: Vec<(Vec<u8>, Vec<u8>)>,
    },
    /// A command with an undecoded opcode.
    Other {
        /// Timestamp.
        timestamp: i64,
        /// Opcode.
        opcode: Opcode,
        /// Raw field bytes.
        fields: Vec<u8>,
    },
}

impl UlogEntry {
    /// Appends this entry to a builder.
    pub fn append_to(&self, builder: UlogBuilder) -> UlogBuilder {
        match self {
            Self::Put {
                timestamp,
                key,
                value,
            } => builder.put(*timestamp, key, value),
            Self::PutKeep {
                timestamp,
                key,
                value,
            } => builder.putkeep(*timestamp, key, value),
            Self::Misc {
                timestamp,
                name,
                pairs,
            } => {
                let pairs: Vec<(&[u8], &[u8])> = pairs
                    .iter()
                    .map(|(k, v)| (k.as_slice(), v.as_slice()))
                    .collect();
                builder.misc(*timestamp, name, &pairs)
            }
            Self::Other {
                timestamp,
                opcode,
                fields,
            } => builder.command(*timestamp, opcode.as_byte(), fields),
        }
    }
}

/// Builds a log from entries, returning its bytes and record offsets.
pub fn build_ulog(entries: &[UlogEntry]) -> (Vec<u8>, Vec<u64>) {
    let builder = entries
        .iter()
        .fold(UlogBuilder::new(), |builder, entry| entry.append_to(builder));
    let offsets = builder.offsets().to_vec();
    (builder.build(), offsets)
}

/// Strategy for bytes that are never the ulog magic.
pub fn sync_safe_bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>().prop_filter("ulog magic", |b| *b != ULOG_MAGIC), 0..max_len)
}

/// Strategy for an `i64` none of whose bytes is the ulog magic.
pub fn sync_safe_timestamp() -> impl Strategy<Value = i64> {
    prop::array::uniform8(0u8..ULOG_MAGIC).prop_map(i64::from_be_bytes)
}

/// Strategy for any ulog entry.
///
/// Field sizes keep every payload below 0xC9 bytes so the payload size field
/// never contains the magic either.
pub fn ulog_entry_strategy() -> impl Strategy<Value = UlogEntry> {
    let pair = (sync_safe_bytes(8), sync_safe_bytes(16));
    prop_oneof![
        (sync_safe_timestamp(), sync_safe_bytes(40), sync_safe_bytes(80)).prop_map(
            |(timestamp, key, value)| UlogEntry::Put {
                timestamp,
                key,
                value
            }
        ),
        (sync_safe_timestamp(), sync_safe_bytes(40), sync_safe_bytes(80)).prop_map(
            |(timestamp, key, value)| UlogEntry::PutKeep {
                timestamp,
                key,
                value
            }
        ),
        (
            sync_safe_timestamp(),
            sync_safe_bytes(8),
            prop::collection::vec(pair, 0..4)
        )
            .prop_map(|(timestamp, name, pairs)| UlogEntry::Misc {
                timestamp,
                name,
                pairs
            }),
        (
            sync_safe_timestamp(),
            prop::sample::select(vec![Opcode::Out, Opcode::PutCat, Opcode::Vanish, Opcode::AddInt]),
            sync_safe_bytes(32)
        )
            .prop_map(|(timestamp, opcode, fields)| UlogEntry::Other {
                timestamp,
                opcode,
                fields
            }),
    ]
}

/// An AOF command to frame.
#[derive(Debug, Clone)]
pub struct AofEntry {
    /// Command name.
    pub name: &'static str,
    /// Key bytes.
    pub key: Vec<u8>,
    /// Value bytes.
    pub value: Vec<u8>,
}

/// Builds an AOF from entries, returning its bytes and command offsets.
pub fn build_aof(entries: &[AofEntry]) -> (Vec<u8>, Vec<u64>) {
    let builder = entries.iter().fold(AofBuilder::new(), |builder, entry| {
        builder.command(entry.name, &entry.key, &entry.value)
    });
    let offsets = builder.offsets().to_vec();
    (builder.build(), offsets)
}

/// Strategy for AOF commands with alphanumeric keys and values.
pub fn aof_entry_strategy() -> impl Strategy<Value = AofEntry> {
    let text = |max: usize| {
        prop::string::string_regex(&format!("[a-zA-Z0-9]{{0,{max}}}"))
            .expect("Invalid regex")
            .prop_map(String::into_bytes)
    };
    prop_oneof![
        (
            prop::sample::select(vec!["SET", "RPUSH", "SADD", "ZADD", "HSET", "SELECT"]),
            text(16),
            text(64)
        )
            .prop_map(|(name, key, value)| AofEntry { name, key, value }),
        (text(16), 0i64..=i64::MAX).prop_map(|(key, ts)| AofEntry {
            name: "EXPIREAT",
            key,
            value: ts.to_string().into_bytes(),
        }),
    ]
}

/// Strategy for a sorted list of cut points strictly inside `0..len`.
pub fn cut_points_strategy(len: u64, max_cuts: usize) -> impl Strategy<Value = Vec<u64>> {
    let upper = len.max(2);
    prop::collection::vec(1..upper, 0..=max_cuts).prop_map(move |mut cuts| {
        cuts.retain(|c| *c < len);
        cuts.sort_unstable();
        cuts.dedup();
        cuts
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn magic_only_at_record_starts(entries in prop::collection::vec(ulog_entry_strategy(), 0..10)) {
            let (data, offsets) = build_ulog(&entries);
            let starts: Vec<u64> = data
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == ULOG_MAGIC)
                .map(|(i, _)| i as u64)
                .collect();
            prop_assert_eq!(starts, offsets);
        }

        #[test]
        fn cut_points_are_sorted(cuts in cut_points_strategy(100, 8)) {
            prop_assert!(cuts.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(cuts.iter().all(|c| *c > 0 && *c < 100));
        }
    }
}
