//! Benchmark utilities.

#![warn(missing_docs)]

use kvlog_codec::{MULTIBULK_MAGIC, ULOG_MAGIC};
use kvlog_testkit::{AofBuilder, UlogBuilder};
use rand::Rng;

/// Generate random bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Random bytes that never contain either format's record magic.
pub fn noise(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size)
        .map(|_| loop {
            let b: u8 = rng.gen();
            if b != ULOG_MAGIC && b != MULTIBULK_MAGIC {
                break b;
            }
        })
        .collect()
}

/// Random bytes with the ulog magic planted every `stride` bytes, none of
/// them followed by a valid header.
pub fn false_starts(size: usize, stride: usize) -> Vec<u8> {
    let mut data = noise(size);
    for i in (0..size).step_by(stride.max(1)) {
        data[i] = ULOG_MAGIC;
    }
    data
}

/// An update log of `count` `put` records with `payload_size` byte values.
pub fn ulog_log(count: usize, payload_size: usize) -> Vec<u8> {
    let value = random_data(payload_size);
    (0..count)
        .fold(UlogBuilder::new(), |log, i| {
            log.put(i as i64, format!("key-{i:08}").as_bytes(), &value)
        })
        .build()
}

/// An AOF of `count` `SET` commands with `payload_size` byte values.
pub fn aof_log(count: usize, payload_size: usize) -> Vec<u8> {
    let value = random_data(payload_size);
    (0..count)
        .fold(AofBuilder::new(), |log, i| {
            log.set(format!("key-{i:08}").as_bytes(), &value)
        })
        .build()
}
