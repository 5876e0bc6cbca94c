//! Cross-crate window partition tests.

use kvlog_codec::{DecoderConfig, Pair, RedisCommandType};
use kvlog_core::{open_aof, open_ulog, LogFormat, LogRecord, Window, WindowReader};
use kvlog_storage::{ByteSource, FileSource, InMemorySource};
use kvlog_testkit::prelude::*;
use proptest::prelude::*;

/// Reads every window between consecutive cut points, concatenating offsets.
fn partitioned_offsets<S: ByteSource>(
    source: &S,
    format: LogFormat,
    cuts: &[u64],
) -> Vec<u64> {
    let total = source.size().unwrap();
    let mut bounds = vec![0];
    bounds.extend_from_slice(cuts);
    bounds.push(total);

    let mut offsets = Vec::new();
    for pair in bounds.windows(2) {
        let window = Window::new(pair[0], pair[1] - pair[0]);
        let reader = WindowReader::open(source, format, window, DecoderConfig::default()).unwrap();
        for decoded in reader {
            offsets.push(decoded.unwrap().offset);
        }
    }
    offsets
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ulog_windows_yield_each_record_once(
        (entries, cuts) in prop::collection::vec(ulog_entry_strategy(), 0..24)
            .prop_flat_map(|entries| {
                let len = build_ulog(&entries).0.len() as u64;
                (Just(entries), cut_points_strategy(len, 6))
            })
    ) {
        let (data, offsets) = build_ulog(&entries);
        let source = InMemorySource::with_data(data);
        prop_assert_eq!(partitioned_offsets(&source, LogFormat::Ulog, &cuts), offsets);
    }

    #[test]
    fn aof_windows_yield_each_record_once(
        (entries, cuts) in prop::collection::vec(aof_entry_strategy(), 0..24)
            .prop_flat_map(|entries| {
                let len = build_aof(&entries).0.len() as u64;
                (Just(entries), cut_points_strategy(len, 6))
            })
    ) {
        let (data, offsets) = build_aof(&entries);
        let source = InMemorySource::with_data(data);
        prop_assert_eq!(partitioned_offsets(&source, LogFormat::Aof, &cuts), offsets);
    }
}

#[test]
fn ulog_file_windows_match_whole_file_read() {
    let mut builder = UlogBuilder::new();
    for i in 0..50i64 {
        let key = format!("key-{i}");
        builder = builder.put(i, key.as_bytes(), b"some value bytes");
    }
    let expected = builder.offsets().to_vec();
    let log = TempLog::new("ttserver.ulog", &builder.build());

    let source = FileSource::open(log.path()).unwrap();
    let format = LogFormat::detect(log.path()).unwrap();
    let total = source.size().unwrap();

    let mut records = Vec::new();
    for window in Window::split(total, 97) {
        let reader = open_ulog(&source, window, DecoderConfig::default()).unwrap();
        for decoded in reader {
            let decoded = decoded.unwrap();
            assert!(window.contains(decoded.offset));
            records.push(decoded);
        }
    }

    assert_eq!(format, LogFormat::Ulog);
    assert_eq!(records.iter().map(|r| r.offset).collect::<Vec<_>>(), expected);
    assert_eq!(records[7].record.elements(), &[Pair::new("key-7", "some value bytes")]);
}

#[test]
fn aof_window_skips_false_start_candidates() {
    // A stray '*' inside a value is not followed by a count and bulk header.
    let builder = AofBuilder::new()
        .set(b"k1", b"a*b")
        .expireat(b"k1", 1_700_000_000)
        .set(b"k2", b"v2");
    let expected = builder.offsets().to_vec();
    let data = builder.build();
    let source = InMemorySource::with_data(data.clone());

    let cut = expected[0] + 20;
    let reader = open_aof(
        &source,
        Window::new(cut, data.len() as u64 - cut),
        DecoderConfig::default(),
    )
    .unwrap();
    let records: Vec<_> = reader.map(Result::unwrap).collect();
    assert_eq!(
        records.iter().map(|r| r.offset).collect::<Vec<_>>(),
        expected[1..]
    );
    assert_eq!(records[0].record.command_type, RedisCommandType::ExpireAt);
    assert_eq!(records[0].record.expire_at, 1_700_000_000);
}

#[test]
fn runtime_format_records() {
    let data = UlogBuilder::new()
        .misc(5, b"putlist", &[(b"a".as_slice(), b"1".as_slice())])
        .build();
    let source = InMemorySource::with_data(data.clone());
    let reader = WindowReader::open(
        &source,
        LogFormat::Ulog,
        Window::whole(data.len() as u64),
        DecoderConfig::default(),
    )
    .unwrap();

    let records: Vec<_> = reader.map(Result::unwrap).collect();
    match &records[0].record {
        LogRecord::Ulog(record) => {
            assert_eq!(record.name(), "putlist");
            assert_eq!(record.timestamp, 5);
        }
        LogRecord::Aof(_) => panic!("expected a ulog record"),
    }
}

#[test]
fn truncated_tail_is_reported() {
    let mut data = UlogBuilder::new().put(1, b"k", b"v").put(2, b"k", b"v").build();
    data.truncate(data.len() - 3);
    let source = InMemorySource::with_data(data.clone());

    let mut reader = open_ulog(&source, Window::whole(data.len() as u64), DecoderConfig::default())
        .unwrap();
    assert!(reader.next_record().unwrap().is_some());
    let err = reader.next_record().unwrap_err();
    assert!(err.is_truncated());
}
