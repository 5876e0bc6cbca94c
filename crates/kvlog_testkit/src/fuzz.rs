//! Fuzz testing harnesses.
//!
//! These targets can be used with cargo-fuzz or driven by proptest. Each
//! accepts arbitrary bytes and must never panic.

use kvlog_codec::{
    decode_record, find_record_start, AofDecoder, DecoderConfig, MultibulkHeader, PushbackReader,
    RecordDecoder, TyrantCommand, UlogDecoder, UlogHeader, SCAN_HEADER_LEN,
};

/// Small ceiling so garbage lengths cannot allocate much.
fn fuzz_config() -> DecoderConfig {
    DecoderConfig::new().buffer_size(64).max_record_size(1 << 20)
}

/// Fuzz target for the ulog decoder, with and without alignment.
pub fn fuzz_ulog_decode(data: &[u8]) {
    for result in UlogDecoder::with_config(data, fuzz_config()).records() {
        let _ = result;
    }

    let mut decoder = UlogDecoder::with_config(data, fuzz_config().strict_opcodes(true));
    if let Ok(outcome) = decoder.find_first_record(None) {
        if outcome.is_found() {
            let _ = decoder.read_record();
        }
    }

    let _ = decode_record(data, true);
    let _ = decode_record(data, false);
}

/// Fuzz target for the embedded command parser.
pub fn fuzz_command_parse(data: &[u8]) {
    let _ = TyrantCommand::parse(data, false);
    let _ = TyrantCommand::parse(data, true);
}

/// Fuzz target for the AOF decoder, with and without alignment.
pub fn fuzz_aof_decode(data: &[u8]) {
    for result in AofDecoder::with_config(data, fuzz_config()).records() {
        let _ = result;
    }

    let mut decoder = AofDecoder::with_config(data, fuzz_config());
    if let Ok(outcome) = decoder.find_first_record(None) {
        if outcome.is_found() {
            let _ = decoder.read_record();
        }
    }
}

/// Fuzz target for the boundary scanner.
///
/// Checks that a found offset really points at a header the predicate
/// accepts.
pub fn fuzz_scanner(data: &[u8]) {
    let mut cursor = PushbackReader::new(data, 16, SCAN_HEADER_LEN);
    if let Ok(kvlog_codec::ScanOutcome::Found { offset }) =
        find_record_start(&mut cursor, &UlogHeader, None)
    {
        let start = offset as usize;
        assert!(data.len() >= start + SCAN_HEADER_LEN, "header past end");
        assert!(
            kvlog_codec::HeaderValidator::is_valid_header(
                &UlogHeader,
                &data[start..start + SCAN_HEADER_LEN]
            ),
            "scanner accepted an invalid header"
        );
    }

    let mut cursor = PushbackReader::new(data, 16, 8);
    let _ = find_record_start(&mut cursor, &MultibulkHeader, Some(data.len() as u64 / 2));
}
