//! Find-start command implementation.

use kvlog_codec::{RecordDecoder, ScanOutcome};
use kvlog_storage::RangeReader;
use std::path::Path;

use super::{open_source, Options};

/// Runs the find-start command.
pub fn run(
    path: &Path,
    options: &Options,
    offset: u64,
    length: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = options.format_for(path)?;
    let source = open_source(path)?;

    let reader = RangeReader::new(&source, offset);
    let mut decoder = format.decoder(reader, options.config.clone());
    match decoder.align(length)? {
        ScanOutcome::Found { offset: skipped } => {
            println!("record start: {} (skipped {} bytes)", offset + skipped, skipped);
        }
        ScanOutcome::Exhausted { scanned } => {
            println!("no record found before end of file ({} bytes scanned)", scanned);
        }
        ScanOutcome::LimitReached { scanned } => {
            println!("no record found within {} bytes", scanned);
        }
    }

    Ok(())
}
