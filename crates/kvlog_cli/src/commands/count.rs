//! Count command implementation.

use kvlog_core::{Window, WindowReader};
use kvlog_storage::ByteSource;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use super::{open_source, Options};

/// Per-window counts for output.
#[derive(Debug, Serialize)]
pub struct WindowCount {
    /// Window start offset.
    pub start: u64,
    /// Window end offset.
    pub end: u64,
    /// Records that start inside the window.
    pub records: u64,
    /// Bytes skipped before the first record.
    pub skipped: u64,
    /// Time spent reading, in milliseconds.
    pub elapsed_ms: u64,
}

/// Runs the count command.
pub fn run(
    path: &Path,
    options: &Options,
    split_size: u64,
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = options.format_for(path)?;
    let source = open_source(path)?;
    let total = source.size()?;

    let windows = Window::split(total, split_size);
    info!(path = %path.display(), %format, windows = windows.len(), "counting records");

    let mut counts = Vec::new();
    for window in windows {
        let mut reader = WindowReader::open(&source, format, window, options.config.clone())?;
        while reader.next_record()?.is_some() {}
        let stats = reader.close();
        counts.push(WindowCount {
            start: window.start,
            end: window.end(),
            records: stats.records,
            skipped: stats.skipped,
            elapsed_ms: stats.elapsed.as_millis() as u64,
        });
    }

    match output {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&counts)?);
        }
        _ => {
            for count in &counts {
                println!(
                    "[{:010}..{:010}] records={} skipped={} time={}ms",
                    count.start, count.end, count.records, count.skipped, count.elapsed_ms
                );
            }
            let total_records: u64 = counts.iter().map(|c| c.records).sum();
            println!("total: {} records in {} windows", total_records, counts.len());
        }
    }

    Ok(())
}
