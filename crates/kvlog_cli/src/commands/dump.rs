//! Dump command implementation.

use kvlog_codec::Decoded;
use kvlog_core::{LogRecord, WindowReader};
use serde::Serialize;
use std::path::Path;

use super::{display_bytes, open_source, window_for, Options};

/// Record representation for output.
#[derive(Debug, Serialize)]
pub struct RecordInfo {
    /// Absolute offset in the file.
    pub offset: u64,
    /// Bytes the record occupies.
    pub len: u64,
    /// Command name.
    pub command: String,
    /// Ulog timestamp (if applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Ulog session id (if applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i32>,
    /// AOF key (if applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// AOF value size in bytes (if applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_size: Option<usize>,
    /// AOF expiry timestamp (if applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<i64>,
    /// Ulog key/value elements.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<(String, String)>,
}

impl From<Decoded<LogRecord>> for RecordInfo {
    fn from(decoded: Decoded<LogRecord>) -> Self {
        let mut info = RecordInfo {
            offset: decoded.offset,
            len: decoded.len,
            command: String::new(),
            timestamp: None,
            session_id: None,
            key: None,
            value_size: None,
            expire_at: None,
            elements: Vec::new(),
        };
        match decoded.record {
            LogRecord::Ulog(record) => {
                info.command = record.name().into_owned();
                info.timestamp = Some(record.timestamp);
                info.session_id = Some(record.session_id);
                info.elements = record
                    .elements()
                    .iter()
                    .map(|pair| (display_bytes(&pair.key), display_bytes(&pair.value)))
                    .collect();
            }
            LogRecord::Aof(command) => {
                info.command = command.command_type.to_string();
                info.expire_at = command.expiry();
                info.value_size = command.value.as_ref().map(|v| v.len());
                info.key = Some(command.key);
            }
        }
        info
    }
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    options: &Options,
    offset: u64,
    length: Option<u64>,
    limit: Option<usize>,
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = options.format_for(path)?;
    let source = open_source(path)?;
    let window = window_for(&source, offset, length)?;

    let reader = WindowReader::open(&source, format, window, options.config.clone())?;
    let records = collect_records(reader, limit)?;

    match output {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            print_text_output(&records);
        }
    }

    Ok(())
}

fn collect_records<D>(
    mut reader: WindowReader<D>,
    limit: Option<usize>,
) -> Result<Vec<RecordInfo>, Box<dyn std::error::Error>>
where
    D: kvlog_codec::RecordDecoder<Record = LogRecord>,
{
    let max_records = limit.unwrap_or(usize::MAX);
    let mut records = Vec::new();
    while records.len() < max_records {
        match reader.next_record()? {
            Some(decoded) => records.push(RecordInfo::from(decoded)),
            None => break,
        }
    }
    reader.close();
    Ok(records)
}

fn print_text_output(records: &[RecordInfo]) {
    println!("Records ({} total)", records.len());
    println!("================");
    println!();

    for record in records {
        print!("[{:010}] {:10} len={}", record.offset, record.command, record.len);

        if let Some(ts) = record.timestamp {
            print!(" ts={}", ts);
        }
        if let Some(sid) = record.session_id {
            print!(" sid={}", sid);
        }
        if let Some(ref key) = record.key {
            print!(" key={}", key);
        }
        if let Some(size) = record.value_size {
            print!(" value={} bytes", size);
        }
        if let Some(expire_at) = record.expire_at {
            print!(" expire_at={}", expire_at);
        }
        for (key, value) in &record.elements {
            print!(" {}={}", key, preview(value));
        }

        println!();
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 32;
    match text.char_indices().nth(MAX) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
