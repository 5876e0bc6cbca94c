//! kvlog CLI
//!
//! Command-line tools for Tokyo Tyrant update logs and Redis append-only
//! files.
//!
//! # Commands
//!
//! - `dump` - Decode and print the records of a file or window
//! - `find-start` - Locate the first record boundary at or after an offset
//! - `count` - Count records per window, as a split-based job would see them

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Inspect ulog and AOF transaction logs.
#[derive(Parser)]
#[command(name = "kvlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log format (ulog, aof); detected from the file extension if omitted
    #[arg(global = true, short, long)]
    format: Option<String>,

    /// Read buffer size in bytes (0 = default)
    #[arg(global = true, long, default_value = "8192")]
    buffer_size: usize,

    /// Reject ulog opcodes outside the Tyrant opcode table
    #[arg(global = true, long)]
    strict: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode and print records
    Dump {
        /// Path to the log file
        path: PathBuf,

        /// Window start offset
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Window length (defaults to the rest of the file)
        #[arg(short = 'n', long)]
        length: Option<u64>,

        /// Maximum number of records to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short = 'O', long, default_value = "text")]
        output: String,
    },

    /// Find the first record boundary at or after an offset
    FindStart {
        /// Path to the log file
        path: PathBuf,

        /// Offset to start scanning from
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Maximum number of bytes to scan
        #[arg(short = 'n', long)]
        length: Option<u64>,
    },

    /// Count records per window
    Count {
        /// Path to the log file
        path: PathBuf,

        /// Window size in bytes (0 = whole file)
        #[arg(short, long, default_value = "0")]
        split_size: u64,

        /// Output format (text, json)
        #[arg(short = 'O', long, default_value = "text")]
        output: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let options = commands::Options {
        format: cli.format,
        config: kvlog_codec::DecoderConfig::new()
            .buffer_size(cli.buffer_size)
            .strict_opcodes(cli.strict),
    };

    match cli.command {
        Commands::Dump {
            path,
            offset,
            length,
            limit,
            output,
        } => {
            commands::dump::run(&path, &options, offset, length, limit, &output)?;
        }
        Commands::FindStart {
            path,
            offset,
            length,
        } => {
            commands::find_start::run(&path, &options, offset, length)?;
        }
        Commands::Count {
            path,
            split_size,
            output,
        } => {
            commands::count::run(&path, &options, split_size, &output)?;
        }
        Commands::Version => {
            println!("kvlog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("kvlog Core v{}", kvlog_core::VERSION);
        }
    }

    Ok(())
}
