//! # kvlog Core
//!
//! Window processing for ulog and AOF transaction logs.
//!
//! Large logs are processed as independent byte windows, possibly in
//! parallel, each with its own reader and no shared state. This crate
//! provides:
//! - [`Window`] and [`Window::split`] for cutting a file into ranges
//! - [`WindowReader`], which aligns once to the first record boundary and
//!   reads every record that starts inside the window, with absolute offsets
//! - [`LogFormat`] detection and a runtime-selected [`LogDecoder`]
//!
//! ## Usage
//!
//! ```
//! use kvlog_codec::DecoderConfig;
//! use kvlog_core::{open_aof, Window};
//! use kvlog_storage::InMemorySource;
//!
//! let data = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n".to_vec();
//! let source = InMemorySource::with_data(data.clone());
//!
//! let reader = open_aof(&source, Window::whole(data.len() as u64), DecoderConfig::default())?;
//! for decoded in reader {
//!     let decoded = decoded?;
//!     assert_eq!(decoded.record.key, "k");
//! }
//! # Ok::<(), kvlog_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod format;
mod open;
mod window;

pub use error::{CoreError, CoreResult};
pub use format::{LogDecoder, LogFormat, LogRecord};
pub use open::{open_aof, open_ulog};
pub use window::{Window, WindowReader, WindowStats};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
