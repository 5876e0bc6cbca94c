//! # kvlog storage
//!
//! Read-only byte sources for kvlog.
//!
//! Log files are consumed in windows: a caller hands a worker an absolute
//! byte range of a (possibly much larger) file and the worker decodes the
//! records that start inside it. This crate provides the lowest layer of
//! that pipeline. Sources are **opaque byte stores**; they know nothing
//! about ulog or AOF framing.
//!
//! ## Available Sources
//!
//! - [`InMemorySource`] - For tests and buffers that are already loaded
//! - [`FileSource`] - Positional reads against an OS file
//!
//! [`RangeReader`] adapts any source into a [`std::io::Read`] starting at an
//! absolute offset, which is what the decoders consume.
//!
//! ## Example
//!
//! ```rust
//! use kvlog_storage::{ByteSource, InMemorySource, RangeReader};
//! use std::io::Read;
//!
//! let source = InMemorySource::with_data(b"hello world".to_vec());
//! assert_eq!(source.read_at(6, 5).unwrap(), b"world");
//!
//! let mut reader = RangeReader::new(&source, 6);
//! let mut out = String::new();
//! reader.read_to_string(&mut out).unwrap();
//! assert_eq!(out, "world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;
mod range;

pub use backend::ByteSource;
pub use error::{StorageError, StorageResult};
pub use file::FileSource;
pub use memory::InMemorySource;
pub use range::RangeReader;
