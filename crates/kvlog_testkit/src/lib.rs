//! # kvlog Testkit
//!
//! Test utilities for kvlog.
//!
//! This crate provides:
//! - Framing builders for ulog and AOF inputs
//! - Property-based test generators using proptest
//! - Fuzz testing harnesses
//!
//! ## Usage
//!
//! ```rust
//! use kvlog_testkit::prelude::*;
//!
//! let log = UlogBuilder::new().put(1, b"key", b"value").build();
//! fuzz_ulog_decode(&log);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
