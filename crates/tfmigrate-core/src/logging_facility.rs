//! Structured logging facility for tfmigrate
//!
//! One `init(profile)` call per process, the `log_op_*` macros for timed
//! operations, and an in-memory capture layer for tests.
//!
//! Logs go to stderr; stdout is reserved for migration output and the
//! messages a CI job greps for ("Already up to date.").
//!
//! # Usage
//!
//! ```rust
//! use tfmigrate_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

use std::time::Instant;

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};

#[doc(hidden)]
pub use tfmigrate_core_types::schema;

/// Milliseconds since `started`, saturating
pub fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
