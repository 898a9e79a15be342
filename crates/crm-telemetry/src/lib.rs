//! Logging setup shared by the CRM binaries.
//!
//! Output goes to stderr so command output on stdout stays machine-readable.

pub mod logging;

pub use logging::{init_logging, init_logging_json, LogFormat};
