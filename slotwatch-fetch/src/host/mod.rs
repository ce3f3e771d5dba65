//! Host APIs for slotwatch.
//!
//! - [`http`] - HTTP client with tracing and domain allowlist
//! - [`process`] - Subprocess execution for external helpers

pub mod http;
pub mod process;

// Re-export key types
pub use http::HttpClient;
pub use process::{ProcessOutput, ProcessRunner};
