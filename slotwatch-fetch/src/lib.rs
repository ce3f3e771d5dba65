// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # slotwatch Fetch
//!
//! Host APIs and the resource client for slotwatch.
//!
//! ## Host APIs
//!
//! The [`host`] module wraps the two kinds of side effects the daemon has:
//!
//! - [`host::http`] - HTTP client with tracing, cookie support, and domain allowlist
//! - [`host::process`] - Subprocess execution with timeouts (used by the login helper)
//!
//! ## Resource Client
//!
//! [`resource::ResourceClient`] performs one request against the monitored
//! endpoint and classifies the response into a
//! [`FetchResult`](slotwatch_core::FetchResult).
//!
//! ## Example
//!
//! ```ignore
//! use slotwatch_fetch::ResourceClient;
//! use slotwatch_core::{CredentialBundle, ResourceFetch};
//!
//! let client = ResourceClient::new("https://lks.bmstu.ru/lks-back/api/v1/fv/<id>/groups")?;
//! let result = client.fetch(&CredentialBundle::empty()).await;
//! ```

pub mod error;
pub mod host;
pub mod resource;

// Errors
pub use error::{HttpError, ProcessError};

// Host APIs
pub use host::{
    http::HttpClient,
    process::{ProcessOutput, ProcessRunner},
};

// Resource client
pub use resource::ResourceClient;
