// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # slotwatch Core
//!
//! Core types, the fingerprint engine, and collaborator traits for slotwatch.
//!
//! This crate has no I/O of its own. It provides:
//!
//! - Domain models (records, credential bundles, fetch results, inbound commands)
//! - The fingerprint engine that decides which records are newly available
//! - Error types shared across crates
//! - Trait definitions for the resource, login, and messaging collaborators
//!
//! ## Key Types
//!
//! ### Records
//! - [`Record`] - One monitored slot as observed in a single fetch
//! - [`Schedule`] - Day/time descriptor of a record
//!
//! ### Fingerprinting
//! - [`Fingerprint`] - Stable identity of a record across polling cycles
//! - [`KnownSet`] - Fingerprints already notified and still present
//! - [`classify`] - Splits a fetch into newly available records and the next known set
//!
//! ### Sessions & Messaging
//! - [`CredentialBundle`] - Opaque session cookies for the monitored resource
//! - [`FetchResult`] - Classified outcome of one resource request
//! - [`InboundMessage`] / [`Command`] / [`CommandOffset`] - Inbound command stream
//! - [`OutboundMessage`] - Rendered text sent to the chat

pub mod error;
pub mod fingerprint;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::{AuthError, CoreError, MessagingError};

// Re-export fingerprint engine
pub use fingerprint::{classify, Classification, Fingerprint, KnownSet};

// Re-export all model types
pub use models::{
    // Records
    Record,
    Schedule,
    // Sessions
    CredentialBundle,
    SessionCookie,
    // Fetch
    FetchResult,
    // Messaging
    Command,
    CommandOffset,
    InboundMessage,
    MessageFormat,
    OutboundMessage,
};

// Re-export traits
pub use traits::{Messenger, Reauthenticator, ResourceFetch};
