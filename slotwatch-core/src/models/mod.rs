//! Domain models for slotwatch.
//!
//! ## Submodules
//!
//! - [`record`] - Observed slots (Record, Schedule)
//! - [`credentials`] - Session credential bundle
//! - [`fetch`] - Classified resource responses
//! - [`message`] - Inbound commands and outbound messages

mod credentials;
mod fetch;
mod message;
mod record;

pub use credentials::{CredentialBundle, SessionCookie};
pub use fetch::FetchResult;
pub use message::{Command, CommandOffset, InboundMessage, MessageFormat, OutboundMessage};
pub use record::{Record, Schedule};
