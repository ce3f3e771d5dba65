//! Trait definitions for slotwatch collaborators.
//!
//! Each external system the engine talks to sits behind one of these traits
//! so the polling and command loops can be exercised with in-memory fakes.

use async_trait::async_trait;

use crate::error::{AuthError, MessagingError};
use crate::models::{CommandOffset, CredentialBundle, FetchResult, InboundMessage, OutboundMessage};

/// The monitored resource.
///
/// Implementations perform exactly one request per call and never retry or
/// reauthenticate on their own.
#[async_trait]
pub trait ResourceFetch: Send + Sync {
    /// Fetches the current schedule using the given credentials.
    async fn fetch(&self, credentials: &CredentialBundle) -> FetchResult;
}

/// The login flow that produces a fresh credential bundle.
#[async_trait]
pub trait Reauthenticator: Send + Sync {
    /// Runs the login flow to completion.
    async fn reauthenticate(&self) -> Result<CredentialBundle, AuthError>;
}

/// The chat endpoint used for notifications and commands.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Delivers one message to the configured recipient.
    async fn send(&self, message: &OutboundMessage) -> Result<(), MessagingError>;

    /// Long-polls for messages after `offset`, oldest first.
    async fn poll_inbound(&self, offset: CommandOffset)
        -> Result<Vec<InboundMessage>, MessagingError>;
}
