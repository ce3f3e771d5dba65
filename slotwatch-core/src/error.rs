//! Core error types for slotwatch.

use thiserror::Error;

/// Core error type for slotwatch operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The resource answered successfully but the body has an unexpected shape.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

/// Failure of the reauthentication gate.
///
/// The stale credential bundle stays in place when this is returned.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The login helper could not be started or was not found.
    #[error("Login helper unavailable: {0}")]
    HelperUnavailable(String),

    /// The login flow ran but did not produce a session.
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// The login flow exceeded its time budget.
    #[error("Login timed out after {0} seconds")]
    Timeout(u64),

    /// The login flow produced output that is not a credential bundle.
    #[error("Invalid credential output: {0}")]
    InvalidOutput(String),
}

/// Failure talking to the messaging endpoint.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("Messaging API returned HTTP {status}: {description}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Description from the response body, if any.
        description: String,
    },

    /// The endpoint answered with a body we cannot read.
    #[error("Invalid messaging response: {0}")]
    InvalidResponse(String),
}

impl MessagingError {
    /// Returns true if the failure is likely to clear up on its own.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidResponse(_) => false,
        }
    }
}
