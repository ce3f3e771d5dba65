//! Classified resource responses.

use std::fmt;

/// Outcome of one request to the monitored resource.
///
/// Only [`FetchResult::Unauthorized`] routes into reauthentication. A server
/// error is transient and must never trigger a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Success; carries the raw response body.
    Authorized(String),
    /// The session is no longer valid (401 or 403).
    Unauthorized {
        /// HTTP status code.
        status: u16,
    },
    /// Any other non-success status.
    ServerError {
        /// HTTP status code.
        status: u16,
    },
    /// No usable response (connect failure, timeout, truncated body).
    NetworkFailure(String),
}

impl FetchResult {
    /// Classifies a completed HTTP exchange.
    pub fn from_response(status: u16, body: String) -> Self {
        match status {
            200..=299 => Self::Authorized(body),
            401 | 403 => Self::Unauthorized { status },
            _ => Self::ServerError { status },
        }
    }
}

impl fmt::Display for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authorized(body) => write!(f, "authorized ({} bytes)", body.len()),
            Self::Unauthorized { status } => write!(f, "unauthorized (HTTP {status})"),
            Self::ServerError { status } => write!(f, "server error (HTTP {status})"),
            Self::NetworkFailure(cause) => write!(f, "network failure: {cause}"),
        }
    }
}
