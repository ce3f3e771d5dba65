//! One fetch of the schedule, with credentials and reauthentication.
//!
//! Shared by the poll loop and the snapshot command. A fetch that comes back
//! unauthorized triggers exactly one refresh of the shared session; whether
//! to fetch again is the caller's decision. A repeated fetch goes through
//! `fetch_without_refresh` so one request never logs in twice.

use std::sync::Arc;

use slotwatch_core::{AuthError, CoreError, FetchResult, Record, ResourceFetch};
use slotwatch_providers::parse_schedule;
use tracing::{debug, warn};

use crate::session::{RefreshOutcome, SessionManager};

/// Result of one schedule fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Parsed records, in payload order.
    Records(Vec<Record>),
    /// The session was rejected; `refresh` says how reauthentication went.
    Unauthorized {
        /// Status code the resource answered with.
        status: u16,
        /// Outcome of the refresh attempt, `None` if none was made.
        refresh: Option<Result<RefreshOutcome, AuthError>>,
    },
    /// The resource failed for a reason other than authentication.
    ServerError {
        /// Status code the resource answered with.
        status: u16,
    },
    /// The request never completed.
    NetworkFailure(String),
    /// The resource answered but the body could not be understood.
    Malformed(CoreError),
}

/// Fetches and parses the schedule using the shared session.
#[derive(Clone)]
pub struct SlotSource {
    resource: Arc<dyn ResourceFetch>,
    session: Arc<SessionManager>,
}

impl SlotSource {
    /// Creates a source over `resource` authenticated by `session`.
    pub fn new(resource: Arc<dyn ResourceFetch>, session: Arc<SessionManager>) -> Self {
        Self { resource, session }
    }

    /// Performs one fetch. Reauthenticates at most once on rejection.
    pub async fn fetch(&self) -> FetchOutcome {
        self.fetch_inner(true).await
    }

    /// Performs one fetch and reports a rejection without reauthenticating.
    pub async fn fetch_without_refresh(&self) -> FetchOutcome {
        self.fetch_inner(false).await
    }

    async fn fetch_inner(&self, reauthenticate: bool) -> FetchOutcome {
        let ticket = self.session.ticket().await;

        match self.resource.fetch(&ticket.bundle).await {
            FetchResult::Authorized(body) => match parse_schedule(&body) {
                Ok(records) => FetchOutcome::Records(records),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable schedule");
                    FetchOutcome::Malformed(e)
                }
            },
            FetchResult::Unauthorized { status } if !reauthenticate => {
                warn!(status, "Session rejected again, not reauthenticating");
                FetchOutcome::Unauthorized { status, refresh: None }
            }
            FetchResult::Unauthorized { status } => {
                warn!(status, "Session rejected, reauthenticating");
                let refresh = self.session.refresh(ticket.generation).await;
                if let Err(e) = &refresh {
                    warn!(error = %e, "Reauthentication failed, keeping stale session");
                }
                FetchOutcome::Unauthorized { status, refresh: Some(refresh) }
            }
            FetchResult::ServerError { status } => {
                warn!(status, "Schedule endpoint returned an error");
                FetchOutcome::ServerError { status }
            }
            FetchResult::NetworkFailure(cause) => {
                debug!(cause = %cause, "Schedule request did not complete");
                FetchOutcome::NetworkFailure(cause)
            }
        }
    }
}
