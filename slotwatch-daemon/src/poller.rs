//! Poll orchestrator.
//!
//! Fetch, classify, dispatch; then sleep for the interval. Cycles never
//! overlap and none of them can stall the loop: every outcome, including a
//! panic inside the cycle, ends with the orchestrator back in
//! [`PollState::Idle`].

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use slotwatch_core::{classify, KnownSet};
use tracing::{debug, error, info, instrument};

use crate::notifications::Dispatcher;
use crate::session::RefreshOutcome;
use crate::source::{FetchOutcome, SlotSource};

/// Where the orchestrator is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Waiting for the interval timer.
    Idle,
    /// A fetch/classify/dispatch cycle is running.
    Polling,
}

/// What one cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Records were classified; `notified` of them were new.
    Classified {
        /// Records in the payload.
        observed: usize,
        /// Records announced this cycle.
        notified: usize,
    },
    /// The session was rejected. Data from this cycle was discarded.
    Unauthorized {
        /// Whether a usable session is in place for the next cycle.
        reauthenticated: bool,
    },
    /// The resource answered with a non-auth error status.
    ServerError,
    /// The request did not complete.
    NetworkFailure,
    /// The payload could not be parsed; the known set was left untouched.
    Malformed,
    /// The cycle panicked.
    Panicked,
}

/// Timed loop that announces newly available records.
pub struct PollOrchestrator {
    source: SlotSource,
    dispatcher: Dispatcher,
    known: KnownSet,
    interval: Duration,
    state: PollState,
}

impl PollOrchestrator {
    /// Creates an orchestrator that polls every `interval`.
    pub fn new(source: SlotSource, dispatcher: Dispatcher, interval: Duration) -> Self {
        Self {
            source,
            dispatcher,
            known: KnownSet::new(),
            interval,
            state: PollState::Idle,
        }
    }

    /// Current loop state.
    pub fn state(&self) -> PollState {
        self.state
    }

    /// Records already announced and still present.
    pub fn known(&self) -> &KnownSet {
        &self.known
    }

    /// Runs cycles forever, sleeping `interval` after each one.
    pub async fn run(&mut self) {
        info!(interval = ?self.interval, "Poll loop started");
        loop {
            let outcome = self.run_cycle().await;
            debug!(?outcome, "Cycle finished");
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Runs one cycle and returns to idle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.state = PollState::Polling;

        let outcome = AssertUnwindSafe(self.cycle())
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!("Poll cycle panicked");
                CycleOutcome::Panicked
            });

        self.state = PollState::Idle;
        outcome
    }

    #[instrument(skip(self), fields(known = self.known.len()))]
    async fn cycle(&mut self) -> CycleOutcome {
        let records = match self.source.fetch().await {
            FetchOutcome::Records(records) => records,
            FetchOutcome::Unauthorized { refresh, .. } => {
                let reauthenticated = matches!(
                    refresh,
                    Some(Ok(RefreshOutcome::Refreshed | RefreshOutcome::Reused))
                );
                return CycleOutcome::Unauthorized { reauthenticated };
            }
            FetchOutcome::ServerError { .. } => return CycleOutcome::ServerError,
            FetchOutcome::NetworkFailure(_) => return CycleOutcome::NetworkFailure,
            FetchOutcome::Malformed(_) => return CycleOutcome::Malformed,
        };

        let observed = records.len();
        let classification = classify(records, std::mem::take(&mut self.known));
        self.known = classification.known;

        let notified = classification.newly_available.len();
        if notified == 0 {
            info!(observed, "No new slots");
        } else {
            info!(observed, notified, "New slots found");
            self.dispatcher.dispatch(&classification.newly_available).await;
        }

        if classification.evicted > 0 {
            debug!(evicted = classification.evicted, "Slots left the schedule");
        }

        CycleOutcome::Classified { observed, notified }
    }
}

impl std::fmt::Debug for PollOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollOrchestrator")
            .field("known", &self.known.len())
            .field("interval", &self.interval)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
