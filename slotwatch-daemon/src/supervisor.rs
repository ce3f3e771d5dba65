//! Task supervision.
//!
//! Each long-running loop is spawned as its own task. If the task ends, by
//! panic or by returning, it is started again after a short delay; the
//! other loop keeps running throughout.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

/// Delay before a stopped task is restarted.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(5);

/// Restarts tasks that stop.
#[derive(Debug, Clone, Copy)]
pub struct Supervisor {
    restart_delay: Duration,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(DEFAULT_RESTART_DELAY)
    }
}

impl Supervisor {
    /// Creates a supervisor with the given restart delay.
    pub fn new(restart_delay: Duration) -> Self {
        Self { restart_delay }
    }

    /// Keeps the task produced by `make_task` running.
    ///
    /// Returns only if the task is cancelled.
    pub async fn supervise<F, Fut>(&self, name: &'static str, mut make_task: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut restarts: u32 = 0;

        loop {
            info!(task = name, restarts, "Starting task");

            match tokio::spawn(make_task()).await {
                Ok(()) => warn!(task = name, "Task exited unexpectedly"),
                Err(e) if e.is_panic() => error!(task = name, "Task panicked"),
                Err(_) => {
                    info!(task = name, "Task cancelled");
                    return;
                }
            }

            restarts = restarts.saturating_add(1);
            tokio::time::sleep(self.restart_delay).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
