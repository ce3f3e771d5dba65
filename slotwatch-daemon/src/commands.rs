//! Command channel.
//!
//! Long-polls the chat for commands and answers them. Runs independently of
//! the poll loop and never touches its known set; `/check` fetches its own
//! copy of the schedule.
//!
//! Only messages from the configured chat are acted on. Everything else,
//! including unrecognized text, is consumed silently.

use std::sync::Arc;
use std::time::Duration;

use slotwatch_core::{Command, CommandOffset, MessagingError, Messenger, OutboundMessage, Record};
use tracing::{debug, info, instrument, warn};

use crate::notifications::Dispatcher;
use crate::source::{FetchOutcome, SlotSource};

/// Pause between successful long-polls.
pub const DEFAULT_IDLE_DELAY: Duration = Duration::from_millis(500);

/// Pause after a failed long-poll.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Reply to `/start` and `/help`.
pub const GREETING: &str = "Hi! I keep an eye on free PE slots and message you as soon as one opens.\n\n\
    To see everything that is open right now, send /check";

/// Reply to `/check` when nothing is open.
pub const NOTHING_AVAILABLE: &str = "❌ No open slots right now.";

/// Reply to `/check` when the schedule could not be fetched.
pub const TRY_AGAIN_LATER: &str = "⚠️ Could not load the schedule. Please try again later.";

/// Long-poll loop answering chat commands.
pub struct CommandChannel {
    messenger: Arc<dyn Messenger>,
    dispatcher: Dispatcher,
    source: SlotSource,
    chat_id: String,
    offset: CommandOffset,
    idle_delay: Duration,
    error_backoff: Duration,
}

impl CommandChannel {
    /// Creates a channel that answers messages from `chat_id` only.
    pub fn new(
        messenger: Arc<dyn Messenger>,
        dispatcher: Dispatcher,
        source: SlotSource,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            messenger,
            dispatcher,
            source,
            chat_id: chat_id.into(),
            offset: CommandOffset::new(),
            idle_delay: DEFAULT_IDLE_DELAY,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }

    /// Overrides the pauses between polls.
    #[must_use]
    pub fn with_delays(mut self, idle_delay: Duration, error_backoff: Duration) -> Self {
        self.idle_delay = idle_delay;
        self.error_backoff = error_backoff;
        self
    }

    /// Position in the inbound stream.
    pub fn offset(&self) -> CommandOffset {
        self.offset
    }

    /// Polls forever.
    pub async fn run(&mut self) {
        info!("Command listener started");
        loop {
            match self.poll_once().await {
                Ok(_) => tokio::time::sleep(self.idle_delay).await,
                Err(e) => {
                    warn!(error = %e, "Failed to poll for commands");
                    tokio::time::sleep(self.error_backoff).await;
                }
            }
        }
    }

    /// Performs one long-poll and handles what it returned.
    ///
    /// Returns the number of commands acted on. The offset moves past every
    /// returned message before it is handled, so a message is never seen
    /// twice.
    #[instrument(skip(self), fields(offset = self.offset.next()))]
    pub async fn poll_once(&mut self) -> Result<usize, MessagingError> {
        let messages = self.messenger.poll_inbound(self.offset).await?;
        let mut handled = 0;

        for message in messages {
            if !self.offset.advance(message.id) {
                debug!(id = message.id, "Skipping already consumed message");
                continue;
            }

            if message.sender.as_deref() != Some(self.chat_id.as_str()) {
                debug!(id = message.id, "Ignoring message from another chat");
                continue;
            }

            let Some(command) = message.text.as_deref().and_then(Command::parse) else {
                continue;
            };

            self.handle(command).await;
            handled += 1;
        }

        Ok(handled)
    }

    /// Answers one command.
    pub async fn handle(&self, command: Command) {
        info!(?command, "Handling command");
        match command {
            Command::Greeting => {
                self.dispatcher.send(OutboundMessage::plain(GREETING)).await;
            }
            Command::Snapshot => match self.open_slots().await {
                Some(records) if records.is_empty() => {
                    self.dispatcher
                        .send(OutboundMessage::plain(NOTHING_AVAILABLE))
                        .await;
                }
                Some(records) => self.dispatcher.dispatch_snapshot(&records).await,
                None => {
                    self.dispatcher
                        .send(OutboundMessage::plain(TRY_AGAIN_LATER))
                        .await;
                }
            },
        }
    }

    /// Fetches the schedule and keeps the open records.
    ///
    /// After a successful (or reused) reauthentication the fetch is retried
    /// once, without another login. Returns `None` if no data could be
    /// obtained.
    async fn open_slots(&self) -> Option<Vec<Record>> {
        let mut outcome = self.source.fetch().await;

        if let FetchOutcome::Unauthorized { refresh: Some(Ok(_)), .. } = outcome {
            debug!("Retrying snapshot with refreshed session");
            outcome = self.source.fetch_without_refresh().await;
        }

        match outcome {
            FetchOutcome::Records(records) => {
                Some(records.into_iter().filter(Record::is_available).collect())
            }
            other => {
                warn!(outcome = ?other, "Snapshot unavailable");
                None
            }
        }
    }
}

impl std::fmt::Debug for CommandChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandChannel")
            .field("chat_id", &self.chat_id)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}
