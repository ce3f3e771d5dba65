//! Inbound commands and outbound messages.

use serde::{Deserialize, Serialize};

// ============================================================================
// Outbound
// ============================================================================

/// Formatting mode for an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFormat {
    /// Plain text, sent as-is.
    #[default]
    Plain,
    /// HTML subset understood by the chat client.
    Html,
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Message text.
    pub text: String,
    /// How the text should be interpreted.
    pub format: MessageFormat,
}

impl OutboundMessage {
    /// Creates a plain-text message.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: MessageFormat::Plain,
        }
    }

    /// Creates an HTML-formatted message.
    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: MessageFormat::Html,
        }
    }
}

// ============================================================================
// Inbound
// ============================================================================

/// One message from the inbound command stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Monotonic identifier assigned by the messaging endpoint.
    pub id: i64,
    /// Identity of the chat the message came from.
    pub sender: Option<String>,
    /// Message text, if it was a text message.
    pub text: Option<String>,
}

/// Cursor into the inbound command stream.
///
/// Only ever moves forward within a process lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct CommandOffset {
    last_seen: i64,
}

impl CommandOffset {
    /// Creates an offset positioned before any message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier of the last consumed message (0 before the first).
    pub fn last_seen(self) -> i64 {
        self.last_seen
    }

    /// The offset value to request on the next poll.
    pub fn next(self) -> i64 {
        self.last_seen + 1
    }

    /// Moves the cursor past `id`. Returns false if `id` is not ahead of it.
    pub fn advance(&mut self, id: i64) -> bool {
        if id > self.last_seen {
            self.last_seen = id;
            true
        } else {
            false
        }
    }
}

/// A recognized user command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/start` or `/help`: static greeting.
    Greeting,
    /// `/check`: on-demand snapshot of currently open slots.
    Snapshot,
}

impl Command {
    /// Parses message text into a command.
    ///
    /// Matching is case-insensitive, ignores surrounding whitespace, and
    /// accepts one trailing bot mention (`/check@my_bot`) with no whitespace
    /// in it. Anything else is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        let name = match text.split_once('@') {
            Some((name, mention))
                if !mention.is_empty() && !mention.contains(char::is_whitespace) =>
            {
                name
            }
            Some(_) => return None,
            None => text.as_str(),
        };

        match name {
            "/start" | "/help" => Some(Self::Greeting),
            "/check" => Some(Self::Snapshot),
            _ => None,
        }
    }
}
