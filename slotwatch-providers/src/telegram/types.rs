//! Bot API wire types.
//!
//! Only the fields slotwatch reads are modelled; everything else in the
//! payload is ignored.

use serde::Deserialize;
use slotwatch_core::InboundMessage;

/// Envelope around every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Payload on success.
    pub result: Option<T>,
    /// Human-readable error on failure.
    pub description: Option<String>,
    /// Error code on failure (mirrors the HTTP status).
    pub error_code: Option<u16>,
}

/// One entry from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update identifier.
    pub update_id: i64,
    /// New incoming message, if this update carries one.
    pub message: Option<Message>,
}

/// An incoming chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Chat the message was sent in.
    pub chat: Chat,
    /// Message text, absent for stickers, photos, etc.
    pub text: Option<String>,
}

/// Chat identity.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Chat {
    /// Chat identifier.
    pub id: i64,
}

impl From<Update> for InboundMessage {
    fn from(update: Update) -> Self {
        let (sender, text) = match update.message {
            Some(message) => (Some(message.chat.id.to_string()), message.text),
            None => (None, None),
        };

        InboundMessage {
            id: update.update_id,
            sender,
            text,
        }
    }
}
