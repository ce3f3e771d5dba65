//! Telegram Bot API integration.
//!
//! Notifications go out through `sendMessage`; commands arrive through
//! `getUpdates` long polling. Only the configured chat is addressed.

mod api;
mod types;

pub use api::{TelegramClient, API_BASE_URL, DEFAULT_LONG_POLL};
pub use types::{ApiResponse, Chat, Message, Update};
