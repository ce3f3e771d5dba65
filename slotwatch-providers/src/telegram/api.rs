//! Bot API client.
//!
//! # Endpoints
//!
//! ```text
//! POST {base}/bot<token>/sendMessage   chat_id, text[, parse_mode, disable_web_page_preview]
//! GET  {base}/bot<token>/getUpdates    ?offset=<last+1>&timeout=<secs>
//! ```
//!
//! The token is part of the URL, so URLs are stripped from every error
//! before it is logged or returned.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use slotwatch_core::{
    CommandOffset, InboundMessage, MessageFormat, MessagingError, Messenger, OutboundMessage,
};
use slotwatch_fetch::{HttpClient, HttpError};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use super::types::{ApiResponse, Update};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the Bot API.
pub const API_BASE_URL: &str = "https://api.telegram.org";

/// How long one `getUpdates` call may be held open by the server.
pub const DEFAULT_LONG_POLL: Duration = Duration::from_secs(25);

/// Extra client-side budget on top of the long-poll window.
const LONG_POLL_MARGIN: Duration = Duration::from_secs(5);

/// Timeout for `sendMessage`.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Client
// ============================================================================

/// Messenger backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: HttpClient,
    base_url: String,
    token: String,
    chat_id: String,
    long_poll: Duration,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("long_poll", &self.long_poll)
            .finish()
    }
}

impl TelegramClient {
    /// Creates a client for the public Bot API.
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, HttpError> {
        Self::with_base_url(API_BASE_URL, token, chat_id)
    }

    /// Creates a client against a custom API host.
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Result<Self, HttpError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?
            .to_string();

        let http = HttpClient::with_timeout(SEND_TIMEOUT)?.allow_domains(vec![host]);

        Ok(Self {
            http,
            base_url,
            token: token.into(),
            chat_id: chat_id.into(),
            long_poll: DEFAULT_LONG_POLL,
        })
    }

    /// Overrides the long-poll window.
    #[must_use]
    pub fn with_long_poll(mut self, long_poll: Duration) -> Self {
        self.long_poll = long_poll;
        self
    }

    /// The chat this client talks to.
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.token)
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    #[instrument(skip_all, fields(chars = message.text.chars().count(), format = ?message.format))]
    async fn send(&self, message: &OutboundMessage) -> Result<(), MessagingError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("chat_id", self.chat_id.as_str()),
            ("text", message.text.as_str()),
        ];
        if message.format == MessageFormat::Html {
            form.push(("parse_mode", "HTML"));
            form.push(("disable_web_page_preview", "true"));
        }

        let response = self
            .http
            .post_form(&self.method_url("sendMessage"), &form)
            .await
            .map_err(transport_error)?;

        decode::<serde_json::Value>(response).await?;
        debug!("Message delivered");
        Ok(())
    }

    #[instrument(skip_all, fields(offset = offset.next()))]
    async fn poll_inbound(
        &self,
        offset: CommandOffset,
    ) -> Result<Vec<InboundMessage>, MessagingError> {
        let query = [
            ("offset", offset.next().to_string()),
            ("timeout", self.long_poll.as_secs().to_string()),
        ];

        let response = self
            .http
            .get_query(
                &self.method_url("getUpdates"),
                &query,
                self.long_poll + LONG_POLL_MARGIN,
            )
            .await
            .map_err(transport_error)?;

        let updates: Vec<Update> = decode(response).await?.unwrap_or_default();
        debug!(updates = updates.len(), "Updates received");

        Ok(updates.into_iter().map(InboundMessage::from).collect())
    }
}

// ============================================================================
// Response Handling
// ============================================================================

fn transport_error(error: HttpError) -> MessagingError {
    let message = match error {
        HttpError::Request(e) => e.without_url().to_string(),
        other => other.to_string(),
    };
    warn!(error = %message, "Telegram request failed");
    MessagingError::Transport(message)
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<Option<T>, MessagingError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| MessagingError::Transport(e.without_url().to_string()))?;

    let envelope: ApiResponse<T> = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => {
            return Err(MessagingError::InvalidResponse(e.to_string()));
        }
        Err(_) => {
            return Err(MessagingError::Api {
                status: status.as_u16(),
                description: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }
    };

    if !status.is_success() || !envelope.ok {
        let error = MessagingError::Api {
            status: envelope.error_code.unwrap_or_else(|| status.as_u16()),
            description: envelope
                .description
                .unwrap_or_else(|| "no description".to_string()),
        };
        warn!(error = %error, "Telegram API rejected request");
        return Err(error);
    }

    Ok(envelope.result)
}

// ============================================================================
// Tests
// ============================================================================
