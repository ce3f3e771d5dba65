//! Session credential bundle.
//!
//! The bundle is opaque to the rest of the application: it is produced by the
//! login flow, persisted as a blob, and rendered into a `Cookie` header. No
//! code inspects individual cookies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single session cookie.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

impl SessionCookie {
    /// Creates a cookie.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Opaque set of session tokens for the monitored resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    cookies: Vec<SessionCookie>,
    #[serde(default)]
    obtained_at: Option<DateTime<Utc>>,
}

impl CredentialBundle {
    /// Creates a bundle obtained now.
    pub fn new(cookies: Vec<SessionCookie>) -> Self {
        Self {
            cookies,
            obtained_at: Some(Utc::now()),
        }
    }

    /// Returns a bundle with no cookies.
    ///
    /// Requests made with it are expected to come back unauthorized, which
    /// routes the caller into reauthentication.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the bundle holds no cookies.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Number of cookies in the bundle.
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// When the login flow produced this bundle, if known.
    pub fn obtained_at(&self) -> Option<DateTime<Utc>> {
        self.obtained_at
    }

    /// Renders the bundle as a `Cookie` header value.
    ///
    /// Returns `None` for an empty bundle. Later cookies with the same name
    /// win, matching how a cookie jar would treat repeated `set` calls.
    pub fn cookie_header(&self) -> Option<String> {
        let mut seen: Vec<&SessionCookie> = Vec::with_capacity(self.cookies.len());
        for cookie in self.cookies.iter().rev() {
            if !seen.iter().any(|c| c.name == cookie.name) {
                seen.push(cookie);
            }
        }
        if seen.is_empty() {
            return None;
        }
        seen.reverse();

        Some(
            seen.iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
