//! Environment configuration.
//!
//! All settings come from environment variables and are validated once at
//! startup. Every problem is collected so a misconfigured deployment gets a
//! single complete error message.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::credentials::CREDENTIALS_FILE;
use crate::error::ConfigError;
use crate::persistence::default_state_dir;

/// Environment variable names.
pub mod vars {
    /// Bot API token.
    pub const TELEGRAM_TOKEN: &str = "SLOTWATCH_TELEGRAM_TOKEN";
    /// Chat that receives notifications and may send commands.
    pub const CHAT_ID: &str = "SLOTWATCH_CHAT_ID";
    /// Resource account login.
    pub const LOGIN: &str = "SLOTWATCH_LOGIN";
    /// Resource account password.
    pub const PASSWORD: &str = "SLOTWATCH_PASSWORD";
    /// Semester identifier that scopes the schedule endpoint.
    pub const SEMESTER_ID: &str = "SLOTWATCH_SEMESTER_ID";
    /// Poll interval in seconds.
    pub const INTERVAL_SECS: &str = "SLOTWATCH_INTERVAL_SECS";
    /// Directory holding the credential blob.
    pub const STATE_DIR: &str = "SLOTWATCH_STATE_DIR";
    /// External login helper program.
    pub const LOGIN_HELPER: &str = "SLOTWATCH_LOGIN_HELPER";
    /// Origin of the monitored site.
    pub const API_BASE: &str = "SLOTWATCH_API_BASE";
}

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(180);

/// Default login helper program.
pub const DEFAULT_LOGIN_HELPER: &str = "slotwatch-login";

/// Default origin of the monitored site.
pub const DEFAULT_API_BASE: &str = "https://lks.bmstu.ru";

/// Validated application configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Bot API token.
    pub telegram_token: String,
    /// Destination chat, also the only accepted command sender.
    pub chat_id: String,
    /// Resource account login.
    pub login: String,
    /// Resource account password.
    pub password: String,
    /// Semester identifier.
    pub semester_id: String,
    /// Delay between poll cycles.
    pub poll_interval: Duration,
    /// Directory holding the credential blob.
    pub state_dir: PathBuf,
    /// Login helper program (name on PATH or path).
    pub login_helper: String,
    /// Origin of the monitored site, without trailing slash.
    pub api_base: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut missing = Vec::new();
        let mut require = |key: &'static str| {
            get(key).unwrap_or_else(|| {
                missing.push(key);
                String::new()
            })
        };

        let telegram_token = require(vars::TELEGRAM_TOKEN);
        let chat_id = require(vars::CHAT_ID);
        let login = require(vars::LOGIN);
        let password = require(vars::PASSWORD);
        let semester_id = require(vars::SEMESTER_ID);

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let poll_interval = match get(vars::INTERVAL_SECS) {
            None => DEFAULT_POLL_INTERVAL,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: vars::INTERVAL_SECS,
                        reason: format!("expected a positive number of seconds, got {raw:?}"),
                    });
                }
            },
        };

        let api_base = get(vars::API_BASE)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        if !(api_base.starts_with("https://") || api_base.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                var: vars::API_BASE,
                reason: format!("expected an http(s) URL, got {api_base:?}"),
            });
        }

        let config = Self {
            telegram_token,
            chat_id,
            login,
            password,
            semester_id,
            poll_interval,
            state_dir: get(vars::STATE_DIR).map_or_else(default_state_dir, PathBuf::from),
            login_helper: get(vars::LOGIN_HELPER).unwrap_or_else(|| DEFAULT_LOGIN_HELPER.to_string()),
            api_base,
        };

        debug!(config = ?config, "Configuration loaded");
        Ok(config)
    }

    /// URL of the schedule endpoint.
    pub fn resource_url(&self) -> String {
        format!("{}/lks-back/api/v1/fv/{}/groups", self.api_base, self.semester_id)
    }

    /// URL of the page where slots are booked.
    pub fn booking_url(&self) -> String {
        format!("{}/fv/new-record", self.api_base)
    }

    /// Path of the credential blob.
    pub fn credentials_path(&self) -> PathBuf {
        self.state_dir.join(CREDENTIALS_FILE)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("semester_id", &self.semester_id)
            .field("poll_interval", &self.poll_interval)
            .field("state_dir", &self.state_dir)
            .field("login_helper", &self.login_helper)
            .field("api_base", &self.api_base)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
