//! Reauthentication through an external login helper.
//!
//! The student portal sits behind an SSO page that needs a real browser to
//! get through. The daemon does not drive the browser itself; it runs a
//! helper program that does, and reads the resulting cookies from its
//! stdout.
//!
//! Helper contract:
//! - credentials arrive in `SLOTWATCH_LOGIN` / `SLOTWATCH_PASSWORD`
//! - the page to open arrives in `SLOTWATCH_LOGIN_URL`
//! - on success it exits 0 and prints either a JSON array of
//!   `{"name", "value"}` objects or `{"cookies": [...]}`

use async_trait::async_trait;
use serde::Deserialize;
use slotwatch_core::{AuthError, CredentialBundle, Reauthenticator, SessionCookie};
use slotwatch_fetch::{ProcessError, ProcessRunner};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Time budget for one helper run.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

/// Env var carrying the account login.
const ENV_LOGIN: &str = "SLOTWATCH_LOGIN";
/// Env var carrying the account password.
const ENV_PASSWORD: &str = "SLOTWATCH_PASSWORD";
/// Env var carrying the page the helper should open.
const ENV_LOGIN_URL: &str = "SLOTWATCH_LOGIN_URL";

// ============================================================================
// Login Helper
// ============================================================================

/// Reauthentication gate backed by a helper program.
#[derive(Clone)]
pub struct LoginHelper {
    program: String,
    login: String,
    password: String,
    login_url: String,
    timeout: Duration,
    runner: ProcessRunner,
}

impl std::fmt::Debug for LoginHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginHelper")
            .field("program", &self.program)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("login_url", &self.login_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LoginHelper {
    /// Creates a gate that runs `program` against the portal at `api_base`.
    pub fn new(
        program: impl Into<String>,
        api_base: &str,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            login: login.into(),
            password: password.into(),
            login_url: format!("{}/profile", api_base.trim_end_matches('/')),
            timeout: DEFAULT_LOGIN_TIMEOUT,
            runner: ProcessRunner::new(),
        }
    }

    /// Overrides the time budget for one helper run.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The page handed to the helper.
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Returns true if the helper program can be found.
    pub fn is_available(&self) -> bool {
        self.runner.is_installed(&self.program)
    }
}

#[async_trait]
impl Reauthenticator for LoginHelper {
    #[instrument(skip(self), fields(program = %self.program))]
    async fn reauthenticate(&self) -> Result<CredentialBundle, AuthError> {
        info!("Running login helper");

        let env = [
            (ENV_LOGIN, self.login.as_str()),
            (ENV_PASSWORD, self.password.as_str()),
            (ENV_LOGIN_URL, self.login_url.as_str()),
        ];

        let output = self
            .runner
            .run_with_env(&self.program, &[], &env, self.timeout)
            .await
            .map_err(|e| map_process_error(e, self.timeout))?;

        let exit_code = output.exit_code;
        let stdout = output.into_stdout().map_err(|e| {
            warn!(exit_code, "Login helper failed");
            map_process_error(e, self.timeout)
        })?;

        let bundle = parse_helper_output(&stdout)?;
        info!(cookies = bundle.len(), "Login helper produced a session");
        Ok(bundle)
    }
}

fn map_process_error(error: ProcessError, timeout: Duration) -> AuthError {
    match error {
        ProcessError::NotFound(cmd) => AuthError::HelperUnavailable(cmd),
        ProcessError::Io(e) => AuthError::HelperUnavailable(e.to_string()),
        ProcessError::Timeout(_) => AuthError::Timeout(timeout.as_secs()),
        ProcessError::NonZeroExit { code, stderr } => {
            let stderr = stderr.trim();
            if stderr.is_empty() {
                AuthError::LoginFailed(format!("helper exited with code {code}"))
            } else {
                AuthError::LoginFailed(format!("helper exited with code {code}: {stderr}"))
            }
        }
    }
}

// ============================================================================
// Output Parsing
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum HelperOutput {
    Cookies(Vec<SessionCookie>),
    Wrapped { cookies: Vec<SessionCookie> },
}

/// Parses the helper's stdout into a credential bundle.
///
/// A run that prints no cookies is a failed login.
pub fn parse_helper_output(stdout: &str) -> Result<CredentialBundle, AuthError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(AuthError::LoginFailed("helper printed nothing".to_string()));
    }

    let parsed: HelperOutput = serde_json::from_str(trimmed)
        .map_err(|e| AuthError::InvalidOutput(format!("expected cookie JSON: {e}")))?;

    let cookies = match parsed {
        HelperOutput::Cookies(cookies) | HelperOutput::Wrapped { cookies } => cookies,
    };

    let cookies: Vec<SessionCookie> = cookies
        .into_iter()
        .filter(|c| !c.name.trim().is_empty())
        .collect();

    debug!(cookies = cookies.len(), "Parsed helper output");

    if cookies.is_empty() {
        return Err(AuthError::LoginFailed("helper returned no cookies".to_string()));
    }

    Ok(CredentialBundle::new(cookies))
}

// ============================================================================
// Tests
// ============================================================================
