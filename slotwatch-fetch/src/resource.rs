//! Resource client for the monitored schedule endpoint.
//!
//! One call is one GET request carrying the current credential bundle. The
//! response is classified, never retried: retry and reauthentication are
//! decisions for the calling loop.

use async_trait::async_trait;
use slotwatch_core::{CredentialBundle, FetchResult, ResourceFetch};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::HttpError;
use crate::host::http::HttpClient;

/// Default timeout for one schedule request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the monitored endpoint.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    http: HttpClient,
    url: String,
}

impl ResourceClient {
    /// Creates a client for `url` with the default timeout.
    ///
    /// Requests are restricted to the URL's own host so the session cookies
    /// cannot leak elsewhere.
    pub fn new(url: impl Into<String>) -> Result<Self, HttpError> {
        Self::with_timeout(url, DEFAULT_FETCH_TIMEOUT)
    }

    /// Creates a client for `url` with a custom timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, HttpError> {
        let url = url.into();
        let parsed = Url::parse(&url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?
            .to_string();

        let http = HttpClient::with_timeout(timeout)?.allow_domains(vec![host]);
        Ok(Self { http, url })
    }
}

#[async_trait]
impl ResourceFetch for ResourceClient {
    #[instrument(skip(self, credentials), fields(cookies = credentials.len()))]
    async fn fetch(&self, credentials: &CredentialBundle) -> FetchResult {
        let cookies = credentials.cookie_header();

        let response = match self.http.get_with_cookies(&self.url, cookies.as_deref()).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, timeout = e.is_timeout(), "Schedule request failed");
                return FetchResult::NetworkFailure(e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(status = %status, "Schedule request rejected");
            return FetchResult::from_response(status.as_u16(), String::new());
        }

        match response.text().await {
            Ok(body) => {
                debug!(bytes = body.len(), "Schedule received");
                FetchResult::from_response(status.as_u16(), body)
            }
            Err(e) => {
                warn!(error = %e, "Failed to read schedule body");
                FetchResult::NetworkFailure(e.to_string())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use slotwatch_core::SessionCookie;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves one canned HTTP response and returns the raw request it saw.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{addr}/lks-back/api/v1/fv/abc/groups"), handle)
    }

    #[tokio::test]
    async fn test_success_returns_body_and_sends_cookies() {
        let (url, server) = serve_once("200 OK", r#"[{"groups":[]}]"#).await;
        let client = ResourceClient::new(url).unwrap();
        let credentials = CredentialBundle::new(vec![SessionCookie::new("sid", "s3cr3t")]);

        let result = client.fetch(&credentials).await;
        let request = server.await.unwrap().to_lowercase();

        assert_eq!(result, FetchResult::Authorized(r#"[{"groups":[]}]"#.to_string()));
        assert!(request.contains("cookie: sid=s3cr3t"));
        assert!(request.contains("user-agent: mozilla/5.0"));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let (url, server) = serve_once("401 Unauthorized", "").await;
        let client = ResourceClient::new(url).unwrap();

        let result = client.fetch(&CredentialBundle::empty()).await;
        let request = server.await.unwrap().to_lowercase();

        assert_eq!(result, FetchResult::Unauthorized { status: 401 });
        assert!(!request.contains("cookie:"));
    }

    #[tokio::test]
    async fn test_forbidden() {
        let (url, _server) = serve_once("403 Forbidden", "denied").await;
        let client = ResourceClient::new(url).unwrap();

        assert_eq!(
            client.fetch(&CredentialBundle::empty()).await,
            FetchResult::Unauthorized { status: 403 }
        );
    }

    #[tokio::test]
    async fn test_server_error() {
        let (url, _server) = serve_once("502 Bad Gateway", "upstream down").await;
        let client = ResourceClient::new(url).unwrap();

        assert_eq!(
            client.fetch(&CredentialBundle::empty()).await,
            FetchResult::ServerError { status: 502 }
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ResourceClient::new(format!("http://{addr}/groups")).unwrap();
        let result = client.fetch(&CredentialBundle::empty()).await;

        assert!(matches!(result, FetchResult::NetworkFailure(_)));
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            ResourceClient::new("not a url"),
            Err(HttpError::InvalidUrl(_))
        ));
    }
}
