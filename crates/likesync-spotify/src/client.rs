//! Spotify Web API client
//!
//! Provides a typed HTTP client for the Spotify Web API. Handles the bearer
//! header, per-request timeouts, endpoint construction and the mapping of
//! HTTP failures onto [`SourceError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use likesync_spotify::client::SpotifyClient;
//!
//! # async fn example() -> Result<(), likesync_core::ports::SourceError> {
//! let client = SpotifyClient::new("access-token-here");
//! let page = client.get_saved_tracks(0, 50).await?;
//! println!("{} tracks on the first page", page.items.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use likesync_core::config::RemoteConfig;
use likesync_core::ports::SourceError;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Base URL for the Spotify Web API v1
const SPOTIFY_BASE_URL: &str = "https://api.spotify.com/v1";

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry-After values above this are ignored
const MAX_RETRY_AFTER_SECS: u64 = 3600;

// ============================================================================
// Error body
// ============================================================================

/// Regular error object returned by the Web API
///
/// `{"error": {"status": 401, "message": "The access token expired"}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorObject,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    message: Option<String>,
}

// ============================================================================
// SpotifyClient
// ============================================================================

/// HTTP client for Spotify Web API calls
///
/// Wraps `reqwest::Client` with authentication headers, base URL
/// construction and a per-request timeout. No request is retried here.
pub struct SpotifyClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests (no trailing slash)
    base_url: String,
    /// Bearer token supplied by the caller
    access_token: String,
    /// Upper bound for each request, response body included
    timeout: Duration,
}

impl SpotifyClient {
    /// Creates a new SpotifyClient with the given access token
    ///
    /// # Arguments
    /// * `access_token` - A valid Spotify bearer token with `user-library-read`
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, SPOTIFY_BASE_URL)
    }

    /// Creates a new SpotifyClient with a custom base URL (useful for testing)
    ///
    /// # Arguments
    /// * `access_token` - A valid bearer token
    /// * `base_url` - Custom base URL for API requests
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Creates a client from the `remote` configuration section
    pub fn from_config(config: &RemoteConfig, access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, config.base_url.clone())
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
    }

    /// Overrides the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the configured per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// Automatically prepends the base URL, adds the Authorization header
    /// and applies the per-request timeout.
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to base URL (e.g., "/me/tracks")
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
    }

    /// Sends a GET request and decodes the JSON body
    ///
    /// # Errors
    ///
    /// - [`SourceError::Timeout`] / [`SourceError::Network`] on transport failure
    /// - A status-mapped error (see [`error_from_response`]) on non-2xx
    /// - [`SourceError::InvalidResponse`] if the body is not the expected JSON
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let response = self
            .request(Method::GET, path)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error = error_from_response(response).await;
            warn!(path, status = status.as_u16(), error = %error, "Spotify request failed");
            return Err(error);
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        debug!(path, bytes = body.len(), "Received Spotify response");

        serde_json::from_str(&body).map_err(|e| {
            SourceError::InvalidResponse(format!("Failed to parse {} response: {}", path, e))
        })
    }

    fn transport_error(&self, error: reqwest::Error) -> SourceError {
        if error.is_timeout() {
            SourceError::Timeout(self.timeout)
        } else {
            SourceError::Network(error.to_string())
        }
    }
}

// ============================================================================
// Status mapping
// ============================================================================

/// Converts a non-success response into a [`SourceError`]
///
/// | Status | Error                         |
/// |--------|-------------------------------|
/// | 401    | `Unauthorized`                |
/// | 429    | `RateLimited` (`Retry-After`) |
/// | 5xx    | `Server`                      |
/// | other  | `Rejected`                    |
pub async fn error_from_response(response: Response) -> SourceError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);

    match status {
        StatusCode::UNAUTHORIZED => SourceError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited { retry_after },
        s if s.is_server_error() => SourceError::Server {
            status: s.as_u16(),
            message,
        },
        s => SourceError::Rejected {
            status: s.as_u16(),
            message,
        },
    }
}

/// Extracts a readable message from an error body
///
/// Prefers the Web API error object, then the raw body, then the reason phrase.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if let Some(message) = envelope.error.message.filter(|m| !m.trim().is_empty()) {
            return message;
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.chars().take(200).collect();
    }

    status
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string()
}

/// Parses a `Retry-After` header value
///
/// Accepts delay-seconds or an HTTP-date. Values in the past, unparseable
/// values and delays over an hour yield `None`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return (seconds <= MAX_RETRY_AFTER_SECS).then(|| Duration::from_secs(seconds));
    }

    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let diff = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
    u64::try_from(diff.num_seconds())
        .ok()
        .filter(|&s| s > 0 && s <= MAX_RETRY_AFTER_SECS)
        .map(Duration::from_secs)
}
