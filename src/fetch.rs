//! HTTP JSON fetcher shared by every data source.
//!
//! DESIGN
//! ======
//! One GET helper with caching disabled. The body is parsed as JSON
//! regardless of status so a server-supplied `message` survives into the
//! error. There is no retry here: the next scheduled tick is the retry.
//!
//! Sources depend on the `JsonFetch` trait, not on `reqwest`, so tests can
//! drive them with canned payloads.

use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde_json::Value;

use crate::config::FetchTimeouts;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by a single JSON request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("request failed: {0}")]
    Transport(String),

    /// The request exceeded its configured timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The server answered with a non-success status.
    #[error("HTTP {status}{}", message_suffix(.message))]
    Status { status: u16, message: Option<String> },

    /// A success response whose body is not JSON.
    #[error("malformed JSON payload: {0}")]
    MalformedPayload(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

// =============================================================================
// FETCH SEAM
// =============================================================================

#[async_trait::async_trait]
pub trait JsonFetch: Send + Sync {
    /// GET `url` and return its parsed JSON body.
    async fn fetch_json(&self, url: &str) -> Result<Value, RequestError>;
}

/// `reqwest`-backed fetcher with explicit request and connect timeouts.
pub struct HttpJsonFetcher {
    http: reqwest::Client,
    timeouts: FetchTimeouts,
}

impl HttpJsonFetcher {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(timeouts: FetchTimeouts) -> Result<Self, RequestError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request())
            .connect_timeout(timeouts.connect())
            .build()
            .map_err(|e| RequestError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, timeouts })
    }

    fn transport_error(&self, err: &reqwest::Error) -> RequestError {
        if err.is_timeout() {
            RequestError::Timeout { secs: self.timeouts.request_secs }
        } else {
            RequestError::Transport(err.to_string())
        }
    }
}

#[async_trait::async_trait]
impl JsonFetch for HttpJsonFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, RequestError> {
        let response = self
            .http
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.transport_error(&e))?;
        interpret_response(status, &body)
    }
}

/// Turn a status code and raw body into the fetch result.
///
/// Non-success statuses always fail, carrying the body's top-level
/// `message` string when there is one.
///
/// # Errors
///
/// `Status` for non-2xx responses, `MalformedPayload` for a 2xx body that
/// is not JSON.
pub fn interpret_response(status: u16, body: &str) -> Result<Value, RequestError> {
    let parsed = serde_json::from_str::<Value>(body);

    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(String::from);
        return Err(RequestError::Status { status, message });
    }

    parsed.map_err(|e| RequestError::MalformedPayload(e.to_string()))
}

#[cfg(test)]
#[path = "fetch_test.rs"]
mod tests;
