//! Shared plumbing for talking to the campus portal.
//!
//! Transport failures are classified here once so every component agrees on
//! what counts as transient.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use thiserror::Error;

use crate::config::PortalConfig;
use crate::retry::Retryable;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Errors raised by a single portal request.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP error: {0}")]
    Http(String),

    /// The response did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Parse(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl PortalError {
    /// Truncated response body for error messages.
    pub(crate) fn parse(context: &str, body: &str) -> Self {
        Self::Parse(format!(
            "{}: {}",
            context,
            body.chars().take(120).collect::<String>()
        ))
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PortalError::Timeout
        } else if e.is_connect() {
            PortalError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            PortalError::Parse(e.to_string())
        } else {
            PortalError::Http(e.to_string())
        }
    }
}

impl Retryable for PortalError {
    fn is_retryable(&self) -> bool {
        // the portal's pages are stable but occasionally flaky, so shape errors retry too
        !matches!(self, Self::Client(_))
    }
}

/// Build a fresh client with its own cookie jar.
///
/// Each login gets a new client so no cookies leak between sessions.
pub fn build_client(config: &PortalConfig) -> Result<Client, PortalError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .map_err(|e| PortalError::Client(format!("invalid user agent: {}", e)))?,
    );

    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs as u64))
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .map_err(|e| PortalError::Client(e.to_string()))
}

/// Read the body of a response as text, regardless of status.
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, PortalError> {
    response.text().await.map_err(PortalError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(PortalError::Timeout.is_retryable());
        assert!(PortalError::Parse("bad json".into()).is_retryable());
        assert!(!PortalError::Client("tls".into()).is_retryable());
    }

    #[test]
    fn test_parse_error_truncates_body() {
        let body = "x".repeat(1000);
        let err = PortalError::parse("catalog page", &body);
        assert!(err.to_string().len() < 200);
    }

    #[test]
    fn test_build_client_rejects_bad_user_agent() {
        let config = PortalConfig {
            user_agent: "bad\nagent".to_string(),
            ..Default::default()
        };
        assert!(matches!(build_client(&config), Err(PortalError::Client(_))));
        assert!(build_client(&PortalConfig::default()).is_ok());
    }
}
