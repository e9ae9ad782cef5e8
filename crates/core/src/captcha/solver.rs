//! Fetches and decodes challenge images.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use crate::portal::{read_body, PortalError};
use crate::session::Session;

use super::{CaptchaChallenge, CaptchaError, CaptchaRecognizer};

/// Challenge endpoint response: `{"result": "data:image/jpeg;base64,<payload>"}`.
#[derive(Debug, Deserialize)]
struct ChallengeResponse {
    result: String,
}

/// Decode a challenge's `result` string into image bytes.
///
/// Everything up to and including the first comma is a mime prefix.
pub fn decode_challenge(result: &str) -> Result<CaptchaChallenge, CaptchaError> {
    let payload = match result.split_once(',') {
        Some((_, payload)) => payload,
        None => result,
    };
    let image = STANDARD
        .decode(payload.trim())
        .map_err(|e| CaptchaError::InvalidPayload(e.to_string()))?;
    if image.is_empty() {
        return Err(CaptchaError::InvalidPayload("empty image".to_string()));
    }
    Ok(CaptchaChallenge { image })
}

/// Fetches a challenge and asks the recognizer for a guess.
pub struct CaptchaSolver {
    captcha_url: String,
    recognizer: Arc<dyn CaptchaRecognizer>,
}

impl CaptchaSolver {
    pub fn new(captcha_url: impl Into<String>, recognizer: Arc<dyn CaptchaRecognizer>) -> Self {
        Self {
            captcha_url: captcha_url.into(),
            recognizer,
        }
    }

    /// Fetch a fresh challenge for this session.
    pub async fn fetch(&self, session: &Session) -> Result<CaptchaChallenge, CaptchaError> {
        let response = session
            .client()
            .get(&self.captcha_url)
            .send()
            .await
            .map_err(PortalError::from)?;
        let body = read_body(response).await?;

        let challenge: ChallengeResponse = serde_json::from_str(&body)
            .map_err(|_| PortalError::parse("captcha response is not JSON", &body))?;
        decode_challenge(&challenge.result)
    }

    /// Fetch a challenge and return the recognizer's guess. No internal retry.
    pub async fn solve(&self, session: &Session) -> Result<String, CaptchaError> {
        let challenge = self.fetch(session).await?;
        // the challenge is consumed here; a new one is fetched for every attempt
        let guess = self.recognizer.recognize(&challenge.image).await?;
        let guess = guess.trim().to_string();
        debug!(
            recognizer = self.recognizer.name(),
            bytes = challenge.image.len(),
            guess = %guess,
            "Captcha recognized"
        );
        Ok(guess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_strips_mime_prefix() {
        let challenge = decode_challenge("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(challenge.image, b"hello");
    }

    #[test]
    fn test_decode_without_prefix() {
        let challenge = decode_challenge("aGVsbG8=").unwrap();
        assert_eq!(challenge.image, b"hello");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_challenge("data:image/jpeg;base64,!!!not-base64!!!").unwrap_err();
        assert!(matches!(err, CaptchaError::InvalidPayload(_)));
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        let err = decode_challenge("data:image/jpeg;base64,").unwrap_err();
        assert!(matches!(err, CaptchaError::InvalidPayload(_)));
    }
}
