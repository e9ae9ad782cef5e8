//! Captcha challenges for reservation submissions.
//!
//! Each attempt fetches a fresh challenge image, which is handed to an opaque
//! recognition engine. A wrong guess is a normal outcome handled by the
//! submission loop, not an error here.

mod command;
mod solver;

pub use command::CommandRecognizer;
pub use solver::{decode_challenge, CaptchaSolver};

use async_trait::async_trait;
use thiserror::Error;

use crate::exec::ExecError;
use crate::portal::PortalError;

/// Errors that can occur while solving a captcha.
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// Fetching the challenge failed.
    #[error("Failed to fetch captcha: {0}")]
    Portal(#[from] PortalError),

    /// The challenge payload was not valid base64 image data.
    #[error("Invalid captcha payload: {0}")]
    InvalidPayload(String),

    /// The recognition engine could not run at all.
    #[error("Captcha engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine ran but failed on this image.
    #[error("Captcha recognition failed: {0}")]
    RecognitionFailed(String),
}

impl CaptchaError {
    /// Whether a fresh challenge could succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::EngineUnavailable(_))
    }
}

impl From<ExecError> for CaptchaError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::NotFound { .. } => CaptchaError::EngineUnavailable(e.to_string()),
            other => CaptchaError::RecognitionFailed(other.to_string()),
        }
    }
}

/// One single-use challenge image.
#[derive(Debug, Clone)]
pub struct CaptchaChallenge {
    pub image: Vec<u8>,
}

/// Opaque image classifier: image bytes in, best-guess text out.
#[async_trait]
pub trait CaptchaRecognizer: Send + Sync {
    /// Name of this recognizer for logging.
    fn name(&self) -> &str;

    /// Guess the code shown in the image. No accuracy guarantee.
    async fn recognize(&self, image: &[u8]) -> Result<String, CaptchaError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_engine_is_not_retryable() {
        let err = CaptchaError::from(ExecError::NotFound {
            path: PathBuf::from("ocr"),
        });
        assert!(matches!(err, CaptchaError::EngineUnavailable(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_engine_failure_is_retryable() {
        let err = CaptchaError::from(ExecError::Timeout { timeout_secs: 5 });
        assert!(matches!(err, CaptchaError::RecognitionFailed(_)));
        assert!(err.is_retryable());
        assert!(CaptchaError::InvalidPayload("x".into()).is_retryable());
    }
}
