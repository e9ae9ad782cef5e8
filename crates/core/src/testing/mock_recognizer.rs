//! Mock captcha recognizer for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::captcha::{CaptchaError, CaptchaRecognizer};

/// Mock implementation of the CaptchaRecognizer trait.
///
/// Queued guesses are returned first, then the default guess forever.
#[derive(Debug)]
pub struct MockRecognizer {
    default_guess: String,
    queued: Arc<RwLock<VecDeque<Result<String, CaptchaError>>>>,
    images: Arc<RwLock<Vec<Vec<u8>>>>,
}

impl Default for MockRecognizer {
    fn default() -> Self {
        Self::new("abcd")
    }
}

impl MockRecognizer {
    pub fn new(default_guess: impl Into<String>) -> Self {
        Self {
            default_guess: default_guess.into(),
            queued: Arc::new(RwLock::new(VecDeque::new())),
            images: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Queue guesses to return before the default.
    pub async fn push_guesses<I, S>(&self, guesses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut queued = self.queued.write().await;
        queued.extend(guesses.into_iter().map(|g| Ok(g.into())));
    }

    /// Queue a failure.
    pub async fn push_error(&self, error: CaptchaError) {
        self.queued.write().await.push_back(Err(error));
    }

    /// Images seen so far, in order.
    pub async fn recorded_images(&self) -> Vec<Vec<u8>> {
        self.images.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.images.read().await.len()
    }
}

#[async_trait]
impl CaptchaRecognizer for MockRecognizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn recognize(&self, image: &[u8]) -> Result<String, CaptchaError> {
        self.images.write().await.push(image.to_vec());
        match self.queued.write().await.pop_front() {
            Some(result) => result,
            None => Ok(self.default_guess.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_default() {
        let recognizer = MockRecognizer::new("ok12");
        recognizer.push_guesses(["bad1"]).await;
        recognizer
            .push_error(CaptchaError::RecognitionFailed("blurry".into()))
            .await;

        assert_eq!(recognizer.recognize(b"img").await.unwrap(), "bad1");
        assert!(recognizer.recognize(b"img").await.is_err());
        assert_eq!(recognizer.recognize(b"img").await.unwrap(), "ok12");
        assert_eq!(recognizer.call_count().await, 3);
    }
}
