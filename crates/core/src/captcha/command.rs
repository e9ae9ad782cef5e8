use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::CaptchaConfig;
use crate::exec::run_piped;

use super::{CaptchaError, CaptchaRecognizer};

/// Recognizer that pipes the image into an external OCR program.
///
/// The program reads raw image bytes on stdin and prints its guess on stdout.
pub struct CommandRecognizer {
    program: PathBuf,
    args: Vec<String>,
    timeout_secs: u64,
}

impl CommandRecognizer {
    pub fn new(config: &CaptchaConfig) -> Self {
        Self {
            program: PathBuf::from(&config.command),
            args: config.args.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

#[async_trait]
impl CaptchaRecognizer for CommandRecognizer {
    fn name(&self) -> &str {
        "command"
    }

    async fn recognize(&self, image: &[u8]) -> Result<String, CaptchaError> {
        let stdout = run_piped(&self.program, &self.args, image, self.timeout_secs).await?;
        let guess = String::from_utf8_lossy(&stdout).trim().to_string();
        if guess.is_empty() {
            return Err(CaptchaError::RecognitionFailed(
                "recognizer printed nothing".to_string(),
            ));
        }
        Ok(guess)
    }
}
