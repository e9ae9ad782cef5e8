//! Mock password encryptor for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::crypto::{EncryptError, PasswordEncryptor};

/// A recorded encryption call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEncryption {
    pub plaintext: String,
    pub salt: String,
}

/// Mock implementation of the PasswordEncryptor trait.
///
/// Produces `enc(<plaintext>|<salt>)`, so tests can tell which salt was used.
#[derive(Debug, Default)]
pub struct MockEncryptor {
    calls: Arc<RwLock<Vec<RecordedEncryption>>>,
    next_error: Arc<RwLock<Option<EncryptError>>>,
}

impl MockEncryptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ciphertext this mock returns for the given inputs.
    pub fn expected(plaintext: &str, salt: &str) -> String {
        format!("enc({}|{})", plaintext, salt)
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedEncryption> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: EncryptError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl PasswordEncryptor for MockEncryptor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn encrypt(&self, plaintext: &str, salt: &str) -> Result<String, EncryptError> {
        self.calls.write().await.push(RecordedEncryption {
            plaintext: plaintext.to_string(),
            salt: salt.to_string(),
        });
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        Ok(Self::expected(plaintext, salt))
    }
}
