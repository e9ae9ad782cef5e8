//! Password encryption for the CAS login form.
//!
//! The login page expects the password encrypted with a per-page salt by the
//! portal's own script. The algorithm is treated as a black box behind the
//! `PasswordEncryptor` trait.

mod node;

pub use node::NodeScriptEncryptor;

use async_trait::async_trait;
use thiserror::Error;

use crate::exec::ExecError;

/// Errors that can occur while encrypting a password.
#[derive(Debug, Error)]
pub enum EncryptError {
    #[error("Encryption script not found: {0}")]
    ScriptNotFound(String),

    #[error("Encryption helper failed: {0}")]
    Helper(#[from] ExecError),

    #[error("Encryption produced no output")]
    EmptyOutput,
}

/// Something that can produce the login form's password ciphertext.
#[async_trait]
pub trait PasswordEncryptor: Send + Sync {
    /// Name of this encryptor for logging.
    fn name(&self) -> &str;

    /// Encrypt `plaintext` with the salt published on the login page.
    async fn encrypt(&self, plaintext: &str, salt: &str) -> Result<String, EncryptError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EncryptError::ScriptNotFound("encrypt.js".to_string());
        assert_eq!(err.to_string(), "Encryption script not found: encrypt.js");
        assert_eq!(
            EncryptError::EmptyOutput.to_string(),
            "Encryption produced no output"
        );
    }
}
