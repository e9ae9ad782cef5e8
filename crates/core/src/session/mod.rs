//! Portal sessions and the login handshake.

mod manager;
mod types;

pub use manager::{build_login_form, extract_hidden_fields, find_salt, SessionManager};
pub use types::*;

use thiserror::Error;

use crate::crypto::EncryptError;
use crate::portal::PortalError;
use crate::retry::Retryable;

/// Errors that can occur while logging in.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Login request failed: {0}")]
    Portal(#[from] PortalError),

    /// The login page did not carry the expected hidden fields.
    #[error("Malformed login page: {0}")]
    MalformedLoginPage(String),

    #[error("Password encryption failed: {0}")]
    Encrypt(#[from] EncryptError),
}

impl Retryable for SessionError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Portal(e) => e.is_retryable(),
            Self::MalformedLoginPage(_) => true,
            Self::Encrypt(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(SessionError::Portal(PortalError::Timeout).is_retryable());
        assert!(SessionError::MalformedLoginPage("empty".into()).is_retryable());
        assert!(!SessionError::Encrypt(EncryptError::EmptyOutput).is_retryable());
    }
}
