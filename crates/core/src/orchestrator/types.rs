//! Types for the reservation orchestrator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::retry::RetryError;
use crate::session::SessionError;
use crate::submission::{RetryReason, SubmissionError, SubmissionOutcome};

/// Errors that end a run without a terminal submission outcome.
#[derive(Debug, Error)]
pub enum ReserveError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Login kept failing (or failed permanently).
    #[error("login failed: {0}")]
    Login(RetryError<SessionError>),

    #[error("catalog unavailable: {0}")]
    Catalog(RetryError<CatalogError>),

    #[error("activity not found: {0}")]
    ActivityNotFound(String),

    #[error("cannot schedule activity: {0}")]
    InvalidOpenTime(#[source] CatalogError),

    #[error("submission aborted: {0}")]
    Submission(#[from] SubmissionError),

    /// The operator deadline passed while attempts were still retryable.
    #[error("gave up after {attempts} attempts ({last_reason})")]
    DeadlineExceeded {
        attempts: u32,
        last_reason: RetryReason,
    },

    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl ReserveError {
    /// Infrastructure failures (as opposed to operator input or cancellation).
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Login(_) | Self::Catalog(_) | Self::Submission(_) | Self::DeadlineExceeded { .. }
        )
    }
}

/// Final result of a reservation run that reached a terminal outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationReport {
    pub activity_id: String,
    pub activity_name: String,
    /// Either `Success` or `Fatal`.
    pub outcome: SubmissionOutcome,
    /// Attempts made (captcha solve + submit cycles).
    pub attempts: u32,
    /// Logins performed for the submission loop.
    pub logins: u32,
    pub finished_at: DateTime<Utc>,
}

impl ReservationReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReserveError::DeadlineExceeded {
            attempts: 42,
            last_reason: RetryReason::BadCaptcha,
        };
        assert_eq!(err.to_string(), "gave up after 42 attempts (bad captcha)");
        assert!(err.is_infrastructure());

        let err = ReserveError::ActivityNotFound("abc".to_string());
        assert_eq!(err.to_string(), "activity not found: abc");
        assert!(!err.is_infrastructure());
    }
}
