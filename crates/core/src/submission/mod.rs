//! Reservation submission state machine.
//!
//! `Attempting -> {Success, Retryable, Fatal}`. Each attempt solves a fresh
//! captcha; the caller loops while the outcome is retryable.

mod submitter;
mod types;

pub use submitter::Submitter;
pub use types::*;

use thiserror::Error;

use crate::captcha::CaptchaError;

/// Local faults that make further attempts pointless.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Captcha engine error: {0}")]
    Captcha(CaptchaError),
}
