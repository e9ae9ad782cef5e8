use serde::{Deserialize, Serialize};

/// Message fragment the portal uses for a wrong captcha guess.
pub const BAD_CAPTCHA_MARKER: &str = "验证码错误";

/// Message fragment the portal uses when booking has not opened yet.
pub const NOT_OPEN_MARKER: &str = "尚未开放";

/// Response body of the reservation endpoint: `{code, msg}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationResponse {
    /// `200` on acceptance. Some deployments send it as a string.
    pub code: serde_json::Value,
    #[serde(default)]
    pub msg: Option<String>,
}

impl ReservationResponse {
    pub fn is_accepted(&self) -> bool {
        match &self.code {
            serde_json::Value::Number(n) => n.as_i64() == Some(200),
            serde_json::Value::String(s) => s.trim() == "200",
            _ => false,
        }
    }

    pub fn message(&self) -> &str {
        self.msg.as_deref().unwrap_or("")
    }
}

/// Why an attempt may succeed if repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RetryReason {
    /// The captcha guess was wrong.
    BadCaptcha,
    /// The booking window has not opened yet (early trigger or clock drift).
    NotOpenYet,
    /// A network or portal hiccup during the attempt.
    Transport(String),
    /// The challenge image could not be decoded or read.
    Captcha(String),
    /// The portal answered with something other than JSON, typically the login page.
    SessionExpired,
}

impl std::fmt::Display for RetryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadCaptcha => write!(f, "bad captcha"),
            Self::NotOpenYet => write!(f, "not open yet"),
            Self::Transport(detail) => write!(f, "transport error: {}", detail),
            Self::Captcha(detail) => write!(f, "captcha unreadable: {}", detail),
            Self::SessionExpired => write!(f, "session expired"),
        }
    }
}

/// Result of one reservation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// The portal accepted the reservation.
    Success { message: String },
    /// Worth repeating with a fresh captcha.
    Retryable { reason: RetryReason },
    /// Rejected for good (slot full, already booked, not permitted, ...).
    Fatal { message: String },
}

impl SubmissionOutcome {
    /// Success and Fatal end the attempt loop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Retryable { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Classify a reservation response. Pure function of the body.
pub fn classify(response: &ReservationResponse) -> SubmissionOutcome {
    let message = response.message();
    if response.is_accepted() {
        SubmissionOutcome::Success {
            message: message.to_string(),
        }
    } else if message.contains(BAD_CAPTCHA_MARKER) {
        SubmissionOutcome::Retryable {
            reason: RetryReason::BadCaptcha,
        }
    } else if message.contains(NOT_OPEN_MARKER) {
        SubmissionOutcome::Retryable {
            reason: RetryReason::NotOpenYet,
        }
    } else {
        SubmissionOutcome::Fatal {
            message: message.to_string(),
        }
    }
}
