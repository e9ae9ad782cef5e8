//! One reservation attempt: fresh captcha, submit, classify.

use serde_json::json;
use tracing::{info, warn};

use crate::captcha::{CaptchaError, CaptchaSolver};
use crate::portal::{read_body, PortalError};
use crate::session::Session;

use super::{classify, ReservationResponse, RetryReason, SubmissionError, SubmissionOutcome};

/// Sends reservation attempts for a single activity endpoint.
pub struct Submitter {
    reserve_url: String,
    solver: CaptchaSolver,
}

fn retryable(reason: RetryReason) -> SubmissionOutcome {
    SubmissionOutcome::Retryable { reason }
}

/// Map a portal failure during an attempt to its retry reason.
fn portal_reason(error: &PortalError) -> RetryReason {
    match error {
        // the portal answers expired sessions with its HTML login page
        PortalError::Parse(_) => RetryReason::SessionExpired,
        other => RetryReason::Transport(other.to_string()),
    }
}

impl Submitter {
    pub fn new(reserve_url: impl Into<String>, solver: CaptchaSolver) -> Self {
        Self {
            reserve_url: reserve_url.into(),
            solver,
        }
    }

    /// Make one attempt with a freshly solved captcha.
    ///
    /// Network trouble is reported as a retryable outcome; only a broken
    /// captcha engine is an error.
    pub async fn attempt(
        &self,
        session: &Session,
        activity_id: &str,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let guess = match self.solver.solve(session).await {
            Ok(guess) => guess,
            Err(CaptchaError::Portal(e)) => {
                warn!(session = session.id(), "Captcha fetch failed: {}", e);
                return Ok(retryable(portal_reason(&e)));
            }
            Err(e) if e.is_retryable() => {
                warn!(session = session.id(), "Captcha solve failed: {}", e);
                return Ok(retryable(RetryReason::Captcha(e.to_string())));
            }
            Err(e) => return Err(SubmissionError::Captcha(e)),
        };

        let param_json = json!({ "HD_WID": activity_id, "vcode": guess }).to_string();
        let result = session
            .client()
            .post(&self.reserve_url)
            .form(&[("paramJson", param_json.as_str())])
            .send()
            .await;

        let body = match result {
            Ok(response) => read_body(response).await,
            Err(e) => Err(PortalError::from(e)),
        };
        let body = match body {
            Ok(body) => body,
            Err(e) => {
                warn!(session = session.id(), "Reservation request failed: {}", e);
                return Ok(retryable(portal_reason(&e)));
            }
        };

        let response: ReservationResponse = match serde_json::from_str(&body) {
            Ok(response) => response,
            Err(_) => {
                let e = PortalError::parse("reservation response is not JSON", &body);
                warn!(session = session.id(), "{}", e);
                return Ok(retryable(portal_reason(&e)));
            }
        };

        info!(
            session = session.id(),
            activity = activity_id,
            code = %response.code,
            msg = response.message(),
            "Reservation response"
        );
        Ok(classify(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_means_session_expired() {
        assert_eq!(
            portal_reason(&PortalError::Parse("<html>".into())),
            RetryReason::SessionExpired
        );
        assert!(matches!(
            portal_reason(&PortalError::Timeout),
            RetryReason::Transport(_)
        ));
    }
}
