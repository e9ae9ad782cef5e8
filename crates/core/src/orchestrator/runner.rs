//! Reservation orchestrator implementation.
//!
//! Drives one run: login, fetch the catalog, then either reserve right away
//! or arm the precision trigger `lead` ahead of the opening instant. The
//! trigger's job logs in, waits for the exact instant and loops submissions
//! until a terminal outcome.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info, warn};

use crate::captcha::{CaptchaRecognizer, CaptchaSolver};
use crate::catalog::{Activity, Catalog, CatalogFetcher};
use crate::config::{parse_utc_offset, Config};
use crate::crypto::PasswordEncryptor;
use crate::retry::RetryPolicy;
use crate::session::{Credentials, Session, SessionManager};
use crate::submission::{RetryReason, SubmissionOutcome, Submitter};
use crate::trigger::{Clock, PrecisionTrigger, Shutdown, TriggerError};

use super::types::{ReservationReport, ReserveError};

/// The reservation orchestrator.
pub struct ReservationOrchestrator {
    sessions: SessionManager,
    fetcher: CatalogFetcher,
    submitter: Submitter,
    trigger: PrecisionTrigger,
    retry_policy: RetryPolicy,
    utc_offset: FixedOffset,
    lead: Duration,
    max_duration: Duration,
    retry_delay: Duration,
}

impl ReservationOrchestrator {
    /// Create a new orchestrator from configuration and its collaborators.
    pub fn new(
        config: &Config,
        encryptor: Arc<dyn PasswordEncryptor>,
        recognizer: Arc<dyn CaptchaRecognizer>,
        clock: Arc<dyn Clock>,
        retry_policy: RetryPolicy,
    ) -> Result<Self, ReserveError> {
        let utc_offset = parse_utc_offset(&config.portal.utc_offset)?;
        let portal = &config.portal;

        Ok(Self {
            sessions: SessionManager::new(portal.clone(), encryptor, retry_policy.clone()),
            fetcher: CatalogFetcher::new(
                &portal.activity_list_url,
                &config.catalog,
                retry_policy.clone(),
            ),
            submitter: Submitter::new(
                &portal.reserve_url,
                CaptchaSolver::new(&portal.captcha_url, recognizer),
            ),
            trigger: PrecisionTrigger::from_config(clock, &config.trigger),
            retry_policy,
            utc_offset,
            lead: Duration::from_secs(config.trigger.lead_secs),
            max_duration: Duration::from_secs(config.submission.max_duration_secs),
            retry_delay: Duration::from_millis(config.submission.retry_delay_ms),
        })
    }

    /// Log in, fetch the whole catalog and close the session.
    pub async fn fetch_catalog(&self, credentials: &Credentials) -> Result<Catalog, ReserveError> {
        let session = self
            .sessions
            .login_with_retry(credentials)
            .await
            .map_err(ReserveError::Login)?;

        let result = self.fetcher.fetch_all_with_retry(&session).await;
        session.close();
        result.map_err(ReserveError::Catalog)
    }

    /// Opening instant of an activity, in UTC.
    pub fn opens_at(&self, activity: &Activity) -> Result<DateTime<Utc>, ReserveError> {
        activity
            .opens_at(self.utc_offset)
            .map_err(ReserveError::InvalidOpenTime)
    }

    /// Whether booking for `activity` has already opened.
    pub fn is_open(&self, activity: &Activity) -> Result<bool, ReserveError> {
        Ok(self.opens_at(activity)? <= self.trigger.now())
    }

    /// Fetch a fresh catalog and reserve `activity_id` from it.
    pub async fn run(
        &self,
        credentials: &Credentials,
        activity_id: &str,
        shutdown: &Shutdown,
    ) -> Result<ReservationReport, ReserveError> {
        let catalog = self.fetch_catalog(credentials).await?;
        let activity = catalog
            .get(activity_id)
            .ok_or_else(|| ReserveError::ActivityNotFound(activity_id.to_string()))?;
        self.reserve(credentials, activity, shutdown).await
    }

    /// Reserve now if booking is open, otherwise schedule the trigger.
    pub async fn reserve(
        &self,
        credentials: &Credentials,
        activity: &Activity,
        shutdown: &Shutdown,
    ) -> Result<ReservationReport, ReserveError> {
        let opens_at = self.opens_at(activity)?;
        let now = self.trigger.now();

        if opens_at <= now {
            info!(activity = %activity.id, %opens_at, "Booking already open, reserving now");
            return self.reserve_job(credentials, activity, None, shutdown).await;
        }

        let lead =
            chrono::Duration::from_std(self.lead).unwrap_or_else(|_| chrono::Duration::zero());
        let fire_at = opens_at - lead;
        info!(
            activity = %activity.id,
            name = %activity.name,
            %opens_at,
            %fire_at,
            "Booking not open yet, scheduling"
        );

        self.trigger
            .run_at(fire_at, shutdown, || {
                self.reserve_job(credentials, activity, Some(opens_at), shutdown)
            })
            .await
            .map_err(|TriggerError::Cancelled| ReserveError::Cancelled { attempts: 0 })?
    }

    /// The scheduled job: log in, wait for the exact opening, then submit.
    async fn reserve_job(
        &self,
        credentials: &Credentials,
        activity: &Activity,
        opens_at: Option<DateTime<Utc>>,
        shutdown: &Shutdown,
    ) -> Result<ReservationReport, ReserveError> {
        let session = self.login(credentials, shutdown, 0).await?;

        if let Some(opens_at) = opens_at {
            let waited = self.trigger.wait_until(opens_at, shutdown).await;
            if let Err(TriggerError::Cancelled) = waited {
                session.close();
                return Err(ReserveError::Cancelled { attempts: 0 });
            }
            debug!(activity = %activity.id, "Opening instant reached");
        }

        self.submit_until_terminal(credentials, session, activity, shutdown)
            .await
    }

    async fn login(
        &self,
        credentials: &Credentials,
        shutdown: &Shutdown,
        attempts: u32,
    ) -> Result<Session, ReserveError> {
        tokio::select! {
            _ = shutdown.cancelled() => Err(ReserveError::Cancelled { attempts }),
            result = self.sessions.login_with_retry(credentials) => {
                result.map_err(ReserveError::Login)
            }
        }
    }

    /// Attempt submissions on `session` until Success or Fatal.
    ///
    /// Bounded only by the operator deadline and shutdown. A session the
    /// portal no longer accepts is replaced by a fresh login. Network
    /// failures back off under the retry policy; rejections retry at once.
    pub async fn submit_until_terminal(
        &self,
        credentials: &Credentials,
        mut session: Session,
        activity: &Activity,
        shutdown: &Shutdown,
    ) -> Result<ReservationReport, ReserveError> {
        let deadline = tokio::time::Instant::now() + self.max_duration;
        let mut attempts: u32 = 0;
        let mut logins: u32 = 1;
        let mut transport_failures: u32 = 0;
        let mut last_reason = RetryReason::NotOpenYet;

        loop {
            if tokio::time::Instant::now() >= deadline {
                session.close();
                warn!(activity = %activity.id, attempts, "Submission deadline exceeded");
                return Err(ReserveError::DeadlineExceeded {
                    attempts,
                    last_reason,
                });
            }

            attempts += 1;
            let result = tokio::select! {
                _ = shutdown.cancelled() => None,
                result = self.submitter.attempt(&session, &activity.id) => Some(result),
            };
            let outcome = match result {
                None => {
                    session.close();
                    return Err(ReserveError::Cancelled { attempts });
                }
                Some(Err(e)) => {
                    session.close();
                    return Err(ReserveError::Submission(e));
                }
                Some(Ok(outcome)) => outcome,
            };

            match outcome {
                SubmissionOutcome::Retryable { reason } => {
                    info!(
                        activity = %activity.id,
                        attempt = attempts,
                        %reason,
                        "Attempt rejected, retrying"
                    );
                    if reason == RetryReason::SessionExpired {
                        session.close();
                        session = self.login(credentials, shutdown, attempts).await?;
                        logins += 1;
                    }

                    let delay = if matches!(reason, RetryReason::Transport(_)) {
                        transport_failures += 1;
                        self.retry_policy
                            .delay_after(transport_failures)
                            .max(self.retry_delay)
                    } else {
                        transport_failures = 0;
                        self.retry_delay
                    };
                    last_reason = reason;

                    if !delay.is_zero() {
                        tokio::select! {
                            _ = shutdown.cancelled() => {
                                session.close();
                                return Err(ReserveError::Cancelled { attempts });
                            }
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
                terminal => {
                    session.close();
                    match &terminal {
                        SubmissionOutcome::Success { .. } => {
                            info!(activity = %activity.id, attempts, "Reservation succeeded")
                        }
                        _ => warn!(activity = %activity.id, attempts, "Reservation rejected"),
                    }
                    return Ok(ReservationReport {
                        activity_id: activity.id.clone(),
                        activity_name: activity.name.clone(),
                        outcome: terminal,
                        attempts,
                        logins,
                        finished_at: self.trigger.now(),
                    });
                }
            }
        }
    }
}
