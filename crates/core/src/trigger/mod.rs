//! Precision trigger: wait for a wall-clock instant, then fire once.
//!
//! Waiting is a cooperative poll-and-sleep loop against an injectable
//! [`Clock`], so it stays responsive to [`Shutdown`] and can be tested on a
//! paused tokio clock.

mod clock;
mod shutdown;

pub use clock::{Clock, SystemClock};
pub use shutdown::Shutdown;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::TriggerConfig;

/// Beyond this distance from the target the loop sleeps in coarse steps.
const FINE_WINDOW: Duration = Duration::from_secs(1);

/// Longest single sleep while far from the target, so clock jumps are noticed.
const COARSE_STEP: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Trigger cancelled before firing")]
    Cancelled,
}

/// Waits for target instants with sub-100ms resolution.
#[derive(Clone)]
pub struct PrecisionTrigger {
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
}

impl PrecisionTrigger {
    pub fn new(clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        Self {
            clock,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn from_config(clock: Arc<dyn Clock>, config: &TriggerConfig) -> Self {
        Self::new(clock, Duration::from_millis(config.poll_interval_ms))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Block the calling task until the clock reaches `target`.
    pub async fn wait_until(
        &self,
        target: DateTime<Utc>,
        shutdown: &Shutdown,
    ) -> Result<(), TriggerError> {
        loop {
            if shutdown.is_triggered() {
                return Err(TriggerError::Cancelled);
            }

            let now = self.clock.now();
            if now >= target {
                return Ok(());
            }

            let remaining = (target - now).to_std().unwrap_or(Duration::ZERO);
            let step = if remaining > FINE_WINDOW {
                (remaining - FINE_WINDOW).min(COARSE_STEP)
            } else {
                self.poll_interval.min(remaining)
            };

            tokio::select! {
                _ = shutdown.cancelled() => return Err(TriggerError::Cancelled),
                _ = tokio::time::sleep(step) => {}
            }
        }
    }

    /// Wait for `target`, then run `job` exactly once and return its result.
    ///
    /// A target in the past fires immediately.
    pub async fn run_at<F, Fut, T>(
        &self,
        target: DateTime<Utc>,
        shutdown: &Shutdown,
        job: F,
    ) -> Result<T, TriggerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let now = self.clock.now();
        if target <= now {
            debug!(%target, %now, "Target already reached, firing immediately");
        } else {
            info!(%target, wait_secs = (target - now).num_seconds(), "Trigger scheduled");
            self.wait_until(target, shutdown).await?;
        }

        info!(%target, fired_at = %self.clock.now(), "Trigger fired");
        Ok(job().await)
    }
}
