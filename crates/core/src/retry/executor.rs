use std::fmt::{Debug, Display};
use std::future::Future;

use tracing::{debug, warn};

use super::{RetryError, RetryEvent, RetryPolicy, Retryable};

/// Run `op` until it succeeds, the error is permanent, or the budget runs out.
///
/// `op` receives the 1-based attempt number.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display + Debug,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempt, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(error) => {
                let retryable = error.is_retryable();
                let exhausted = attempt >= max_attempts;
                let next_delay = if retryable && !exhausted {
                    Some(policy.delay_after(attempt))
                } else {
                    None
                };

                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    retryable,
                    "Attempt failed: {}",
                    error
                );
                policy.notify(&RetryEvent {
                    operation: operation.to_string(),
                    attempt,
                    max_attempts,
                    error: error.to_string(),
                    next_delay,
                });

                if !retryable {
                    return Err(RetryError::Permanent {
                        operation: operation.to_string(),
                        error,
                    });
                }

                match next_delay {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => {
                        return Err(RetryError::Exhausted {
                            operation: operation.to_string(),
                            attempts: attempt,
                            last: error,
                        })
                    }
                }
            }
        }
        attempt += 1;
    }
}
