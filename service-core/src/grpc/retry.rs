//! gRPC client retry utilities for service-to-service communication.
//!
//! Retries use exponential backoff and never sleep past the request deadline.
//! Mutating calls are configured with [`RetryConfig::no_retry`] by the clients:
//! a retried `CreateSale` could record the sale twice.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tonic::{Code, Status};
use tracing::{info, warn};

/// Configuration for retry behavior.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Initial backoff duration before first retry.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to backoff duration.
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Create a config with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Create a config for quick retries (smaller backoffs).
    pub fn quick() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    fn backoff_duration(&self, attempt: u32) -> Duration {
        let backoff =
            self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let backoff_ms = backoff.min(self.max_backoff.as_millis() as f64) as u64;

        let mut duration = Duration::from_millis(backoff_ms);

        if self.add_jitter {
            // Add up to 25% jitter
            let jitter = (backoff_ms as f64 * 0.25 * rand_jitter()) as u64;
            duration += Duration::from_millis(jitter);
        }

        duration
    }
}

/// Simple pseudo-random jitter (0.0 to 1.0) without external dependencies.
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// Determines if a gRPC status code is retryable.
pub fn is_retryable(status: &Status) -> bool {
    matches!(
        status.code(),
        Code::Unavailable | Code::ResourceExhausted | Code::Aborted | Code::Unknown
    )
}

/// Execute a gRPC call with retry logic.
///
/// `DeadlineExceeded` is never retried here: the deadline belongs to the
/// inbound request, so a second attempt would start already late. When
/// `deadline` has passed before the first attempt the call is not made.
pub async fn retry_grpc_call<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    deadline: Option<Instant>,
    f: F,
) -> Result<T, Status>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, Status>>,
{
    let mut attempt = 0;

    loop {
        if let Some(deadline) = deadline
            && Instant::now() >= deadline
        {
            warn!(
                operation = operation_name,
                attempt = attempt + 1,
                "Request deadline passed before gRPC call"
            );
            return Err(Status::deadline_exceeded(format!(
                "deadline passed before {}",
                operation_name
            )));
        }

        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "gRPC call succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(status) => {
                if attempt >= config.max_retries || !is_retryable(&status) {
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        code = ?status.code(),
                        message = status.message(),
                        "gRPC call failed"
                    );
                    return Err(status);
                }

                let backoff = config.backoff_duration(attempt);
                if let Some(deadline) = deadline
                    && Instant::now() + backoff >= deadline
                {
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        code = ?status.code(),
                        "gRPC call failed, no time left to retry"
                    );
                    return Err(status);
                }

                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    code = ?status.code(),
                    message = status.message(),
                    backoff_ms = backoff.as_millis(),
                    "gRPC call failed, retrying after backoff"
                );

                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_duration() {
        let config = RetryConfig {
            add_jitter: false,
            ..Default::default()
        };

        assert_eq!(config.backoff_duration(0), Duration::from_millis(100));
        assert_eq!(config.backoff_duration(1), Duration::from_millis(200));
        assert_eq!(config.backoff_duration(2), Duration::from_millis(400));
    }

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(&Status::unavailable("service down")));
        assert!(is_retryable(&Status::resource_exhausted("rate limited")));
        assert!(!is_retryable(&Status::deadline_exceeded("timeout")));
        assert!(!is_retryable(&Status::invalid_argument("bad request")));
        assert!(!is_retryable(&Status::not_found("not found")));
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let config = RetryConfig::default();
        let result =
            retry_grpc_call(&config, "test_op", None, || async { Ok::<_, Status>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_no_retry_makes_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = retry_grpc_call(&RetryConfig::no_retry(), "create_sale", None, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(Status::unavailable("down"))
            }
        })
        .await;

        assert_eq!(result.unwrap_err().code(), Code::Unavailable);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = RetryConfig {
            initial_backoff: Duration::from_millis(1),
            add_jitter: false,
            ..RetryConfig::quick()
        };
        let result = retry_grpc_call(&config, "get_sale", None, || {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(Status::unavailable("warming up"))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_passed_deadline_skips_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = retry_grpc_call(
            &RetryConfig::default(),
            "get_debt",
            Some(Instant::now()),
            || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Status>(1)
                }
            },
        )
        .await;

        assert_eq!(result.unwrap_err().code(), Code::DeadlineExceeded);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
