//! Backoff for SQLite lock contention
//!
//! Audit writes can race with other writers on the same database file. A
//! "database is locked" error is retried with exponential backoff (10 ms,
//! doubling, capped at 1 s) until `max_wait_ms` has elapsed; any other error
//! is returned immediately.

use rights_common::{Error, Result};
use std::time::{Duration, Instant};

const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 1000;

/// Default lock wait for audit writes
pub const DEFAULT_MAX_LOCK_WAIT_MS: u64 = 5000;

fn is_lock_error(err: &Error) -> bool {
    matches!(err, Error::Database(db_err) if db_err.to_string().contains("database is locked"))
}

/// Run `operation` until it succeeds, fails with a non-lock error, or the
/// wait budget runs out.
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let start = Instant::now();
    let budget = Duration::from_millis(max_wait_ms);
    let mut backoff_ms = INITIAL_BACKOFF_MS;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Database write succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_lock_error(&err) {
            return Err(err);
        }

        let elapsed = start.elapsed();
        if elapsed >= budget {
            tracing::error!(
                operation = operation_name,
                attempt,
                elapsed_ms = elapsed.as_millis() as u64,
                max_wait_ms,
                "Database still locked, giving up"
            );
            return Err(Error::Internal(format!(
                "{}: database locked after {} attempts ({} ms)",
                operation_name,
                attempt,
                elapsed.as_millis()
            )));
        }

        tracing::warn!(
            operation = operation_name,
            attempt,
            backoff_ms,
            "Database locked, backing off"
        );
        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locked() -> Error {
        Error::Database(sqlx::Error::Protocol("database is locked".to_string()))
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let result = retry_on_lock("test_op", 1000, || async { Ok::<_, Error>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_lock_errors_are_retried() {
        let mut attempts = 0;
        let result = retry_on_lock("test_op", 5000, || {
            attempts += 1;
            let current = attempts;
            async move {
                if current < 3 {
                    Err(locked())
                } else {
                    Ok(current)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_other_errors_fail_immediately() {
        let mut attempts = 0;
        let result = retry_on_lock("test_op", 5000, || {
            attempts += 1;
            async { Err::<i32, _>(Error::Internal("boom".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(Error::Internal(_))));
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let result = retry_on_lock("test_op", 30, || async { Err::<i32, _>(locked()) }).await;
        match result {
            Err(Error::Internal(msg)) => assert!(msg.contains("database locked")),
            other => panic!("expected Internal, got {:?}", other.map(|_| ())),
        }
    }
}
