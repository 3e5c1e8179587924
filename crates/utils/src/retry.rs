//! Retry logic for transient control-socket failures

use onair_core::Result;
use std::future::Future;

/// Run `operation`, and run it once more if the first failure is retryable.
///
/// Only meant for side-effect free operations: every attempt builds a fresh
/// connection, and a non-retryable error is returned untouched.
pub async fn retry_once<F, Fut, T>(label: &str, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match operation().await {
        Err(error) if error.is_retryable() => {
            tracing::warn!(operation = label, %error, "transient failure, retrying once");
            operation().await
        }
        other => other,
    }
}
