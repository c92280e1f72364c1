//! Bounded retry with exponential backoff for upstream calls.

use std::future::Future;
use std::time::Duration;

use serde_json::json;

use crate::error::AzureError;
use crate::telemetry::TelemetryHooks;

/// Runs `op` until it succeeds, a non-transient error occurs, or
/// `max_retries` re-attempts are exhausted.
///
/// Sleep before attempt `n` (1-based) is `backoff_base * 2^(n-1)`. The
/// `on_error` hook fires once per failed attempt with the attempt number
/// and error text.
pub async fn retry_loop<T, F, Fut>(
    mut op: F,
    max_retries: u32,
    backoff_base: Duration,
    hooks: &TelemetryHooks,
    event: &str,
) -> Result<T, AzureError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AzureError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                hooks.error(
                    event,
                    &json!({ "attempt": attempt, "error": err.to_string() }),
                );
                if !err.is_transient() || attempt > max_retries {
                    return Err(err);
                }
                tokio::time::sleep(backoff_base * 2u32.pow(attempt - 1)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let tries = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&tries);

        let result = retry_loop(
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(AzureError::RateLimited("busy".into()))
                    } else {
                        Ok(42)
                    }
                }
            },
            3,
            Duration::from_millis(1),
            &TelemetryHooks::default(),
            "test.retry",
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(tries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_retries_on_persistent_transient_error() {
        let tries = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&tries);

        let result: Result<(), _> = retry_loop(
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AzureError::Timeout("slow".into()))
                }
            },
            2,
            Duration::from_millis(1),
            &TelemetryHooks::default(),
            "test.retry",
        )
        .await;

        assert!(matches!(result, Err(AzureError::Timeout(_))));
        // Initial attempt plus two retries.
        assert_eq!(tries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_error_fails_immediately() {
        let tries = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&tries);

        let result: Result<(), _> = retry_loop(
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AzureError::Api {
                        status: 400,
                        message: "bad".into(),
                    })
                }
            },
            5,
            Duration::from_millis(1),
            &TelemetryHooks::default(),
            "test.retry",
        )
        .await;

        assert!(matches!(result, Err(AzureError::Api { status: 400, .. })));
        assert_eq!(tries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn error_hook_fires_once_per_attempt() {
        let hook_hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hook_hits);
        let hooks = TelemetryHooks {
            on_result: None,
            on_error: Some(Arc::new(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        };

        let _: Result<(), _> = retry_loop(
            || async { Err(AzureError::RateLimited("busy".into())) },
            2,
            Duration::from_millis(1),
            &hooks,
            "test.retry",
        )
        .await;

        assert_eq!(hook_hits.load(Ordering::SeqCst), 3);
    }
}
