//! Deadline enforcement for domain operations.
//!
//! # Responsibilities
//! - Run an operation on its own task, concurrently with the request path
//! - Race the operation against a deadline timer
//! - Deliver exactly one `Outcome` to the caller
//! - Signal cancellation into operations that outlive their deadline
//!
//! # Design Decisions
//! - The worker hands its result over a oneshot channel; nothing else is shared
//! - On expiry the receiver is dropped, so a late result has nowhere to go
//! - Cancellation is cooperative: operations must watch their token.
//!   An operation that ignores it keeps running until it finishes on its own
//!   and is counted as abandoned once its result has nowhere to go.
//! - A worker that panics fails the request instead of waiting out the deadline

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::{classify, ClassifiedError, GateError};
use crate::observability::metrics;

/// Terminal result of running an operation under a deadline.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Operation completed successfully before the deadline.
    Success(T),
    /// Operation completed with an error before the deadline.
    Failure(ClassifiedError),
    /// Deadline elapsed first.
    Expired,
}

impl<T> Outcome<T> {
    pub fn is_expired(&self) -> bool {
        matches!(self, Outcome::Expired)
    }

    /// Collapse into a `Result`, classifying expiry as a timeout.
    pub fn into_result(self, deadline: Duration) -> Result<T, ClassifiedError> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(err) => Err(err),
            Outcome::Expired => Err(ClassifiedError::timeout(deadline)),
        }
    }
}

/// Run `operation` under `deadline`.
///
/// `operation` receives a [`CancellationToken`] that is cancelled when the
/// deadline elapses; long-running operations should select on
/// `token.cancelled()` at their suspension points and bail out with
/// [`GateError::Cancelled`].
pub async fn execute<T, F, Fut>(deadline: Duration, operation: F) -> Outcome<T>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, GateError>> + Send + 'static,
    T: Send + 'static,
{
    let token = CancellationToken::new();
    let (tx, rx) = oneshot::channel();
    let work = operation(token.clone());

    tokio::spawn(async move {
        let result = work.await;
        if let Err(late) = tx.send(result) {
            // A cooperative bail-out after expiry is not an abandoned operation.
            if !matches!(late, Err(GateError::Cancelled)) {
                metrics::record_abandoned_operation();
                tracing::debug!("Discarding result of operation that outlived its deadline");
            }
        }
    });

    let timer = tokio::time::sleep(deadline);

    tokio::select! {
        biased;

        received = rx => match received {
            Ok(Ok(value)) => Outcome::Success(value),
            Ok(Err(err)) => Outcome::Failure(classify(&err)),
            Err(_) => Outcome::Failure(classify(&GateError::internal(
                "operation aborted before producing a result",
            ))),
        },
        _ = timer => {
            token.cancel();
            Outcome::Expired
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_returns_operation_result_unaltered() {
        let outcome = execute(Duration::from_secs(1), |_| async {
            Ok::<_, GateError>(vec!["alpha".to_string(), "beta".to_string()])
        })
        .await;

        match outcome {
            Outcome::Success(value) => assert_eq!(value, vec!["alpha", "beta"]),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_is_classified() {
        let outcome = execute(Duration::from_secs(1), |_| async {
            Err::<(), _>(GateError::InvalidRequest("card must be a number".into()))
        })
        .await;

        match outcome {
            Outcome::Failure(err) => {
                assert_eq!(err.kind, ErrorKind::BadRequest);
                assert!(err.detail.contains("card must be a number"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_at_deadline() {
        let deadline = Duration::from_millis(100);
        let start = Instant::now();

        let outcome = execute(deadline, |_| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, GateError>(())
        })
        .await;

        let waited = start.elapsed();
        assert!(outcome.is_expired());
        assert!(waited >= deadline);
        assert!(waited < deadline + Duration::from_millis(10), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_cancels_token() {
        let (seen_tx, seen_rx) = oneshot::channel();

        let outcome = execute(Duration::from_millis(50), move |token| async move {
            token.cancelled().await;
            let _ = seen_tx.send(());
            Err::<(), _>(GateError::Cancelled)
        })
        .await;

        assert!(outcome.is_expired());
        assert!(seen_rx.await.is_ok(), "operation never observed cancellation");
    }

    #[tokio::test(start_paused = true)]
    async fn test_uncooperative_operation_runs_to_completion() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();

        let outcome = execute(Duration::from_millis(50), move |_| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, GateError>("late")
        })
        .await;

        assert!(outcome.is_expired());
        assert_eq!(finished.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_operation_fails_fast() {
        let start = std::time::Instant::now();
        let outcome = execute(Duration::from_secs(30), move |_| async move {
            if start.elapsed() < Duration::from_secs(3600) {
                panic!("boom");
            }
            Ok::<_, GateError>(())
        })
        .await;

        assert!(start.elapsed() < Duration::from_secs(5));
        match outcome {
            Outcome::Failure(err) => assert_eq!(err.kind, ErrorKind::Internal),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    fn recorder() -> metrics_exporter_prometheus::PrometheusRecorder {
        metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder()
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooperative_cancel_is_not_abandoned() {
        let recorder = recorder();
        let handle = recorder.handle();
        let _guard = ::metrics::set_default_local_recorder(&recorder);

        let outcome = execute(Duration::from_millis(50), |token| async move {
            token.cancelled().await;
            Err::<(), _>(GateError::Cancelled)
        })
        .await;
        assert!(outcome.is_expired());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!handle.render().contains("gate_operations_abandoned_total"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ignored_token_is_counted_as_abandoned() {
        let recorder = recorder();
        let handle = recorder.handle();
        let _guard = ::metrics::set_default_local_recorder(&recorder);

        let outcome = execute(Duration::from_millis(50), |_| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, GateError>("late")
        })
        .await;
        assert!(outcome.is_expired());
        assert!(!handle.render().contains("gate_operations_abandoned_total"));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(handle.render().contains("gate_operations_abandoned_total 1"));
    }

    #[test]
    fn test_expired_maps_to_timeout() {
        let err = Outcome::<()>::Expired
            .into_result(Duration::from_millis(10))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }
}
