use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use spyglass_cdp::CdpError;

use super::*;
use crate::error::ToolError;

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        backoff: 1.0,
    }
}

#[tokio::test]
async fn test_success_on_first_attempt() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let result = with_retry(&fast_policy(), move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, CoreError>(42)
        }
    })
    .await
    .unwrap();
    assert_eq!(result, 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retries_transport_errors_until_success() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let result = with_retry(&fast_policy(), move || {
        let counter = counter.clone();
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(CoreError::Cdp(CdpError::ConnectionLost))
            } else {
                Ok("recovered")
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(result, "recovered");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_exhaustion_returns_last_error() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let err = with_retry(&fast_policy(), move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(CoreError::Tool(ToolError::new("net", "trace", "flaky", "retry")))
        }
    })
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::Tool(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_validation_errors_are_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let err = with_retry(&fast_policy(), move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(CoreError::Validation("limit out of range".into()))
        }
    })
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_policy_errors_are_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let err = with_retry(&fast_policy(), move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(CoreError::Policy("denied".into()))
        }
    })
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::Policy(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_zero_attempts_clamps_to_one() {
    let policy = RetryPolicy {
        max_attempts: 0,
        initial_delay: Duration::from_millis(1),
        backoff: 1.0,
    };
    let result = with_retry(&policy, || async { Ok::<_, CoreError>(1) }).await.unwrap();
    assert_eq!(result, 1);
}
