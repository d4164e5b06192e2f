use std::time::Duration;

use jaburu::{JaburuError, Result};

#[test]
fn test_error_display() {
    let err = JaburuError::Api {
        status: 404,
        endpoint: "/deputados/999999".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("404"));
    assert!(msg.contains("/deputados/999999"));
}

#[test]
fn test_timeout_display_names_endpoint() {
    let err = JaburuError::Timeout {
        endpoint: "/votacoes".to_string(),
    };
    assert!(err.to_string().contains("/votacoes"));
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(JaburuError::Configuration("missing section".into()))
    }
    assert!(returns_error().is_err());
}

#[test]
fn json_error_converts() {
    let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
    let err: JaburuError = json_err.into();
    assert!(matches!(err, JaburuError::Json(_)));
}

// ============================================================================
// Retryable classification
// ============================================================================

#[test]
fn retryable_errors() {
    assert!(
        JaburuError::RateLimited {
            waited: Duration::from_millis(600)
        }
        .is_retryable()
    );
    assert!(
        JaburuError::BreakerOpen {
            retry_in: Duration::from_secs(10)
        }
        .is_retryable()
    );
    assert!(
        JaburuError::Timeout {
            endpoint: "/deputados".into()
        }
        .is_retryable()
    );
    assert!(JaburuError::Http("connection reset".into()).is_retryable());
    assert!(
        JaburuError::Api {
            status: 500,
            endpoint: "/deputados".into()
        }
        .is_retryable()
    );
    assert!(
        JaburuError::Api {
            status: 503,
            endpoint: "/votacoes".into()
        }
        .is_retryable()
    );
}

#[test]
fn permanent_errors() {
    assert!(
        !JaburuError::Api {
            status: 400,
            endpoint: "/deputados".into()
        }
        .is_retryable()
    );
    assert!(
        !JaburuError::Api {
            status: 404,
            endpoint: "/deputados".into()
        }
        .is_retryable()
    );
    assert!(
        !JaburuError::Envelope {
            endpoint: "/deputados".into(),
            reason: "missing `dados` field".into()
        }
        .is_retryable()
    );
    assert!(!JaburuError::Configuration("bad toml".into()).is_retryable());
}

// ============================================================================
// retry_in extraction
// ============================================================================

#[test]
fn retry_in_from_breaker_open() {
    let remaining = Duration::from_secs(12);
    let err = JaburuError::BreakerOpen {
        retry_in: remaining,
    };
    assert_eq!(err.retry_in(), Some(remaining));
}

#[test]
fn retry_in_none_for_other_errors() {
    assert_eq!(
        JaburuError::RateLimited {
            waited: Duration::from_millis(600)
        }
        .retry_in(),
        None
    );
    assert_eq!(
        JaburuError::Timeout {
            endpoint: "/deputados".into()
        }
        .retry_in(),
        None
    );
}
