//! Retry utilities for transient backend failures.
//!
//! Provides classification of retryable errors and exponential backoff.

use crate::error::AnalysisError;
use std::time::Duration;

/// Determine whether an analysis error is worth retrying.
///
/// Retryable errors: timeouts, transport failures, rate limits (429), server
/// errors (5xx). Non-retryable: auth failures, bad requests, input errors.
pub fn is_retryable(error: &AnalysisError) -> bool {
    match error {
        AnalysisError::Timeout { .. } | AnalysisError::Network { .. } => true,
        AnalysisError::Backend {
            status_code: Some(code),
            ..
        } => *code == 429 || (500..=599).contains(code),
        _ => false,
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_retryable() {
        assert!(is_retryable(&AnalysisError::Timeout { timeout_ms: 60_000 }));
    }

    #[test]
    fn test_network_error_is_retryable() {
        let err = AnalysisError::Network {
            message: "connection refused".to_string(),
        };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = AnalysisError::Backend {
            message: "Gemini HTTP 429: quota exceeded".to_string(),
            status_code: Some(429),
        };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_server_error_is_retryable() {
        let err = AnalysisError::Backend {
            message: "Gemini HTTP 503: overloaded".to_string(),
            status_code: Some(503),
        };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_bad_request_not_retryable() {
        let err = AnalysisError::Backend {
            message: "Gemini HTTP 400: bad request".to_string(),
            status_code: Some(400),
        };
        assert!(!is_retryable(&err));
    }

    #[test]
    fn test_unparsable_body_not_retryable() {
        let err = AnalysisError::Backend {
            message: "Gemini returned no answer: SAFETY".to_string(),
            status_code: None,
        };
        assert!(!is_retryable(&err));
    }

    #[test]
    fn test_auth_and_input_errors_not_retryable() {
        let err = AnalysisError::Auth {
            message: "HTTP 401: unauthorized".to_string(),
            status_code: Some(401),
        };
        assert!(!is_retryable(&err));
        assert!(!is_retryable(&AnalysisError::MissingImage));
    }

    #[test]
    fn test_backoff_exponential() {
        assert_eq!(backoff_duration(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_duration(1, 1000), Duration::from_millis(2000));
        assert_eq!(backoff_duration(2, 1000), Duration::from_millis(4000));
        assert_eq!(backoff_duration(3, 1000), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_capped_at_30s() {
        assert_eq!(backoff_duration(10, 1000), Duration::from_millis(30_000));
    }
}
