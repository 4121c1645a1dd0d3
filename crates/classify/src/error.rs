use thiserror::Error;

/// Errors that can occur during document classification.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request timed out.
    #[error("classification request timed out after {0}s")]
    Timeout(u64),

    /// The service answered with a non-success status.
    #[error("classification API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body violated the expected schema.
    #[error("invalid classification response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClassifyError {
    /// Whether retrying the request may succeed. Schema violations are
    /// deterministic and never retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassifyError::Http(_) | ClassifyError::Timeout(_) => true,
            ClassifyError::Api { status, .. } => *status == 429 || *status >= 500,
            ClassifyError::InvalidResponse(_) | ClassifyError::Configuration(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(ClassifyError::Http("connection refused".into()).is_retryable());
        assert!(ClassifyError::Timeout(30).is_retryable());
        assert!(
            ClassifyError::Api {
                status: 429,
                message: "rate limited".into()
            }
            .is_retryable()
        );
        assert!(
            ClassifyError::Api {
                status: 503,
                message: "overloaded".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn schema_violations_are_not_retryable() {
        assert!(!ClassifyError::InvalidResponse("no category field".into()).is_retryable());
        assert!(
            !ClassifyError::Api {
                status: 400,
                message: "bad request".into()
            }
            .is_retryable()
        );
        assert!(!ClassifyError::Configuration("missing key".into()).is_retryable());
    }
}
