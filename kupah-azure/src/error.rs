use thiserror::Error;

/// Errors surfaced by the upstream chat and embeddings adapters.
///
/// The retry loop consults [`AzureError::is_transient`]: rate limits,
/// timeouts, transport failures, and generic API errors are retried with
/// backoff. Only request errors that cannot succeed on a retry (bad
/// request, auth, not-found, unprocessable input) and locally-detected
/// problems (malformed response, configuration) fail the call immediately.
#[derive(Debug, Error)]
pub enum AzureError {
    /// Provider rate-limited the request (HTTP 429).
    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    /// The per-call timeout elapsed.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Non-success HTTP response from the provider.
    #[error("provider error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Connection-level failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered 200 but the payload was not in the expected
    /// shape.
    #[error("malformed provider response: {0}")]
    InvalidResponse(String),

    /// Required configuration is missing or unparseable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AzureError {
    /// True for failure classes the retry policy should re-attempt.
    ///
    /// Generic API errors count as transient; only statuses whose outcome
    /// cannot change on a retry are excluded.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            AzureError::RateLimited(_) | AzureError::Timeout(_) | AzureError::Transport(_) => true,
            AzureError::Api { status, .. } => !matches!(status, 400 | 401 | 403 | 404 | 422),
            AzureError::InvalidResponse(_) | AzureError::Config(_) => false,
        }
    }

    /// Classifies a non-success HTTP status plus its body text.
    #[must_use]
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 429 {
            AzureError::RateLimited(body)
        } else {
            AzureError::Api {
                status,
                message: body,
            }
        }
    }
}

impl From<reqwest::Error> for AzureError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AzureError::Timeout(err.to_string())
        } else {
            AzureError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(AzureError::RateLimited("429".into()).is_transient());
        assert!(AzureError::Timeout("t".into()).is_transient());
        assert!(
            AzureError::Api {
                status: 503,
                message: "unavailable".into()
            }
            .is_transient()
        );
        assert!(!AzureError::InvalidResponse("no choices".into()).is_transient());
        assert!(!AzureError::Config("missing endpoint".into()).is_transient());
    }

    #[test]
    fn generic_api_errors_retry_but_permanent_request_errors_do_not() {
        // Unclassified statuses behave like the provider SDK's base API
        // error and stay retryable.
        for status in [409u16, 418, 500, 529] {
            assert!(
                AzureError::Api {
                    status,
                    message: "api error".into()
                }
                .is_transient(),
                "status {status} should be transient"
            );
        }
        for status in [400u16, 401, 403, 404, 422] {
            assert!(
                !AzureError::Api {
                    status,
                    message: "permanent".into()
                }
                .is_transient(),
                "status {status} should fail fast"
            );
        }
    }

    #[test]
    fn status_429_maps_to_rate_limited() {
        assert!(matches!(
            AzureError::from_status(429, "slow down".into()),
            AzureError::RateLimited(_)
        ));
        assert!(matches!(
            AzureError::from_status(404, "missing".into()),
            AzureError::Api { status: 404, .. }
        ));
    }
}
