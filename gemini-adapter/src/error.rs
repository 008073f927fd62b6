//! Failure kinds of a single vision request.

use thiserror::Error;

/// Failure of a single vision request.
///
/// Only [`VisionError::RateLimit`] and [`VisionError::Network`] are transient;
/// everything else will fail the same way on a second attempt.
#[derive(Debug, Error)]
pub enum VisionError {
    /// The API rejected the credential (missing, invalid or revoked key).
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The API asked us to slow down (HTTP 429).
    #[error("Rate limited: {0}")]
    RateLimit(String),

    /// Connection, timeout or server-side (5xx) failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be turned into extracted text.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The client could not be constructed from the given configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl VisionError {
    /// Returns `true` for failures worth retrying after a delay.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimit(_) | Self::Network(_))
    }

    /// Returns `true` if the failure is a credential problem.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Short machine-readable name of the failure kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::RateLimit(_) => "rate_limit",
            Self::Network(_) => "network",
            Self::MalformedResponse(_) => "malformed_response",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limit_and_network_are_transient() {
        assert!(VisionError::RateLimit("slow down".into()).is_transient());
        assert!(VisionError::Network("reset".into()).is_transient());
        assert!(!VisionError::Auth("bad key".into()).is_transient());
        assert!(!VisionError::MalformedResponse("no candidates".into()).is_transient());
        assert!(!VisionError::InvalidConfig("tls".into()).is_transient());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = VisionError::Auth("API key not valid".into());
        assert_eq!(err.to_string(), "Authentication failed: API key not valid");
        assert_eq!(err.kind(), "auth");
    }
}
