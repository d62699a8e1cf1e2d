//! Error taxonomy for model calls and debate runs.
//!
//! | Category  | Retriable | Examples                                  |
//! |-----------|-----------|-------------------------------------------|
//! | Transient | yes       | network failure, 5xx, call timeout        |
//! | RateLimit | yes       | HTTP 429                                  |
//! | Fatal     | no        | auth failure, malformed response, 4xx     |

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use super::review::ReviewError;

/// Classification used by the call policy to decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCategory {
    /// Network or backend hiccup; safe to retry.
    Transient,
    /// Provider throttling; retry after back-off.
    RateLimit,
    /// Retrying cannot help.
    Fatal,
}

impl RetryCategory {
    pub fn is_retriable(self) -> bool {
        matches!(self, Self::Transient | Self::RateLimit)
    }
}

impl fmt::Display for RetryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::RateLimit => write!(f, "rate_limit"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// Failure of a single `ModelClient` invocation.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Request never produced a response (connection reset, DNS, ...).
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("authentication failed: {0}")]
    Auth(String),

    /// Non-success HTTP status other than auth / rate-limit.
    #[error("model API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

impl ModelError {
    pub fn retry_category(&self) -> RetryCategory {
        match self {
            Self::Transport(_) | Self::Timeout(_) => RetryCategory::Transient,
            Self::RateLimited(_) => RetryCategory::RateLimit,
            Self::Api { status, .. } if *status >= 500 => RetryCategory::Transient,
            Self::Auth(_) | Self::Api { .. } | Self::MalformedResponse(_) => RetryCategory::Fatal,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.retry_category().is_retriable()
    }
}

/// Sample-level failure of a debate run.
#[derive(Debug, Error)]
pub enum DebateError {
    #[error("invalid debate configuration: {0}")]
    InvalidConfig(String),

    #[error("sample has no answer options")]
    EmptyOptions,

    #[error("model call failed for agent {agent} in round {round}: {source}")]
    ModelCall {
        agent: usize,
        round: usize,
        #[source]
        source: ModelError,
    },

    #[error("peer review construction failed: {0}")]
    Review(#[from] ReviewError),

    /// Context lengths diverged after a round; indicates a scheduling bug.
    #[error("round barrier violated after round {round}: agent {agent} has {actual} messages, expected {expected}")]
    RoundBarrier {
        round: usize,
        agent: usize,
        expected: usize,
        actual: usize,
    },

    #[error("agent task failed: {0}")]
    AgentTask(String),

    #[error("debate cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_and_timeout_are_transient() {
        assert_eq!(
            ModelError::Transport("reset".into()).retry_category(),
            RetryCategory::Transient
        );
        assert!(ModelError::Timeout(Duration::from_secs(5)).is_retriable());
    }

    #[test]
    fn test_rate_limit_is_retriable() {
        let err = ModelError::RateLimited("slow down".into());
        assert_eq!(err.retry_category(), RetryCategory::RateLimit);
        assert!(err.is_retriable());
    }

    #[test]
    fn test_server_errors_retry_client_errors_do_not() {
        let server = ModelError::Api {
            status: 503,
            body: "overloaded".into(),
        };
        assert!(server.is_retriable());

        let client = ModelError::Api {
            status: 400,
            body: "bad request".into(),
        };
        assert!(!client.is_retriable());
    }

    #[test]
    fn test_auth_and_malformed_are_fatal() {
        assert!(!ModelError::Auth("bad key".into()).is_retriable());
        assert_eq!(
            ModelError::MalformedResponse("no choices".into()).retry_category(),
            RetryCategory::Fatal
        );
    }

    #[test]
    fn test_debate_error_display() {
        let err = DebateError::ModelCall {
            agent: 2,
            round: 1,
            source: ModelError::Auth("denied".into()),
        };
        let text = err.to_string();
        assert!(text.contains("agent 2"));
        assert!(text.contains("round 1"));
        assert!(text.contains("denied"));

        let err = DebateError::RoundBarrier {
            round: 0,
            agent: 1,
            expected: 2,
            actual: 1,
        };
        assert!(err.to_string().contains("round barrier"));
    }
}
