//! GitHub API error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::transport::HttpError;

/// Errors that can occur when interacting with the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Non-2xx response other than the rate-limit case.
    #[error("GitHub API error: status {status}: {body}")]
    Api { status: u16, body: String },

    /// 403 carrying an `X-RateLimit-Reset` hint.
    #[error("Rate limit exceeded. Resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    /// Network-level failure.
    #[error(transparent)]
    Transport(#[from] HttpError),

    /// Response body was not the JSON shape we expected.
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl GitHubError {
    /// True when the error means the current fetch loop cannot proceed until
    /// the quota resets.
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, GitHubError::RateLimited { .. })
    }
}
