//! Error taxonomy for the request pipeline.

use crate::traits::NoticeLevel;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Every failed call is classified as exactly one of these.
///
/// `Business` and `Transport` must never be collapsed into each other:
/// callers distinguish a 2xx envelope carrying an application failure code
/// from an HTTP-level failure.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    /// No response was received at all (connect failure, timeout, DNS).
    #[error("network error: {0}")]
    Network(String),

    /// HTTP-level failure (4xx/5xx).
    #[error("HTTP {status}: {message}")]
    Transport { status: u16, message: String },

    /// Application-level failure embedded in a 2xx envelope.
    #[error("business error {code}: {message}")]
    Business { code: i64, message: String },

    /// Login or identity-fetch specific failure. Never escalates to
    /// session invalidation; there is no session to invalidate yet.
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// True for the failures that signal a rejected credential.
    #[inline]
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::Transport { status: 401, .. } | ApiError::Business { code: 401, .. }
        )
    }

    /// HTTP status, when the failure carries one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Severity of the user-facing notice for this failure: client-side
    /// failures warn, server-side and connectivity failures are errors.
    #[must_use]
    pub fn notice_level(&self) -> NoticeLevel {
        match self {
            ApiError::Network(_) => NoticeLevel::Error,
            ApiError::Transport { status, .. } if *status >= 500 => NoticeLevel::Error,
            ApiError::Transport { .. } => NoticeLevel::Warning,
            ApiError::Business { code, .. } if *code >= 500 => NoticeLevel::Error,
            ApiError::Business { .. } => NoticeLevel::Warning,
            ApiError::Auth(_) => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        }
    }
}
