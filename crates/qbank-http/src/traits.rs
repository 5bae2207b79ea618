//! Abstraction seams between the pipeline and the application shell.

use crate::error::Result;
use crate::types::{ApiRequest, RawResponse};
use async_trait::async_trait;

/// Read access to the current credential. The session store implements
/// this; the pipeline never owns authentication state itself.
pub trait CredentialProvider: Send + Sync + 'static {
    fn credential(&self) -> Option<String>;
}

/// Receiver for credential-rejection events detected by the pipeline.
/// Implementations must be safe to call repeatedly and concurrently.
pub trait AuthEvents: Send + Sync + 'static {
    fn on_unauthorized(&self);
}

/// Severity of a user-facing notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A transient user-facing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn warning(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Sink for notices the pipeline emits centrally.
pub trait NoticeSink: Send + Sync + 'static {
    fn notify(&self, notice: Notice);
}

/// Transport abstraction. Returns the raw response for the pipeline to
/// classify; only a true no-response failure maps to `ApiError::Network`.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse>;
}

/// Default provider for clients built without a session: no credential.
pub(crate) struct NoCredential;

impl CredentialProvider for NoCredential {
    fn credential(&self) -> Option<String> {
        None
    }
}

/// Default notice sink: drop everything.
pub(crate) struct DiscardNotices;

impl NoticeSink for DiscardNotices {
    fn notify(&self, _notice: Notice) {}
}

/// Default auth-event receiver: ignore.
pub(crate) struct IgnoreAuthEvents;

impl AuthEvents for IgnoreAuthEvents {
    fn on_unauthorized(&self) {}
}
