//! The request pipeline: credential attachment, dispatch, classification.

use crate::client::config::ClientConfig;
use crate::client::http_transport::HttpTransport;
use crate::error::{ApiError, Result};
use crate::traits::{
    AuthEvents, CredentialProvider, DiscardNotices, IgnoreAuthEvents, NoCredential, Notice,
    NoticeLevel, NoticeSink, Transport,
};
use crate::types::{ApiRequest, RawResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// The API client. Every outbound call passes through the same two
/// stages: a request transform that attaches the current credential, and
/// a response classification that maps the result onto the error
/// taxonomy. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
    credentials: Arc<dyn CredentialProvider>,
    notices: Arc<dyn NoticeSink>,
    auth_events: Arc<dyn AuthEvents>,
}

impl ApiClient {
    /// Build a client over the reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Build a client over an arbitrary transport (tests use this).
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        ApiClient {
            transport,
            config: Arc::new(config),
            credentials: Arc::new(NoCredential),
            notices: Arc::new(DiscardNotices),
            auth_events: Arc::new(IgnoreAuthEvents),
        }
    }

    pub fn with_credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = provider;
        self
    }

    pub fn with_notices(mut self, sink: Arc<dyn NoticeSink>) -> Self {
        self.notices = sink;
        self
    }

    pub fn with_auth_events(mut self, events: Arc<dyn AuthEvents>) -> Self {
        self.auth_events = events;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Dispatch a request and classify the result.
    pub async fn request(&self, mut request: ApiRequest) -> Result<serde_json::Value> {
        let had_credential = match self.credentials.credential() {
            Some(token) => {
                request.bearer = Some(token);
                true
            }
            None => false,
        };

        if self.config.enable_logging {
            tracing::debug!(
                "[qbank-out] {} {} auth={}",
                request.method,
                request.path,
                had_credential
            );
        }

        let path = request.path.clone();
        let raw = match self.transport.send(request).await {
            Ok(raw) => raw,
            Err(err) => {
                if matches!(err, ApiError::Network(_)) {
                    tracing::warn!("[qbank-net] {}: {}", path, err);
                    self.notices
                        .notify(Notice::error("Network error, check your connection"));
                }
                return Err(err);
            }
        };

        if self.config.enable_logging {
            tracing::debug!("[qbank-in] {} status={}", path, raw.status);
        }

        self.classify(&path, raw, had_credential)
    }

    /// Map a raw response onto the four-way classification and run the
    /// centralized side effects (notices, unauthorized hook).
    fn classify(
        &self,
        path: &str,
        raw: RawResponse,
        had_credential: bool,
    ) -> Result<serde_json::Value> {
        let body = raw.body_json();

        if raw.is_success() {
            if let Some(code) = embedded_failure_code(&body) {
                let message = failure_message(&body, "request failed");
                let err = ApiError::Business { code, message };
                tracing::warn!("[qbank-in] {} business failure: {}", path, err);
                if code == 401 {
                    self.auth_events.on_unauthorized();
                } else {
                    self.notify_failure(&err);
                }
                return Err(err);
            }
            return Ok(body);
        }

        let status = raw.status;
        let message = failure_message(&body, default_status_message(status));
        let err = ApiError::Transport { status, message };
        tracing::warn!("[qbank-in] {} transport failure: {}", path, err);

        // 401 always invalidates; 403 while holding a credential is treated
        // as a likely-expired credential and invalidates too. The hook owns
        // the single notice + redirect for both.
        if status == 401 || (status == 403 && had_credential) {
            self.auth_events.on_unauthorized();
        } else {
            self.notify_failure(&err);
        }
        Err(err)
    }

    fn notify_failure(&self, err: &ApiError) {
        let notice = match err.notice_level() {
            NoticeLevel::Warning => Notice::warning(err.to_string()),
            NoticeLevel::Error => Notice::error(err.to_string()),
        };
        self.notices.notify(notice);
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.request(ApiRequest::get(path)).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T> {
        let mut request = ApiRequest::get(path);
        request.query = query;
        let value = self.request(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let value = self
            .request(ApiRequest::post(path).with_json(serde_json::to_value(body)?))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// POST with a body, discarding whatever payload comes back.
    pub async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        self.request(ApiRequest::post(path).with_json(serde_json::to_value(body)?))
            .await?;
        Ok(())
    }

    /// Bodyless POST, discarding the payload.
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        self.request(ApiRequest::post(path)).await?;
        Ok(())
    }

    pub async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let value = self
            .request(ApiRequest::put(path).with_json(serde_json::to_value(body)?))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request(ApiRequest::delete(path)).await?;
        Ok(())
    }
}

/// A 2xx body is a business failure when it is an object carrying an
/// integer `code` of at least 300. Success payloads are either bare DTOs
/// or envelopes with a sub-300 code.
fn embedded_failure_code(body: &serde_json::Value) -> Option<i64> {
    let code = body.as_object()?.get("code")?.as_i64()?;
    (code >= 300).then_some(code)
}

/// Server failure bodies carry `detail` (FastAPI style) or `message`.
fn failure_message(body: &serde_json::Value, fallback: &str) -> String {
    body.get("detail")
        .or_else(|| body.get("message"))
        .and_then(|v| v.as_str())
        .unwrap_or(fallback)
        .to_string()
}

fn default_status_message(status: u16) -> &'static str {
    match status {
        400 => "bad request",
        401 => "unauthorized",
        403 => "forbidden",
        404 => "resource not found",
        408 => "request timed out",
        500 => "internal server error",
        502 => "bad gateway",
        503 => "service unavailable",
        504 => "gateway timeout",
        _ => "request failed",
    }
}
