//! Outbound request envelope.

use bytes::Bytes;
use http::Method;

/// Body of an outbound call.
#[derive(Clone, Debug)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// Multipart file upload. When `progress` is set, the transport feeds
    /// cumulative fractions in `0.0..=1.0` as bytes go out.
    Multipart {
        field: String,
        file_name: String,
        content: Bytes,
        progress: Option<async_channel::Sender<f32>>,
    },
}

/// An outbound call before credential attachment and dispatch.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Filled in by the pipeline from the credential provider, not by
    /// callers. Absence is not an error; the remote enforces authorization.
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// True when the request carries a JSON body (used for the default
    /// `Content-Type`; uploads switch to multipart).
    pub fn is_json(&self) -> bool {
        matches!(self.body, RequestBody::Json(_))
    }
}
