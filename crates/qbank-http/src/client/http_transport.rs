//! reqwest-backed transport.

use crate::client::config::ClientConfig;
use crate::client::upload::progress_chunks;
use crate::error::{ApiError, Result};
use crate::traits::Transport;
use crate::types::{ApiRequest, RawResponse, RequestBody};
use async_trait::async_trait;
use std::collections::BTreeMap;
use url::Url;

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    upload_chunk_bytes: usize,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        let base_url =
            Url::parse(&config.base_url).map_err(|e| ApiError::Config(e.to_string()))?;
        Ok(HttpTransport {
            client,
            base_url,
            upload_chunk_bytes: config.upload_chunk_bytes,
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
        let url = request_url(&self.base_url, &request.path, &request.query)?;

        let mut builder = self.client.request(request.method.clone(), url);

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart {
                field,
                file_name,
                content,
                progress,
            } => {
                let len = content.len() as u64;
                let stream = progress_chunks(content, self.upload_chunk_bytes, progress);
                let part =
                    reqwest::multipart::Part::stream_with_length(reqwest::Body::wrap_stream(stream), len)
                        .file_name(file_name);
                builder.multipart(reqwest::multipart::Form::new().part(field, part))
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let mut headers = BTreeMap::new();
        for (k, v) in response.headers() {
            if let Ok(val) = v.to_str() {
                headers.insert(k.as_str().to_string(), val.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Resolve the request path against the base URL, encoding query pairs
/// into the URL itself.
fn request_url(base: &Url, path: &str, query: &[(String, String)]) -> Result<Url> {
    let mut url = base.join(path).map_err(|e| ApiError::Config(e.to_string()))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}
