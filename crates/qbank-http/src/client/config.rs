//! Configuration for the API client.

/// Configuration for the API client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the remote API.
    pub base_url: String,
    /// Request timeout in milliseconds. A timed-out call surfaces as a
    /// network error; the pipeline never retries.
    pub request_timeout_ms: u64,
    /// Chunk size for streamed uploads, in bytes.
    pub upload_chunk_bytes: usize,
    /// Enable request/response tracing.
    pub enable_logging: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 15_000,
            upload_chunk_bytes: 64 * 1024,
            enable_logging: false,
        }
    }
}
