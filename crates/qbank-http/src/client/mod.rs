//! Request pipeline implementation.

mod config;
mod fetch;
mod http_transport;
mod upload;

pub use config::ClientConfig;
pub use fetch::ApiClient;
pub use http_transport::HttpTransport;
pub use upload::{UploadProgress, UploadTask};
