pub mod client;
pub mod error;
pub mod traits;
pub mod types;

pub use client::{ApiClient, ClientConfig, HttpTransport, UploadProgress, UploadTask};
pub use error::{ApiError, Result};
pub use traits::{AuthEvents, CredentialProvider, Notice, NoticeLevel, NoticeSink, Transport};
pub use types::{ApiRequest, RawResponse, RequestBody};
