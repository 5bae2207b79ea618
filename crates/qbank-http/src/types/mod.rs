//! Request and response envelope types.

mod request;
mod response;

pub use request::{ApiRequest, RequestBody};
pub use response::RawResponse;
