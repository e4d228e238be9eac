//! HTTP request/response types, dates and userinfo handling

pub mod date;
pub mod escape;
pub mod request;
pub mod response;
pub mod url;

pub use request::{PendingRequest, RequestKind};
pub use response::Response;
