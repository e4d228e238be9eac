//! Outbound request construction
//!
//! Turns a [`PendingRequest`](crate::http::PendingRequest) into the method,
//! request target and header block written on the wire, plus the redacted
//! line logged for it.

pub mod request;

pub use request::{BuiltRequest, RequestBuilder};
