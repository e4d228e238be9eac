//! The types most callers need.

pub use crate::client::Fetcher;
pub use crate::config::{Build, HttpConfig, UserAgent};
pub use crate::connect::{
    BoxFuture, Connection, ConnectionPool, PoolKey, PooledConnection, Transport,
};
pub use crate::error::{Error, HttpError, Result};
pub use crate::http::{PendingRequest, RequestKind, Response};
pub use crate::proxy::{ExplicitProxy, ProxyConfig, ProxyEndpoint, ProxyResolver};
pub use crate::telemetry::{
    DiagnosticSink, FetchStats, FetchStatsSnapshot, MemorySink, TracingSink,
};
pub use crate::tls::{CertificateFailure, CertificateInfo, CertificateVerifier, VerifyCode};

pub use ::http::{HeaderMap, HeaderValue, Method, StatusCode};
pub use url::Url;
