//! The request a caller hands to the fetcher

use std::fmt;

use chrono::{DateTime, Utc};
use http::Method;
use url::Url;

use crate::proxy::ProxyEndpoint;

/// Request class. Only index and package downloads are issued, so GET and
/// HEAD are the whole vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestKind {
    #[default]
    Get,
    Head,
}

impl RequestKind {
    pub fn method(self) -> Method {
        match self {
            RequestKind::Get => Method::GET,
            RequestKind::Head => Method::HEAD,
        }
    }

    /// HEAD replies never carry a body, whatever their headers claim.
    #[must_use]
    pub fn expects_body(self) -> bool {
        matches!(self, RequestKind::Get)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method().as_str())
    }
}

/// A fully resolved request: target, proxy decision, conditional timestamp.
///
/// Constructed once by the caller (usually through `Fetcher::prepare`) and
/// never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingRequest {
    uri: Url,
    proxy: Option<ProxyEndpoint>,
    last_modified: Option<DateTime<Utc>>,
    kind: RequestKind,
}

impl PendingRequest {
    pub fn new(uri: Url, kind: RequestKind) -> Self {
        Self {
            uri,
            proxy: None,
            last_modified: None,
            kind,
        }
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<ProxyEndpoint>) -> Self {
        self.proxy = proxy;
        self
    }

    #[must_use]
    pub fn with_last_modified(mut self, last_modified: Option<DateTime<Utc>>) -> Self {
        self.last_modified = last_modified;
        self
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn proxy(&self) -> Option<&ProxyEndpoint> {
        self.proxy.as_ref()
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn is_tls(&self) -> bool {
        self.uri.scheme() == "https"
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("uri", &crate::http::url::redact(&self.uri))
            .field("proxy", &self.proxy)
            .field("last_modified", &self.last_modified)
            .field("kind", &self.kind)
            .finish()
    }
}
