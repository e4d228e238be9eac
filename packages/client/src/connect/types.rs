//! Transport seams: connections, connectors and pool keys

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{self, Result};
use crate::http::PendingRequest;
use crate::proxy::ProxyEndpoint;

/// Boxed future returned by object-safe async seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A live, bidirectional byte stream to an origin (possibly via a proxy).
pub trait Connection: AsyncRead + AsyncWrite + Send + Unpin + fmt::Debug {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin + fmt::Debug> Connection for T {}

/// Opens connections for pool keys. The network implementation is
/// [`NetTransport`](super::NetTransport); tests substitute in-memory fakes.
pub trait Transport: Send + Sync + fmt::Debug {
    fn connect<'a>(&'a self, key: &'a PoolKey) -> BoxFuture<'a, Result<Box<dyn Connection>>>;
}

/// Identity of a reusable connection slot.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub host: String,
    pub port: u16,
    pub proxy: Option<ProxyEndpoint>,
    pub tls: bool,
}

impl PoolKey {
    pub fn new(host: impl Into<String>, port: u16, proxy: Option<ProxyEndpoint>, tls: bool) -> Self {
        Self {
            host: host.into(),
            port,
            proxy,
            tls,
        }
    }

    /// Key for the origin a request targets. Only `http` and `https` are
    /// fetchable.
    pub fn for_request(request: &PendingRequest) -> Result<Self> {
        let uri = request.uri();
        let tls = match uri.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(error::builder(format!("unsupported URL scheme {other:?}")).with_url(uri));
            }
        };
        let host = uri
            .host_str()
            .ok_or_else(|| error::invalid_url("URL has no host").with_url(uri))?;
        let port = uri
            .port_or_known_default()
            .ok_or_else(|| error::invalid_url("URL has no port").with_url(uri))?;

        Ok(Self::new(
            host.to_ascii_lowercase(),
            port,
            request.proxy().cloned(),
            tls,
        ))
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.tls { "https" } else { "http" };
        write!(f, "{scheme}://{}:{}", self.host, self.port)?;
        if let Some(proxy) = &self.proxy {
            write!(f, " via {proxy}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolKey({self})")
    }
}
