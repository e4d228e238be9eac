//! Core fetch orchestration
//!
//! resolve proxy → acquire pooled connection → build request → exchange →
//! release or discard the connection.

use std::error::Error as StdError;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::CONNECTION;
use http::{HeaderMap, Version};
use http_body_util::BodyExt;
use tokio::runtime::Runtime;
use url::Url;

use crate::builder::{BuiltRequest, RequestBuilder};
use crate::config::HttpConfig;
use crate::connect::{ConnectionPool, NetTransport, PoolKey, PooledConnection, Transport};
use crate::error::{self, Result};
use crate::http::{PendingRequest, RequestKind, Response};
use crate::proxy::{ExplicitProxy, ProxyConfig, ProxyResolver};
use crate::telemetry::{DiagnosticSink, FetchStats, TracingSink};
use crate::tls::TlsManager;

/// I/O threads driving connections of one fetcher.
const IO_THREADS: usize = 2;

/// Fetches remote resources over pooled plain or TLS connections.
///
/// Safe to share between threads; each fetch may run on its own thread and
/// the pool never hands one connection to two of them. The blocking entry
/// points run on a runtime owned by the fetcher; async callers use
/// [`Fetcher::execute`] instead.
#[derive(Debug)]
pub struct Fetcher {
    config: HttpConfig,
    resolver: ProxyResolver,
    builder: RequestBuilder,
    pool: ConnectionPool,
    tls: Arc<TlsManager>,
    stats: Arc<FetchStats>,
    runtime: Runtime,
}

impl Fetcher {
    /// Fetcher over the network, reporting certificate diagnostics through
    /// `tracing`.
    pub fn new(config: HttpConfig, proxy_config: ProxyConfig) -> Result<Self> {
        Self::with_sink(config, proxy_config, Arc::new(TracingSink))
    }

    /// Fetcher over the network with a caller-provided diagnostic sink.
    pub fn with_sink(
        config: HttpConfig,
        proxy_config: ProxyConfig,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Result<Self> {
        Self::assemble(config, proxy_config, sink, None)
    }

    /// Fetcher over a custom transport.
    pub fn with_transport(
        config: HttpConfig,
        proxy_config: ProxyConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Self::assemble(config, proxy_config, Arc::new(TracingSink), Some(transport))
    }

    fn assemble(
        config: HttpConfig,
        proxy_config: ProxyConfig,
        sink: Arc<dyn DiagnosticSink>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<Self> {
        config.validate()?;

        let stats = Arc::new(FetchStats::new());
        let tls = Arc::new(TlsManager::from_http_config(&config, sink));
        let transport = transport
            .unwrap_or_else(|| Arc::new(NetTransport::new(&config, Arc::clone(&tls))));
        let pool = ConnectionPool::new(transport, Arc::clone(&stats))
            .with_checkout_timeout(config.pool_checkout_timeout);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(IO_THREADS)
            .thread_name("pkgfetch-io")
            .enable_all()
            .build()
            .map_err(error::builder)?;

        Ok(Self {
            builder: RequestBuilder::new(&config.user_agent)?,
            resolver: ProxyResolver::new(proxy_config),
            pool,
            tls,
            stats,
            runtime,
            config,
        })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    pub fn resolver(&self) -> &ProxyResolver {
        &self.resolver
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn tls(&self) -> &Arc<TlsManager> {
        &self.tls
    }

    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }

    /// Resolve the proxy for `uri` and capture everything the request needs.
    pub fn prepare(
        &self,
        uri: Url,
        kind: RequestKind,
        last_modified: Option<DateTime<Utc>>,
        explicit_proxy: Option<&ExplicitProxy>,
    ) -> PendingRequest {
        let proxy = self.resolver.resolve(&uri, explicit_proxy);
        PendingRequest::new(uri, kind)
            .with_proxy(proxy)
            .with_last_modified(last_modified)
    }

    /// Parse, prepare and fetch in one call.
    pub fn fetch_uri(
        &self,
        uri: &str,
        kind: RequestKind,
        last_modified: Option<DateTime<Utc>>,
        explicit_proxy: Option<&ExplicitProxy>,
    ) -> Result<Response> {
        let uri = Url::parse(uri).map_err(error::invalid_url)?;
        let request = self.prepare(uri, kind, last_modified, explicit_proxy);
        self.fetch(&request)
    }

    /// Send `request` and read the complete response, blocking the calling
    /// thread.
    ///
    /// Must not be called from inside an async runtime; use
    /// [`Fetcher::execute`] there.
    pub fn fetch(&self, request: &PendingRequest) -> Result<Response> {
        self.runtime.block_on(self.execute(request))
    }

    /// Send `request` and read the complete response.
    ///
    /// Non-2xx statuses are returned as responses. A stale pooled connection
    /// that fails before replying is replaced once; other transport failures
    /// surface as retryable errors and the connection is discarded.
    pub async fn execute(&self, request: &PendingRequest) -> Result<Response> {
        self.stats.record_request();
        let uri = request.uri();

        let key = PoolKey::for_request(request)?;
        let built = self.builder.build(request)?;

        let mut retried = false;
        loop {
            let mut conn = match self.pool.acquire(&key).await {
                Ok(conn) => conn,
                Err(e) => {
                    self.record_failure(&e);
                    return Err(e.with_url(uri));
                }
            };
            let reused = conn.is_reused();

            let outcome =
                tokio::time::timeout(self.config.read_timeout, exchange(&mut conn, &built)).await;
            match outcome {
                Ok(Ok(reply)) => {
                    if reply.reusable {
                        self.pool.release(conn);
                    } else {
                        self.pool.discard(conn);
                    }
                    return Ok(self.finish(request, &built, reply));
                }
                Ok(Err(e)) => {
                    self.pool.discard(conn);
                    if reused && !retried && is_stale(&e) {
                        tracing::debug!("pooled connection went stale ({e}), reconnecting");
                        retried = true;
                        continue;
                    }
                    self.stats.record_transport_failure();
                    return Err(error::request(e).with_url(uri));
                }
                Err(elapsed) => {
                    self.pool.discard(conn);
                    self.stats.record_transport_failure();
                    return Err(error::timeout(elapsed).with_url(uri));
                }
            }
        }
    }

    /// Close every idle pooled connection.
    pub fn close_all(&self) -> usize {
        self.pool.close_all()
    }

    fn finish(&self, request: &PendingRequest, built: &BuiltRequest, reply: Reply) -> Response {
        let Reply { head, body, .. } = reply;
        tracing::debug!("{} -> {}", built.log_line, head.status);

        if head.status == ::http::StatusCode::NOT_MODIFIED {
            self.stats.record_not_modified();
        }

        let body = if request.kind().expects_body() {
            body
        } else {
            Bytes::new()
        };
        Response::new(head.status, head.version, head.headers, body)
    }

    fn record_failure(&self, e: &error::Error) {
        if e.is_certificate() {
            self.stats.record_certificate_failure();
        } else {
            self.stats.record_transport_failure();
        }
    }
}

/// A complete reply and whether its connection may carry another request.
struct Reply {
    head: http::response::Parts,
    body: Bytes,
    reusable: bool,
}

async fn exchange(conn: &mut PooledConnection, built: &BuiltRequest) -> hyper::Result<Reply> {
    let response = conn.send(built.to_request()).await?;
    let (head, body) = response.into_parts();
    let body = body.collect().await?.to_bytes();
    let reusable = keeps_alive(head.version, &head.headers) && !conn.is_closed();
    Ok(Reply {
        head,
        body,
        reusable,
    })
}

/// Whether the peer is willing to keep the connection open.
fn keeps_alive(version: Version, headers: &HeaderMap) -> bool {
    let has_token = |token: &str| {
        headers
            .get_all(CONNECTION)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .any(|t| t.trim().eq_ignore_ascii_case(token))
    };
    if has_token("close") {
        return false;
    }
    match version {
        Version::HTTP_10 => has_token("keep-alive"),
        _ => true,
    }
}

/// Failures typical of a keep-alive connection the peer already closed.
fn is_stale(e: &hyper::Error) -> bool {
    if e.is_canceled() || e.is_closed() || e.is_incomplete_message() {
        return true;
    }
    e.source()
        .and_then(|source| source.downcast_ref::<io::Error>())
        .is_some_and(|io| {
            matches!(
                io.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            )
        })
}
