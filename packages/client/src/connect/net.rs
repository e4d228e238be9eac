//! Network transport over tokio TCP and rustls

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;

use super::tcp::{connect_to_address_list, establish_connect_tunnel, resolve_host};
use super::types::{BoxFuture, Connection, PoolKey, Transport};
use crate::config::HttpConfig;
use crate::error::{self, Result};
use crate::tls::TlsManager;

/// Dials origins directly, through a plain HTTP proxy, or through a CONNECT
/// tunnel for TLS targets behind a proxy.
pub struct NetTransport {
    tls: Arc<TlsManager>,
    connect_timeout: Duration,
}

impl NetTransport {
    pub fn new(config: &HttpConfig, tls: Arc<TlsManager>) -> Self {
        Self {
            tls,
            connect_timeout: config.connect_timeout,
        }
    }

    pub fn tls(&self) -> &Arc<TlsManager> {
        &self.tls
    }

    async fn dial(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        let addrs = resolve_host(host, port).await?;
        let stream = connect_to_address_list(&addrs, Some(self.connect_timeout)).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    async fn open(&self, key: &PoolKey) -> Result<Box<dyn Connection>> {
        // https proxy URIs are dialed in the clear like http ones
        let (dial_host, dial_port) = match &key.proxy {
            Some(proxy) => (proxy.host(), proxy.port()),
            None => (key.host.as_str(), key.port),
        };

        let stream = self.dial(dial_host, dial_port).await.map_err(connect_error)?;
        tracing::debug!("connected to {dial_host}:{dial_port} for {key}");

        if !key.tls {
            return Ok(Box::new(stream));
        }

        match &key.proxy {
            Some(proxy) => {
                let auth = proxy.basic_auth().transpose()?;
                let tunnel = establish_connect_tunnel(stream, &key.host, key.port, auth.as_ref())
                    .await
                    .map_err(connect_error)?;
                let tls = self.tls.handshake(tunnel, &key.host).await?;
                Ok(Box::new(tls))
            }
            None => {
                let tls = self.tls.handshake(stream, &key.host).await?;
                Ok(Box::new(tls))
            }
        }
    }
}

impl Transport for NetTransport {
    fn connect<'a>(&'a self, key: &'a PoolKey) -> BoxFuture<'a, Result<Box<dyn Connection>>> {
        Box::pin(async move {
            // The whole setup, tunnel and handshake included, shares one deadline
            match tokio::time::timeout(self.connect_timeout, self.open(key)).await {
                Ok(result) => result,
                Err(elapsed) => Err(error::timeout(elapsed)),
            }
        })
    }
}

impl fmt::Debug for NetTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetTransport")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

fn connect_error(e: io::Error) -> error::Error {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => error::timeout(e),
        _ => error::connect(e),
    }
}
