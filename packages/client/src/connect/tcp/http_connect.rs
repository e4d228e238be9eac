//! HTTP CONNECT tunnel establishment

use std::io;

use bytes::Bytes;
use http::header::{HOST, PROXY_AUTHORIZATION};
use http::{HeaderValue, Method, Request, Uri};
use http_body_util::Empty;
use hyper::client::conn::http1;
use hyper::upgrade::Upgraded;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

/// Byte stream carried inside an established CONNECT tunnel.
pub type Tunnel = TokioIo<Upgraded>;

/// Ask the proxy on `proxy_stream` to open a tunnel to `host:port`.
///
/// Any 2xx reply establishes the tunnel; other statuses are refusals.
pub async fn establish_connect_tunnel(
    proxy_stream: TcpStream,
    host: &str,
    port: u16,
    auth: Option<&HeaderValue>,
) -> io::Result<Tunnel> {
    let authority = format!("{host}:{port}");
    let target: Uri = authority
        .parse()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("{authority}: {e}")))?;

    let (mut sender, conn) = http1::handshake::<_, Empty<Bytes>>(TokioIo::new(proxy_stream))
        .await
        .map_err(io::Error::other)?;
    tokio::spawn(async move {
        if let Err(e) = conn.with_upgrades().await {
            tracing::debug!("CONNECT handshake connection failed: {e}");
        }
    });

    let mut request = Request::new(Empty::new());
    *request.method_mut() = Method::CONNECT;
    *request.uri_mut() = target;
    let headers = request.headers_mut();
    headers.insert(
        HOST,
        HeaderValue::from_str(&authority)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?,
    );
    if let Some(auth) = auth {
        headers.insert(PROXY_AUTHORIZATION, auth.clone());
    }

    let response = sender.send_request(request).await.map_err(io::Error::other)?;
    if !response.status().is_success() {
        return Err(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            format!("proxy refused CONNECT to {authority}: {}", response.status()),
        ));
    }

    let upgraded = hyper::upgrade::on(response).await.map_err(io::Error::other)?;
    tracing::debug!("CONNECT tunnel to {authority} established");
    Ok(TokioIo::new(upgraded))
}
