//! Basic TCP connection establishment

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;

/// Connect to the first reachable address, trying each in order.
///
/// `timeout` bounds every attempt separately. The error of the last attempt
/// is returned when every address fails.
pub async fn connect_to_address_list(
    addrs: &[SocketAddr],
    timeout: Option<Duration>,
) -> io::Result<TcpStream> {
    let mut last_error =
        io::Error::new(io::ErrorKind::InvalidInput, "No addresses to connect to");

    for addr in addrs {
        let attempt = match timeout {
            Some(t) => match tokio::time::timeout(t, TcpStream::connect(addr)).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {addr} timed out after {t:?}"),
                )),
            },
            None => TcpStream::connect(addr).await,
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!("Failed to connect to {}: {}", addr, e);
                last_error = e;
            }
        }
    }

    Err(last_error)
}
