//! Shared fixtures: an in-memory transport, certificate helpers and a
//! one-shot TLS server.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use pkgfetch_client::error;
use pkgfetch_client::{BoxFuture, Connection, PoolKey, Result, Transport};
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

pub const OK_HELLO: &str = "HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello";

type Requests = Arc<Mutex<Vec<(usize, String)>>>;

/// Peer end of an in-memory connection: answers every request head it
/// reads with the canned reply.
struct FakeServer {
    id: usize,
    response: Vec<u8>,
    /// Replies left before the peer hangs up on the next request
    remaining: Option<usize>,
    delay: Duration,
    requests: Requests,
}

impl FakeServer {
    async fn serve(mut self, mut stream: DuplexStream) {
        let mut pending = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let end = loop {
                if let Some(pos) = pending.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => pending.extend_from_slice(&buf[..n]),
                }
            };
            let request: Vec<u8> = pending.drain(..end).collect();
            self.requests
                .lock()
                .expect("requests lock")
                .push((self.id, String::from_utf8_lossy(&request).into_owned()));

            match self.remaining {
                Some(0) => return,
                Some(ref mut remaining) => *remaining -= 1,
                None => {}
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if stream.write_all(&self.response).await.is_err() {
                return;
            }
        }
    }
}

/// Transport handing out in-memory connections and recording what they saw.
#[derive(Debug)]
pub struct FakeTransport {
    response: Vec<u8>,
    replies_per_connection: Option<usize>,
    delay: Duration,
    connects: AtomicUsize,
    keys: Mutex<Vec<PoolKey>>,
    failures: Mutex<VecDeque<String>>,
    refuse_all: bool,
    requests: Requests,
}

impl FakeTransport {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.as_bytes().to_vec(),
            replies_per_connection: None,
            delay: Duration::ZERO,
            connects: AtomicUsize::new(0),
            keys: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            refuse_all: false,
            requests: Arc::default(),
        }
    }

    /// Every connection hangs up on the request after its `n`th reply.
    pub fn replies_per_connection(mut self, n: usize) -> Self {
        self.replies_per_connection = Some(n);
        self
    }

    /// Hold each reply back for `delay`.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Refuse every connect attempt.
    pub fn refusing(mut self) -> Self {
        self.refuse_all = true;
        self
    }

    /// Fail the next connect attempt with `message`.
    pub fn fail_next(&self, message: &str) {
        self.failures
            .lock()
            .expect("failures lock")
            .push_back(message.to_string());
    }

    /// Connections successfully opened.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Keys of every connect attempt, successful or not.
    pub fn keys(&self) -> Vec<PoolKey> {
        self.keys.lock().expect("keys lock").clone()
    }

    /// `(connection id, raw request head)` in the order they arrived.
    pub fn requests(&self) -> Vec<(usize, String)> {
        self.requests.lock().expect("requests lock").clone()
    }

    fn open(&self, key: &PoolKey) -> Result<Box<dyn Connection>> {
        self.keys.lock().expect("keys lock").push(key.clone());
        if self.refuse_all {
            return Err(error::connect("connection refused"));
        }
        if let Some(message) = self.failures.lock().expect("failures lock").pop_front() {
            return Err(error::connect(message));
        }

        let id = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        let (client, server) = tokio::io::duplex(64 * 1024);
        let peer = FakeServer {
            id,
            response: self.response.clone(),
            remaining: self.replies_per_connection,
            delay: self.delay,
            requests: Arc::clone(&self.requests),
        };
        tokio::spawn(peer.serve(server));
        Ok(Box::new(client))
    }
}

impl Transport for FakeTransport {
    fn connect<'a>(&'a self, key: &'a PoolKey) -> BoxFuture<'a, Result<Box<dyn Connection>>> {
        Box::pin(async move { self.open(key) })
    }
}

/// Self-signed certificate for `localhost` valid between the given dates.
pub fn self_signed(
    common_name: &str,
    not_before: (i32, u8, u8),
    not_after: (i32, u8, u8),
) -> (rcgen::Certificate, rcgen::KeyPair) {
    let mut params = rcgen::CertificateParams::new(vec!["localhost".to_string()])
        .expect("certificate params");
    let mut name = rcgen::DistinguishedName::new();
    name.push(rcgen::DnType::CommonName, common_name);
    params.distinguished_name = name;
    params.not_before = rcgen::date_time_ymd(not_before.0, not_before.1, not_before.2);
    params.not_after = rcgen::date_time_ymd(not_after.0, not_after.1, not_after.2);

    let key = rcgen::KeyPair::generate().expect("key pair");
    let cert = params.self_signed(&key).expect("self-signed certificate");
    (cert, key)
}

/// Serve one TLS connection on 127.0.0.1 with `cert`, answering a single
/// request with `hello`. Returns the bound port.
pub fn spawn_tls_server(cert: &rcgen::Certificate, key: &rcgen::KeyPair) -> u16 {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der()));
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![cert.der().clone()], key)
        .expect("server certificate");
    let config = Arc::new(config);

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();

    thread::spawn(move || {
        let Ok((tcp, _)) = listener.accept() else {
            return;
        };
        let Ok(conn) = rustls::ServerConnection::new(config) else {
            return;
        };
        let mut tls = rustls::StreamOwned::new(conn, tcp);

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match tls.read(&mut buf) {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let reply = "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello";
        let _ = tls.write_all(reply.as_bytes());
        tls.conn.send_close_notify();
        let _ = tls.flush();
    });

    port
}

/// Serve one CONNECT request on 127.0.0.1. With an upstream port the tunnel
/// is accepted and relayed there; without one it is refused with `407`.
/// Returns the bound port and a handle to the recorded request head.
pub fn spawn_connect_proxy(upstream: Option<u16>) -> (u16, Arc<Mutex<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let seen = Arc::new(Mutex::new(String::new()));
    let recorded = Arc::clone(&seen);

    thread::spawn(move || {
        let Ok((mut client, _)) = listener.accept() else {
            return;
        };

        let mut head = Vec::new();
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            match client.read(&mut byte) {
                Ok(0) | Err(_) => return,
                Ok(_) => head.push(byte[0]),
            }
        }
        *recorded.lock().expect("seen lock") = String::from_utf8_lossy(&head).into_owned();

        let Some(upstream) = upstream else {
            let _ = client.write_all(b"HTTP/1.1 407 Proxy Authentication Required\r\n\r\n");
            return;
        };
        let Ok(mut origin) = TcpStream::connect(("127.0.0.1", upstream)) else {
            return;
        };
        let _ = client.write_all(b"HTTP/1.1 200 Connection established\r\n\r\n");

        let (Ok(mut client_reader), Ok(mut origin_writer)) = (client.try_clone(), origin.try_clone())
        else {
            return;
        };
        thread::spawn(move || {
            let _ = io::copy(&mut client_reader, &mut origin_writer);
            let _ = origin_writer.shutdown(Shutdown::Write);
        });
        let _ = io::copy(&mut origin, &mut client);
        let _ = client.shutdown(Shutdown::Write);
    });

    (port, seen)
}
