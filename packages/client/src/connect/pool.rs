//! Keyed connection pool
//!
//! Each [`PoolKey`] owns a single slot holding at most one idle HTTP/1.1
//! connection. A checked-out connection is exclusive to its holder; a second
//! caller for the same key waits on the slot until the first one hands it
//! back.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use http::{Request, Response};
use http_body_util::Empty;
use hyper::body::Incoming;
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::types::{PoolKey, Transport};
use crate::error::{self, Result};
use crate::telemetry::FetchStats;

/// Request handle of one HTTP/1.1 connection. Requests carry no body.
type Sender = SendRequest<Empty<Bytes>>;

#[derive(Debug)]
struct Idle {
    id: u64,
    sender: Sender,
}

#[derive(Debug)]
struct Slot {
    /// Single permit: whoever holds it owns the key's connection
    gate: Arc<Semaphore>,
    idle: Mutex<Option<Idle>>,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(1)),
            idle: Mutex::new(None),
        }
    }
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, Option<Idle>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_idle(&self) -> bool {
        self.lock().is_some()
    }
}

/// A connection checked out of the pool.
///
/// Hand it back with [`ConnectionPool::release`] when the exchange left it
/// reusable, or [`ConnectionPool::discard`] otherwise. Dropping it without
/// either frees the slot and closes the connection.
pub struct PooledConnection {
    id: u64,
    key: PoolKey,
    sender: Sender,
    /// `None` for connections opened outside the pool
    slot: Option<(Arc<Slot>, OwnedSemaphorePermit)>,
    reused: bool,
}

impl PooledConnection {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    /// Whether this connection already served an earlier request.
    pub fn is_reused(&self) -> bool {
        self.reused
    }

    /// Whether this connection returns to the pool on release.
    pub fn is_pooled(&self) -> bool {
        self.slot.is_some()
    }

    /// Whether the peer or the protocol task has shut the connection.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send one request and wait for the response head.
    pub async fn send(
        &mut self,
        request: Request<Empty<Bytes>>,
    ) -> hyper::Result<Response<Incoming>> {
        self.sender.ready().await?;
        self.sender.send_request(request).await
    }
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("pooled", &self.is_pooled())
            .field("reused", &self.reused)
            .finish()
    }
}

/// Caches one live connection per key and serializes access to it.
pub struct ConnectionPool {
    transport: Arc<dyn Transport>,
    slots: DashMap<PoolKey, Arc<Slot>>,
    checkout_timeout: Option<Duration>,
    next_id: AtomicU64,
    stats: Arc<FetchStats>,
}

impl ConnectionPool {
    pub fn new(transport: Arc<dyn Transport>, stats: Arc<FetchStats>) -> Self {
        Self {
            transport,
            slots: DashMap::new(),
            checkout_timeout: None,
            next_id: AtomicU64::new(1),
            stats,
        }
    }

    /// Wait at most `timeout` for a busy slot before opening a pool-external
    /// connection. Without it, callers wait indefinitely.
    #[must_use]
    pub fn with_checkout_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Check out the connection for `key`, opening one if the slot is empty.
    pub async fn acquire(&self, key: &PoolKey) -> Result<PooledConnection> {
        // Clone the slot out so the map shard is not held while waiting
        let slot = Arc::clone(self.slots.entry(key.clone()).or_default().value());

        let checkout = Arc::clone(&slot.gate).acquire_owned();
        let permit = match self.checkout_timeout {
            None => checkout.await,
            Some(timeout) => match tokio::time::timeout(timeout, checkout).await {
                Ok(permit) => permit,
                Err(_) => {
                    drop(slot);
                    return self.open_unpooled(key).await;
                }
            },
        }
        .map_err(error::connect)?;

        let idle = slot.lock().take();
        if let Some(Idle { id, sender }) = idle {
            if sender.is_closed() {
                self.stats.record_connection_discarded();
                tracing::debug!("idle connection #{id} for {key} was closed by the peer");
            } else {
                self.stats.record_connection_reused();
                tracing::debug!("reusing connection #{id} for {key}");
                return Ok(PooledConnection {
                    id,
                    key: key.clone(),
                    sender,
                    slot: Some((slot, permit)),
                    reused: true,
                });
            }
        }

        // A failed connect drops the permit and frees the slot
        let (id, sender) = self.open(key).await?;
        tracing::debug!("opened connection #{id} for {key}");
        Ok(PooledConnection {
            id,
            key: key.clone(),
            sender,
            slot: Some((slot, permit)),
            reused: false,
        })
    }

    async fn open_unpooled(&self, key: &PoolKey) -> Result<PooledConnection> {
        let (id, sender) = self.open(key).await?;
        tracing::debug!("checkout timed out, opened pool-external connection #{id} for {key}");
        Ok(PooledConnection {
            id,
            key: key.clone(),
            sender,
            slot: None,
            reused: false,
        })
    }

    /// Dial `key` and run the HTTP/1.1 handshake. The connection is driven
    /// by its own task until every handle to it is dropped.
    async fn open(&self, key: &PoolKey) -> Result<(u64, Sender)> {
        let io = self.transport.connect(key).await?;
        let (sender, conn) = http1::handshake(TokioIo::new(io))
            .await
            .map_err(error::connect)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.stats.record_connection_opened();
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("connection #{id} closed with error: {e}");
            }
        });
        Ok((id, sender))
    }

    /// Return a healthy connection for reuse. Pool-external connections are
    /// closed instead.
    pub fn release(&self, connection: PooledConnection) {
        let PooledConnection {
            id,
            key,
            sender,
            slot,
            ..
        } = connection;

        match slot {
            Some((slot, permit)) => {
                tracing::debug!("connection #{id} idle for {key}");
                *slot.lock() = Some(Idle { id, sender });
                drop(permit);
            }
            None => tracing::debug!("closing pool-external connection #{id}"),
        }
    }

    /// Close a connection that must not carry another request.
    pub fn discard(&self, connection: PooledConnection) {
        self.stats.record_connection_discarded();
        tracing::debug!("discarding connection #{} for {}", connection.id, connection.key);
        let key = connection.key.clone();
        drop(connection);
        self.prune(&key);
    }

    /// Close every idle connection. Checked-out connections are unaffected.
    /// Returns how many were closed.
    pub fn close_all(&self) -> usize {
        let mut closed = 0;
        self.slots.retain(|_, slot| {
            if slot.lock().take().is_some() {
                closed += 1;
            }
            // Keep slots a holder or waiter still points at
            Arc::strong_count(slot) > 1
        });
        tracing::debug!("closed {closed} idle connections");
        closed
    }

    /// Number of connections parked for reuse.
    pub fn idle_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().is_idle())
            .count()
    }

    /// Number of keys with a slot, busy or idle.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Forget the slot for `key` once nothing holds, awaits or parks in it.
    fn prune(&self, key: &PoolKey) {
        self.slots
            .remove_if(key, |_, slot| Arc::strong_count(slot) == 1 && !slot.is_idle());
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("transport", &self.transport)
            .field("slots", &self.slots.len())
            .field("checkout_timeout", &self.checkout_timeout)
            .finish()
    }
}
