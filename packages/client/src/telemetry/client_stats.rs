//! Fetch statistics with lock-free atomic counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Fetch and connection pool statistics
#[derive(Debug)]
pub struct FetchStats {
    /// Total number of requests sent
    pub requests_total: AtomicU64,
    /// Number of `304 Not Modified` replies
    pub not_modified: AtomicU64,
    /// Connections opened through the transport
    pub connections_opened: AtomicU64,
    /// Acquisitions served by an idle pooled connection
    pub connections_reused: AtomicU64,
    /// Connections dropped instead of being returned to the pool
    pub connections_discarded: AtomicU64,
    /// Handshakes aborted by certificate verification
    pub certificate_failures: AtomicU64,
    /// Connect, timeout and exchange failures
    pub transport_failures: AtomicU64,
}

impl Default for FetchStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchStats {
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            not_modified: AtomicU64::new(0),
            connections_opened: AtomicU64::new(0),
            connections_reused: AtomicU64::new(0),
            connections_discarded: AtomicU64::new(0),
            certificate_failures: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_modified(&self) {
        self.not_modified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_reused(&self) {
        self.connections_reused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_discarded(&self) {
        self.connections_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_certificate_failure(&self) {
        self.certificate_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Create a snapshot of current statistics
    pub fn snapshot(&self) -> FetchStatsSnapshot {
        FetchStatsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            not_modified: self.not_modified.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_reused: self.connections_reused.load(Ordering::Relaxed),
            connections_discarded: self.connections_discarded.load(Ordering::Relaxed),
            certificate_failures: self.certificate_failures.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `FetchStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStatsSnapshot {
    pub requests_total: u64,
    pub not_modified: u64,
    pub connections_opened: u64,
    pub connections_reused: u64,
    pub connections_discarded: u64,
    pub certificate_failures: u64,
    pub transport_failures: u64,
}
