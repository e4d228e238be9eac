//! # pkgfetch client
//!
//! HTTP/1.1 request layer for a package-management client, built on hyper
//! and tokio behind a blocking API: fetches remote index and package data
//! over pooled plain or TLS connections, through optionally authenticated
//! proxies, with chain-aware certificate failure diagnostics and credential
//! redaction in every log line.
//!
//! ## Usage
//!
//! ```no_run
//! use pkgfetch_client::{Fetcher, HttpConfig, ProxyConfig, RequestKind};
//!
//! let fetcher = Fetcher::new(HttpConfig::default(), ProxyConfig::from_env())?;
//! let response = fetcher.fetch_uri(
//!     "https://index.example.org/specs.4.8.gz",
//!     RequestKind::Get,
//!     None,
//!     None,
//! )?;
//! println!("{} ({} bytes)", response.code(), response.body().len());
//! # Ok::<(), pkgfetch_client::Error>(())
//! ```

#![deny(unsafe_code)]

use std::sync::{Arc, OnceLock};

pub mod auth;
pub mod builder;
pub mod client;
pub mod config;
pub mod connect;
pub mod error;
pub mod http;
pub mod proxy;
pub mod telemetry;
pub mod tls;

pub mod prelude;

pub use crate::prelude::*;

/// Process-wide fetcher sharing one connection pool across callers.
static GLOBAL_FETCHER: OnceLock<Arc<Fetcher>> = OnceLock::new();

/// Get the global fetcher, building it from defaults and the process
/// environment on first use.
pub fn global_fetcher() -> Result<Arc<Fetcher>> {
    if let Some(fetcher) = GLOBAL_FETCHER.get() {
        return Ok(Arc::clone(fetcher));
    }
    let fetcher = Arc::new(Fetcher::new(HttpConfig::default(), ProxyConfig::from_env())?);
    Ok(Arc::clone(GLOBAL_FETCHER.get_or_init(|| fetcher)))
}

/// Initialize the global fetcher with custom configuration.
///
/// Fails when the configuration is invalid or the global fetcher already
/// exists; the existing instance is left untouched in both cases.
pub fn init_global_fetcher(config: HttpConfig, proxy_config: ProxyConfig) -> Result<()> {
    let fetcher = Fetcher::new(config, proxy_config)?;
    GLOBAL_FETCHER
        .set(Arc::new(fetcher))
        .map_err(|_| error::builder("global fetcher already initialized"))
}

/// Statistics of the global fetcher, if it has been created.
#[must_use]
pub fn fetch_stats() -> Option<FetchStatsSnapshot> {
    GLOBAL_FETCHER.get().map(|fetcher| fetcher.stats().snapshot())
}
