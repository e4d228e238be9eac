//! pkgfetch public API
//!
//! The boundary used by the rest of a package-management client:
//! `fetch(uri, kind, last_modified, explicit_proxy) -> Response`. Requests
//! run on the process-global fetcher so every caller shares one connection
//! pool; pass a [`Fetcher`] explicitly to [`fetch_with`] to use another.

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

use chrono::{DateTime, Utc};

pub use pkgfetch_client::{
    CertificateFailure, Error, ExplicitProxy, Fetcher, HttpConfig, MemorySink, ProxyConfig,
    RequestKind, Response, Result, UserAgent, global_fetcher, init_global_fetcher,
};

/// Fetch `uri` on the global fetcher.
///
/// `last_modified` turns a GET into a conditional request; a `304` reply
/// comes back as a response with an empty body. `explicit_proxy` overrides
/// the environment.
///
/// # Errors
///
/// Builder errors for unparseable or unsupported URIs, certificate errors
/// when the peer chain is rejected, and retryable transport errors otherwise.
pub fn fetch(
    uri: &str,
    kind: RequestKind,
    last_modified: Option<DateTime<Utc>>,
    explicit_proxy: Option<&ExplicitProxy>,
) -> Result<Response> {
    let fetcher = global_fetcher()?;
    fetch_with(&fetcher, uri, kind, last_modified, explicit_proxy)
}

/// Same as [`fetch`] on a caller-owned fetcher.
///
/// # Errors
///
/// See [`fetch`].
pub fn fetch_with(
    fetcher: &Fetcher,
    uri: &str,
    kind: RequestKind,
    last_modified: Option<DateTime<Utc>>,
    explicit_proxy: Option<&ExplicitProxy>,
) -> Result<Response> {
    tracing::trace!("fetch {kind}");
    fetcher.fetch_uri(uri, kind, last_modified, explicit_proxy)
}

/// Shorthands over the global fetcher.
pub struct Remote;

impl Remote {
    /// Unconditional GET.
    ///
    /// # Errors
    ///
    /// See [`fetch`].
    pub fn get(uri: &str) -> Result<Response> {
        fetch(uri, RequestKind::Get, None, None)
    }

    /// GET that may be answered with `304 Not Modified`.
    ///
    /// # Errors
    ///
    /// See [`fetch`].
    pub fn get_if_modified_since(uri: &str, since: DateTime<Utc>) -> Result<Response> {
        fetch(uri, RequestKind::Get, Some(since), None)
    }

    /// HEAD request; the body is always empty.
    ///
    /// # Errors
    ///
    /// See [`fetch`].
    pub fn head(uri: &str) -> Result<Response> {
        fetch(uri, RequestKind::Head, None, None)
    }
}
