//! Proxy resolution
//!
//! Decides, per target URI, whether a request goes direct or through an
//! HTTP proxy, and with which credentials. Resolution reads an immutable
//! [`ProxyConfig`] snapshot, so it takes no locks and never touches the
//! process environment after the snapshot is taken.

pub mod config;
pub mod endpoint;
pub mod no_proxy;
pub mod resolver;

pub use config::ProxyConfig;
pub use endpoint::ProxyEndpoint;
pub use no_proxy::NoProxy;
pub use resolver::{ExplicitProxy, ProxyResolver};
