//! Fetch layer configuration
//!
//! `HttpConfig` carries timeouts, certificate store candidates and the
//! user agent. Proxy settings live in `crate::proxy::ProxyConfig`.

pub mod types;
pub mod user_agent;
pub mod validation;

pub use types::HttpConfig;
pub use user_agent::{Build, UserAgent};
pub use validation::{ConfigResult, ConfigurationError};
