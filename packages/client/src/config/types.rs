//! Core HTTP configuration structure and presets

use std::path::PathBuf;
use std::time::Duration;

use super::user_agent::UserAgent;

/// HTTP fetch configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// TCP connect timeout, including proxy tunnel setup
    pub connect_timeout: Duration,

    /// Deadline for one request and its complete response
    pub read_timeout: Duration,

    /// How long a request waits for a busy pooled connection before opening
    /// a pool-external one. `None` waits for release.
    pub pool_checkout_timeout: Option<Duration>,

    /// Seed the certificate store with the operating system roots
    pub use_system_certs: bool,

    /// Bundled CA files to add when present on disk
    pub cert_files: Vec<PathBuf>,

    /// Caller CA bundle: a PEM file or a directory of `.pem` files
    pub ssl_ca_cert: Option<PathBuf>,

    /// PEM file holding a client certificate and its private key
    pub ssl_client_cert: Option<PathBuf>,

    /// User agent sent with every request
    pub user_agent: UserAgent,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            pool_checkout_timeout: None,
            use_system_certs: true,
            cert_files: Vec::new(),
            ssl_ca_cert: None,
            ssl_client_cert: None,
            user_agent: UserAgent::default(),
        }
    }
}

impl HttpConfig {
    /// Configuration for talking to a private mirror with its own CA.
    ///
    /// System roots stay enabled; `ca_bundle` is added on top.
    #[must_use]
    pub fn with_ca_bundle(ca_bundle: impl Into<PathBuf>) -> Self {
        Self {
            ssl_ca_cert: Some(ca_bundle.into()),
            ..Self::default()
        }
    }

    /// Short timeouts for interactive commands that should fail fast.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(15),
            pool_checkout_timeout: Some(Duration::from_secs(5)),
            ..Self::default()
        }
    }

    /// Add bundled certificate candidates; missing files are skipped at load time.
    #[must_use]
    pub fn cert_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.cert_files.extend(files.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: UserAgent) -> Self {
        self.user_agent = user_agent;
        self
    }
}
