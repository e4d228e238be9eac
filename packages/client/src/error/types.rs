use std::error::Error as StdError;
use std::fmt;

use crate::tls::CertificateFailure;

/// A Result alias where the Err case is `pkgfetch_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur while fetching a remote resource.
pub struct Error {
    pub inner: Box<Inner>,
}

pub struct Inner {
    pub kind: Kind,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    /// Target URL with any userinfo already redacted.
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Kind {
    /// Invalid configuration or request construction
    Builder,
    /// Connection establishment failed (DNS, TCP, proxy tunnel, TLS transport)
    Connect,
    /// Connect or read timed out
    Timeout,
    /// Sending the request or reading the response failed
    Request,
    /// The peer certificate chain failed verification
    Certificate(Box<CertificateFailure>),
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                url: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    /// Attach the target URL. Userinfo is redacted before it is stored.
    #[must_use]
    pub fn with_url(mut self, url: &url::Url) -> Self {
        self.inner.url = Some(crate::http::url::redact(url));
        self
    }

    pub fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    /// Get the redacted URL associated with this error, if any
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.inner.url.as_deref()
    }

    /// The verification failure carried by a certificate error.
    #[must_use]
    pub fn certificate_failure(&self) -> Option<&CertificateFailure> {
        match &self.inner.kind {
            Kind::Certificate(failure) => Some(failure),
            _ => None,
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("pkgfetch::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref url) = self.inner.url {
            f.field("url", url);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            Kind::Builder => f.write_str("builder error")?,
            Kind::Connect => f.write_str("error connecting")?,
            Kind::Timeout => f.write_str("operation timed out")?,
            Kind::Request => f.write_str("error sending request")?,
            Kind::Certificate(failure) => write!(
                f,
                "certificate verification failed at depth {}: {} ({})",
                failure.depth,
                failure.code.description(),
                failure.code
            )?,
        }

        if let Some(ref url) = self.inner.url {
            write!(f, " for url ({url})")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
