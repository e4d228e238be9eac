//! Resolved proxy endpoint

use std::fmt;

use http::HeaderValue;
use url::Url;

use crate::http::escape::{url_decode, url_encode};
use crate::http::url::{OAUTH_BASIC, REDACTED};

/// A proxy to relay a request through.
///
/// Credentials are stored percent-encoded so they can be embedded in a URI
/// as-is; the accessors return them decoded. `Debug` and `Display` print
/// the redacted form only.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ProxyEndpoint {
    scheme: String,
    host: String,
    port: u16,
    user: Option<String>,
    password: Option<String>,
}

impl ProxyEndpoint {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
            user: None,
            password: None,
        }
    }

    /// Attach decoded credentials; each is percent-encoded independently.
    #[must_use]
    pub fn with_credentials(mut self, user: &str, password: Option<&str>) -> Self {
        self.user = Some(url_encode(user));
        self.password = password.map(url_encode);
        self
    }

    /// Endpoint from a parsed proxy URL. Userinfo already present in the URL
    /// is kept in its encoded form.
    pub(crate) fn from_url(url: &Url) -> Option<Self> {
        let host = url.host_str()?;
        let port = url.port_or_known_default()?;
        let mut endpoint = Self::new(url.scheme(), host.to_ascii_lowercase(), port);
        if !url.username().is_empty() {
            endpoint.user = Some(url.username().to_string());
            endpoint.password = url.password().map(str::to_string);
        }
        Some(endpoint)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host as it appears in a URI; IPv6 literals keep their brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn has_credentials(&self) -> bool {
        self.user.is_some()
    }

    /// Decoded user name.
    pub fn user(&self) -> Option<String> {
        self.user.as_deref().map(url_decode)
    }

    /// Decoded password.
    pub fn password(&self) -> Option<String> {
        self.password.as_deref().map(url_decode)
    }

    pub fn encoded_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn encoded_password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// `host:port`
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Full URI including encoded credentials. Never log this.
    pub fn uri(&self) -> String {
        self.render(self.user.as_deref(), self.password.as_deref())
    }

    /// URI with the credential replaced by `REDACTED`.
    ///
    /// A token (user without password, or `token:x-oauth-basic`) hides the
    /// user; a `user:password` pair hides the password.
    pub fn redacted(&self) -> String {
        match (self.user.as_deref(), self.password.as_deref()) {
            (None, _) => self.render(None, None),
            (Some(_), None) => self.render(Some(REDACTED), None),
            (Some(_), Some(OAUTH_BASIC)) => self.render(Some(REDACTED), Some(OAUTH_BASIC)),
            (Some(user), Some(_)) => self.render(Some(user), Some(REDACTED)),
        }
    }

    /// `Proxy-Authorization` value when the endpoint carries credentials.
    pub fn basic_auth(&self) -> Option<crate::Result<HeaderValue>> {
        let user = self.user()?;
        Some(crate::auth::basic_auth(user, self.password()))
    }

    fn render(&self, user: Option<&str>, password: Option<&str>) -> String {
        let mut uri = format!("{}://", self.scheme);
        if let Some(user) = user {
            uri.push_str(user);
            if let Some(password) = password {
                uri.push(':');
                uri.push_str(password);
            }
            uri.push('@');
        }
        uri.push_str(&self.authority());
        uri
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProxyEndpoint").field(&self.redacted()).finish()
    }
}
