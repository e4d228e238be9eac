//! Effective proxy selection for a target URI

use url::Url;

use super::config::ProxyConfig;
use super::endpoint::ProxyEndpoint;
use super::no_proxy::NoProxy;

/// Caller-supplied proxy override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplicitProxy {
    /// Force a direct connection, ignoring the environment.
    Direct,
    /// Use this proxy string, normalized the same way environment values are.
    Url(String),
}

impl ExplicitProxy {
    /// An empty string means "no proxy".
    pub fn parse(value: &str) -> Self {
        if value.trim().is_empty() {
            ExplicitProxy::Direct
        } else {
            ExplicitProxy::Url(value.to_string())
        }
    }
}

/// Resolves the proxy, if any, a request should be relayed through.
#[derive(Debug, Clone)]
pub struct ProxyResolver {
    config: ProxyConfig,
    no_proxy: NoProxy,
}

impl ProxyResolver {
    pub fn new(config: ProxyConfig) -> Self {
        let no_proxy = config.no_proxy();
        Self { config, no_proxy }
    }

    pub fn from_env() -> Self {
        Self::new(ProxyConfig::from_env())
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Effective proxy for `target`, or `None` for a direct connection.
    ///
    /// A `no_proxy` match wins over everything; otherwise an explicit proxy
    /// wins over the scheme's environment variable. Configuration problems
    /// are logged and resolve to a direct connection.
    pub fn resolve(&self, target: &Url, explicit: Option<&ExplicitProxy>) -> Option<ProxyEndpoint> {
        if !self.no_proxy.malformed().is_empty() {
            tracing::warn!(
                "ignoring proxy configuration, malformed no_proxy entries: {:?}",
                self.no_proxy.malformed()
            );
            return None;
        }

        let host = target.host_str().unwrap_or_default();
        if self.no_proxy.matches(host) {
            tracing::debug!("no_proxy matched {host}, connecting directly");
            return None;
        }

        let raw = match explicit {
            Some(ExplicitProxy::Direct) => return None,
            Some(ExplicitProxy::Url(value)) if value.trim().is_empty() => return None,
            Some(ExplicitProxy::Url(value)) => value.as_str(),
            None => {
                let value = self.config.lookup(env_variable(target.scheme()))?;
                // Present but empty disables the proxy for this scheme
                if value.trim().is_empty() {
                    return None;
                }
                value
            }
        };

        let normalized = normalize(raw.trim());
        let url = match Url::parse(&normalized) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("ignoring malformed proxy URI: {e}");
                return None;
            }
        };

        // An https proxy URI is dialed the same way; TLS targets still tunnel
        if !matches!(url.scheme(), "http" | "https") {
            tracing::warn!(
                "ignoring proxy with unsupported scheme {:?}, connecting directly",
                url.scheme()
            );
            return None;
        }

        let Some(mut endpoint) = ProxyEndpoint::from_url(&url) else {
            tracing::warn!("ignoring proxy URI without a host");
            return None;
        };

        if !endpoint.has_credentials() {
            if let Some(user) = self.credential(target.scheme(), "user") {
                let password = self.credential(target.scheme(), "pass");
                endpoint = endpoint.with_credentials(user, password);
            }
        }

        tracing::debug!("using proxy {endpoint} for {}", target.scheme());
        Some(endpoint)
    }

    /// `<scheme>_proxy_<suffix>` then `http_proxy_<suffix>`, ignoring empty values.
    fn credential(&self, scheme: &str, suffix: &str) -> Option<&str> {
        let scheme = if scheme == "https" { "https" } else { "http" };
        self.config
            .lookup(&format!("{scheme}_proxy_{suffix}"))
            .filter(|v| !v.is_empty())
            .or_else(|| {
                self.config
                    .lookup(&format!("http_proxy_{suffix}"))
                    .filter(|v| !v.is_empty())
            })
    }
}

/// Environment variable governing a target scheme. Only `https` has its
/// own variable; every other scheme follows `http_proxy`.
fn env_variable(scheme: &str) -> &'static str {
    match scheme {
        "https" => "https_proxy",
        _ => "http_proxy",
    }
}

/// Prefix `http://` onto values without a recognized scheme.
fn normalize(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    if ["http:", "https:", "ftp:", "file:"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
    {
        raw.to_string()
    } else {
        format!("http://{raw}")
    }
}
