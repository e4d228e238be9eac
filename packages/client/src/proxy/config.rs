//! Snapshot of proxy-related environment variables

use std::collections::BTreeMap;
use std::fmt;

use super::no_proxy::NoProxy;

/// Variable names consulted during resolution, in lower case. Each is also
/// looked up in upper case.
pub const PROXY_VARIABLES: &[&str] = &[
    "http_proxy",
    "https_proxy",
    "http_proxy_user",
    "http_proxy_pass",
    "https_proxy_user",
    "https_proxy_pass",
    "no_proxy",
];

/// Immutable proxy configuration captured once per process (or per test).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    vars: BTreeMap<String, String>,
}

impl ProxyConfig {
    /// Empty configuration: every request goes direct unless an explicit
    /// proxy is supplied.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture the proxy variables of the current process environment.
    pub fn from_env() -> Self {
        let mut vars = BTreeMap::new();
        for name in PROXY_VARIABLES {
            for key in [name.to_string(), name.to_ascii_uppercase()] {
                if let Ok(value) = std::env::var(&key) {
                    vars.insert(key, value);
                }
            }
        }
        tracing::debug!(
            "captured proxy environment: {:?}",
            vars.keys().collect::<Vec<_>>()
        );
        Self { vars }
    }

    /// Build a configuration from explicit name/value pairs. Names are
    /// case-sensitive, as environment variable names are.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `name` (given in lower case), checking the lower-case
    /// variable first and then the upper-case one. A present but empty
    /// value is returned as `Some("")`.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .or_else(|| self.vars.get(&name.to_ascii_uppercase()))
            .map(String::as_str)
    }

    /// Parsed `no_proxy` list.
    pub fn no_proxy(&self) -> NoProxy {
        NoProxy::parse(self.lookup("no_proxy").unwrap_or_default())
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values may carry credentials
        f.debug_set().entries(self.vars.keys()).finish()
    }
}
