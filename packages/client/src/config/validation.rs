//! Configuration validation

use std::time::Duration;

use super::types::HttpConfig;

/// Configuration validation result type
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid timeout value: {0}")]
    InvalidTimeout(String),

    #[error("Invalid configuration parameter: {0}")]
    InvalidParameter(String),
}

impl From<ConfigurationError> for crate::Error {
    fn from(err: ConfigurationError) -> Self {
        crate::error::builder(err)
    }
}

fn validate_timeout(timeout: Duration, name: &str) -> ConfigResult<()> {
    if timeout.is_zero() {
        return Err(ConfigurationError::InvalidTimeout(format!(
            "{name} cannot be zero"
        )));
    }
    if timeout > Duration::from_secs(3600) {
        return Err(ConfigurationError::InvalidTimeout(format!(
            "{name} must not exceed 1 hour"
        )));
    }
    Ok(())
}

impl HttpConfig {
    /// Check timeouts and the user agent before the config is used.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_timeout(self.connect_timeout, "connect_timeout")?;
        validate_timeout(self.read_timeout, "read_timeout")?;
        if let Some(checkout) = self.pool_checkout_timeout {
            validate_timeout(checkout, "pool_checkout_timeout")?;
        }

        let user_agent = self.user_agent.to_string();
        if user_agent.is_empty() {
            return Err(ConfigurationError::InvalidParameter(
                "User agent cannot be empty".to_string(),
            ));
        }
        if user_agent.chars().any(char::is_control) {
            return Err(ConfigurationError::InvalidParameter(
                "User agent cannot contain control characters".to_string(),
            ));
        }

        if let Some(ca) = &self.ssl_ca_cert {
            if ca.as_os_str().is_empty() {
                return Err(ConfigurationError::InvalidParameter(
                    "ssl_ca_cert path is empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
