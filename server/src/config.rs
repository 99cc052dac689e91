//! Process configuration.
//!
//! Read from environment variables with the `ESTIMATION` prefix and `__` as
//! the nesting separator, e.g. `ESTIMATION__SERVER__PORT=3000` or
//! `ESTIMATION__POLICY__DUPLICATE_CREATE=join`. A plain `PORT` variable
//! overrides the listening port.

use estimation_system::SessionPolicy;
use serde::Deserialize;
use thiserror::Error;

const ENV_PREFIX: &str = "ESTIMATION";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration loading failed: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub policy: SessionPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Queue length of the server loop and of every session.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Origin allowed by CORS. Any origin when unset.
    pub allowed_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            channel_capacity: default_channel_capacity(),
            allowed_origin: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_channel_capacity() -> usize {
    64
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_vars(None)
    }

    /// `vars` replaces the process environment when given.
    fn from_vars(vars: Option<::config::Map<String, String>>) -> Result<Self, ConfigError> {
        let port = match &vars {
            Some(vars) => vars.get("PORT").cloned(),
            None => std::env::var("PORT").ok(),
        };

        let config = ::config::Config::builder()
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .source(vars),
            )
            .set_override_option("server.port", port)?
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("port must not be 0"));
        }
        if self.server.channel_capacity == 0 {
            return Err(ConfigError::Invalid("channel capacity must not be 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estimation_system::{DuplicateCreate, JoinMissing, OnDisconnect};

    fn vars(pairs: &[(&str, &str)]) -> ::config::Map<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn it_uses_defaults_without_environment() {
        let config = AppConfig::from_vars(Some(vars(&[]))).expect("");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.channel_capacity, 64);
        assert!(config.server.allowed_origin.is_none());
        assert_eq!(config.policy, SessionPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn it_reads_prefixed_variables() {
        let config = AppConfig::from_vars(Some(vars(&[
            ("ESTIMATION__SERVER__HOST", "127.0.0.1"),
            ("ESTIMATION__SERVER__PORT", "8080"),
            ("ESTIMATION__POLICY__DUPLICATE_CREATE", "join"),
            ("ESTIMATION__POLICY__JOIN_MISSING", "reject"),
            ("ESTIMATION__POLICY__ON_DISCONNECT", "remove"),
        ])))
        .expect("");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.policy.duplicate_create, DuplicateCreate::Join);
        assert_eq!(config.policy.join_missing, JoinMissing::Reject);
        assert_eq!(config.policy.on_disconnect, OnDisconnect::Remove);
    }

    #[test]
    fn it_lets_plain_port_win() {
        let config = AppConfig::from_vars(Some(vars(&[
            ("ESTIMATION__SERVER__PORT", "8080"),
            ("PORT", "5000"),
        ])))
        .expect("");
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn it_rejects_zero_port_and_capacity() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.channel_capacity = 0;
        assert!(config.validate().is_err());
    }
}
