//! Gateway configuration.
//!
//! Every field has a default so a config file only names what it changes.
//! Nothing here reads the environment; hosts decide where the TOML comes
//! from and may overlay their own flags before calling `validate`.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;
use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/graphql";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Absolute `http`/`https` URL of the GraphQL endpoint.
    pub endpoint: String,
    /// Upper bound for a single invocation, in milliseconds.
    pub timeout_ms: u64,
    pub cache_policy: CachePolicy,
    /// Invalidate the query cache after every successful mutation.
    pub refetch_on_mutation: bool,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Emissions buffered per watch before the background task waits.
    pub watch_buffer: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: 10_000,
            cache_policy: CachePolicy::default(),
            refetch_on_mutation: true,
            headers: BTreeMap::new(),
            watch_buffer: 16,
        }
    }
}

impl GatewayConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::Invalid(format!("endpoint `{}`: {e}", self.endpoint)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "endpoint `{}` must use http or https",
                self.endpoint
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".to_string()));
        }
        if self.watch_buffer == 0 {
            return Err(ConfigError::Invalid("watch_buffer must be positive".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.cache_policy, CachePolicy::CacheFirst);
        assert!(config.refetch_on_mutation);
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let config = GatewayConfig::from_toml_str(
            r#"
            endpoint = "https://heroes.example/graphql"
            timeout_ms = 2500
            cache_policy = "network-only"

            [headers]
            x-client = "heroes"
            "#,
        )
        .unwrap();
        assert_eq!(config.endpoint, "https://heroes.example/graphql");
        assert_eq!(config.timeout_ms, 2500);
        assert_eq!(config.cache_policy, CachePolicy::NetworkOnly);
        assert_eq!(config.headers["x-client"], "heroes");
        assert_eq!(config.watch_buffer, 16);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = GatewayConfig::from_toml_str("endpoint_uri = \"http://x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn relative_or_foreign_endpoints_are_invalid() {
        let err = GatewayConfig::new("/graphql").validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = GatewayConfig::new("ftp://heroes.example/graphql")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let config = GatewayConfig {
            timeout_ms: 0,
            ..GatewayConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = GatewayConfig::load("/nonexistent/heroes.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
