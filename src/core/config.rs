//! Configuration management for the weather MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables (optionally via a `.env` file) or
//! defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default base URL of the Amap REST API.
pub const DEFAULT_AMAP_BASE_URL: &str = "https://restapi.amap.com";

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Process-wide credentials (used by the STDIO transport).
    pub credentials: CredentialsConfig,

    /// Upstream weather API configuration.
    pub upstream: UpstreamConfig,

    /// Problems found while loading, reported once logging is up.
    #[serde(skip)]
    warnings: Vec<String>,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Configuration for external API credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Amap API key, read once at startup.
    pub api_key: Option<String>,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Upstream weather API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the geocoding/weather API.
    pub base_url: String,

    /// Optional per-request timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AMAP_BASE_URL.to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "weather-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            credentials: CredentialsConfig::default(),
            upstream: UpstreamConfig::default(),
            warnings: Vec::new(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Server settings use the `MCP_` prefix (e.g. `MCP_SERVER_NAME`,
    /// `MCP_LOG_LEVEL`). The API key is read from `MCP_AMAP_API_KEY`, falling
    /// back to `API_KEY`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        let api_key = std::env::var("MCP_AMAP_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|k| !k.is_empty());
        match api_key {
            Some(key) => config.credentials.api_key = Some(key),
            None if config.transport.is_stdio() => config.warnings.push(
                "No API key configured. Set MCP_AMAP_API_KEY (or API_KEY); \
                 weather queries over STDIO will be rejected"
                    .to_string(),
            ),
            None => {}
        }

        if let Ok(base_url) = std::env::var("MCP_AMAP_BASE_URL") {
            config.upstream.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("MCP_AMAP_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => config.upstream.timeout_secs = Some(secs),
                Err(_) => config
                    .warnings
                    .push(format!("Ignoring invalid MCP_AMAP_TIMEOUT_SECS: {timeout}")),
            }
        }

        config
    }

    /// Warnings collected by [`Config::from_env`].
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Log what was loaded. Call after the subscriber is installed.
    pub fn log_summary(&self) {
        if self.credentials.api_key.is_some() {
            info!("Amap API key loaded from environment");
        }
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn clear_key_vars() {
        unsafe {
            std::env::remove_var("MCP_AMAP_API_KEY");
            std::env::remove_var("API_KEY");
        }
    }

    #[test]
    fn test_api_key_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_key_vars();
        unsafe {
            std::env::set_var("MCP_AMAP_API_KEY", "test_key_12345");
        }
        let config = Config::from_env();
        assert_eq!(config.credentials.api_key.as_deref(), Some("test_key_12345"));
        clear_key_vars();
    }

    #[test]
    fn test_api_key_legacy_fallback() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_key_vars();
        unsafe {
            std::env::set_var("API_KEY", "legacy_key");
        }
        let config = Config::from_env();
        assert_eq!(config.credentials.api_key.as_deref(), Some("legacy_key"));
        clear_key_vars();
    }

    #[test]
    fn test_timeout_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_AMAP_TIMEOUT_SECS", "7");
        }
        let config = Config::from_env();
        assert_eq!(config.upstream.timeout_secs, Some(7));

        unsafe {
            std::env::set_var("MCP_AMAP_TIMEOUT_SECS", "soon");
        }
        let config = Config::from_env();
        assert_eq!(config.upstream.timeout_secs, None);
        assert!(
            config
                .warnings()
                .iter()
                .any(|w| w.contains("MCP_AMAP_TIMEOUT_SECS: soon"))
        );
        unsafe {
            std::env::remove_var("MCP_AMAP_TIMEOUT_SECS");
        }
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let creds = CredentialsConfig {
            api_key: Some("super_secret_key".to_string()),
        };
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_key"));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.server.name, "weather-server");
        assert!(config.credentials.api_key.is_none());
        assert_eq!(config.upstream.base_url, DEFAULT_AMAP_BASE_URL);
        assert!(config.upstream.timeout_secs.is_none());
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn test_missing_stdio_key_is_collected_as_warning() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_key_vars();
        unsafe {
            std::env::set_var("MCP_TRANSPORT", "stdio");
        }
        let config = Config::from_env();
        assert!(config.transport.is_stdio());
        assert!(config.warnings().iter().any(|w| w.contains("No API key")));
        unsafe {
            std::env::remove_var("MCP_TRANSPORT");
        }
    }
}
