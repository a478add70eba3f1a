//! Configuration management.

use serde::Deserialize;
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Record store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Event publisher configuration
    #[serde(default)]
    pub publisher: PublisherConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: Default::default(),
            store: Default::default(),
            publisher: Default::default(),
            observability: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Key prefix for stored records
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Commit-phase timeout; a timed-out commit is reported as store unavailability
    #[serde(default = "default_commit_timeout", with = "humantime_serde")]
    pub commit_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
            commit_timeout: default_commit_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublisherConfig {
    /// Redis connection URL (defaults to the store URL when unset)
    pub url: Option<String>,

    /// Stream key prefix for change events
    #[serde(default = "default_key_prefix")]
    pub stream_prefix: String,

    /// Notify-phase timeout; a timed-out publish is absorbed as a publish failure
    #[serde(default = "default_notify_timeout", with = "humantime_serde")]
    pub notify_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            url: None,
            stream_prefix: default_key_prefix(),
            notify_timeout: default_notify_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
        }
    }
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_redis_url() -> String { "redis://localhost:6379".to_string() }
fn default_key_prefix() -> String { "scribe:".to_string() }
fn default_commit_timeout() -> Duration { Duration::from_secs(5) }
fn default_notify_timeout() -> Duration { Duration::from_secs(5) }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SCRIBE").separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }

    /// Load from a specific file path, with environment overrides.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("SCRIBE").separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }

    /// Publisher URL, falling back to the store URL.
    pub fn publisher_url(&self) -> &str {
        self.publisher.url.as_deref().unwrap_or(&self.store.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.store.key_prefix, "scribe:");
        assert_eq!(cfg.store.commit_timeout, Duration::from_secs(5));
        assert_eq!(cfg.publisher_url(), "redis://localhost:6379");
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let path = std::env::temp_dir().join("scribe_config_test.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9999\n\n[store]\nkey_prefix = \"records:\"\n",
        )
        .unwrap();

        let cfg = Config::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9999);
        assert_eq!(cfg.store.key_prefix, "records:");
        // Untouched sections keep their defaults
        assert_eq!(cfg.store.commit_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_publisher_url_override() {
        let cfg = Config {
            publisher: PublisherConfig {
                url: Some("redis://bus:6379".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(cfg.publisher_url(), "redis://bus:6379");
    }
}
