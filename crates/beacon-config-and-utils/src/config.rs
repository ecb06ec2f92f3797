//! Configuration management for the Beacon host.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default number of events kept in the in-memory journal.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 100;

/// Default number of undelivered events kept in the retry queue.
pub const DEFAULT_RETRY_CAPACITY: usize = 50;

/// Default cadence of the periodic retry flush.
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 30;

/// Default collector request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default storage key namespace.
pub const DEFAULT_STORAGE_NAMESPACE: &str = "myron";

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Capacity of the in-memory journal.
    #[serde(default = "default_journal_capacity")]
    pub journal_capacity: usize,
    /// Capacity of the persisted retry queue.
    #[serde(default = "default_retry_capacity")]
    pub retry_capacity: usize,
    /// Collector endpoint. Without one, events are only logged.
    #[serde(default)]
    pub collector_url: Option<String>,
    /// Seconds between periodic retry flushes.
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
    /// Collector request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Re-enqueue events whose retried delivery fails instead of dropping them.
    #[serde(default)]
    pub requeue_failed_on_flush: bool,
    /// Prefix for persisted keys (`<namespace>_user_id`).
    #[serde(default = "default_storage_namespace")]
    pub storage_namespace: String,
    /// Origin stamped on every event.
    #[serde(default)]
    pub page_url: Option<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_journal_capacity() -> usize {
    DEFAULT_JOURNAL_CAPACITY
}

fn default_retry_capacity() -> usize {
    DEFAULT_RETRY_CAPACITY
}

fn default_retry_interval_secs() -> u64 {
    DEFAULT_RETRY_INTERVAL_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_storage_namespace() -> String {
    DEFAULT_STORAGE_NAMESPACE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
            retry_capacity: DEFAULT_RETRY_CAPACITY,
            collector_url: None,
            retry_interval_secs: DEFAULT_RETRY_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            requeue_failed_on_flush: false,
            storage_namespace: default_storage_namespace(),
            page_url: None,
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides and validate.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply `BEACON_LOG_LEVEL` and `BEACON_COLLECTOR_URL` overrides using
    /// `lookup` to read variables. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(log_level) = read("BEACON_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Some(url) = read("BEACON_COLLECTOR_URL") {
            self.collector_url = Some(url);
        }
    }

    /// Reject values the journal cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.journal_capacity == 0 {
            return Err(CoreError::Config(
                "journal_capacity must be at least 1".to_string(),
            ));
        }
        if self.retry_capacity == 0 {
            return Err(CoreError::Config(
                "retry_capacity must be at least 1".to_string(),
            ));
        }
        if self.retry_interval_secs == 0 {
            return Err(CoreError::Config(
                "retry_interval_secs must be at least 1".to_string(),
            ));
        }
        self.collector_url()?;
        Ok(())
    }

    /// Get the collector URL, parsed.
    pub fn collector_url(&self) -> CoreResult<Option<Url>> {
        match &self.collector_url {
            Some(raw) => Ok(Some(Url::parse(raw)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.journal_capacity, 100);
        assert_eq!(config.retry_capacity, 50);
        assert_eq!(config.storage_namespace, "myron");
        assert!(config.collector_url.is_none());
        assert!(!config.requeue_failed_on_flush);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        std::fs::write(
            &config_path,
            r#"{ "log_level": "debug", "journal_capacity": 3 }"#,
        )
        .unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.journal_capacity, 3);
        assert_eq!(config.retry_capacity, DEFAULT_RETRY_CAPACITY);
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut config = Config::default();
        config.retry_capacity = 2;
        config.collector_url = Some("https://collector.example.com/api/analytics".to_string());
        config.requeue_failed_on_flush = true;
        config.save(&paths).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded.retry_capacity, 2);
        assert!(loaded.requeue_failed_on_flush);
        assert_eq!(
            loaded.collector_url().unwrap().unwrap().path(),
            "/api/analytics"
        );
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load_from_file(&paths.config_file());
        assert!(config.is_err());

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.journal_capacity, DEFAULT_JOURNAL_CAPACITY);
    }

    #[test]
    fn test_overrides_apply_non_empty_values() {
        let env: HashMap<&str, &str> = [
            ("BEACON_LOG_LEVEL", "trace"),
            ("BEACON_COLLECTOR_URL", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.log_level, "trace");
        assert!(config.collector_url.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_capacities() {
        let mut config = Config::default();
        config.journal_capacity = 0;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        let mut config = Config::default();
        config.retry_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_invalid_url() {
        let mut config = Config::default();
        config.collector_url = Some("not a valid url".to_string());
        assert!(matches!(config.validate(), Err(CoreError::InvalidUrl(_))));
    }
}
