use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{CacheConfig, RetryPolicy};
use crate::transport::client::DEFAULT_BASE_URL;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheSettings,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Backend endpoint every request path is resolved against
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl ApiConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

/// Cache timings as written in the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
  pub stale_secs: u64,
  pub gc_secs: u64,
  pub sweep_secs: u64,
  /// Retries after a failed read
  pub retry: u32,
  pub retry_base_ms: u64,
  pub retry_max_ms: u64,
}

impl Default for CacheSettings {
  fn default() -> Self {
    let defaults = CacheConfig::default();
    Self {
      stale_secs: defaults.stale_time.as_secs(),
      gc_secs: defaults.gc_time.as_secs(),
      sweep_secs: defaults.sweep_interval.as_secs(),
      retry: defaults.retry.retries,
      retry_base_ms: defaults.retry.base_delay.as_millis() as u64,
      retry_max_ms: defaults.retry.max_delay.as_millis() as u64,
    }
  }
}

impl CacheSettings {
  pub fn to_cache_config(&self) -> CacheConfig {
    CacheConfig {
      stale_time: Duration::from_secs(self.stale_secs),
      gc_time: Duration::from_secs(self.gc_secs),
      // A zero period would make the sweeper's interval panic.
      sweep_interval: Duration::from_secs(self.sweep_secs.max(1)),
      retry: RetryPolicy {
        retries: self.retry,
        base_delay: Duration::from_millis(self.retry_base_ms),
        max_delay: Duration::from_millis(self.retry_max_ms),
      },
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Default filter directive; `RUST_LOG` wins when set
  pub level: String,
  /// Directory for log files (defaults to the data directory)
  pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      dir: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./composeadm.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/composeadm/config.yaml
  ///
  /// Without any file the defaults apply.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("composeadm.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("composeadm").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is a valid, all-defaults config.
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.api.base_url, "http://localhost:8888/v1");
    assert_eq!(config.api.timeout(), Duration::from_secs(30));
    assert_eq!(config.cache.to_cache_config(), CacheConfig::default());
    assert_eq!(config.log.level, "info");
  }

  #[test]
  fn test_partial_sections() {
    let config = Config::parse(
      "api:\n  base_url: https://admin.example.com/v1\ncache:\n  stale_secs: 0\n  retry: 3\n",
    )
    .unwrap();

    assert_eq!(config.api.base_url, "https://admin.example.com/v1");
    assert_eq!(config.api.timeout_secs, 30);
    let cache = config.cache.to_cache_config();
    assert_eq!(cache.stale_time, Duration::ZERO);
    assert_eq!(cache.retry.retries, 3);
    assert_eq!(cache.gc_time, Duration::from_secs(600));
  }

  #[test]
  fn test_zero_sweep_clamped() {
    let config = Config::parse("cache:\n  sweep_secs: 0\n").unwrap();
    assert_eq!(config.cache.to_cache_config().sweep_interval, Duration::from_secs(1));
  }

  #[test]
  fn test_explicit_missing_path_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    assert!(Config::load(Some(&missing)).is_err());
  }

  #[test]
  fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("composeadm.yaml");
    std::fs::write(&path, "log:\n  level: debug\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.log.level, "debug");
  }

  #[test]
  fn test_malformed_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "api: [").unwrap();

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("broken.yaml"));
  }
}
