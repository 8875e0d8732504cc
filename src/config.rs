use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub storage: StorageConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the club backend, including any path prefix (e.g. `/api/v1`)
  pub base_url: String,
  #[serde(default = "default_timeout")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:3000/api".to_string(),
      timeout_secs: default_timeout(),
    }
  }
}

fn default_timeout() -> u64 {
  15
}

/// Staleness policy for the paginated lists. A TTL of 0 keeps a page valid
/// until its filters or page change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub events_ttl_secs: u64,
  pub notifications_ttl_secs: u64,
  pub files_ttl_secs: u64,
  pub page_size: u32,
  /// Persist the last good page per query for offline starts
  pub snapshots: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      events_ttl_secs: 300,
      notifications_ttl_secs: 60,
      files_ttl_secs: 300,
      page_size: 20,
      snapshots: true,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
  /// SQLite file for on-device state (default: $XDG_DATA_HOME/clubhouse/store.db)
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Directory for the log file (default: $XDG_DATA_HOME/clubhouse)
  pub dir: Option<PathBuf>,
  /// Filter directive, e.g. "clubhouse=debug"
  pub filter: Option<String>,
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./clubhouse.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/clubhouse/config.yaml
  ///
  /// With no file found, defaults are used.
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

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    Ok(config.with_env_overrides(|name| std::env::var(name).ok()))
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("clubhouse.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("clubhouse").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.cache.page_size == 0 {
      return Err(eyre!("cache.page_size must be at least 1"));
    }
    Ok(config)
  }

  fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
    if let Some(url) = var("CLUBHOUSE_API_URL").filter(|v| !v.is_empty()) {
      self.api.base_url = url;
    }
    if let Some(filter) = var("CLUBHOUSE_LOG").filter(|v| !v.is_empty()) {
      self.logging.filter = Some(filter);
    }
    self
  }

  /// Token supplied through the environment, used instead of an interactive login.
  pub fn env_token() -> Option<String> {
    std::env::var("CLUBHOUSE_TOKEN").ok().filter(|t| !t.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_when_sections_missing() {
    let config = Config::parse("api:\n  base_url: https://club.example.com/api/v1\n").unwrap();
    assert_eq!(config.api.base_url, "https://club.example.com/api/v1");
    assert_eq!(config.api.timeout_secs, 15);
    assert_eq!(config.cache.events_ttl_secs, 300);
    assert!(config.cache.snapshots);
    assert!(config.storage.path.is_none());
  }

  #[test]
  fn test_partial_cache_section() {
    let yaml = "cache:\n  notifications_ttl_secs: 0\n  page_size: 50\n";
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.cache.notifications_ttl_secs, 0);
    assert_eq!(config.cache.page_size, 50);
    assert_eq!(config.cache.files_ttl_secs, 300);
  }

  #[test]
  fn test_zero_page_size_rejected() {
    assert!(Config::parse("cache:\n  page_size: 0\n").is_err());
  }

  #[test]
  fn test_env_overrides() {
    let config = Config::default().with_env_overrides(|name| match name {
      "CLUBHOUSE_API_URL" => Some("https://staging.example.com/api".to_string()),
      _ => None,
    });
    assert_eq!(config.api.base_url, "https://staging.example.com/api");
    assert!(config.logging.filter.is_none());
  }

  #[test]
  fn test_explicit_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(Some(&dir.path().join("nope.yaml"))).is_err());
  }

  #[test]
  fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clubhouse.yaml");
    std::fs::write(&path, "api:\n  base_url: https://a.example.com\n  timeout_secs: 3\n").unwrap();
    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.api.timeout_secs, 3);
  }
}
