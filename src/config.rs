use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::query::QueryOptions;

/// Environment variable naming the backend base URL.
pub const API_URL_ENV: &str = "SHOPDESK_API_URL";

/// Base URL baked in at build time, if the build environment had one.
const BUILD_API_URL: Option<&str> = option_env!("SHOPDESK_API_URL");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub session: SessionConfig,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
  /// Symbol printed in front of amounts
  #[serde(default = "default_currency")]
  pub currency: String,
}

fn default_currency() -> String {
  "$".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
  /// Backend base URL, e.g. https://api.example.com/api
  #[serde(default)]
  pub url: Option<String>,
  /// Transport timeout for a single request
  pub timeout_secs: Option<u64>,
}

impl ApiConfig {
  /// The configured base URL, or an error telling the user how to set one.
  pub fn base_url(&self) -> Result<&str> {
    self.url.as_deref().ok_or_else(|| {
      eyre!(
        "No API URL configured. Set {} or api.url in ~/.config/shopdesk/config.yaml",
        API_URL_ENV
      )
    })
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_cache_secs")]
  pub ttl_secs: u64,
  #[serde(default = "default_cache_secs")]
  pub sweep_interval_secs: u64,
}

fn default_cache_secs() -> u64 {
  5 * 60
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs: default_cache_secs(),
      sweep_interval_secs: default_cache_secs(),
    }
  }
}

impl CacheConfig {
  pub fn query_options(&self) -> QueryOptions {
    QueryOptions {
      ttl: Duration::from_secs(self.ttl_secs),
      sweep_interval: Duration::from_secs(self.sweep_interval_secs.max(1)),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
  /// Keep the session on disk between runs
  #[serde(default = "default_persist")]
  pub persist: bool,
}

fn default_persist() -> bool {
  true
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      persist: default_persist(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./shopdesk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/shopdesk/config.yaml
  /// 4. ~/.config/shopdesk/config.yaml
  ///
  /// Without a file, defaults apply as long as a base URL is known from the
  /// environment or the build. `SHOPDESK_API_URL` overrides `api.url`.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    let env_url = std::env::var(API_URL_ENV).ok();
    config.resolve_api_url(env_url.as_deref(), BUILD_API_URL);

    if config.api.url.is_none() {
      return Err(eyre!(
        "No configuration found. Set {} or create ~/.config/shopdesk/config.yaml\n\
                 See config.example.yaml for the format.",
        API_URL_ENV
      ));
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("shopdesk.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("shopdesk").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Runtime environment wins over the file, the file over the build.
  fn resolve_api_url(&mut self, env_url: Option<&str>, build_url: Option<&str>) {
    let non_empty = |s: &&str| !s.trim().is_empty();
    if let Some(url) = env_url.filter(non_empty) {
      self.api.url = Some(url.trim().to_string());
    } else if self.api.url.as_deref().filter(non_empty).is_none() {
      self.api.url = build_url.filter(non_empty).map(|s| s.trim().to_string());
    }
  }

  /// Title shown in the header.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    self
      .api
      .url
      .as_deref()
      .and_then(|u| url::Url::parse(u).ok())
      .and_then(|u| u.host_str().map(String::from))
      .unwrap_or_else(|| "shopdesk".to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_parse_full_config() {
    let yaml = r#"
api:
  url: https://api.example.com/api
  timeout_secs: 10
cache:
  ttl_secs: 120
session:
  persist: false
title: Downtown Barbers
currency: "€"
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.api.base_url().unwrap(), "https://api.example.com/api");
    assert_eq!(config.api.timeout_secs, Some(10));
    assert_eq!(config.cache.ttl_secs, 120);
    assert_eq!(config.cache.sweep_interval_secs, 300);
    assert!(!config.session.persist);
    assert_eq!(config.display_title(), "Downtown Barbers");
    assert_eq!(config.currency, "€");
  }

  #[test]
  fn test_defaults_from_empty_file() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert!(config.api.url.is_none());
    assert!(config.api.base_url().is_err());
    assert!(config.session.persist);
    assert_eq!(config.currency, "$");
    let options = config.cache.query_options();
    assert_eq!(options.ttl, Duration::from_secs(300));
    assert_eq!(options.sweep_interval, Duration::from_secs(300));
  }

  #[test]
  fn test_env_url_beats_file_and_build() {
    let mut config = Config::default();
    config.api.url = Some("https://file.example.com".to_string());
    config.resolve_api_url(Some("https://env.example.com"), Some("https://build.example.com"));
    assert_eq!(config.api.url.as_deref(), Some("https://env.example.com"));
  }

  #[test]
  fn test_file_url_beats_build() {
    let mut config = Config::default();
    config.api.url = Some("https://file.example.com".to_string());
    config.resolve_api_url(None, Some("https://build.example.com"));
    assert_eq!(config.api.url.as_deref(), Some("https://file.example.com"));
  }

  #[test]
  fn test_build_url_is_fallback() {
    let mut config = Config::default();
    config.resolve_api_url(Some("  "), Some("https://build.example.com"));
    assert_eq!(config.api.url.as_deref(), Some("https://build.example.com"));
    assert_eq!(config.display_title(), "build.example.com");
  }

  #[test]
  fn test_load_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "api:\n  url: https://shop.example.com/api\ntitle: Corner Cuts").unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert!(config.api.url.is_some());
    assert_eq!(config.display_title(), "Corner Cuts");
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    let err = Config::load(Some(Path::new("/nonexistent/shopdesk.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
