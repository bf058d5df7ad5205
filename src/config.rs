use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Default lesson shown when no lesson id is given.
pub const DEFAULT_LESSON_ID: &str = "language-models-intro";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Origin of the lesson-data endpoint (scheme + host + port)
  pub origin: String,
  /// Base path prefixed to every endpoint path
  pub api_base: String,
  /// Per-request timeout in seconds
  pub timeout_secs: u64,
  /// Retries after the initial attempt (2 retries = 3 total attempts)
  pub max_retries: u32,
  /// How long an unsubscribed cache entry is kept before eviction
  pub keep_unused_for_secs: u64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      origin: "http://127.0.0.1:3000".to_string(),
      api_base: "/api".to_string(),
      timeout_secs: 20,
      max_retries: 2,
      keep_unused_for_secs: 300,
    }
  }
}

impl Config {
  /// Load configuration from file, falling back to defaults when none exists.
  ///
  /// Search order:
  /// 1. Explicit path if provided (an error if missing)
  /// 2. ./lessonq.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/lessonq/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(ConfigError::NotFound(p.display().to_string()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      // Every field has a sensible default; a missing file is not an error.
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("lessonq.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("lessonq").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
      path: path.display().to_string(),
      source: e,
    })?;

    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
      path: path.display().to_string(),
      source: e,
    })
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }

  pub fn keep_unused_for(&self) -> Duration {
    Duration::from_secs(self.keep_unused_for_secs)
  }
}
