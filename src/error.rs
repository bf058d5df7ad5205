//! Error types for the fetch/cache pipeline.

use thiserror::Error;

/// Error produced by the transport, retry and cache layers.
///
/// Cloneable so a rejected cache entry can hand the same error to every
/// deduplicated subscriber.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
  /// Transport-level failure (connection refused, DNS, broken pipe).
  #[error("network failure: {0}")]
  Network(String),

  /// The request exceeded the per-request timeout.
  #[error("request timed out")]
  Timeout,

  /// The server answered with a non-success status.
  #[error("server returned {status}: {message}")]
  Status { status: u16, message: String },

  /// The response body could not be decoded as the expected JSON shape.
  #[error("failed to decode response: {0}")]
  Decode(String),
}

impl FetchError {
  /// Whether the retry wrapper should attempt this request again.
  ///
  /// Network failures, timeouts and 5xx responses are transient. Client
  /// errors (400 validation, 405 method not allowed) and decode failures
  /// are surfaced immediately.
  pub fn is_retryable(&self) -> bool {
    match self {
      FetchError::Network(_) | FetchError::Timeout => true,
      FetchError::Status { status, .. } => *status >= 500,
      FetchError::Decode(_) => false,
    }
  }

  pub(crate) fn decode(err: impl std::fmt::Display) -> Self {
    FetchError::Decode(err.to_string())
  }
}

impl From<reqwest::Error> for FetchError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      FetchError::Timeout
    } else if err.is_decode() {
      FetchError::Decode(err.to_string())
    } else {
      FetchError::Network(err.to_string())
    }
  }
}

/// Error loading or parsing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {0}")]
  NotFound(String),

  #[error("failed to read config file {path}: {source}")]
  Read {
    path: String,
    source: std::io::Error,
  },

  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: String,
    source: serde_yaml::Error,
  },
}
