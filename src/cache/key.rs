//! Query keys: stable identifiers for cached read operations.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identifies a read operation: endpoint name plus serialized arguments.
///
/// Two calls with the same endpoint and arguments share one cache entry;
/// distinct arguments never collide. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
  endpoint: String,
  args: String,
}

impl QueryKey {
  pub fn new(endpoint: impl Into<String>, args: impl Into<String>) -> Self {
    Self {
      endpoint: endpoint.into(),
      args: args.into(),
    }
  }

  /// Stable, fixed-length map index for this key.
  pub fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.endpoint.as_bytes());
    hasher.update(b":");
    hasher.update(self.args.as_bytes());
    hex::encode(hasher.finalize())
  }

  /// Human-readable form for logs.
  pub fn description(&self) -> String {
    format!("{}({})", self.endpoint, self.args)
  }
}
