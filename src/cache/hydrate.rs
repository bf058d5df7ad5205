//! Hydration bridge: merging server-produced cache state into a client
//! cache on first load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use super::entry::{CacheEntry, EntryStatus, Tag};
use super::key::QueryKey;
use super::store::QueryCache;

/// Serializable view of a cache suitable for shipping from a server
/// render to the client.
///
/// Only fulfilled entries are captured; pending and rejected entries are
/// transient and never cross the boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSnapshot {
  pub entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
  pub key: QueryKey,
  pub data: Value,
  pub tags: BTreeSet<Tag>,
  pub fetched_at: DateTime<Utc>,
}

impl QueryCache {
  /// Export every fulfilled entry.
  pub fn snapshot(&self) -> CacheSnapshot {
    let entries = self.lock_entries();
    let entries = entries
      .values()
      .filter_map(|entry| match (&entry.status, entry.last_fetched_at) {
        (EntryStatus::Fulfilled(data), Some(fetched_at)) => Some(SnapshotEntry {
          key: entry.key.clone(),
          data: data.clone(),
          tags: entry.tags.clone(),
          fetched_at,
        }),
        _ => None,
      })
      .collect();
    CacheSnapshot { entries }
  }

  /// Merge a server-produced snapshot into this cache.
  ///
  /// Hydrated entries land fulfilled, so a subsequent subscribe within TTL
  /// serves them without a fetch. Keys already present are left untouched,
  /// which makes the merge idempotent: hydrating twice with the same
  /// snapshot leaves the cache as hydrating once would.
  pub fn hydrate(&self, snapshot: &CacheSnapshot) {
    let mut entries = self.lock_entries();
    for snap in &snapshot.entries {
      let hash = snap.key.cache_hash();
      if entries.contains_key(&hash) {
        continue;
      }
      tracing::debug!(key = %snap.key.description(), "hydrated from snapshot");
      entries.insert(
        hash,
        CacheEntry::hydrated(
          snap.key.clone(),
          snap.data.clone(),
          snap.tags.clone(),
          snap.fetched_at,
        ),
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  fn snapshot_with(id: &str, progress: u64) -> CacheSnapshot {
    CacheSnapshot {
      entries: vec![SnapshotEntry {
        key: QueryKey::new("getLessonData", id),
        data: json!({"id": id, "progress": progress}),
        tags: [Tag::lesson(id)].into_iter().collect(),
        fetched_at: Utc::now(),
      }],
    }
  }

  #[tokio::test]
  async fn test_hydrated_entry_is_served_without_fetch() {
    let cache = QueryCache::default();
    cache.hydrate(&snapshot_with("intro", 60));

    let calls = Arc::new(AtomicU32::new(0));
    let calls2 = calls.clone();
    let value = cache
      .fetch(
        &QueryKey::new("getLessonData", "intro"),
        vec![Tag::lesson("intro")],
        move || async move {
          calls2.fetch_add(1, Ordering::SeqCst);
          Ok(json!({"progress": 0}))
        },
      )
      .await
      .unwrap();

    assert_eq!(value["progress"], 60);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_hydrate_twice_is_idempotent() {
    let cache = QueryCache::default();
    let snapshot = snapshot_with("intro", 60);
    cache.hydrate(&snapshot);
    cache.hydrate(&snapshot);
    assert_eq!(cache.len(), 1);

    let status = cache
      .entry_status(&QueryKey::new("getLessonData", "intro"))
      .unwrap();
    assert_eq!(status.data().unwrap()["progress"], 60);
  }

  #[tokio::test]
  async fn test_hydrate_does_not_overwrite_live_entries() {
    let cache = QueryCache::default();
    cache
      .fetch(
        &QueryKey::new("getLessonData", "intro"),
        vec![Tag::lesson("intro")],
        || async { Ok(json!({"progress": 80})) },
      )
      .await
      .unwrap();

    cache.hydrate(&snapshot_with("intro", 60));

    let status = cache
      .entry_status(&QueryKey::new("getLessonData", "intro"))
      .unwrap();
    assert_eq!(status.data().unwrap()["progress"], 80);
  }

  #[tokio::test]
  async fn test_snapshot_round_trip() {
    let cache = QueryCache::default();
    cache
      .fetch(
        &QueryKey::new("getLessonData", "intro"),
        vec![Tag::lesson("intro")],
        || async { Ok(json!({"progress": 60})) },
      )
      .await
      .unwrap();

    let snapshot = cache.snapshot();
    assert_eq!(snapshot.entries.len(), 1);

    // Snapshots serialize, ship and land intact on the other side.
    let wire = serde_json::to_string(&snapshot).unwrap();
    let restored: CacheSnapshot = serde_json::from_str(&wire).unwrap();

    let client = QueryCache::default();
    client.hydrate(&restored);
    let status = client
      .entry_status(&QueryKey::new("getLessonData", "intro"))
      .unwrap();
    assert_eq!(status.data().unwrap()["progress"], 60);
  }

  #[tokio::test]
  async fn test_snapshot_skips_rejected_entries() {
    let cache = QueryCache::default();
    let result = cache
      .fetch(&QueryKey::new("getLessonData", "broken"), vec![], || async {
        Err(crate::error::FetchError::Timeout)
      })
      .await;
    assert!(result.is_err());

    assert!(cache.snapshot().entries.is_empty());
  }
}
