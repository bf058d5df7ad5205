//! Cache entries and the tags that group them for invalidation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tokio::sync::watch;

use crate::error::FetchError;

use super::key::QueryKey;

/// Label attached to cache entries at creation time, used to mark groups
/// of entries stale in one invalidation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
  pub kind: String,
  pub id: String,
}

impl Tag {
  pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
    Self {
      kind: kind.into(),
      id: id.into(),
    }
  }

  /// Tag covering one lesson's data.
  pub fn lesson(id: impl Into<String>) -> Self {
    Self::new("LessonData", id)
  }
}

/// Lifecycle state of a cache entry.
///
/// Data is only present when fulfilled, an error only when rejected;
/// the two never coexist.
#[derive(Debug, Clone)]
pub enum EntryStatus {
  /// A fetch is in flight; concurrent subscribers attach to it.
  Pending,
  /// The last fetch succeeded.
  Fulfilled(Value),
  /// The last fetch failed after retries were exhausted.
  Rejected(FetchError),
}

impl EntryStatus {
  pub fn is_pending(&self) -> bool {
    matches!(self, EntryStatus::Pending)
  }

  pub fn data(&self) -> Option<&Value> {
    match self {
      EntryStatus::Fulfilled(value) => Some(value),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&FetchError> {
    match self {
      EntryStatus::Rejected(error) => Some(error),
      _ => None,
    }
  }
}

/// One cached read operation, shared by all subscribers of its key.
pub(crate) struct CacheEntry {
  pub key: QueryKey,
  pub status: EntryStatus,
  pub tags: BTreeSet<Tag>,
  /// When the entry last settled successfully; None until first fulfillment
  pub last_fetched_at: Option<DateTime<Utc>>,
  pub subscriber_count: usize,
  /// Set by tag invalidation; forces a refetch on next subscribe
  pub stale: bool,
  /// Bumped on every touch; a TTL timer only evicts its own generation
  pub generation: u64,
  /// Status broadcast to deduplicated subscribers
  notify: watch::Sender<EntryStatus>,
}

impl CacheEntry {
  pub fn pending(key: QueryKey, tags: BTreeSet<Tag>) -> Self {
    let (notify, _) = watch::channel(EntryStatus::Pending);
    Self {
      key,
      status: EntryStatus::Pending,
      tags,
      last_fetched_at: None,
      subscriber_count: 0,
      stale: false,
      generation: 0,
      notify,
    }
  }

  /// Entry restored from a server-produced snapshot; already settled,
  /// so attaching to it never starts a fetch.
  pub fn hydrated(
    key: QueryKey,
    data: Value,
    tags: BTreeSet<Tag>,
    fetched_at: DateTime<Utc>,
  ) -> Self {
    let (notify, _) = watch::channel(EntryStatus::Fulfilled(data.clone()));
    Self {
      key,
      status: EntryStatus::Fulfilled(data),
      tags,
      last_fetched_at: Some(fetched_at),
      subscriber_count: 0,
      stale: false,
      generation: 0,
      notify,
    }
  }

  /// Receiver observing this entry's status transitions. Subscribing sees
  /// the current status immediately, so a waiter attaching after the fetch
  /// settles never hangs.
  pub fn watch(&self) -> watch::Receiver<EntryStatus> {
    self.notify.subscribe()
  }

  /// Reset to pending for a new fetch cycle, replacing the tag set.
  pub fn begin_fetch(&mut self, tags: BTreeSet<Tag>) {
    self.status = EntryStatus::Pending;
    self.stale = false;
    self.tags = tags;
    let _ = self.notify.send(EntryStatus::Pending);
  }

  /// Settle the in-flight fetch and wake every waiter.
  pub fn settle(&mut self, result: Result<Value, FetchError>) {
    let status = match result {
      Ok(value) => {
        self.last_fetched_at = Some(Utc::now());
        EntryStatus::Fulfilled(value)
      }
      Err(error) => EntryStatus::Rejected(error),
    };
    self.status = status.clone();
    let _ = self.notify.send(status);
  }
}
