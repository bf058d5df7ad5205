//! The endpoint cache: a keyed store of query results with request
//! deduplication, tag invalidation and TTL eviction.

use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

use crate::error::FetchError;

use super::entry::{CacheEntry, EntryStatus, Tag};
use super::key::QueryKey;

/// Default time an unsubscribed entry is kept before eviction.
pub const DEFAULT_KEEP_UNUSED_FOR: Duration = Duration::from_secs(300);

/// Shared, subscriber-counted store of query results.
///
/// All entries live in a single owned map behind the handle; nothing else
/// mutates them. Handles are cheap to clone and share one map.
///
/// The TTL plays two roles, both measured from the last successful fetch:
/// it bounds how long a fulfilled entry is served without a refetch, and
/// how long an entry without subscribers survives before eviction.
#[derive(Clone)]
pub struct QueryCache {
  entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
  keep_unused_for: Duration,
}

/// What a subscriber should do after the map lock is released.
enum Plan {
  /// Fresh fulfilled entry; serve it without I/O.
  Hit(Value),
  /// Await the entry's in-flight (or just-started) fetch.
  Wait(watch::Receiver<EntryStatus>),
  /// The in-flight fetch predates a tag invalidation; its result must not
  /// satisfy this subscriber. Wait for it to settle, then start over.
  WaitStale(watch::Receiver<EntryStatus>),
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new(DEFAULT_KEEP_UNUSED_FOR)
  }
}

impl QueryCache {
  pub fn new(keep_unused_for: Duration) -> Self {
    Self {
      entries: Arc::new(Mutex::new(HashMap::new())),
      keep_unused_for,
    }
  }

  // A poisoned lock only means a fetch task panicked between map updates;
  // the map itself is still consistent, so keep serving.
  pub(super) fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn is_fresh(&self, entry: &CacheEntry) -> bool {
    let ttl = chrono::Duration::from_std(self.keep_unused_for)
      .unwrap_or(chrono::Duration::MAX);
    entry
      .last_fetched_at
      .map(|at| chrono::Utc::now() - at <= ttl)
      .unwrap_or(false)
  }

  /// Subscribe to a query key, fetching if no fresh result is cached.
  ///
  /// Within the pending window every concurrent subscriber attaches to the
  /// single in-flight fetch; `fetcher` is dropped unused in that case. A
  /// fetch that was already in flight when its tag was invalidated does not
  /// count: the subscriber waits for it to settle and then starts a fresh
  /// cycle, so a read after an invalidation never observes the older value.
  /// The subscription is held until [`unsubscribe`](Self::unsubscribe);
  /// callers that only want the value should use [`fetch`](Self::fetch).
  pub async fn subscribe<F, Fut>(
    &self,
    key: &QueryKey,
    tags: Vec<Tag>,
    fetcher: F,
  ) -> Result<Value, FetchError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
  {
    let hash = key.cache_hash();
    let tags: BTreeSet<Tag> = tags.into_iter().collect();
    let mut fetcher = Some(fetcher);
    let mut subscribed = false;

    loop {
      let plan = {
        let mut entries = self.lock_entries();
        match entries.get_mut(&hash) {
          Some(entry) => {
            if !subscribed {
              entry.subscriber_count += 1;
              subscribed = true;
            }
            entry.generation += 1;
            match &entry.status {
              EntryStatus::Pending if entry.stale => {
                tracing::debug!(key = %key.description(), "in-flight fetch invalidated, awaiting settle");
                Plan::WaitStale(entry.watch())
              }
              EntryStatus::Pending => {
                tracing::debug!(key = %key.description(), "joining in-flight fetch");
                Plan::Wait(entry.watch())
              }
              EntryStatus::Fulfilled(value) if !entry.stale && self.is_fresh(entry) => {
                tracing::debug!(key = %key.description(), "cache hit");
                Plan::Hit(value.clone())
              }
              // Stale, expired or rejected: start a new fetch cycle.
              _ => match fetcher.take() {
                Some(f) => {
                  entry.begin_fetch(tags.clone());
                  let rx = entry.watch();
                  self.spawn_fetch(hash.clone(), key, f());
                  Plan::Wait(rx)
                }
                None => Plan::Wait(entry.watch()),
              },
            }
          }
          None => {
            let Some(f) = fetcher.take() else {
              return Err(FetchError::Network(
                "cache entry dropped before fetch settled".into(),
              ));
            };
            let mut entry = CacheEntry::pending(key.clone(), tags.clone());
            entry.subscriber_count = 1;
            subscribed = true;
            let rx = entry.watch();
            entries.insert(hash.clone(), entry);
            self.spawn_fetch(hash.clone(), key, f());
            Plan::Wait(rx)
          }
        }
      };

      match plan {
        Plan::Hit(value) => return Ok(value),
        Plan::Wait(rx) => return Self::await_settled(rx).await,
        // Let the superseded cycle finish, then re-plan; the settled value
        // stays marked stale so the next pass begins a fresh fetch.
        Plan::WaitStale(rx) => {
          let _ = Self::await_settled(rx).await;
        }
      }
    }
  }

  /// Drop one subscription. When the count reaches zero a TTL countdown
  /// starts; the entry is evicted unless resubscribed first.
  pub fn unsubscribe(&self, key: &QueryKey) {
    let hash = key.cache_hash();
    let generation = {
      let mut entries = self.lock_entries();
      let Some(entry) = entries.get_mut(&hash) else {
        return;
      };
      entry.subscriber_count = entry.subscriber_count.saturating_sub(1);
      if entry.subscriber_count > 0 {
        return;
      }
      entry.generation += 1;
      entry.generation
    };
    self.schedule_eviction(hash, generation);
  }

  /// One-shot read: subscribe, await the result, unsubscribe.
  pub async fn fetch<F, Fut>(
    &self,
    key: &QueryKey,
    tags: Vec<Tag>,
    fetcher: F,
  ) -> Result<Value, FetchError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
  {
    let result = self.subscribe(key, tags, fetcher).await;
    self.unsubscribe(key);
    result
  }

  /// Mark every entry carrying `tag` stale. Performs no I/O: the next
  /// subscribe on a flagged entry refetches regardless of TTL.
  pub fn invalidate(&self, tag: &Tag) {
    let mut entries = self.lock_entries();
    for entry in entries.values_mut() {
      if entry.tags.contains(tag) {
        tracing::debug!(key = %entry.key.description(), kind = %tag.kind, id = %tag.id, "invalidated");
        entry.stale = true;
      }
    }
  }

  /// Current status of a key's entry, if one exists.
  pub fn entry_status(&self, key: &QueryKey) -> Option<EntryStatus> {
    self.lock_entries().get(&key.cache_hash()).map(|e| e.status.clone())
  }

  /// Number of live entries.
  pub fn len(&self) -> usize {
    self.lock_entries().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock_entries().is_empty()
  }

  /// Run the fetch to completion on its own task so it settles even if
  /// every subscriber is dropped mid-flight.
  fn spawn_fetch<Fut>(&self, hash: String, key: &QueryKey, fut: Fut)
  where
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
  {
    tracing::debug!(key = %key.description(), "fetch started");
    let cache = self.clone();
    tokio::spawn(async move {
      let result = fut.await;
      if let Err(error) = &result {
        tracing::debug!(%error, "fetch rejected");
      }
      let mut entries = cache.lock_entries();
      if let Some(entry) = entries.get_mut(&hash) {
        entry.settle(result);
      }
    });
  }

  fn schedule_eviction(&self, hash: String, generation: u64) {
    let cache = self.clone();
    tokio::spawn(async move {
      tokio::time::sleep(cache.keep_unused_for).await;
      let mut entries = cache.lock_entries();
      let evict = entries
        .get(&hash)
        .map(|e| e.generation == generation && e.subscriber_count == 0)
        .unwrap_or(false);
      if evict {
        if let Some(entry) = entries.remove(&hash) {
          tracing::debug!(key = %entry.key.description(), "evicted after TTL");
        }
      }
    });
  }

  async fn await_settled(mut rx: watch::Receiver<EntryStatus>) -> Result<Value, FetchError> {
    loop {
      let status = rx.borrow_and_update().clone();
      match status {
        EntryStatus::Fulfilled(value) => return Ok(value),
        EntryStatus::Rejected(error) => return Err(error),
        EntryStatus::Pending => {}
      }
      if rx.changed().await.is_err() {
        // Entry evicted with the fetch still unsettled; treat as a drop.
        return Err(FetchError::Network("cache entry dropped before fetch settled".into()));
      }
    }
  }
}
