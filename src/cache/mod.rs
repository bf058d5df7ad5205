//! Client-side endpoint cache.
//!
//! This module provides the application-state cache behind the lessons
//! façade:
//! - Keyed query results shared by subscriber count, with at most one
//!   in-flight fetch per key (deduplication)
//! - Tag-based bulk invalidation with lazy refetch
//! - TTL eviction of unsubscribed entries
//! - Hydration of server-produced snapshots without refetching

mod entry;
mod hydrate;
mod key;
mod store;

pub use entry::{EntryStatus, Tag};
pub use hydrate::{CacheSnapshot, SnapshotEntry};
pub use key::QueryKey;
pub use store::{QueryCache, DEFAULT_KEEP_UNUSED_FOR};
