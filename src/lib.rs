//! lessonq: a client-side query cache for lesson progress data.
//!
//! The crate wires a typed lessons façade through an endpoint cache
//! (request deduplication, tag invalidation, TTL eviction, hydration)
//! and a retrying HTTP transport, plus the in-memory demo endpoint the
//! client talks to.

pub mod cache;
pub mod config;
pub mod error;
pub mod lessons;
pub mod retry;
pub mod server;
pub mod transport;

pub use cache::{CacheSnapshot, QueryCache, QueryKey, Tag};
pub use config::Config;
pub use error::FetchError;
pub use lessons::{LessonData, LessonsApi, UpdateLessonProgressArgs};
