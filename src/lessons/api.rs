//! Typed query/mutation façade over the endpoint cache.
//!
//! Reads flow through the cache (dedupe, TTL, tags) down to the retrying
//! transport; writes go straight to the transport and invalidate the
//! lesson's tag on success, so the next read refetches.

use crate::cache::{QueryCache, QueryKey, Tag};
use crate::config::{Config, DEFAULT_LESSON_ID};
use crate::error::FetchError;
use crate::retry::RetryPolicy;
use crate::transport::HttpTransport;

use super::types::{LessonData, UpdateLessonProgressArgs, UpdateLessonRequest};

const LESSON_DATA_PATH: &str = "/lesson-data";

/// Lessons client with transparent caching.
#[derive(Clone)]
pub struct LessonsApi {
  transport: HttpTransport,
  retry: RetryPolicy,
  cache: QueryCache,
}

impl LessonsApi {
  pub fn new(config: &Config) -> Result<Self, FetchError> {
    Ok(Self {
      transport: HttpTransport::new(config)?,
      retry: RetryPolicy::new(config.max_retries),
      cache: QueryCache::new(config.keep_unused_for()),
    })
  }

  /// The underlying cache, for hydration and snapshotting.
  pub fn cache(&self) -> &QueryCache {
    &self.cache
  }

  /// Fetch a lesson's data, served from cache when fresh.
  ///
  /// Defaults to the intro lesson when no id is given. The entry is tagged
  /// with the lesson id so mutations can invalidate it.
  pub async fn get_lesson_data(&self, lesson_id: Option<&str>) -> Result<LessonData, FetchError> {
    let lesson_id = lesson_id.unwrap_or(DEFAULT_LESSON_ID).to_string();
    let key = QueryKey::new("getLessonData", lesson_id.clone());
    let tag = Tag::lesson(lesson_id.clone());

    let transport = self.transport.clone();
    let retry = self.retry;
    let value = self
      .cache
      .fetch(&key, vec![tag], move || async move {
        retry
          .run(|| {
            let transport = transport.clone();
            let lesson_id = lesson_id.clone();
            async move {
              transport
                .get(LESSON_DATA_PATH, &[("lessonId", lesson_id.as_str())])
                .await
            }
          })
          .await
      })
      .await?;

    serde_json::from_value(value).map_err(FetchError::decode)
  }

  /// Apply a progress update and invalidate the lesson's cached data.
  ///
  /// The tag is flagged stale before this returns, so any read issued
  /// afterwards refetches instead of serving the pre-mutation value.
  pub async fn update_lesson_progress(
    &self,
    args: UpdateLessonProgressArgs,
  ) -> Result<LessonData, FetchError> {
    let request = UpdateLessonRequest {
      lesson_id: args.lesson_id.clone(),
      action: args.action(),
    };

    let value = self
      .retry
      .run(|| {
        let transport = self.transport.clone();
        let request = request.clone();
        async move { transport.post(LESSON_DATA_PATH, &request).await }
      })
      .await?;

    self.cache.invalidate(&Tag::lesson(args.lesson_id));
    serde_json::from_value(value).map_err(FetchError::decode)
  }
}
