//! Bounded retry wrapper around transport operations.
//!
//! Retries transient failures immediately, with no backoff; permanent
//! failures (4xx, decode errors) surface on the first attempt. The caller
//! passes a closure that builds a fresh request future per attempt.
//!
//! Retried writes are assumed safe to repeat. Nothing here guards a
//! mutation against double-applying after a transient failure mid-flight;
//! the endpoint carries no idempotency keys.

use std::future::Future;

use crate::error::FetchError;

/// Retry policy with a fixed attempt cap.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  /// Retries after the first attempt (2 retries = 3 total attempts)
  max_retries: u32,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_retries: 2 }
  }
}

impl RetryPolicy {
  pub fn new(max_retries: u32) -> Self {
    Self { max_retries }
  }

  /// Run `op`, retrying retryable failures up to the cap.
  ///
  /// The final error is propagated unchanged once the cap is exhausted.
  pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, FetchError>
  where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
  {
    let mut attempt = 0u32;
    loop {
      match op().await {
        Ok(value) => return Ok(value),
        Err(error) if error.is_retryable() && attempt < self.max_retries => {
          attempt += 1;
          tracing::debug!(attempt, %error, "retrying after transient failure");
        }
        Err(error) => return Err(error),
      }
    }
  }
}
