//! HTTP transport: the raw I/O boundary.
//!
//! Issues requests against a base path with default headers and a fixed
//! per-request timeout, and maps failures into [`FetchError`] kinds so the
//! retry wrapper can tell transient failures from permanent ones.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::error::FetchError;

/// HTTP transport wrapper around a shared reqwest client.
#[derive(Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
  origin: Url,
  api_base: String,
}

impl HttpTransport {
  pub fn new(config: &Config) -> Result<Self, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
      .default_headers(headers)
      .timeout(config.timeout())
      .build()
      .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {}", e)))?;

    let origin = Url::parse(&config.origin)
      .map_err(|e| FetchError::Network(format!("invalid origin {}: {}", config.origin, e)))?;

    Ok(Self {
      client,
      origin,
      api_base: config.api_base.trim_end_matches('/').to_string(),
    })
  }

  fn url(&self, path: &str) -> Result<Url, FetchError> {
    let full = format!("{}{}", self.api_base, path);
    self
      .origin
      .join(&full)
      .map_err(|e| FetchError::Network(format!("invalid endpoint path {}: {}", full, e)))
  }

  /// GET an endpoint with query parameters, returning the JSON body.
  pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
    let url = self.url(path)?;
    let response = self.client.get(url).query(query).send().await?;
    Self::read_json(response).await
  }

  /// POST a JSON body to an endpoint, returning the JSON body.
  pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, FetchError> {
    let url = self.url(path)?;
    let response = self.client.post(url).json(body).send().await?;
    Self::read_json(response).await
  }

  async fn read_json(response: reqwest::Response) -> Result<Value, FetchError> {
    let status = response.status();
    if !status.is_success() {
      // Keep the body: error responses carry an {error} payload worth showing.
      let message = response.text().await.unwrap_or_default();
      tracing::debug!(status = status.as_u16(), %message, "non-success response");
      return Err(FetchError::Status {
        status: status.as_u16(),
        message,
      });
    }

    response.json().await.map_err(FetchError::from)
  }
}
