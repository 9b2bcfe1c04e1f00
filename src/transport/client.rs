//! The single point of egress for backend calls.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::envelope::Envelope;
use super::error::TransportError;
use crate::notify::{Notice, Notifier};
use crate::session::SessionStore;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8888/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameters and body for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
  query: Vec<(String, String)>,
  body: Option<Value>,
}

impl RequestOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn query(mut self, key: &str, value: impl ToString) -> Self {
    self.query.push((key.to_string(), value.to_string()));
    self
  }

  /// Add a parameter only when a value is present.
  pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
    match value {
      Some(v) => self.query(key, v),
      None => self,
    }
  }

  pub fn json(mut self, body: impl Serialize) -> Result<Self, TransportError> {
    let body = serde_json::to_value(body)
      .map_err(|e| TransportError::RequestConfig(format!("unserializable body: {}", e)))?;
    self.body = Some(body);
    Ok(self)
  }
}

/// HTTP client that attaches the session token, unwraps envelopes and
/// reports every failure exactly once through the notifier.
#[derive(Clone)]
pub struct HttpClient {
  http: reqwest::Client,
  base_url: Url,
  session: Arc<dyn SessionStore>,
  notifier: Arc<dyn Notifier>,
}

impl HttpClient {
  pub fn new(
    base_url: &str,
    timeout: Duration,
    session: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
  ) -> Result<Self, TransportError> {
    let mut base_url = Url::parse(base_url)
      .map_err(|e| TransportError::RequestConfig(format!("invalid base url {}: {}", base_url, e)))?;
    if base_url.cannot_be_a_base() {
      return Err(TransportError::RequestConfig(format!(
        "base url {} cannot carry paths",
        base_url
      )));
    }
    // Url::join drops the last segment unless the path ends in a slash.
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let http = reqwest::Client::builder()
      .timeout(timeout)
      .default_headers(headers)
      .build()
      .map_err(TransportError::from_reqwest)?;

    Ok(Self {
      http,
      base_url,
      session,
      notifier,
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  pub async fn get<T: DeserializeOwned>(
    &self,
    path: &str,
    options: RequestOptions,
  ) -> Result<T, TransportError> {
    self.send(Method::GET, path, options).await
  }

  pub async fn put<T: DeserializeOwned>(
    &self,
    path: &str,
    options: RequestOptions,
  ) -> Result<T, TransportError> {
    self.send(Method::PUT, path, options).await
  }

  /// Perform one round trip and return the envelope's `data`.
  pub async fn send<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    options: RequestOptions,
  ) -> Result<T, TransportError> {
    let result = self.exchange(method.clone(), path, options).await;
    if let Err(err) = &result {
      warn!(%method, path, error = %err, "request failed");
      self.notifier.notify(Notice::error(err.user_message()));
    }
    result
  }

  async fn exchange<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    options: RequestOptions,
  ) -> Result<T, TransportError> {
    let request = self.build_request(method.clone(), path, options)?;

    let response = self
      .http
      .execute(request)
      .await
      .map_err(TransportError::from_reqwest)?;

    let status = response.status();
    debug!(%method, path, status = status.as_u16(), "response received");
    if !status.is_success() {
      return Err(TransportError::Http {
        status: status.as_u16(),
      });
    }

    let body = response
      .bytes()
      .await
      .map_err(TransportError::from_reqwest)?;

    let envelope: Envelope =
      serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
    let data = envelope.into_data()?;

    serde_json::from_value(data).map_err(|e| TransportError::Decode(e.to_string()))
  }

  fn build_request(
    &self,
    method: Method,
    path: &str,
    options: RequestOptions,
  ) -> Result<reqwest::Request, TransportError> {
    let mut url = self
      .base_url
      .join(path.trim_start_matches('/'))
      .map_err(|e| TransportError::RequestConfig(format!("invalid path {}: {}", path, e)))?;

    // An absolute path in `path` would otherwise let a call escape the backend.
    if url.origin() != self.base_url.origin() {
      return Err(TransportError::RequestConfig(format!(
        "path {} leaves {}",
        path, self.base_url
      )));
    }

    if !options.query.is_empty() {
      url.query_pairs_mut().extend_pairs(options.query.iter());
    }

    let mut builder = self.http.request(method, url);
    if let Some(token) = self.session.token() {
      let value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| TransportError::RequestConfig("token is not a valid header value".into()))?;
      builder = builder.header(reqwest::header::AUTHORIZATION, value);
    }
    if let Some(body) = &options.body {
      builder = builder.json(body);
    }

    builder.build().map_err(TransportError::from_reqwest)
  }
}
