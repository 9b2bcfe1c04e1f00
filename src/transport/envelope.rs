//! The `{code, message, data}` wrapper every backend response uses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TransportError;

/// Response envelope as sent by the backend.
///
/// `data` stays untyped until the envelope has been checked, so a failed
/// envelope never has to match the caller's payload type.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
  #[serde(default)]
  pub code: Option<i64>,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub data: Value,
  /// Some endpoints signal failure with an explicit marker instead of a code.
  #[serde(default)]
  pub success: Option<bool>,
  #[serde(default, rename = "errorMessage")]
  pub error_message: Option<String>,
}

/// Codes treated as logical success. An absent code counts as success.
fn is_success_code(code: i64) -> bool {
  code == 0 || (200..300).contains(&code)
}

impl Envelope {
  pub fn is_success(&self) -> bool {
    self.success != Some(false) && self.code.map_or(true, is_success_code)
  }

  /// Unwrap the payload, or turn the envelope into a logical failure.
  pub fn into_data(self) -> Result<Value, TransportError> {
    if self.is_success() {
      return Ok(self.data);
    }
    let message = self.message.or(self.error_message);
    Err(TransportError::logical(self.code, message))
  }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
  pub records: Vec<T>,
  pub current: u32,
  pub size: u32,
  pub total: u64,
  /// Omitted by some backends; see [`Page::page_count`].
  #[serde(default)]
  pub pages: u32,
}

impl<T> Page<T> {
  /// Number of pages, derived from `total` when the server left it out.
  pub fn page_count(&self) -> u64 {
    if self.pages > 0 || self.total == 0 {
      return u64::from(self.pages);
    }
    let size = u64::from(self.size.max(1));
    self.total.div_ceil(size)
  }

  pub fn is_last(&self) -> bool {
    u64::from(self.current) >= self.page_count()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn envelope(value: Value) -> Envelope {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn test_success_codes() {
    assert!(envelope(json!({"code": 200, "data": 1})).is_success());
    assert!(envelope(json!({"code": 0, "data": 1})).is_success());
    assert!(envelope(json!({"data": 1})).is_success());
    assert!(!envelope(json!({"code": 500, "message": "boom"})).is_success());
    assert!(!envelope(json!({"code": 200, "success": false})).is_success());
  }

  #[test]
  fn test_into_data_prefers_message_then_error_message() {
    let err = envelope(json!({"code": 500, "message": "boom"}))
      .into_data()
      .unwrap_err();
    assert_eq!(
      err,
      TransportError::Logical {
        code: Some(500),
        message: "boom".to_string()
      }
    );

    let err = envelope(json!({"success": false, "errorMessage": "nope"}))
      .into_data()
      .unwrap_err();
    assert_eq!(err.user_message(), "nope");

    let err = envelope(json!({"code": 1})).into_data().unwrap_err();
    assert_eq!(err.user_message(), "请求失败");
  }

  #[test]
  fn test_missing_data_is_null() {
    let data = envelope(json!({"code": 200, "message": "ok"}))
      .into_data()
      .unwrap();
    assert!(data.is_null());
    serde_json::from_value::<()>(data).unwrap();
  }

  #[test]
  fn test_page_count_derived_when_missing() {
    let page: Page<u32> = serde_json::from_value(json!({
      "records": [1, 2],
      "current": 1,
      "size": 10,
      "total": 21
    }))
    .unwrap();
    assert_eq!(page.pages, 0);
    assert_eq!(page.page_count(), 3);
    assert!(!page.is_last());

    let empty: Page<u32> = serde_json::from_value(json!({
      "records": [], "current": 1, "size": 10, "total": 0, "pages": 0
    }))
    .unwrap();
    assert_eq!(empty.page_count(), 0);
    assert!(empty.is_last());
  }
}
