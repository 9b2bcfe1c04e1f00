//! Structured query keys.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Ordered tuple of serializable parts identifying one cached read,
/// e.g. `["nodes", 1, {"page": 1, "size": 10}]`.
///
/// A key matches every key it is a prefix of, so invalidating `["nodes", 1]`
/// reaches every page of project 1's node list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryKey(Vec<Value>);

impl QueryKey {
  pub fn new(root: &str) -> Self {
    Self(vec![Value::String(root.to_string())])
  }

  /// Append a part. Values that fail to serialize become `null`.
  pub fn with(mut self, part: impl Serialize) -> Self {
    self.0.push(serde_json::to_value(part).unwrap_or_default());
    self
  }

  pub fn starts_with(&self, prefix: &QueryKey) -> bool {
    self.0.starts_with(&prefix.0)
  }

  /// Stable, fixed-length storage key.
  ///
  /// Object parts serialize with sorted keys, so equal keys hash equally
  /// regardless of field order.
  pub fn cache_hash(&self) -> String {
    let input = self.to_string();
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let rendered = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
    f.write_str(&rendered)
  }
}
