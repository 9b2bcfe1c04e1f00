//! Sanity checks on compose configuration text before it is uploaded.

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

/// The parts of a compose file worth reporting back.
#[derive(Debug, Deserialize)]
struct ComposeFile {
  #[serde(default)]
  version: Option<serde_yaml::Value>,
  #[serde(default)]
  services: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeSummary {
  pub version: Option<String>,
  pub services: Vec<String>,
}

/// Reject blank text and anything that is not a YAML mapping.
///
/// The text itself is uploaded unchanged; parsing only validates it.
pub fn validate(text: &str) -> Result<ComposeSummary> {
  if text.trim().is_empty() {
    return Err(eyre!("配置不能为空"));
  }

  let document: serde_yaml::Value =
    serde_yaml::from_str(text).map_err(|e| eyre!("Invalid YAML: {}", e))?;
  if !document.is_mapping() {
    return Err(eyre!("Compose configuration must be a YAML mapping"));
  }

  let compose: ComposeFile = serde_yaml::from_value(document)
    .map_err(|e| eyre!("Unexpected compose layout: {}", e))?;

  Ok(ComposeSummary {
    version: compose.version.and_then(|v| match v {
      serde_yaml::Value::String(s) => Some(s),
      serde_yaml::Value::Number(n) => Some(n.to_string()),
      _ => None,
    }),
    services: compose.services.into_keys().collect(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lists_services() {
    let summary = validate(crate::testing::SAMPLE_COMPOSE).unwrap();
    assert_eq!(summary.version.as_deref(), Some("3"));
    assert_eq!(summary.services, vec!["db".to_string(), "web".to_string()]);
  }

  #[test]
  fn test_blank_rejected() {
    let err = validate(" \n\t").unwrap_err();
    assert_eq!(err.to_string(), "配置不能为空");
  }

  #[test]
  fn test_non_mapping_rejected() {
    assert!(validate("- just\n- a list\n").is_err());
    assert!(validate("services: [unclosed").is_err());
  }

  #[test]
  fn test_numeric_version() {
    let summary = validate("version: 3.8\nservices:\n  app: {}\n").unwrap();
    assert_eq!(summary.version.as_deref(), Some("3.8"));
  }

  #[test]
  fn test_services_optional() {
    let summary = validate("x-extension: true\n").unwrap();
    assert!(summary.services.is_empty());
    assert_eq!(summary.version, None);
  }
}
