//! Domain records exchanged with the backend.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A compose-backed project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub node_count: u32,
  #[serde(default)]
  pub resource_count: u32,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
  /// Only present on detail responses
  #[serde(default, alias = "config", skip_serializing_if = "Option::is_none")]
  pub compose_config: Option<String>,
}

/// The configuration record of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
  #[serde(default)]
  pub id: u64,
  pub project_id: u64,
  #[serde(default, alias = "config")]
  pub compose_config: String,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

/// Fields of a partial project update; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub config: Option<String>,
}

impl ProjectPatch {
  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.description.is_none() && self.config.is_none()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NodeStatus {
  Offline,
  Online,
}

impl TryFrom<u8> for NodeStatus {
  type Error = String;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0 => Ok(Self::Offline),
      1 => Ok(Self::Online),
      other => Err(format!("unknown node status {}", other)),
    }
  }
}

impl From<NodeStatus> for u8 {
  fn from(status: NodeStatus) -> Self {
    match status {
      NodeStatus::Offline => 0,
      NodeStatus::Online => 1,
    }
  }
}

impl fmt::Display for NodeStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Offline => "offline",
      Self::Online => "online",
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SyncStatus {
  Unsynced,
  Syncing,
  Failed,
  Succeeded,
}

impl TryFrom<u8> for SyncStatus {
  type Error = String;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0 => Ok(Self::Unsynced),
      1 => Ok(Self::Syncing),
      2 => Ok(Self::Failed),
      3 => Ok(Self::Succeeded),
      other => Err(format!("unknown sync status {}", other)),
    }
  }
}

impl From<SyncStatus> for u8 {
  fn from(status: SyncStatus) -> Self {
    match status {
      SyncStatus::Unsynced => 0,
      SyncStatus::Syncing => 1,
      SyncStatus::Failed => 2,
      SyncStatus::Succeeded => 3,
    }
  }
}

impl fmt::Display for SyncStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Unsynced => "unsynced",
      Self::Syncing => "syncing",
      Self::Failed => "failed",
      Self::Succeeded => "succeeded",
    })
  }
}

/// A machine belonging to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub uid: String,
  pub project_id: u64,
  #[serde(default)]
  pub ip_addr: String,
  pub status: NodeStatus,
  pub auto_sync: bool,
  pub sync_status: SyncStatus,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

/// Filter and position for a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  pub page: u32,
  pub size: u32,
}

impl Default for PageParams {
  fn default() -> Self {
    Self {
      name: None,
      page: 1,
      size: 10,
    }
  }
}

impl PageParams {
  pub fn new(name: Option<String>, page: u32, size: u32) -> Self {
    Self {
      // An empty search box means no filter.
      name: name.filter(|n| !n.trim().is_empty()),
      page: page.max(1),
      size: size.max(1),
    }
  }
}
