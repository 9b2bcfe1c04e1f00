//! Persisted session state: where the bearer token lives between runs.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable that takes precedence over the session file.
pub const TOKEN_ENV: &str = "COMPOSEADM_TOKEN";

/// Source of the bearer token attached to outgoing requests.
///
/// Read on every request, so a login from another process is picked up
/// without restarting.
pub trait SessionStore: Send + Sync {
  fn token(&self) -> Option<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
  token: String,
  saved_at: DateTime<Utc>,
}

/// Token stored as JSON under the user's data directory.
#[derive(Debug, Clone)]
pub struct FileSession {
  path: PathBuf,
}

impl FileSession {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Session file at the default location.
  pub fn open_default() -> Result<Self> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(Self::new(data_dir.join("composeadm").join("session.json")))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn save(&self, token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
      return Err(eyre!("Refusing to save an empty token"));
    }

    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create session directory: {}", e))?;
    }

    let session = SessionFile {
      token: token.to_string(),
      saved_at: Utc::now(),
    };
    let contents = serde_json::to_vec_pretty(&session)
      .map_err(|e| eyre!("Failed to serialize session: {}", e))?;
    std::fs::write(&self.path, contents)
      .map_err(|e| eyre!("Failed to write session file {}: {}", self.path.display(), e))?;

    Ok(())
  }

  /// Remove the stored token. Returns whether there was one.
  pub fn clear(&self) -> Result<bool> {
    match std::fs::remove_file(&self.path) {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(eyre!(
        "Failed to remove session file {}: {}",
        self.path.display(),
        e
      )),
    }
  }

  fn load(&self) -> Option<SessionFile> {
    let contents = std::fs::read(&self.path).ok()?;
    match serde_json::from_slice(&contents) {
      Ok(session) => Some(session),
      Err(e) => {
        warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
        None
      }
    }
  }
}

impl SessionStore for FileSession {
  fn token(&self) -> Option<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
      if !token.trim().is_empty() {
        return Some(token);
      }
    }
    self.load().map(|s| s.token)
  }
}

/// Fixed token, or none.
#[derive(Debug, Clone, Default)]
pub struct StaticSession(pub Option<String>);

impl SessionStore for StaticSession {
  fn token(&self) -> Option<String> {
    self.0.clone()
  }
}
