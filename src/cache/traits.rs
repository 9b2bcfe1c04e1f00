//! Result and error types shared by the cache layer.

use thiserror::Error;

use crate::transport::TransportError;

/// Result from a cache operation, including where the data came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
    }
  }

  pub fn into_data(self) -> T {
    self.data
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Produced by a fetch, possibly one started by another caller
  Network,
  /// Served from a cached entry inside its freshness window
  CacheFresh,
}

/// Why a cached read failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
  /// Every attempt failed; carries the last transport failure.
  #[error("fetch failed after {attempts} attempt(s): {source}")]
  Fetch {
    attempts: u32,
    #[source]
    source: TransportError,
  },

  /// Cached or fetched value does not match the requested type.
  #[error("cached value has unexpected shape: {0}")]
  Decode(String),

  /// The fetch task died before producing a result.
  #[error("fetch aborted: {0}")]
  Aborted(String),
}

impl QueryError {
  /// The underlying transport failure, when there is one.
  pub fn transport(&self) -> Option<&TransportError> {
    match self {
      Self::Fetch { source, .. } => Some(source),
      _ => None,
    }
  }
}
