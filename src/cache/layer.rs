//! Query client: coalesced, cached reads and invalidating writes.

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::key::QueryKey;
use super::policy::CacheConfig;
use super::storage::{Lookup, MemoryStorage, SharedFetch};
use super::traits::{CacheResult, QueryError};
use crate::transport::TransportError;

struct Inner {
  config: CacheConfig,
  storage: Mutex<MemoryStorage>,
  sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
  fn storage(&self) -> MutexGuard<'_, MemoryStorage> {
    // Storage methods never panic midway, so a poisoned table is still consistent.
    self.storage.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Cache of async read results keyed by [`QueryKey`].
///
/// - Fresh entries are served without calling the fetcher.
/// - Concurrent reads of one key share a single fetch.
/// - Failed reads are retried per [`CacheConfig::retry`]; the last good value
///   survives a final failure.
/// - Successful mutations invalidate the keys they declare before returning.
///
/// Cloning is cheap and shares the same cache.
#[derive(Clone)]
pub struct QueryClient {
  inner: Arc<Inner>,
}

impl QueryClient {
  /// Create a client and start its idle-entry sweeper.
  ///
  /// Must be called from within a tokio runtime.
  pub fn new(config: CacheConfig) -> Self {
    let inner = Arc::new(Inner {
      config,
      storage: Mutex::new(MemoryStorage::default()),
      sweeper: Mutex::new(None),
    });

    let sweeper = tokio::spawn(sweep(Arc::downgrade(&inner)));
    *inner.sweeper.lock().unwrap_or_else(PoisonError::into_inner) = Some(sweeper);

    Self { inner }
  }

  pub fn config(&self) -> &CacheConfig {
    &self.inner.config
  }

  /// Read through the cache.
  ///
  /// Returns the cached value while fresh; otherwise joins the pending fetch
  /// for `key` or starts one. The fetch runs on its own task, so it finishes
  /// and updates the cache even if every caller stops waiting.
  pub async fn query<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<CacheResult<T>, QueryError>
  where
    T: Serialize + DeserializeOwned + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
  {
    let pending = {
      let mut storage = self.inner.storage();
      match storage.lookup(key, self.inner.config.stale_time) {
        Lookup::Fresh(value) => return decode(value).map(CacheResult::from_cache),
        Lookup::Join(pending) => pending,
        Lookup::Start { generation } => {
          debug!(%key, generation, "fetching");
          let pending = self.spawn_fetch(key, generation, fetcher);
          storage.begin(key, generation, pending.clone());
          pending
        }
      }
    };

    let value = pending.await?;
    decode(value).map(CacheResult::from_network)
  }

  fn spawn_fetch<T, F, Fut>(&self, key: &QueryKey, generation: u64, fetcher: F) -> SharedFetch
  where
    T: Serialize + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
  {
    let inner = Arc::clone(&self.inner);
    let key = key.clone();
    let hash = key.cache_hash();

    let task = tokio::spawn(async move {
      let retry = inner.config.retry;
      let mut attempt = 0;
      let outcome = loop {
        match fetcher().await {
          Ok(data) => break serde_json::to_value(data).map_err(|e| QueryError::Decode(e.to_string())),
          Err(err) if attempt < retry.retries => {
            let delay = retry.delay(attempt);
            debug!(%key, attempt, ?delay, error = %err, "fetch failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
          }
          Err(err) => {
            warn!(%key, attempts = attempt + 1, error = %err, "fetch failed");
            break Err(QueryError::Fetch {
              attempts: attempt + 1,
              source: err,
            });
          }
        }
      };
      inner.storage().settle(&hash, generation, &outcome);
      outcome
    });

    async move {
      task
        .await
        .unwrap_or_else(|e| Err(QueryError::Aborted(e.to_string())))
    }
    .boxed()
    .shared()
  }

  /// Run a write exactly once. On success every entry under each of
  /// `invalidates` is invalidated before this returns; on failure the cache
  /// is left untouched.
  pub async fn mutate<T, Fut>(&self, fetcher: Fut, invalidates: &[QueryKey]) -> Result<T, TransportError>
  where
    Fut: Future<Output = Result<T, TransportError>>,
  {
    let data = fetcher.await?;
    for key in invalidates {
      self.invalidate(key);
    }
    Ok(data)
  }

  /// Mark every entry under `prefix` stale. The next read of each refetches,
  /// and any fetch already running for them is disowned.
  pub fn invalidate(&self, prefix: &QueryKey) -> usize {
    self.inner.storage().invalidate(prefix)
  }

  /// The cached value for `key`, fresh or not.
  pub fn get_query_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
    let value = self.inner.storage().get(key)?;
    serde_json::from_value(value).ok()
  }

  /// Replace the cached value for `key`, superseding any running fetch.
  pub fn set_query_data<T: Serialize>(&self, key: &QueryKey, data: &T) -> Result<(), QueryError> {
    let value = serde_json::to_value(data).map_err(|e| QueryError::Decode(e.to_string()))?;
    self.inner.storage().set(key, value);
    Ok(())
  }

  /// Register an active subscriber for `key`. The entry is exempt from
  /// garbage collection until every observer is dropped.
  pub fn observe(&self, key: &QueryKey) -> QueryObserver {
    let hash = self.inner.storage().add_observer(key);
    QueryObserver {
      inner: Arc::downgrade(&self.inner),
      hash,
    }
  }

  /// Evict idle entries now instead of waiting for the sweeper.
  pub fn collect_garbage(&self) -> usize {
    self
      .inner
      .storage()
      .collect_garbage(self.inner.config.gc_time)
  }

  pub fn is_cached(&self, key: &QueryKey) -> bool {
    self.inner.storage().contains(key)
  }

  pub fn len(&self) -> usize {
    self.inner.storage().len()
  }

  /// Stop the sweeper and drop every entry. Running fetches still finish
  /// but have nowhere to store their results.
  pub fn dispose(&self) {
    if let Some(sweeper) = self
      .inner
      .sweeper
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take()
    {
      sweeper.abort();
    }
    self.inner.storage().clear();
  }
}

/// Keeps a query entry alive while held.
pub struct QueryObserver {
  inner: Weak<Inner>,
  hash: String,
}

impl Drop for QueryObserver {
  fn drop(&mut self) {
    if let Some(inner) = self.inner.upgrade() {
      inner.storage().remove_observer(&self.hash);
    }
  }
}

async fn sweep(inner: Weak<Inner>) {
  let period = match inner.upgrade() {
    Some(inner) => inner.config.sweep_interval,
    None => return,
  };
  let mut interval = tokio::time::interval(period);
  // The first tick completes immediately.
  interval.tick().await;
  loop {
    interval.tick().await;
    match inner.upgrade() {
      Some(inner) => {
        inner.storage().collect_garbage(inner.config.gc_time);
      }
      None => break,
    }
  }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, QueryError> {
  serde_json::from_value(value).map_err(|e| QueryError::Decode(e.to_string()))
}
