//! In-memory entry table behind the query cache.
//!
//! Every method here is synchronous and runs under the table lock; nothing
//! in this module awaits.

use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::key::QueryKey;
use super::traits::QueryError;

/// Pending fetch that every caller for the same key awaits.
pub type SharedFetch = Shared<BoxFuture<'static, Result<Value, QueryError>>>;

/// What a read should do next, decided atomically under the lock.
pub enum Lookup {
  Fresh(Value),
  Join(SharedFetch),
  Start { generation: u64 },
}

pub struct Entry {
  key: QueryKey,
  value: Option<Value>,
  updated_at: Option<Instant>,
  invalidated: bool,
  /// Advances on every write and invalidation. A fetch only applies its
  /// result if the generation it started with is still current.
  generation: u64,
  in_flight: Option<SharedFetch>,
  observers: usize,
  idle_since: Instant,
}

impl Entry {
  fn new(key: QueryKey, now: Instant, generation: u64) -> Self {
    Self {
      key,
      value: None,
      updated_at: None,
      invalidated: false,
      generation,
      in_flight: None,
      observers: 0,
      idle_since: now,
    }
  }

  fn is_fresh(&self, now: Instant, stale_time: Duration) -> bool {
    match (&self.value, self.updated_at) {
      (Some(_), Some(at)) => !self.invalidated && now.duration_since(at) < stale_time,
      _ => false,
    }
  }

  fn touch(&mut self, now: Instant) {
    if self.observers == 0 {
      self.idle_since = now;
    }
  }

  fn write(&mut self, value: Value, now: Instant, generation: u64) {
    self.value = Some(value);
    self.updated_at = Some(now);
    self.invalidated = false;
    self.generation = generation;
    self.touch(now);
  }
}

fn next(generations: &mut u64) -> u64 {
  *generations += 1;
  *generations
}

#[derive(Default)]
pub struct MemoryStorage {
  entries: HashMap<String, Entry>,
  /// Source of every generation handed out. Never reset, so an entry
  /// recreated after eviction or `clear` cannot match a fetch started
  /// against its predecessor.
  generations: u64,
}

impl MemoryStorage {
  fn entry(&mut self, key: &QueryKey, now: Instant) -> &mut Entry {
    let generations = &mut self.generations;
    self
      .entries
      .entry(key.cache_hash())
      .or_insert_with(|| Entry::new(key.clone(), now, next(generations)))
  }

  /// Decide whether a read is served, joins a pending fetch, or starts one.
  pub fn lookup(&mut self, key: &QueryKey, stale_time: Duration) -> Lookup {
    let now = Instant::now();
    let entry = self.entry(key, now);
    entry.touch(now);

    if entry.is_fresh(now, stale_time) {
      if let Some(value) = &entry.value {
        trace!(%key, "cache hit");
        return Lookup::Fresh(value.clone());
      }
    }
    if let Some(pending) = &entry.in_flight {
      trace!(%key, "joining in-flight fetch");
      return Lookup::Join(pending.clone());
    }
    Lookup::Start {
      generation: entry.generation,
    }
  }

  /// Record the fetch started for `generation`.
  pub fn begin(&mut self, key: &QueryKey, generation: u64, fetch: SharedFetch) {
    let entry = self.entry(key, Instant::now());
    if entry.generation == generation {
      entry.in_flight = Some(fetch);
    }
  }

  /// Apply a finished fetch. Results from a superseded generation are dropped.
  pub fn settle(&mut self, hash: &str, generation: u64, outcome: &Result<Value, QueryError>) {
    let Some(entry) = self.entries.get_mut(hash) else {
      debug!("fetch finished for an evicted entry");
      return;
    };
    if entry.generation != generation {
      debug!(
        key = %entry.key,
        started = generation,
        current = entry.generation,
        "discarding superseded response"
      );
      return;
    }

    entry.in_flight = None;
    let now = Instant::now();
    match outcome {
      Ok(value) => entry.write(value.clone(), now, next(&mut self.generations)),
      // The previous value, if any, stays in place.
      Err(_) => entry.touch(now),
    }
  }

  /// Mark every entry under `prefix` stale and detach its pending fetch.
  pub fn invalidate(&mut self, prefix: &QueryKey) -> usize {
    let mut count = 0;
    for entry in self.entries.values_mut() {
      if entry.key.starts_with(prefix) {
        entry.invalidated = true;
        entry.generation = next(&mut self.generations);
        entry.in_flight = None;
        count += 1;
      }
    }
    debug!(%prefix, count, "invalidated queries");
    count
  }

  pub fn get(&self, key: &QueryKey) -> Option<Value> {
    self
      .entries
      .get(&key.cache_hash())
      .and_then(|e| e.value.clone())
  }

  /// Overwrite an entry's value as if it had just been fetched.
  pub fn set(&mut self, key: &QueryKey, value: Value) {
    let now = Instant::now();
    let generations = &mut self.generations;
    let entry = self
      .entries
      .entry(key.cache_hash())
      .or_insert_with(|| Entry::new(key.clone(), now, next(generations)));
    entry.in_flight = None;
    entry.write(value, now, next(generations));
  }

  pub fn add_observer(&mut self, key: &QueryKey) -> String {
    self.entry(key, Instant::now()).observers += 1;
    key.cache_hash()
  }

  pub fn remove_observer(&mut self, hash: &str) {
    if let Some(entry) = self.entries.get_mut(hash) {
      entry.observers = entry.observers.saturating_sub(1);
      entry.touch(Instant::now());
    }
  }

  /// Evict entries that have had no observer for `gc_time`.
  pub fn collect_garbage(&mut self, gc_time: Duration) -> usize {
    let now = Instant::now();
    let before = self.entries.len();
    self.entries.retain(|_, e| {
      e.observers > 0 || e.in_flight.is_some() || now.duration_since(e.idle_since) < gc_time
    });
    let evicted = before - self.entries.len();
    if evicted > 0 {
      debug!(evicted, remaining = self.entries.len(), "collected idle queries");
    }
    evicted
  }

  pub fn contains(&self, key: &QueryKey) -> bool {
    self.entries.contains_key(&key.cache_hash())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }
}
