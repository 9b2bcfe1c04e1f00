//! Console client that routes reads through the query cache.

use tracing::debug;

use crate::cache::{QueryClient, QueryError, QueryObserver};
use crate::transport::{Page, TransportError};

use super::cache::{nodes_of, roots, touched_by_project_write, ConsoleQueryKey};
use super::client::ConsoleClient;
use super::types::{Node, PageParams, Project, ProjectConfig, ProjectPatch};

/// Console client with transparent caching.
///
/// Same operations as [`ConsoleClient`]. Reads are served from the cache
/// while fresh; writes invalidate the reads they affect.
#[derive(Clone)]
pub struct CachedConsoleClient {
  inner: ConsoleClient,
  cache: QueryClient,
}

impl CachedConsoleClient {
  pub fn new(inner: ConsoleClient, cache: QueryClient) -> Self {
    Self { inner, cache }
  }

  pub fn cache(&self) -> &QueryClient {
    &self.cache
  }

  /// Keep the entry for `key` alive while the returned guard is held.
  pub fn observe(&self, key: &ConsoleQueryKey) -> QueryObserver {
    self.cache.observe(&key.query_key())
  }

  pub async fn list_projects(&self, params: &PageParams) -> Result<Page<Project>, QueryError> {
    let query_key = ConsoleQueryKey::Projects(params.clone()).query_key();
    let inner = self.inner.clone();
    let params = params.clone();

    let result = self
      .cache
      .query(&query_key, move || {
        let inner = inner.clone();
        let params = params.clone();
        async move { inner.list_projects(&params).await }
      })
      .await?;

    debug!(key = %query_key, source = ?result.source, "projects listed");
    Ok(result.into_data())
  }

  pub async fn get_project(&self, id: u64) -> Result<Project, QueryError> {
    let query_key = ConsoleQueryKey::ProjectDetail(id).query_key();
    let inner = self.inner.clone();

    let result = self
      .cache
      .query(&query_key, move || {
        let inner = inner.clone();
        async move { inner.get_project(id).await }
      })
      .await?;

    debug!(key = %query_key, source = ?result.source, "project loaded");
    Ok(result.into_data())
  }

  pub async fn get_project_config(&self, id: u64) -> Result<ProjectConfig, QueryError> {
    let query_key = ConsoleQueryKey::ProjectConfig(id).query_key();
    let inner = self.inner.clone();

    let result = self
      .cache
      .query(&query_key, move || {
        let inner = inner.clone();
        async move { inner.get_project_config(id).await }
      })
      .await?;

    debug!(key = %query_key, source = ?result.source, "project config loaded");
    Ok(result.into_data())
  }

  pub async fn list_nodes(
    &self,
    project_id: u64,
    params: &PageParams,
  ) -> Result<Page<Node>, QueryError> {
    let query_key = ConsoleQueryKey::Nodes {
      project_id,
      params: params.clone(),
    }
    .query_key();
    let inner = self.inner.clone();
    let params = params.clone();

    let result = self
      .cache
      .query(&query_key, move || {
        let inner = inner.clone();
        let params = params.clone();
        async move { inner.list_nodes(project_id, &params).await }
      })
      .await?;

    debug!(key = %query_key, source = ?result.source, "nodes listed");
    Ok(result.into_data())
  }

  /// Replace a project's configuration (write operation, never retried).
  pub async fn update_project_config(&self, id: u64, config: &str) -> Result<(), TransportError> {
    self
      .cache
      .mutate(
        self.inner.update_project_config(id, config),
        &touched_by_project_write(id),
      )
      .await
  }

  pub async fn update_project(&self, id: u64, patch: &ProjectPatch) -> Result<(), TransportError> {
    self
      .cache
      .mutate(
        self.inner.update_project(id, patch),
        &touched_by_project_write(id),
      )
      .await
  }

  /// Toggle auto-sync on a node of `project_id`. Every cached page of that
  /// project's node list is invalidated on success.
  pub async fn set_node_auto_sync(
    &self,
    project_id: u64,
    node_id: u64,
    enabled: bool,
  ) -> Result<(), TransportError> {
    self
      .cache
      .mutate(
        self.inner.set_node_auto_sync(node_id, enabled),
        &[nodes_of(project_id)],
      )
      .await
  }

  /// Invalidate every cached console read.
  pub fn refresh_all(&self) -> usize {
    roots().iter().map(|root| self.cache.invalidate(root)).sum()
  }
}
