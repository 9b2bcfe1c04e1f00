use serde::de::IgnoredAny;
use serde_json::json;

use super::types::{Node, PageParams, Project, ProjectConfig, ProjectPatch};
use crate::transport::{HttpClient, Page, RequestOptions, TransportError};

/// Typed wrappers over the backend's project and node endpoints.
///
/// No caching here; every call is one round trip and errors pass through.
#[derive(Clone)]
pub struct ConsoleClient {
  http: HttpClient,
}

fn page_options(params: &PageParams) -> RequestOptions {
  RequestOptions::new()
    .query_opt("name", params.name.as_deref())
    .query("page", params.page)
    .query("size", params.size)
}

impl ConsoleClient {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }

  /// List projects, optionally filtered by name
  pub async fn list_projects(&self, params: &PageParams) -> Result<Page<Project>, TransportError> {
    self.http.get("/project/page", page_options(params)).await
  }

  /// Get a project, including its compose configuration
  pub async fn get_project(&self, id: u64) -> Result<Project, TransportError> {
    self
      .http
      .get(&format!("/project/{}", id), RequestOptions::new())
      .await
  }

  pub async fn get_project_config(&self, id: u64) -> Result<ProjectConfig, TransportError> {
    self
      .http
      .get(&format!("/project/{}/config", id), RequestOptions::new())
      .await
  }

  /// Replace a project's compose configuration.
  ///
  /// Whatever the backend echoes back is ignored; re-read to see the result.
  pub async fn update_project_config(&self, id: u64, config: &str) -> Result<(), TransportError> {
    let options = RequestOptions::new().json(json!({ "compose_config": config }))?;
    let _: IgnoredAny = self
      .http
      .put(&format!("/project/{}/config", id), options)
      .await?;
    Ok(())
  }

  /// Update the present fields of a project
  pub async fn update_project(&self, id: u64, patch: &ProjectPatch) -> Result<(), TransportError> {
    let options = RequestOptions::new().json(patch)?;
    let _: IgnoredAny = self
      .http
      .put(&format!("/project/{}", id), options)
      .await?;
    Ok(())
  }

  /// List a project's nodes, optionally filtered by name
  pub async fn list_nodes(
    &self,
    project_id: u64,
    params: &PageParams,
  ) -> Result<Page<Node>, TransportError> {
    self
      .http
      .get(
        &format!("/project/{}/nodes/page", project_id),
        page_options(params),
      )
      .await
  }

  pub async fn set_node_auto_sync(&self, node_id: u64, enabled: bool) -> Result<(), TransportError> {
    let options = RequestOptions::new().json(json!({ "auto_sync": enabled }))?;
    let _: IgnoredAny = self
      .http
      .put(&format!("/node/{}/auto-sync", node_id), options)
      .await?;
    Ok(())
  }
}
