//! Query keys for console reads.

use crate::cache::QueryKey;

use super::types::PageParams;

const PROJECTS: &str = "project";
const PROJECT_DETAIL: &str = "project-detail";
const PROJECT_CONFIG: &str = "project-config";
const NODES: &str = "nodes";

/// Every cached console read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleQueryKey {
  /// One page of the project list
  Projects(PageParams),
  /// A single project with its config
  ProjectDetail(u64),
  /// A project's configuration record
  ProjectConfig(u64),
  /// One page of a project's node list
  Nodes { project_id: u64, params: PageParams },
}

impl ConsoleQueryKey {
  pub fn query_key(&self) -> QueryKey {
    match self {
      Self::Projects(params) => QueryKey::new(PROJECTS).with(params),
      Self::ProjectDetail(id) => QueryKey::new(PROJECT_DETAIL).with(id),
      Self::ProjectConfig(id) => QueryKey::new(PROJECT_CONFIG).with(id),
      Self::Nodes { project_id, params } => QueryKey::new(NODES).with(project_id).with(params),
    }
  }
}

/// Every page of the project list.
pub fn all_projects() -> QueryKey {
  QueryKey::new(PROJECTS)
}

/// Every page of one project's node list.
pub fn nodes_of(project_id: u64) -> QueryKey {
  QueryKey::new(NODES).with(project_id)
}

/// Keys a write to project `id` makes stale.
pub fn touched_by_project_write(id: u64) -> Vec<QueryKey> {
  vec![
    ConsoleQueryKey::ProjectDetail(id).query_key(),
    ConsoleQueryKey::ProjectConfig(id).query_key(),
    all_projects(),
  ]
}

/// Roots of every console read, for a full refresh.
pub fn roots() -> Vec<QueryKey> {
  [PROJECTS, PROJECT_DETAIL, PROJECT_CONFIG, NODES]
    .into_iter()
    .map(QueryKey::new)
    .collect()
}
