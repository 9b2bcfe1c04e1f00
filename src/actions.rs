//! Console actions shared by the one-shot CLI and the interactive shell.

use clap::{Args, Subcommand, ValueEnum};
use color_eyre::{eyre::eyre, Report, Result};
use std::path::PathBuf;
use tracing::info;

use crate::cache::QueryError;
use crate::compose;
use crate::console::cache::ConsoleQueryKey;
use crate::console::types::{PageParams, ProjectPatch};
use crate::console::CachedConsoleClient;
use crate::notify::{Notice, Notifier};
use crate::render;
use crate::transport::TransportError;

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
  /// Only rows whose name contains this text
  #[arg(long)]
  pub name: Option<String>,
  #[arg(long, default_value_t = 1)]
  pub page: u32,
  #[arg(long, default_value_t = 10)]
  pub size: u32,
}

impl ListArgs {
  fn params(&self) -> PageParams {
    PageParams::new(self.name.clone(), self.page, self.size)
  }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
  On,
  Off,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Action {
  /// List projects
  Projects(ListArgs),
  /// Show one project
  Project { id: u64 },
  /// Print a project's compose configuration
  Config { id: u64 },
  /// Validate a compose file and upload it as a project's configuration
  ConfigSet { id: u64, file: PathBuf },
  /// Change a project's name or description
  Update {
    id: u64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
  },
  /// List a project's nodes
  Nodes {
    project: u64,
    #[command(flatten)]
    list: ListArgs,
  },
  /// Turn automatic sync on or off for a node
  AutoSync {
    project: u64,
    node: u64,
    state: Toggle,
  },
}

impl Action {
  /// The cached read this action displays.
  pub fn view(&self) -> Option<ConsoleQueryKey> {
    match self {
      Self::Projects(list) => Some(ConsoleQueryKey::Projects(list.params())),
      Self::Project { id } | Self::Update { id, .. } => Some(ConsoleQueryKey::ProjectDetail(*id)),
      Self::Config { id } | Self::ConfigSet { id, .. } => Some(ConsoleQueryKey::ProjectConfig(*id)),
      Self::Nodes { project, list } => Some(ConsoleQueryKey::Nodes {
        project_id: *project,
        params: list.params(),
      }),
      Self::AutoSync { .. } => None,
    }
  }

  /// Run the action and render its result for stdout.
  pub async fn execute(&self, client: &CachedConsoleClient, notifier: &dyn Notifier) -> Result<String> {
    match self {
      Self::Projects(list) => {
        let page = client.list_projects(&list.params()).await?;
        Ok(render::projects(&page))
      }
      Self::Project { id } => {
        let project = client.get_project(*id).await?;
        Ok(render::project(&project))
      }
      Self::Config { id } => {
        let config = client.get_project_config(*id).await?;
        Ok(render::config(&config))
      }
      Self::ConfigSet { id, file } => {
        let text = tokio::fs::read_to_string(file)
          .await
          .map_err(|e| eyre!("Failed to read {}: {}", file.display(), e))?;
        let summary = compose::validate(&text)?;
        client.update_project_config(*id, &text).await?;
        info!(project = *id, services = summary.services.len(), "config uploaded");
        notifier.notify(Notice::success("配置保存成功"));
        Ok(render::compose_summary(&summary))
      }
      Self::Update {
        id,
        name,
        description,
      } => {
        let patch = ProjectPatch {
          name: name.clone(),
          description: description.clone(),
          config: None,
        };
        if patch.is_empty() {
          return Err(eyre!("Nothing to update: pass --name and/or --description"));
        }
        client.update_project(*id, &patch).await?;
        notifier.notify(Notice::success("项目更新成功"));
        let project = client.get_project(*id).await?;
        Ok(render::project(&project))
      }
      Self::Nodes { project, list } => {
        let page = client.list_nodes(*project, &list.params()).await?;
        Ok(render::nodes(&page))
      }
      Self::AutoSync {
        project,
        node,
        state,
      } => {
        let enabled = *state == Toggle::On;
        client.set_node_auto_sync(*project, *node, enabled).await?;
        notifier.notify(Notice::success(if enabled {
          "自动同步已开启"
        } else {
          "自动同步已关闭"
        }));
        Ok(String::new())
      }
    }
  }
}

/// Whether the transport already told the user about this failure.
pub fn notified(err: &Report) -> bool {
  if err.downcast_ref::<TransportError>().is_some() {
    return true;
  }
  err
    .downcast_ref::<QueryError>()
    .is_some_and(|e| e.transport().is_some())
}
