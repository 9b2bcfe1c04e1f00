//! Plain-text output for command results.

use crate::compose::ComposeSummary;
use crate::console::types::{Node, Project, ProjectConfig};
use crate::transport::Page;

/// Left-aligned columns sized to their widest cell.
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
  let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
  for row in rows {
    for (i, cell) in row.iter().enumerate() {
      widths[i] = widths[i].max(cell.chars().count());
    }
  }

  let line = |cells: Vec<&str>| -> String {
    let padded: Vec<String> = cells
      .iter()
      .zip(&widths)
      .map(|(cell, width)| {
        let pad = width - cell.chars().count();
        format!("{}{}", cell, " ".repeat(pad))
      })
      .collect();
    padded.join("  ").trim_end().to_string()
  };

  let mut out = line(headers.to_vec());
  out.push('\n');
  for row in rows {
    out.push_str(&line(row.iter().map(String::as_str).collect()));
    out.push('\n');
  }
  out
}

fn footer<T>(page: &Page<T>) -> String {
  let mut out = format!(
    "page {}/{} · {} total",
    page.current,
    page.page_count().max(1),
    page.total
  );
  if !page.is_last() {
    out.push_str(&format!(" · next: --page {}", page.current + 1));
  }
  out
}

pub fn projects(page: &Page<Project>) -> String {
  if page.records.is_empty() {
    return format!("No projects.\n{}\n", footer(page));
  }
  let rows: Vec<Vec<String>> = page
    .records
    .iter()
    .map(|p| {
      vec![
        p.id.to_string(),
        p.name.clone(),
        p.node_count.to_string(),
        p.resource_count.to_string(),
        p.updated_at.clone(),
      ]
    })
    .collect();
  let mut out = table(&["ID", "NAME", "NODES", "RESOURCES", "UPDATED"], &rows);
  out.push_str(&footer(page));
  out.push('\n');
  out
}

pub fn nodes(page: &Page<Node>) -> String {
  if page.records.is_empty() {
    return format!("No nodes.\n{}\n", footer(page));
  }
  let rows: Vec<Vec<String>> = page
    .records
    .iter()
    .map(|n| {
      vec![
        n.id.to_string(),
        n.name.clone(),
        n.ip_addr.clone(),
        n.status.to_string(),
        n.sync_status.to_string(),
        if n.auto_sync { "on" } else { "off" }.to_string(),
      ]
    })
    .collect();
  let mut out = table(&["ID", "NAME", "ADDRESS", "STATUS", "SYNC", "AUTO-SYNC"], &rows);
  out.push_str(&footer(page));
  out.push('\n');
  out
}

pub fn project(project: &Project) -> String {
  let mut out = format!("{} (#{})\n", project.name, project.id);
  if !project.description.is_empty() {
    out.push_str(&format!("{}\n", project.description));
  }
  out.push_str(&format!(
    "nodes: {}  resources: {}\n",
    project.node_count, project.resource_count
  ));
  out.push_str(&format!(
    "created: {}  updated: {}\n",
    project.created_at, project.updated_at
  ));
  out
}

/// The config text verbatim, newline-terminated.
pub fn config(config: &ProjectConfig) -> String {
  let mut out = config.compose_config.clone();
  if !out.ends_with('\n') {
    out.push('\n');
  }
  out
}

pub fn compose_summary(summary: &ComposeSummary) -> String {
  let version = summary.version.as_deref().unwrap_or("unspecified");
  if summary.services.is_empty() {
    return format!("compose version {}, no services\n", version);
  }
  format!(
    "compose version {}, services: {}\n",
    version,
    summary.services.join(", ")
  )
}
