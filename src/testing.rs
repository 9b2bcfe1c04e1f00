//! In-process backend double and notice recorder for tests.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::{CacheConfig, QueryClient};
use crate::console::{CachedConsoleClient, ConsoleClient};
use crate::notify::{Notice, NoticeLevel, Notifier};
use crate::session::StaticSession;
use crate::transport::client::DEFAULT_TIMEOUT;
use crate::transport::HttpClient;

pub const SAMPLE_COMPOSE: &str = "version: '3'
services:
  web:
    image: nginx:latest
    ports:
      - \"80:80\"
    depends_on:
      - db
  db:
    image: mysql:8.0
    environment:
      - MYSQL_DATABASE=example_db
";

/// Keeps every notice in memory.
#[derive(Default)]
pub struct RecordingNotifier {
  notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
  pub fn notices(&self) -> Vec<Notice> {
    self.notices.lock().unwrap().clone()
  }

  pub fn errors(&self) -> Vec<String> {
    self
      .notices()
      .into_iter()
      .filter(|n| n.level == NoticeLevel::Error)
      .map(|n| n.message)
      .collect()
  }

  pub fn successes(&self) -> Vec<String> {
    self
      .notices()
      .into_iter()
      .filter(|n| n.level == NoticeLevel::Success)
      .map(|n| n.message)
      .collect()
  }
}

impl Notifier for RecordingNotifier {
  fn notify(&self, notice: Notice) {
    self.notices.lock().unwrap().push(notice);
  }
}

#[derive(Debug, Clone)]
pub struct SeenRequest {
  pub method: String,
  pub path: String,
  pub query: Vec<(String, String)>,
  pub authorization: Option<String>,
  pub content_type: Option<String>,
  pub body: Option<Value>,
}

#[derive(Default)]
struct BackendState {
  projects: BTreeMap<u64, Value>,
  configs: BTreeMap<u64, String>,
  nodes: BTreeMap<u64, Value>,
  overrides: HashMap<String, (u16, Value)>,
  delays: HashMap<String, Duration>,
  requests: Vec<SeenRequest>,
}

/// A backend honoring the `/v1` REST contract, seeded with two projects and
/// four nodes. Serves on an ephemeral localhost port for the life of the test.
#[derive(Clone)]
pub struct MockBackend {
  addr: std::net::SocketAddr,
  state: Arc<Mutex<BackendState>>,
}

impl MockBackend {
  pub async fn start() -> Self {
    let state = Arc::new(Mutex::new(seeded_state()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(handle).with_state(state.clone());
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });

    Self { addr, state }
  }

  pub fn base_url(&self) -> String {
    format!("http://{}/v1", self.addr)
  }

  /// Answer every request to `path` (relative to `/v1`) with a fixed response.
  pub fn respond_raw(&self, path: &str, status: u16, body: Value) {
    let mut state = self.state.lock().unwrap();
    state.overrides.insert(format!("/v1{}", path), (status, body));
  }

  pub fn delay(&self, path: &str, delay: Duration) {
    let mut state = self.state.lock().unwrap();
    state.delays.insert(format!("/v1{}", path), delay);
  }

  pub fn last_request(&self) -> Option<SeenRequest> {
    self.state.lock().unwrap().requests.last().cloned()
  }

  /// Number of requests seen for `method` and `path` (relative to `/v1`).
  pub fn hits(&self, method: &str, path: &str) -> usize {
    let full = format!("/v1{}", path);
    self
      .state
      .lock()
      .unwrap()
      .requests
      .iter()
      .filter(|r| r.method == method && r.path == full)
      .count()
  }

  pub fn set_compose(&self, project_id: u64, compose: &str) {
    let mut state = self.state.lock().unwrap();
    state.configs.insert(project_id, compose.to_string());
  }

  /// A cached console client talking to this backend without a token.
  pub fn console(&self, notifier: Arc<RecordingNotifier>) -> CachedConsoleClient {
    let http = HttpClient::new(
      &self.base_url(),
      DEFAULT_TIMEOUT,
      Arc::new(StaticSession(None)),
      notifier,
    )
    .unwrap();
    CachedConsoleClient::new(ConsoleClient::new(http), QueryClient::new(CacheConfig::default()))
  }
}

fn seeded_state() -> BackendState {
  let mut state = BackendState::default();
  for (id, name, nodes) in [(1u64, "示例项目1", 3u64), (2, "示例项目2", 1)] {
    state.projects.insert(
      id,
      json!({
        "id": id,
        "name": name,
        "node_count": nodes,
        "resource_count": 10,
        "description": "这是一个示例项目",
        "created_at": "2023-01-01 00:00:00",
        "updated_at": "2023-01-01 00:00:00",
      }),
    );
    state.configs.insert(id, SAMPLE_COMPOSE.to_string());
  }
  let nodes = [
    (5u64, 1u64, "edge-a", 1, false, 3),
    (6, 1, "edge-b", 0, false, 0),
    (7, 1, "edge-c", 1, false, 2),
    (8, 2, "core-a", 1, true, 1),
  ];
  for (id, project_id, name, status, auto_sync, sync_status) in nodes {
    state.nodes.insert(
      id,
      json!({
        "id": id,
        "name": name,
        "uid": format!("uid-{}", id),
        "project_id": project_id,
        "ip_addr": format!("10.0.0.{}", id),
        "status": status,
        "auto_sync": auto_sync,
        "sync_status": sync_status,
        "created_at": "2023-01-01 00:00:00",
        "updated_at": "2023-01-01 00:00:00",
      }),
    );
  }
  state
}

fn ok(data: Value) -> Response {
  (StatusCode::OK, Json(json!({"code": 200, "message": "ok", "data": data}))).into_response()
}

fn logical(code: i64, message: &str) -> Response {
  (StatusCode::OK, Json(json!({"code": code, "message": message}))).into_response()
}

fn paginate(rows: Vec<Value>, query: &[(String, String)]) -> Value {
  let param = |key: &str| query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
  let page: u64 = param("page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1);
  let size: u64 = param("size").and_then(|s| s.parse().ok()).unwrap_or(10).max(1);
  let rows: Vec<Value> = match param("name").filter(|n| !n.is_empty()) {
    Some(name) => rows
      .into_iter()
      .filter(|r| r["name"].as_str().is_some_and(|n| n.contains(name)))
      .collect(),
    None => rows,
  };
  let total = rows.len() as u64;
  let records: Vec<Value> = rows
    .into_iter()
    .skip(((page - 1) * size) as usize)
    .take(size as usize)
    .collect();
  json!({
    "records": records,
    "current": page,
    "size": size,
    "total": total,
    "pages": total.div_ceil(size),
  })
}

async fn handle(
  State(state): State<Arc<Mutex<BackendState>>>,
  method: Method,
  uri: Uri,
  headers: HeaderMap,
  body: Bytes,
) -> Response {
  let path = uri.path().to_string();
  let query: Vec<(String, String)> = uri
    .query()
    .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
    .unwrap_or_default();
  let header_value = |name: header::HeaderName| {
    headers
      .get(name)
      .and_then(|v| v.to_str().ok())
      .map(String::from)
  };
  let body: Option<Value> = serde_json::from_slice(&body).ok();

  let delay = {
    let mut st = state.lock().unwrap();
    st.requests.push(SeenRequest {
      method: method.to_string(),
      path: path.clone(),
      query: query.clone(),
      authorization: header_value(header::AUTHORIZATION),
      content_type: header_value(header::CONTENT_TYPE),
      body: body.clone(),
    });
    st.delays.get(&path).copied()
  };
  if let Some(delay) = delay {
    tokio::time::sleep(delay).await;
  }

  let mut st = state.lock().unwrap();
  if let Some((status, value)) = st.overrides.get(&path) {
    let status = StatusCode::from_u16(*status).unwrap();
    return (status, Json(value.clone())).into_response();
  }

  let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
  let id = |s: &str| s.parse::<u64>().ok();
  match (method.as_str(), segments.as_slice()) {
    ("GET", ["v1", "project", "page"]) => {
      let rows = st.projects.values().cloned().collect();
      ok(paginate(rows, &query))
    }
    ("GET", ["v1", "project", pid]) => match id(*pid).and_then(|p| st.projects.get(&p)) {
      Some(project) => {
        let mut project = project.clone();
        let pid = project["id"].as_u64().unwrap_or_default();
        project["compose_config"] = json!(st.configs.get(&pid));
        ok(project)
      }
      None => logical(404, "项目不存在"),
    },
    ("GET", ["v1", "project", pid, "config"]) => match id(*pid).and_then(|p| st.configs.get(&p)) {
      Some(config) => ok(json!({
        "id": 100,
        "project_id": id(*pid),
        "compose_config": config,
        "created_at": "2023-01-01 00:00:00",
        "updated_at": "2023-01-01 00:00:00",
      })),
      None => logical(404, "项目不存在"),
    },
    ("PUT", ["v1", "project", pid, "config"]) => {
      let Some(pid) = id(*pid).filter(|p| st.projects.contains_key(p)) else {
        return logical(404, "项目不存在");
      };
      let Some(config) = body.as_ref().and_then(|b| b["compose_config"].as_str()) else {
        return logical(400, "compose_config is required");
      };
      st.configs.insert(pid, config.to_string());
      let project = st.projects.get_mut(&pid).unwrap();
      project["updated_at"] = json!("2024-06-01 12:00:00");
      ok(project.clone())
    }
    ("PUT", ["v1", "project", pid]) => {
      let Some(pid) = id(*pid).filter(|p| st.projects.contains_key(p)) else {
        return logical(404, "项目不存在");
      };
      let patch = body.unwrap_or_default();
      if let Some(config) = patch["config"].as_str() {
        st.configs.insert(pid, config.to_string());
      }
      let project = st.projects.get_mut(&pid).unwrap();
      for field in ["name", "description"] {
        if let Some(value) = patch[field].as_str() {
          project[field] = json!(value);
        }
      }
      ok(Value::Null)
    }
    ("GET", ["v1", "project", pid, "nodes", "page"]) => {
      let pid = id(*pid);
      let rows = st
        .nodes
        .values()
        .filter(|n| n["project_id"].as_u64() == pid)
        .cloned()
        .collect();
      ok(paginate(rows, &query))
    }
    ("PUT", ["v1", "node", nid, "auto-sync"]) => {
      let Some(enabled) = body.as_ref().and_then(|b| b["auto_sync"].as_bool()) else {
        return logical(400, "auto_sync is required");
      };
      match id(*nid).and_then(|n| st.nodes.get_mut(&n)) {
        Some(node) => {
          node["auto_sync"] = json!(enabled);
          ok(Value::Null)
        }
        None => logical(404, "节点不存在"),
      }
    }
    _ => (StatusCode::NOT_FOUND, Json(json!({"code": 404}))).into_response(),
  }
}
