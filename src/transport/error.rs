//! Transport failure taxonomy and its user-facing messages.

use thiserror::Error;

/// Fallback shown when a logical failure carries no message.
pub const DEFAULT_FAILURE_MESSAGE: &str = "请求失败";

/// Every way a call through [`HttpClient`](super::HttpClient) can fail.
///
/// Cloneable so a single failed fetch can be handed to every coalesced caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
  /// The exchange completed but the envelope reported failure.
  #[error("{message}")]
  Logical { code: Option<i64>, message: String },

  /// The server answered with a non-2xx status.
  #[error("HTTP {status}")]
  Http { status: u16 },

  /// No response: unreachable host, timeout, or a connection dropped mid-body.
  #[error("network unreachable: {0}")]
  Network(String),

  /// The request could not be built; nothing was sent.
  #[error("invalid request: {0}")]
  RequestConfig(String),

  /// A 2xx body that is not an envelope or whose data has the wrong shape.
  #[error("malformed response: {0}")]
  Decode(String),
}

impl TransportError {
  pub fn logical(code: Option<i64>, message: Option<String>) -> Self {
    let message = message
      .filter(|m| !m.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
    Self::Logical { code, message }
  }

  /// Classify a `reqwest` failure. Builder errors never reached the wire.
  pub fn from_reqwest(err: reqwest::Error) -> Self {
    if err.is_builder() {
      Self::RequestConfig(err.to_string())
    } else {
      Self::Network(err.to_string())
    }
  }

  /// HTTP status, if the server produced one.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Http { status } => Some(*status),
      _ => None,
    }
  }

  /// The message shown to the user for this failure.
  pub fn user_message(&self) -> String {
    match self {
      Self::Logical { message, .. } => message.clone(),
      Self::Http { status } => match status {
        400 => "请求错误".to_string(),
        401 => "未授权，请重新登录".to_string(),
        403 => "拒绝访问".to_string(),
        404 => "请求地址不存在".to_string(),
        500 => "服务器错误".to_string(),
        other => format!("连接错误 {}", other),
      },
      Self::Network(_) => "网络异常，无法连接服务器".to_string(),
      Self::RequestConfig(detail) => format!("请求配置错误: {}", detail),
      Self::Decode(detail) => format!("响应解析失败: {}", detail),
    }
  }
}
