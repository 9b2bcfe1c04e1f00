//! User-facing notices, kept apart from the results they describe.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Success,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
}

impl Notice {
  pub fn success(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Success,
      message: message.into(),
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Error,
      message: message.into(),
    }
  }
}

/// Sink for notices. The transport emits one error notice per failure.
pub trait Notifier: Send + Sync {
  fn notify(&self, notice: Notice);
}

/// Prints notices to stderr so they never interleave with command output.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
  fn notify(&self, notice: Notice) {
    match notice.level {
      NoticeLevel::Success => eprintln!("✓ {}", notice.message),
      NoticeLevel::Error => eprintln!("✗ {}", notice.message),
    }
  }
}
