//! Interactive loop over the console actions, sharing one cache per session.

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::actions::{notified, Action};
use crate::cache::QueryObserver;
use crate::commands;
use crate::console::CachedConsoleClient;
use crate::notify::Notifier;

const PROMPT: &str = "composeadm> ";

#[derive(Parser, Debug)]
#[command(name = "composeadm", no_binary_name = true, disable_help_subcommand = true)]
struct ShellLine {
  #[command(subcommand)]
  command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
  #[command(flatten)]
  Action(Action),
  Refresh,
  Help,
  Quit,
}

/// What a single input line produced.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
  Output(String),
  Error(String),
  Quit,
}

pub struct Shell {
  client: CachedConsoleClient,
  notifier: Arc<dyn Notifier>,
  /// Keeps the entry behind the last displayed view out of garbage collection
  view: Option<QueryObserver>,
}

impl Shell {
  pub fn new(client: CachedConsoleClient, notifier: Arc<dyn Notifier>) -> Self {
    Self {
      client,
      notifier,
      view: None,
    }
  }

  /// Read lines from stdin until `quit` or end of input.
  pub async fn run(&mut self) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    stdout.write_all(commands::help().as_bytes()).await?;
    loop {
      stdout.write_all(PROMPT.as_bytes()).await?;
      stdout.flush().await?;

      let Some(line) = lines.next_line().await? else {
        break;
      };
      match self.handle(&line).await {
        Step::Output(text) => stdout.write_all(text.as_bytes()).await?,
        Step::Error(text) => eprintln!("{}", text),
        Step::Quit => break,
      }
    }
    Ok(())
  }

  pub async fn handle(&mut self, line: &str) -> Step {
    let mut words = match split_words(line) {
      Ok(words) => words,
      Err(e) => return Step::Error(e.to_string()),
    };
    let Some(first) = words.first_mut() else {
      return Step::Output(String::new());
    };

    match commands::resolve(first) {
      Ok(cmd) => *first = cmd.name.to_string(),
      Err(candidates) if candidates.is_empty() => {
        return Step::Error(format!("Unknown command '{}', try 'help'", first));
      }
      Err(candidates) => {
        let names: Vec<&str> = candidates.iter().map(|c| c.name).collect();
        return Step::Error(format!("'{}' is ambiguous: {}", first, names.join(", ")));
      }
    }

    let parsed = match ShellLine::try_parse_from(&words) {
      Ok(parsed) => parsed,
      Err(e) => return Step::Error(e.to_string().trim_end().to_string()),
    };

    match parsed.command {
      ShellCommand::Quit => Step::Quit,
      ShellCommand::Help => Step::Output(commands::help()),
      ShellCommand::Refresh => {
        let count = self.client.refresh_all();
        Step::Output(format!("{} cached read(s) marked stale\n", count))
      }
      ShellCommand::Action(action) => self.run_action(action).await,
    }
  }

  async fn run_action(&mut self, action: Action) -> Step {
    match action.execute(&self.client, self.notifier.as_ref()).await {
      Ok(text) => {
        if let Some(key) = action.view() {
          self.view = Some(self.client.observe(&key));
        }
        Step::Output(text)
      }
      Err(e) if notified(&e) => {
        debug!(error = %e, "action failed");
        Step::Output(String::new())
      }
      Err(e) => Step::Error(e.to_string()),
    }
  }
}

/// Split a line on whitespace, keeping double-quoted runs together.
fn split_words(line: &str) -> Result<Vec<String>> {
  let mut words = Vec::new();
  let mut current = String::new();
  let mut in_word = false;
  let mut quoted = false;

  for c in line.chars() {
    match c {
      '"' => {
        quoted = !quoted;
        in_word = true;
      }
      c if c.is_whitespace() && !quoted => {
        if in_word {
          words.push(std::mem::take(&mut current));
          in_word = false;
        }
      }
      c => {
        current.push(c);
        in_word = true;
      }
    }
  }

  if quoted {
    return Err(eyre!("Unterminated quote"));
  }
  if in_word {
    words.push(current);
  }
  Ok(words)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::console::cache::ConsoleQueryKey;
  use crate::testing::{MockBackend, RecordingNotifier};

  async fn setup() -> (MockBackend, Shell, Arc<RecordingNotifier>) {
    let backend = MockBackend::start().await;
    let notifier = Arc::new(RecordingNotifier::default());
    let shell = Shell::new(backend.console(notifier.clone()), notifier.clone());
    (backend, shell, notifier)
  }

  #[test]
  fn test_split_words() {
    assert_eq!(
      split_words("  update 1 --description \"new  text\" ").unwrap(),
      vec!["update", "1", "--description", "new  text"]
    );
    assert_eq!(split_words("").unwrap(), Vec::<String>::new());
    assert_eq!(split_words("x \"\"").unwrap(), vec!["x", ""]);
    assert!(split_words("update \"open").is_err());
  }

  #[tokio::test]
  async fn test_alias_runs_action_and_holds_view() {
    let (backend, mut shell, _) = setup().await;

    let Step::Output(text) = shell.handle("p 1").await else {
      panic!("expected output");
    };
    assert!(text.starts_with("示例项目1 (#1)"));
    assert!(shell.view.is_some());

    shell.handle("show 1").await;
    assert_eq!(backend.hits("GET", "/project/1"), 1);
    let key = ConsoleQueryKey::ProjectDetail(1).query_key();
    assert!(shell.client.cache().is_cached(&key));
  }

  #[tokio::test]
  async fn test_prefix_and_ambiguity() {
    let (_backend, mut shell, _) = setup().await;

    let Step::Output(text) = shell.handle("nod 2 --size 5").await else {
      panic!("expected output");
    };
    assert!(text.contains("core-a"));

    assert_eq!(
      shell.handle("pro").await,
      Step::Error("'pro' is ambiguous: projects, project".to_string())
    );
    assert!(matches!(shell.handle("deploy").await, Step::Error(_)));
  }

  #[tokio::test]
  async fn test_bad_arguments_reported() {
    let (backend, mut shell, _) = setup().await;

    assert!(matches!(shell.handle("project abc").await, Step::Error(_)));
    assert!(matches!(shell.handle("auto-sync 1 7 maybe").await, Step::Error(_)));
    assert!(backend.last_request().is_none());
  }

  #[tokio::test]
  async fn test_refresh_then_read_refetches() {
    let (backend, mut shell, _) = setup().await;
    shell.handle("projects").await;
    shell.handle("config 2").await;

    assert_eq!(
      shell.handle("r").await,
      Step::Output("2 cached read(s) marked stale\n".to_string())
    );
    shell.handle("projects").await;
    assert_eq!(backend.hits("GET", "/project/page"), 2);
  }

  #[tokio::test]
  async fn test_backend_error_not_repeated() {
    let (_backend, mut shell, notifier) = setup().await;

    assert_eq!(shell.handle("project 99").await, Step::Output(String::new()));
    assert!(notifier.errors().contains(&"项目不存在".to_string()));
  }

  #[tokio::test]
  async fn test_quit_and_blank_lines() {
    let (_backend, mut shell, _) = setup().await;
    assert_eq!(shell.handle("   ").await, Step::Output(String::new()));
    assert_eq!(shell.handle("exit").await, Step::Quit);
    assert_eq!(shell.handle("QUIT").await, Step::Quit);
  }
}
