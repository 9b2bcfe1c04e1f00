use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

use composeadm::actions::{self, Action};
use composeadm::cache::QueryClient;
use composeadm::console::{CachedConsoleClient, ConsoleClient};
use composeadm::notify::{ConsoleNotifier, Notifier};
use composeadm::session::{FileSession, TOKEN_ENV};
use composeadm::transport::HttpClient;
use composeadm::{config, logging, shell};

#[derive(Parser, Debug)]
#[command(name = "composeadm")]
#[command(about = "Manage compose-backed projects and their nodes")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/composeadm/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Backend endpoint, overriding api.base_url
  #[arg(long)]
  base_url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Store a bearer token for later runs
  Login { token: String },
  /// Forget the stored token
  Logout,
  /// Interactive session with a shared cache
  Shell,
  #[command(flatten)]
  Action(Action),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
  }

  let _log_guard = logging::init(&config.log)?;
  let session = FileSession::open_default()?;

  match &args.command {
    Command::Login { token } => {
      session.save(token)?;
      if std::env::var_os(TOKEN_ENV).is_some() {
        eprintln!("{} is set and takes precedence over the saved token", TOKEN_ENV);
      }
      println!("Token saved to {}", session.path().display());
      return Ok(ExitCode::SUCCESS);
    }
    Command::Logout => {
      if session.clear()? {
        println!("Logged out");
      } else {
        println!("No saved token");
      }
      return Ok(ExitCode::SUCCESS);
    }
    Command::Shell | Command::Action(_) => {}
  }

  let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
  let http = HttpClient::new(
    &config.api.base_url,
    config.api.timeout(),
    Arc::new(session),
    notifier.clone(),
  )?;
  info!(base_url = %http.base_url(), "client ready");

  let cache = QueryClient::new(config.cache.to_cache_config());
  debug!(config = ?cache.config(), "cache ready");
  let client = CachedConsoleClient::new(ConsoleClient::new(http), cache);

  let result = match args.command {
    Command::Action(action) => action.execute(&client, notifier.as_ref()).await.map(|output| {
      print!("{}", output);
    }),
    _ => shell::Shell::new(client.clone(), notifier.clone()).run().await,
  };
  debug!(entries = client.cache().len(), "disposing cache");
  client.cache().dispose();

  match result {
    Ok(()) => Ok(ExitCode::SUCCESS),
    // Already shown through the notifier
    Err(e) if actions::notified(&e) => {
      info!(error = %e, "command failed");
      Ok(ExitCode::FAILURE)
    }
    Err(e) => Err(e),
  }
}
