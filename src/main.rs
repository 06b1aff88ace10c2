mod api;
mod app;
mod cli;
mod commands;
mod config;
mod event;
mod period;
mod query;
mod session;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::ApiClient;
use crate::session::{MemoryStorage, Session, SessionStorage, SqliteStorage};
use crate::ui::view::ViewContext;

const LOG_ENV: &str = "SHOPDESK_LOG";

#[derive(Parser, Debug)]
#[command(name = "shopdesk")]
#[command(about = "A terminal dashboard for running a salon or barbershop")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/shopdesk/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Day the dashboard opens on (YYYY-MM-DD, default today)
  #[arg(short, long)]
  date: Option<String>,

  /// View to open first, e.g. agenda or services
  #[arg(long)]
  view: Option<String>,

  #[command(subcommand)]
  command: Option<cli::Cmd>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Keep the guard alive so buffered log lines are flushed on exit
  let _log_guard = init_tracing()?;

  let config = config::Config::load(args.config.as_deref())?;

  let storage: Box<dyn SessionStorage> = if config.session.persist {
    Box::new(SqliteStorage::open()?)
  } else {
    Box::new(MemoryStorage::new())
  };
  let session = Arc::new(Session::restore(storage)?);
  let api = ApiClient::new(&config.api, session.clone())?;

  if let Some(command) = args.command {
    let output = cli::run(command, &session, &api, &config.currency).await?;
    println!("{}", output);
    return Ok(());
  }

  let user = session
    .user()
    .ok_or_else(|| eyre!("Not signed in. Run `shopdesk login --token <TOKEN>` first."))?;

  let start_date = match args.date.as_deref() {
    Some(s) => period::parse_date(s)?,
    None => chrono::Local::now().date_naive(),
  };

  info!(user = %user.name, role = user.role.label(), api = %api.base_url(), "Starting dashboard");

  let ctx = ViewContext {
    api,
    user,
    query_options: config.cache.query_options(),
    currency: config.currency.clone(),
    start_date,
  };
  let mut app = app::App::new(ctx, config.display_title(), args.view.as_deref());
  app.run().await?;

  Ok(())
}

/// Log to a daily file; the terminal belongs to the dashboard.
fn init_tracing() -> Result<WorkerGuard> {
  let log_dir = dirs::data_dir()
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("shopdesk")
    .join("logs");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(&log_dir, "shopdesk.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false),
    )
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
