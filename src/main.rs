mod app;
mod backend;
mod config;
mod constants;
mod desktop;
mod error;
mod format;
mod gate;
mod http;
mod input;
mod model;
mod progress;
mod ranker;
mod subscriptions;
mod theme;
mod ui;
mod workflow;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use config::Config;
use constants::constants;
use http::HttpBackend;
use workflow::Workflow;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Base URL of the search backend (default: saved preference, then http://127.0.0.1:8765)
  #[arg(short, long)]
  backend_url: Option<String>,

  /// Log filter, e.g. 'debug' or 'yo=trace' (default: saved preference, then 'info')
  #[arg(short, long)]
  log_level: Option<String>,
}

// --- Logging ---

/// Log to `<data dir>/yo.log`; the terminal belongs to the UI. Returns `None`
/// when there is nowhere to write, in which case logging stays off.
fn init_logging(level: &str) -> Option<WorkerGuard> {
  let dir = Config::data_dir()?;
  if let Err(e) = std::fs::create_dir_all(&dir) {
    eprintln!("yo: cannot create {}: {}", dir.display(), e);
    return None;
  }
  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, "yo.log"));
  let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::registry()
    .with(filter)
    .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
    .try_init()
    .ok()?;
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let loaded = Config::load();
  let config = loaded.as_ref().ok().cloned().unwrap_or_default();

  let level = args.log_level.clone().or_else(|| config.log_level.clone()).unwrap_or_else(|| "info".to_string());
  let _guard = init_logging(&level);
  if let Err(e) = &loaded {
    warn!(err = %format!("{:#}", e), "ignoring preferences");
  }

  let backend_url = args
    .backend_url
    .clone()
    .or_else(|| config.backend_url.clone())
    .unwrap_or_else(|| constants().default_backend_url.clone());
  let backend = HttpBackend::new(&backend_url).context("Failed to build HTTP client")?;
  info!(version = env!("CARGO_PKG_VERSION"), backend = %backend_url, "starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, App::new(Workflow::new(Arc::new(backend)), config));
  ratatui::restore();
  if let Err(e) = &result {
    warn!(err = %format!("{:#}", e), "exited with error");
  }
  result
}

fn run(terminal: &mut DefaultTerminal, mut app: App<HttpBackend>) -> Result<()> {
  if let Err(e) = app.workflow.check_status() {
    app.workflow.report(e);
  }

  loop {
    app.tick(Instant::now());

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  info!("bye");
  Ok(())
}
