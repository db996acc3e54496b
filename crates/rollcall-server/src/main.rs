//! rollcall server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `ROLLCALL_*` environment variables, opens the SQLite record store, and
//! serves the HTTP API.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use rollcall_core::{memory::MemoryStore, store::RecordStore};
use rollcall_server::{AppState, ServerConfig};
use rollcall_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Lecture attendance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Keep all records in memory instead of opening the SQLite store.
  #[arg(long)]
  in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ROLLCALL"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.store_path = expand_tilde(&server_cfg.store_path);
  server_cfg.photo_dir = expand_tilde(&server_cfg.photo_dir);

  tokio::fs::create_dir_all(&server_cfg.photo_dir)
    .await
    .with_context(|| format!("failed to create photo dir {:?}", server_cfg.photo_dir))?;

  if cli.in_memory {
    tracing::warn!("running with an in-memory store; records are lost on exit");
    return serve(MemoryStore::new(), server_cfg).await;
  }

  if let Some(parent) = server_cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  serve(store, server_cfg).await
}

async fn serve<S>(store: S, server_cfg: ServerConfig) -> anyhow::Result<()>
where
  S: RecordStore + Clone + 'static,
{
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState::new(store, server_cfg);

  let sessions = state.sessions.clone();
  tokio::spawn(async move {
    let mut tick = tokio::time::interval(Duration::from_secs(5 * 60));
    loop {
      tick.tick().await;
      let purged = sessions.purge_expired().await;
      if purged > 0 {
        tracing::debug!(purged, "expired sessions removed");
      }
    }
  });

  let app = rollcall_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
