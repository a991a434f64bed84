//! exo-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) and the
//! environment, opens the SQLite planet catalog, and serves the JSON API.
//!
//! # Loading a catalog
//!
//! ```
//! cargo run -p exo-server -- import planets.json
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use exo_core::store::PlanetStore as _;
use exo_server::{ServerConfig, app, build_state};
use exo_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Exoplanet browser API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Bulk-load a JSON array of planet documents into the database and exit.
  Import {
    /// JSON export of the catalog.
    file: PathBuf,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // A missing .env file is fine.
  let _ = dotenvy::dotenv();

  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(cli.config)?;

  let db_path = cfg.database_path();
  let store = SqliteStore::open(&db_path)
    .await
    .with_context(|| format!("failed to open database at {db_path:?}"))?;

  if let Some(Command::Import { file }) = cli.command {
    let raw = tokio::fs::read_to_string(&file)
      .await
      .with_context(|| format!("failed to read {file:?}"))?;
    let payload: serde_json::Value =
      serde_json::from_str(&raw).with_context(|| format!("{file:?} is not valid JSON"))?;
    let written = store.import_json(payload).await.context("import failed")?;
    println!("imported {written} planets from {}", file.display());
    return Ok(());
  }

  let count = store.count().await.context("failed to count planets")?;
  tracing::info!(count, path = ?db_path, "planet catalog opened");

  let address = cfg.address();
  let router = app(build_state(&cfg, store)?);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, router).await.context("server error")?;

  Ok(())
}
