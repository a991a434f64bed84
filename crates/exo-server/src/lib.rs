//! Server assembly for the exoplanet browser: configuration, state wiring and
//! the outer router layers. The binary in `main.rs` drives it.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, bail};
use axum::Router;
use exo_api::{AppState, ImageSearch, api_router};
use exo_store_sqlite::SqliteStore;
use exo_summary::{GeminiClient, Summarizer, model::DEFAULT_MODEL};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, from `config.toml` and the environment.
///
/// Environment variables use the upper-case key names (`DATABASE_URL`,
/// `PORT`, `GOOGLE_API_KEY`, ...) and take precedence over the file.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub database_url:   String,
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  #[serde(default)]
  pub google_api_key: Option<String>,
  #[serde(default)]
  pub serp_api_key:   Option<String>,
  #[serde(default = "default_model")]
  pub summary_model:  String,
}

fn default_host() -> String { "0.0.0.0".into() }

fn default_port() -> u16 { 3000 }

fn default_model() -> String { DEFAULT_MODEL.into() }

impl ServerConfig {
  /// Load from an optional TOML file at `path`, then the process environment.
  pub fn load(path: PathBuf) -> anyhow::Result<Self> {
    Self::load_from(path, config::Environment::default().try_parsing(true))
  }

  pub fn load_from(path: PathBuf, env: config::Environment) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(env)
      .build()
      .context("failed to read configuration")?;

    let cfg: ServerConfig = settings
      .try_deserialize()
      .context("invalid configuration (is DATABASE_URL set?)")?;
    if cfg.database_url.trim().is_empty() {
      bail!("DATABASE_URL is empty");
    }
    Ok(cfg)
  }

  /// Filesystem path of the SQLite database named by `database_url`.
  ///
  /// Accepts a bare path or a `sqlite:` / `sqlite://` URL.
  pub fn database_path(&self) -> PathBuf {
    let url = self.database_url.trim();
    let path = url
      .strip_prefix("sqlite://")
      .or_else(|| url.strip_prefix("sqlite:"))
      .unwrap_or(url);
    PathBuf::from(path)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Application ─────────────────────────────────────────────────────────────

pub type ServerState = AppState<SqliteStore, GeminiClient>;

/// Wire the store and outbound clients described by `cfg` into handler state.
pub fn build_state(cfg: &ServerConfig, store: SqliteStore) -> anyhow::Result<ServerState> {
  let gemini = GeminiClient::new(cfg.google_api_key.clone())
    .context("failed to build Gemini client")?;
  if !gemini.is_configured() {
    tracing::warn!("GOOGLE_API_KEY is not set; summary endpoints will answer 501");
  }
  let summarizer = Summarizer::new(Arc::new(gemini))
    .context("failed to build summarizer")?
    .with_models(vec![cfg.summary_model.clone()]);
  let images =
    ImageSearch::new(cfg.serp_api_key.clone()).context("failed to build image search client")?;

  Ok(AppState {
    store:      Arc::new(store),
    summarizer: Arc::new(summarizer),
    images:     Arc::new(images),
  })
}

/// The full HTTP application: API routes plus CORS and request tracing.
pub fn app(state: ServerState) -> Router {
  api_router(state)
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use tower::ServiceExt as _;

  use super::*;

  fn env(vars: &[(&str, &str)]) -> config::Environment {
    let map: HashMap<String, String> =
      vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    config::Environment::default().try_parsing(true).source(Some(map))
  }

  fn no_file() -> PathBuf { PathBuf::from("/nonexistent/exo-config.toml") }

  #[test]
  fn defaults_apply() {
    let cfg = ServerConfig::load_from(no_file(), env(&[("DATABASE_URL", "exo.db")])).unwrap();
    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.summary_model, "gemini-2.5-flash");
    assert_eq!(cfg.google_api_key, None);
    assert_eq!(cfg.address(), "0.0.0.0:3000");
  }

  #[test]
  fn environment_overrides() {
    let cfg = ServerConfig::load_from(
      no_file(),
      env(&[
        ("DATABASE_URL", "sqlite:///var/lib/exo.db"),
        ("PORT", "8080"),
        ("GOOGLE_API_KEY", "g-key"),
      ]),
    )
    .unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.google_api_key.as_deref(), Some("g-key"));
    assert_eq!(cfg.database_path(), PathBuf::from("/var/lib/exo.db"));
  }

  #[test]
  fn missing_database_url_fails_fast() {
    assert!(ServerConfig::load_from(no_file(), env(&[("PORT", "3000")])).is_err());
    assert!(ServerConfig::load_from(no_file(), env(&[("DATABASE_URL", " ")])).is_err());
  }

  #[test]
  fn database_path_forms() {
    let path = |url: &str| {
      ServerConfig {
        database_url:   url.into(),
        host:           default_host(),
        port:           default_port(),
        google_api_key: None,
        serp_api_key:   None,
        summary_model:  default_model(),
      }
      .database_path()
    };
    assert_eq!(path("planets.db"), PathBuf::from("planets.db"));
    assert_eq!(path("sqlite:planets.db"), PathBuf::from("planets.db"));
    assert_eq!(path("sqlite://data/planets.db"), PathBuf::from("data/planets.db"));
  }

  #[tokio::test]
  async fn app_answers_with_cors() {
    let cfg = ServerConfig::load_from(no_file(), env(&[("DATABASE_URL", ":memory:")])).unwrap();
    let store = SqliteStore::open_in_memory().await.unwrap();
    let router = app(build_state(&cfg, store).unwrap());

    let req = Request::builder()
      .uri("/ping")
      .header(header::ORIGIN, "http://localhost:5173")
      .body(Body::empty())
      .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
  }

  #[tokio::test]
  async fn summary_without_key_is_501() {
    let cfg = ServerConfig::load_from(no_file(), env(&[("DATABASE_URL", ":memory:")])).unwrap();
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .import_json(serde_json::json!([{ "_id": "00000000000000000000000a", "pl_name": "X b" }]))
      .await
      .unwrap();
    let router = app(build_state(&cfg, store).unwrap());

    let req = Request::builder()
      .uri("/summarize/00000000000000000000000a?source=record")
      .body(Body::empty())
      .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
  }
}
