//! Error type for `exo-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] exo_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The import payload was not an array of JSON objects.
  #[error("invalid import: {0}")]
  InvalidImport(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
