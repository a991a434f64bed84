//! [`SqliteStore`], the SQLite implementation of [`PlanetStore`].

use std::path::Path;

use exo_core::{
  planet::{Planet, PlanetId},
  query::PlanetQuery,
  store::PlanetStore,
};
use rusqlite::OptionalExtension as _;
use tracing::info;

use crate::{
  encode::{build_find, decode_import, decode_planet, encode_planet},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A planet catalog backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or replace `planets` in a single transaction.
  pub async fn insert_many(&self, planets: &[Planet]) -> Result<usize> {
    let rows: Vec<(String, String)> =
      planets.iter().map(encode_planet).collect::<Result<_>>()?;

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt =
            tx.prepare("INSERT OR REPLACE INTO planets (planet_id, doc) VALUES (?1, ?2)")?;
          for (id, doc) in &rows {
            stmt.execute(rusqlite::params![id, doc])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    Ok(written)
  }

  /// Bulk-load a catalog export: a JSON array of planet documents.
  ///
  /// Documents may carry `_id` as a plain string or as `{"$oid": "..."}`;
  /// documents without one are assigned a fresh id.
  pub async fn import_json(&self, payload: serde_json::Value) -> Result<usize> {
    let serde_json::Value::Array(docs) = payload else {
      return Err(Error::InvalidImport("expected a JSON array".into()));
    };
    let planets = docs
      .into_iter()
      .map(decode_import)
      .collect::<Result<Vec<_>>>()?;
    let written = self.insert_many(&planets).await?;
    info!(written, "imported planet documents");
    Ok(written)
  }
}

// ─── PlanetStore impl ────────────────────────────────────────────────────────

impl PlanetStore for SqliteStore {
  type Error = Error;

  async fn find(&self, query: &PlanetQuery) -> Result<Vec<Planet>> {
    let sql = build_find(query);

    let docs: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql.sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(sql.params), |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    docs.iter().map(|d| decode_planet(d)).collect()
  }

  async fn get(&self, id: &PlanetId) -> Result<Option<Planet>> {
    let id_str = id.to_string();

    let doc: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT doc FROM planets WHERE planet_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    doc.as_deref().map(decode_planet).transpose()
  }

  async fn count(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM planets", [], |row| row.get(0))?))
      .await?;
    Ok(n.max(0) as u64)
  }
}
