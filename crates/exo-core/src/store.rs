//! The `PlanetStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `exo-store-sqlite`).
//! Higher layers (`exo-api`, `exo-server`) depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::{
  planet::{Planet, PlanetId},
  query::PlanetQuery,
};

/// Read-only access to the planet catalog.
///
/// Records are bulk-loaded out of band; nothing in the request path writes.
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PlanetStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the page of records matching `query.filter`, ordered by
  /// `query.paging.sort`, after skipping `skip` and taking at most `limit`.
  ///
  /// Sort keys that are not planet columns are ignored.
  fn find<'a>(
    &'a self,
    query: &'a PlanetQuery,
  ) -> impl Future<Output = Result<Vec<Planet>, Self::Error>> + Send + 'a;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get<'a>(
    &'a self,
    id: &'a PlanetId,
  ) -> impl Future<Output = Result<Option<Planet>, Self::Error>> + Send + 'a;

  /// Approximate number of records, for diagnostics.
  fn count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
