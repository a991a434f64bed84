//! Handlers for planet listing and lookup.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/planets` | Filters, `limit`, `skip`, `sort` |
//! | `GET`  | `/planets/:id` | 400 on a malformed id, 404 if not found |
//! | `GET`  | `/confirmed` | Disposition `CONFIRMED`; `limit`, `skip`, `sort` |
//! | `GET`  | `/candidate` | Disposition `CANDIDATE` |
//! | `GET`  | `/false_positive` | Disposition `FALSE POSITIVE` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use exo_core::{
  planet::{Disposition, Planet, PlanetId},
  query::{ListParams, Paging, PlanetFilter, PlanetQuery},
  store::PlanetStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

pub(crate) fn parse_id(raw_id: &str) -> Result<PlanetId, ApiError> {
  PlanetId::parse(raw_id).map_err(|_| ApiError::BadRequest("Invalid ID".into()))
}

pub(crate) async fn load_by_id<S: PlanetStore>(store: &S, id: &PlanetId) -> Result<Planet, ApiError> {
  store
    .get(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Planet not found".into()))
}

/// Load a planet by its path id, mapping a bad id to 400 and a miss to 404.
pub(crate) async fn load<S: PlanetStore>(store: &S, raw_id: &str) -> Result<Planet, ApiError> {
  load_by_id(store, &parse_id(raw_id)?).await
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /planets[?pl_name&hostname&disposition&disc_year&...&limit&skip&sort]`
pub async fn list<S, M>(
  State(state): State<AppState<S, M>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Planet>>, ApiError>
where
  S: PlanetStore,
{
  let query = PlanetQuery::from(params);
  let planets = state.store.find(&query).await.map_err(ApiError::store)?;
  Ok(Json(planets))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /planets/:id`
pub async fn get_one<S, M>(
  State(state): State<AppState<S, M>>,
  Path(id): Path<String>,
) -> Result<Json<Planet>, ApiError>
where
  S: PlanetStore,
{
  Ok(Json(load(state.store.as_ref(), &id).await?))
}

// ─── By disposition ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PagingParams {
  pub limit: Option<String>,
  pub skip:  Option<String>,
  pub sort:  Option<String>,
}

async fn by_disposition<S: PlanetStore>(
  store: &S,
  disposition: Disposition,
  params: PagingParams,
) -> Result<Json<Vec<Planet>>, ApiError> {
  let paging = Paging::from_params(
    params.limit.as_deref(),
    params.skip.as_deref(),
    params.sort.as_deref(),
  );
  let query = PlanetQuery::new(PlanetFilter::disposition(disposition), paging);
  let planets = store.find(&query).await.map_err(ApiError::store)?;
  Ok(Json(planets))
}

/// `GET /confirmed`
pub async fn confirmed<S, M>(
  State(state): State<AppState<S, M>>,
  Query(params): Query<PagingParams>,
) -> Result<Json<Vec<Planet>>, ApiError>
where
  S: PlanetStore,
{
  by_disposition(state.store.as_ref(), Disposition::Confirmed, params).await
}

/// `GET /candidate`
pub async fn candidate<S, M>(
  State(state): State<AppState<S, M>>,
  Query(params): Query<PagingParams>,
) -> Result<Json<Vec<Planet>>, ApiError>
where
  S: PlanetStore,
{
  by_disposition(state.store.as_ref(), Disposition::Candidate, params).await
}

/// `GET /false_positive`
pub async fn false_positive<S, M>(
  State(state): State<AppState<S, M>>,
  Query(params): Query<PagingParams>,
) -> Result<Json<Vec<Planet>>, ApiError>
where
  S: PlanetStore,
{
  by_disposition(state.store.as_ref(), Disposition::FalsePositive, params).await
}
