//! Handlers for similar-period planets.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/planets/:id/similar` | `?tolerance=<pct>&limit=<n>`; 400 if the planet has no period |
//! | `GET`  | `/similar` | `?period=<days>&tolerance=<pct>&limit=<n>` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use exo_core::{
  listing::{SimilarityOptions, similar_by_period},
  planet::Planet,
  query::{MAX_LIMIT, Paging, PlanetFilter, PlanetQuery, parse_finite},
  store::PlanetStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, planets::load};

#[derive(Debug, Default, Deserialize)]
pub struct SimilarParams {
  pub period:    Option<String>,
  pub tolerance: Option<String>,
  pub limit:     Option<String>,
}

impl SimilarParams {
  /// Options with malformed or out-of-range values left at their defaults.
  fn options(&self) -> SimilarityOptions {
    let mut opts = SimilarityOptions::default();
    if let Some(pct) = self.tolerance.as_deref().and_then(parse_finite).filter(|p| *p > 0.0) {
      opts.tolerance_pct = pct;
    }
    if let Some(n) = self.limit.as_deref().and_then(parse_finite) {
      opts.limit = n.trunc().clamp(1.0, MAX_LIMIT as f64) as usize;
    }
    opts
  }
}

/// Page through the store for up to `opts.pool` planets inside the period
/// band, then rank them.
async fn rank<S: PlanetStore>(
  store: &S,
  target_period: f64,
  opts: &SimilarityOptions,
) -> Result<Vec<Planet>, ApiError> {
  let filter = PlanetFilter {
    pl_orbper: Some(opts.band(target_period)),
    ..PlanetFilter::default()
  };

  let mut pool = Vec::new();
  while pool.len() < opts.pool {
    let mut paging = Paging::default().with_limit(opts.pool - pool.len());
    paging.skip = pool.len();
    let page = store
      .find(&PlanetQuery::new(filter.clone(), paging.clone()))
      .await
      .map_err(ApiError::store)?;
    let exhausted = page.len() < paging.limit;
    pool.extend(page);
    if exhausted {
      break;
    }
  }

  Ok(similar_by_period(&pool, target_period, opts))
}

/// `GET /planets/:id/similar`
pub async fn for_planet<S, M>(
  State(state): State<AppState<S, M>>,
  Path(id): Path<String>,
  Query(params): Query<SimilarParams>,
) -> Result<Json<Vec<Planet>>, ApiError>
where
  S: PlanetStore,
{
  let planet = load(state.store.as_ref(), &id).await?;
  let period = planet
    .pl_orbper
    .filter(|p| p.is_finite() && *p > 0.0)
    .ok_or_else(|| ApiError::BadRequest("Planet has no orbital period".into()))?;

  let opts = SimilarityOptions {
    exclude: Some(planet.id),
    ..params.options()
  };
  Ok(Json(rank(state.store.as_ref(), period, &opts).await?))
}

/// `GET /similar?period=<days>`
pub async fn for_period<S, M>(
  State(state): State<AppState<S, M>>,
  Query(params): Query<SimilarParams>,
) -> Result<Json<Vec<Planet>>, ApiError>
where
  S: PlanetStore,
{
  let period = params
    .period
    .as_deref()
    .and_then(parse_finite)
    .filter(|p| *p > 0.0)
    .ok_or_else(|| ApiError::BadRequest("Invalid period".into()))?;

  Ok(Json(rank(state.store.as_ref(), period, &params.options()).await?))
}
