//! JSON REST API for the exoplanet browser.
//!
//! Exposes an axum [`Router`] backed by any [`PlanetStore`] and any
//! [`GenerativeModel`]. CORS, tracing and transport are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = exo_api::api_router(state).layer(CorsLayer::permissive());
//! ```

pub mod error;
pub mod images;
pub mod planets;
pub mod similar;
pub mod summary;


use std::sync::Arc;

use axum::{Json, Router, routing::get};
use exo_core::store::PlanetStore;
use exo_summary::{GenerativeModel, Summarizer};
use serde_json::{Value, json};

pub use error::ApiError;
pub use images::ImageSearch;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, M> {
  pub store:      Arc<S>,
  pub summarizer: Arc<Summarizer<M>>,
  pub images:     Arc<ImageSearch>,
}

impl<S, M> Clone for AppState<S, M> {
  fn clone(&self) -> Self {
    Self {
      store:      self.store.clone(),
      summarizer: self.summarizer.clone(),
      images:     self.images.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, M>(state: AppState<S, M>) -> Router<()>
where
  S: PlanetStore + 'static,
  M: GenerativeModel + 'static,
{
  Router::new()
    .route("/", get(root))
    .route("/ping", get(ping))
    // Planets
    .route("/planets", get(planets::list::<S, M>))
    .route("/planets/{id}", get(planets::get_one::<S, M>))
    .route("/confirmed", get(planets::confirmed::<S, M>))
    .route("/candidate", get(planets::candidate::<S, M>))
    .route("/false_positive", get(planets::false_positive::<S, M>))
    // Similar
    .route("/planets/{id}/similar", get(similar::for_planet::<S, M>))
    .route("/similar", get(similar::for_period::<S, M>))
    // Summaries
    .route("/summarize/{id}", get(summary::summarize::<S, M>))
    .route("/stream-summary/{id}", get(summary::stream::<S, M>))
    // Images
    .route("/images", get(images::handler::<S, M>))
    .fallback(not_found)
    .with_state(state)
}

async fn root() -> &'static str { "Exoplanet browser API. Try GET /planets." }

async fn ping() -> Json<Value> { Json(json!({ "ok": true, "message": "pong" })) }

async fn not_found() -> ApiError { ApiError::NotFound("Route not found".into()) }
