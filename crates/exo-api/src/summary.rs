//! Handlers for planet summaries.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/summarize/:id` | `?source=paper\|record`, default `paper`; JSON payload |
//! | `GET`  | `/stream-summary/:id` | `?source=paper\|record`, default `record`; SSE |
//!
//! The stream sends `data: {"chunk": "..."}` per increment and ends with
//! either `event: done` (`data: {}`) or `event: error`
//! (`data: {"error": "..."}`). When streaming broke part-way, the full reply
//! follows as `data: {"chunk": "...", "replace": true}` and supersedes the
//! chunks already sent.
//!
//! A fresh cached summary is answered without touching the store.

use std::{convert::Infallible, time::Duration};

use axum::{
  Json,
  extract::{Path, Query, State},
  response::sse::{Event, KeepAlive, Sse},
};
use exo_core::store::PlanetStore;
use exo_summary::{GenerativeModel, RelayEvent, Summarizer, Summary, SummarySource};
use futures::{Stream, StreamExt as _};
use serde::Deserialize;
use serde_json::json;

use crate::{
  AppState,
  error::ApiError,
  planets::{load_by_id, parse_id},
};

const KEEP_ALIVE: Duration = Duration::from_secs(15);

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
  pub source: Option<String>,
}

impl SummaryParams {
  fn source(&self, default: SummarySource) -> Result<SummarySource, ApiError> {
    match self.source.as_deref().map(str::trim) {
      None | Some("") => Ok(default),
      Some(s) if s.eq_ignore_ascii_case("paper") => Ok(SummarySource::Paper),
      Some(s) if s.eq_ignore_ascii_case("record") => Ok(SummarySource::Record),
      Some(_) => Err(ApiError::BadRequest("source must be `paper` or `record`".into())),
    }
  }
}

/// `GET /summarize/:id[?source=paper|record]`
pub async fn summarize<S, M>(
  State(state): State<AppState<S, M>>,
  Path(id): Path<String>,
  Query(params): Query<SummaryParams>,
) -> Result<Json<Summary>, ApiError>
where
  S: PlanetStore,
  M: GenerativeModel + 'static,
{
  let source = params.source(SummarySource::Paper)?;
  let id = parse_id(&id)?;
  if let Some(hit) = state.summarizer.cached(&id, source) {
    return Ok(Json(hit));
  }
  let planet = load_by_id(state.store.as_ref(), &id).await?;
  let summary = state.summarizer.summarize(&planet, source).await?;
  Ok(Json(summary))
}

fn sse_event(event: RelayEvent) -> Event {
  match event {
    RelayEvent::Chunk(text) => Event::default().data(json!({ "chunk": text }).to_string()),
    RelayEvent::Fallback(text) => {
      Event::default().data(json!({ "chunk": text, "replace": true }).to_string())
    }
    RelayEvent::Done => Event::default().event("done").data("{}"),
    RelayEvent::Error(message) => {
      Event::default().event("error").data(json!({ "error": message }).to_string())
    }
  }
}

/// `GET /stream-summary/:id[?source=paper|record]`
pub async fn stream<S, M>(
  State(state): State<AppState<S, M>>,
  Path(id): Path<String>,
  Query(params): Query<SummaryParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError>
where
  S: PlanetStore,
  M: GenerativeModel + 'static,
{
  let source = params.source(SummarySource::Record)?;
  let id = parse_id(&id)?;
  let events = match state.summarizer.cached(&id, source) {
    Some(hit) => Summarizer::<M>::replay(hit),
    None => {
      let planet = load_by_id(state.store.as_ref(), &id).await?;
      state.summarizer.stream(&planet, source).await?
    }
  };

  let stream = events.map(|event| Ok::<_, Infallible>(sse_event(event)));
  Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE)))
}
