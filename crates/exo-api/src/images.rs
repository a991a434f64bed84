//! Image search proxy over SerpAPI's `google_images` engine.
//!
//! `GET /images?q=<query>[&num=<n>]` returns `{"images": [url, ...]}`.

use axum::{
  Json,
  extract::{Query, State},
};
use exo_core::query::parse_finite;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::{AppState, error::ApiError};

pub const SERPAPI_ENDPOINT: &str = "https://serpapi.com/search.json";
pub const DEFAULT_NUM: usize = 12;
pub const MAX_NUM: usize = 50;

/// Pull up to `num` image URLs out of a SerpAPI reply, preferring the
/// original over the thumbnail.
pub fn image_urls(reply: &Value, num: usize) -> Vec<String> {
  let Some(results) = reply.get("images_results").and_then(Value::as_array) else {
    return Vec::new();
  };
  results
    .iter()
    .filter_map(|r| {
      ["original", "thumbnail"]
        .into_iter()
        .find_map(|key| r.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()))
    })
    .take(num)
    .map(str::to_owned)
    .collect()
}

/// SerpAPI client. Without a key every search fails as not configured.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ImageSearch {
  client:   Client,
  api_key:  Option<String>,
  endpoint: String,
}

impl ImageSearch {
  pub fn new(api_key: Option<String>) -> Result<Self, reqwest::Error> {
    Ok(Self {
      client:   Client::builder().timeout(std::time::Duration::from_secs(20)).build()?,
      api_key:  api_key.filter(|k| !k.trim().is_empty()),
      endpoint: SERPAPI_ENDPOINT.to_owned(),
    })
  }

  pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
    self.endpoint = endpoint.into();
    self
  }

  pub async fn search(&self, params: &ImageParams) -> Result<Vec<String>, ApiError> {
    let q = params
      .q
      .as_deref()
      .map(str::trim)
      .filter(|q| !q.is_empty())
      .ok_or_else(|| ApiError::BadRequest("Missing q parameter".into()))?;
    let key = self
      .api_key
      .as_deref()
      .ok_or_else(|| ApiError::Internal("SERP_API_KEY not configured on server".into()))?;

    let mut query = vec![
      ("engine", "google_images"),
      ("q", q),
      ("gl", params.gl.as_deref().unwrap_or("us")),
      ("hl", params.hl.as_deref().unwrap_or("en")),
      ("api_key", key),
    ];
    if let Some(tbs) = params.tbs.as_deref() {
      query.push(("tbs", tbs));
    }

    let resp = self
      .client
      .get(&self.endpoint)
      .header("accept", "application/json")
      .query(&query)
      .send()
      .await
      .map_err(|e| {
        warn!(error = %e, "image search request failed");
        ApiError::Upstream("Image search failed".into())
      })?;

    let status = resp.status();
    if !status.is_success() {
      warn!(%status, "image search answered with an error");
      return Err(ApiError::Upstream(format!("SerpAPI error {}", status.as_u16())));
    }
    let reply: Value = resp
      .json()
      .await
      .map_err(|_| ApiError::Upstream("Invalid JSON from SerpAPI".into()))?;

    Ok(image_urls(&reply, params.num()))
  }
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageParams {
  pub q:   Option<String>,
  pub num: Option<String>,
  pub gl:  Option<String>,
  pub hl:  Option<String>,
  pub tbs: Option<String>,
}

impl ImageParams {
  /// Requested result count, within `1..=MAX_NUM`.
  pub fn num(&self) -> usize {
    self
      .num
      .as_deref()
      .and_then(parse_finite)
      .map(|n| n.trunc().clamp(1.0, MAX_NUM as f64) as usize)
      .unwrap_or(DEFAULT_NUM)
  }
}

/// `GET /images?q=<query>[&num=<n>]`
pub async fn handler<S, M>(
  State(state): State<AppState<S, M>>,
  Query(params): Query<ImageParams>,
) -> Result<Json<Value>, ApiError> {
  let images = state.images.search(&params).await?;
  Ok(Json(json!({ "images": images })))
}
