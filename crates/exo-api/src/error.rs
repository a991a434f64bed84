//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// An error returned by an API handler.
///
/// Every variant renders as `{"error": "<message>"}`; `Unprocessable` also
/// carries `sourceUrl`. Store errors are logged and rendered generically, so
/// `Internal` messages must not carry upstream detail.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("unprocessable: {message}")]
  Unprocessable { message: String, source_url: String },

  #[error("not configured: {0}")]
  NotConfigured(String),

  #[error("upstream failure: {0}")]
  Upstream(String),

  #[error("upstream timeout: {0}")]
  Timeout(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    ApiError::Store(Box::new(err))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::NotConfigured(_) => StatusCode::NOT_IMPLEMENTED,
      ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
      ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
      ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<exo_summary::Error> for ApiError {
  fn from(err: exo_summary::Error) -> Self {
    use exo_summary::Error as E;
    match err {
      E::NoLink => ApiError::BadRequest("No link found in pl_refname".into()),
      E::UnsafeUrl(_) => ApiError::BadRequest("Unsafe or unsupported URL".into()),
      E::InsufficientText { source_url, .. } => ApiError::Unprocessable {
        message: "Could not extract enough text to summarize".into(),
        source_url,
      },
      E::NotConfigured => ApiError::NotConfigured("LLM not configured. Set GOOGLE_API_KEY.".into()),
      E::FetchTimeout(url) => {
        warn!(%url, "source fetch timed out");
        ApiError::Timeout("Upstream fetch timed out".into())
      }
      e @ (E::FetchStatus { .. } | E::Http(_)) => {
        warn!(error = %e, "upstream request failed");
        ApiError::Upstream("Upstream request failed".into())
      }
      e @ (E::Provider(_) | E::UnrecognizedShape | E::EmptyResponse) => {
        warn!(error = %e, "summary generation failed");
        ApiError::Upstream("Summary generation failed".into())
      }
      e @ E::Json(_) => {
        error!(error = %e, "summary serialization failed");
        ApiError::Internal("Server error".into())
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = match self {
      ApiError::Unprocessable {
        message,
        source_url,
      } => json!({ "error": message, "sourceUrl": source_url }),
      ApiError::Store(e) => {
        error!(error = %e, "store error");
        json!({ "error": "Server error" })
      }
      ApiError::BadRequest(m)
      | ApiError::NotFound(m)
      | ApiError::NotConfigured(m)
      | ApiError::Upstream(m)
      | ApiError::Timeout(m)
      | ApiError::Internal(m) => json!({ "error": m }),
    };
    (status, Json(body)).into_response()
  }
}
