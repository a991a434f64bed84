//! Error types for `exo-summary`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no link found in pl_refname")]
  NoLink,

  #[error("unsafe or unsupported URL: {0}")]
  UnsafeUrl(String),

  #[error("only {len} characters of text extracted from {source_url}")]
  InsufficientText { source_url: String, len: usize },

  #[error("generative model not configured")]
  NotConfigured,

  #[error("timed out fetching {0}")]
  FetchTimeout(String),

  #[error("{url} answered {status}")]
  FetchStatus { url: String, status: u16 },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("provider error: {0}")]
  Provider(String),

  #[error("unrecognized provider response shape")]
  UnrecognizedShape,

  #[error("empty provider response")]
  EmptyResponse,

  #[error("serialization error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
