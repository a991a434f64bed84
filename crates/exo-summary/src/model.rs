//! The `GenerativeModel` trait and model-list generation.

use std::{future::Future, pin::Pin};

use futures::Stream;
use tracing::warn;

use crate::{Error, Result};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Incremental text from a streamed generation.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A text-generation provider.
///
/// `model` names the provider-side model id. Implementations that lack
/// credentials fail with [`Error::NotConfigured`] when called.
pub trait GenerativeModel: Send + Sync {
  /// Generate a complete reply to `prompt`.
  fn generate<'a>(
    &'a self,
    model: &'a str,
    prompt: &'a str,
  ) -> impl Future<Output = Result<String>> + Send + 'a;

  /// Start a streamed reply to `prompt`.
  ///
  /// Errors opening the stream are returned directly; errors while reading
  /// it arrive as stream items.
  fn generate_stream<'a>(
    &'a self,
    model: &'a str,
    prompt: &'a str,
  ) -> impl Future<Output = Result<TextStream>> + Send + 'a;
}

/// A reply together with the model that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
  pub model: String,
  pub text:  String,
}

/// Try each of `models` in order and return the first successful reply.
///
/// There is no retry: each model is asked once and the last error is
/// returned if every one fails.
pub async fn generate_text<M: GenerativeModel>(
  provider: &M,
  models: &[String],
  prompt: &str,
) -> Result<Generated> {
  let mut last_err = Error::NotConfigured;
  for model in models {
    match provider.generate(model, prompt).await {
      Ok(text) => {
        return Ok(Generated {
          model: model.clone(),
          text,
        });
      }
      Err(e) => {
        warn!(%model, error = %e, "generation failed");
        last_err = e;
      }
    }
  }
  Err(last_err)
}
