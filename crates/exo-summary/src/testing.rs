//! Test doubles shared by this crate's unit tests.

use std::sync::{
  Arc,
  atomic::{AtomicUsize, Ordering},
};

use futures::{StreamExt as _, stream};

use crate::{
  Error, Result,
  model::{GenerativeModel, TextStream},
};

/// A scripted model that counts how it is used.
#[derive(Default)]
pub(crate) struct FakeModel {
  pub reply:          String,
  pub chunks:         Vec<String>,
  pub fail_stream:    bool,
  /// Fail the stream after this many items have been handed out.
  pub fail_after:     Option<usize>,
  pub fail_generate:  bool,
  pub generate_calls: AtomicUsize,
  /// Upstream stream items handed out so far.
  pub pulled:         Arc<AtomicUsize>,
}

impl FakeModel {
  pub(crate) fn replying(reply: &str) -> Self {
    Self {
      reply: reply.into(),
      ..Self::default()
    }
  }

  pub(crate) fn streaming(chunks: &[&str]) -> Self {
    Self {
      chunks: chunks.iter().map(|c| c.to_string()).collect(),
      ..Self::default()
    }
  }

  pub(crate) fn replying_with(mut self, reply: &str) -> Self {
    self.reply = reply.into();
    self
  }
}

impl GenerativeModel for FakeModel {
  async fn generate(&self, _model: &str, _prompt: &str) -> Result<String> {
    self.generate_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_generate {
      return Err(Error::Provider("generate failed".into()));
    }
    Ok(self.reply.clone())
  }

  async fn generate_stream(&self, _model: &str, _prompt: &str) -> Result<TextStream> {
    if self.fail_stream {
      return Err(Error::Provider("stream failed".into()));
    }
    let pulled = self.pulled.clone();
    let fail_after = self.fail_after;
    let chunks = self.chunks.clone();
    Ok(
      stream::iter(chunks.into_iter().enumerate())
        .map(move |(i, chunk)| {
          pulled.fetch_add(1, Ordering::SeqCst);
          match fail_after {
            Some(n) if i >= n => Err(Error::Provider("stream broke".into())),
            _ => Ok(chunk),
          }
        })
        .boxed(),
    )
  }
}
