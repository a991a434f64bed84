//! Forwarding a streamed generation as discrete events.

use std::sync::Arc;

use futures::{Stream, StreamExt as _};
use tracing::{info, warn};

use crate::model::GenerativeModel;

/// Message carried by [`RelayEvent::Error`]; details stay in the log.
pub const GENERATION_FAILED: &str = "Summary generation failed";

/// One event on a summary stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
  /// An increment of the streamed reply.
  Chunk(String),
  /// The whole reply from a full generation, sent after the stream failed.
  /// It supersedes any chunks sent before it.
  Fallback(String),
  Done,
  Error(String),
}

/// Relay a streamed generation of `prompt`.
///
/// Each non-empty upstream increment becomes one [`RelayEvent::Chunk`], in
/// order, followed by [`RelayEvent::Done`]. If the upstream stream cannot be
/// opened or fails part-way, the full reply is requested once instead and
/// sent as one [`RelayEvent::Fallback`]; if that fails too, the stream ends
/// with [`RelayEvent::Error`] carrying [`GENERATION_FAILED`].
///
/// Nothing happens until the returned stream is polled, and each poll pulls
/// at most one upstream increment. Dropping it drops the upstream stream.
pub fn relay<M>(provider: Arc<M>, model: String, prompt: String) -> impl Stream<Item = RelayEvent> + Send
where
  M: GenerativeModel + 'static,
{
  async_stream::stream! {
    info!(%model, "summary stream started");
    let mut failure = None;

    match provider.generate_stream(&model, &prompt).await {
      Ok(mut upstream) => {
        while let Some(item) = upstream.next().await {
          match item {
            Ok(text) => {
              if !text.is_empty() {
                yield RelayEvent::Chunk(text);
              }
            }
            Err(e) => {
              failure = Some(e);
              break;
            }
          }
        }
      }
      Err(e) => failure = Some(e),
    }

    match failure {
      None => {
        info!(%model, "summary stream finished");
        yield RelayEvent::Done;
      }
      Some(stream_err) => {
        warn!(%model, error = %stream_err, "streaming failed, falling back to full generation");
        match provider.generate(&model, &prompt).await {
          Ok(text) => {
            yield RelayEvent::Fallback(text);
            yield RelayEvent::Done;
          }
          Err(fallback_err) => {
            warn!(%model, stream_error = %stream_err, error = %fallback_err, "fallback generation failed");
            yield RelayEvent::Error(GENERATION_FAILED.to_owned());
          }
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::Ordering;

  use super::*;
  use crate::testing::FakeModel;

  async fn collect(model: FakeModel) -> (Vec<RelayEvent>, Arc<FakeModel>) {
    let model = Arc::new(model);
    let events = relay(model.clone(), "m".into(), "p".into()).collect().await;
    (events, model)
  }

  #[tokio::test]
  async fn forwards_chunks_in_order() {
    let (events, model) = collect(FakeModel::streaming(&["Kepler", "", "-22b."])).await;
    assert_eq!(events, vec![
      RelayEvent::Chunk("Kepler".into()),
      RelayEvent::Chunk("-22b.".into()),
      RelayEvent::Done,
    ]);
    assert_eq!(model.generate_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn falls_back_to_full_generation() {
    let (events, model) = collect(FakeModel {
      fail_stream: true,
      reply: "Whole reply.".into(),
      ..FakeModel::default()
    })
    .await;
    assert_eq!(events, vec![RelayEvent::Fallback("Whole reply.".into()), RelayEvent::Done]);
    assert_eq!(model.generate_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn mid_stream_failure_sends_fallback_after_partial_chunks() {
    let (events, model) = collect(FakeModel {
      fail_after: Some(1),
      ..FakeModel::streaming(&["Kepler-22 b orb", "its"])
    }
    .replying_with("Kepler-22 b orbits a Sun-like star."))
    .await;
    assert_eq!(events, vec![
      RelayEvent::Chunk("Kepler-22 b orb".into()),
      RelayEvent::Fallback("Kepler-22 b orbits a Sun-like star.".into()),
      RelayEvent::Done,
    ]);
    assert_eq!(model.generate_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn reports_a_generic_error_when_fallback_fails() {
    let (events, model) = collect(FakeModel {
      fail_stream: true,
      fail_generate: true,
      ..FakeModel::default()
    })
    .await;
    assert_eq!(events, vec![RelayEvent::Error(GENERATION_FAILED.into())]);
    assert_eq!(model.generate_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn dropping_the_relay_stops_upstream_reads() {
    let model = Arc::new(FakeModel::streaming(&["a", "b", "c", "d"]));
    let pulled = model.pulled.clone();

    let stream = relay(model, "m".into(), "p".into());
    assert_eq!(pulled.load(Ordering::SeqCst), 0);

    let mut stream = Box::pin(stream);
    assert_eq!(stream.next().await, Some(RelayEvent::Chunk("a".into())));
    drop(stream);

    assert_eq!(pulled.load(Ordering::SeqCst), 1);
  }
}
