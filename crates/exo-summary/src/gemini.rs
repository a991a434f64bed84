//! Google Gemini over its REST API.
//!
//! `generateContent` for whole replies, `streamGenerateContent?alt=sse` for
//! streamed ones. Replies have changed shape across API and SDK revisions, so
//! [`normalize_response`] tries each known [`ResponseShape`] in turn.

use std::time::Duration;

use futures::{Stream, StreamExt as _};
use reqwest::{Client, Response};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  model::{GenerativeModel, TextStream},
};

pub const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ─── Response shapes ─────────────────────────────────────────────────────────

/// Known layouts of a generation reply, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
  /// `{"text": "..."}`
  DirectText,
  /// `{"output": [{"content": [{"text": "..."}]}]}`
  OutputContent,
  /// `{"candidates": [{"content": {"parts": [{"text": "..."}, ...]}}]}`
  CandidateParts,
  /// Any of the above wrapped as `{"response": {...}}`.
  NestedResponse,
}

impl ResponseShape {
  pub const ALL: [Self; 4] = [
    Self::DirectText,
    Self::OutputContent,
    Self::CandidateParts,
    Self::NestedResponse,
  ];

  pub fn extract(self, value: &Value) -> Option<String> {
    match self {
      Self::DirectText => value.get("text")?.as_str().map(str::to_owned),
      Self::OutputContent => {
        let text = value.get("output")?.get(0)?.get("content")?.get(0)?.get("text")?;
        match text {
          Value::Null => None,
          Value::String(s) => Some(s.clone()),
          other => Some(other.to_string()),
        }
      }
      Self::CandidateParts => {
        let parts = value
          .get("candidates")?
          .get(0)?
          .get("content")?
          .get("parts")?
          .as_array()?;
        let text: String = parts
          .iter()
          .filter_map(|part| part.get("text").and_then(Value::as_str))
          .collect();
        (!text.is_empty()).then_some(text)
      }
      Self::NestedResponse => {
        let inner = value.get("response")?;
        [Self::DirectText, Self::OutputContent, Self::CandidateParts]
          .into_iter()
          .find_map(|shape| shape.extract(inner))
      }
    }
  }
}

/// Text of a whole reply. Unknown shapes come back as their raw JSON.
pub fn normalize_response(value: &Value) -> Result<String> {
  if value.is_null() {
    return Err(Error::EmptyResponse);
  }
  if let Some(text) = ResponseShape::ALL.into_iter().find_map(|s| s.extract(value)) {
    return Ok(text);
  }
  serde_json::to_string(value).map_err(|_| Error::UnrecognizedShape)
}

/// Text of one streamed increment. Increments without text (for example a
/// final usage-metadata frame) yield `None`.
fn increment_text(value: &Value) -> Result<Option<String>> {
  if let Some(err) = value.get("error") {
    let message = err
      .get("message")
      .and_then(Value::as_str)
      .unwrap_or("stream error");
    return Err(Error::Provider(message.to_owned()));
  }
  Ok(ResponseShape::ALL.into_iter().find_map(|s| s.extract(value)))
}

// ─── SSE framing ─────────────────────────────────────────────────────────────

/// Splits a byte stream into the payloads of `data:` lines.
#[derive(Debug, Default)]
pub struct SseLines {
  pending: Vec<u8>,
}

impl SseLines {
  /// Feed bytes; returns the `data:` payloads completed by them.
  pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
    self.pending.extend_from_slice(bytes);
    let mut out = Vec::new();
    while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
      let line: Vec<u8> = self.pending.drain(..=pos).collect();
      if let Some(data) = data_payload(&line) {
        out.push(data);
      }
    }
    out
  }

  /// Flush a final line that had no trailing newline.
  pub fn finish(&mut self) -> Option<String> {
    let line = std::mem::take(&mut self.pending);
    data_payload(&line)
  }
}

fn data_payload(line: &[u8]) -> Option<String> {
  let line = String::from_utf8_lossy(line);
  let data = line.trim_end_matches(['\r', '\n']).strip_prefix("data:")?.trim();
  (!data.is_empty() && data != "[DONE]").then(|| data.to_owned())
}

fn sse_text_stream(resp: Response) -> impl Stream<Item = Result<String>> + Send {
  async_stream::try_stream! {
    let mut body = std::pin::pin!(resp.bytes_stream());
    let mut lines = SseLines::default();
    while let Some(bytes) = body.next().await {
      let bytes = bytes?;
      for data in lines.push(&bytes) {
        let value: Value = serde_json::from_str(&data)?;
        if let Some(text) = increment_text(&value)? {
          yield text;
        }
      }
    }
    if let Some(data) = lines.finish() {
      let value: Value = serde_json::from_str(&data)?;
      if let Some(text) = increment_text(&value)? {
        yield text;
      }
    }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Gemini REST client.
///
/// A missing or empty API key is accepted at construction; every call then
/// fails with [`Error::NotConfigured`].
#[derive(Clone)]
pub struct GeminiClient {
  client:   Client,
  api_key:  Option<String>,
  base_url: String,
}

impl GeminiClient {
  pub fn new(api_key: Option<String>) -> Result<Self> {
    let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
    Ok(Self {
      client,
      api_key: api_key.filter(|k| !k.trim().is_empty()),
      base_url: API_BASE.to_owned(),
    })
  }

  /// Point the client at another endpoint root.
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  pub fn is_configured(&self) -> bool { self.api_key.is_some() }

  fn url(&self, model: &str, method: &str) -> String {
    format!("{}/models/{model}:{method}", self.base_url.trim_end_matches('/'))
  }

  async fn post(&self, url: String, prompt: &str, timeout: Option<Duration>) -> Result<Response> {
    let key = self.api_key.as_deref().ok_or(Error::NotConfigured)?;
    let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

    let mut req = self.client.post(url).header("x-goog-api-key", key).json(&body);
    if let Some(timeout) = timeout {
      req = req.timeout(timeout);
    }
    let resp = req.send().await?;

    let status = resp.status();
    if !status.is_success() {
      let detail = resp.text().await.unwrap_or_default();
      warn!(%status, %detail, "gemini request failed");
      return Err(Error::Provider(format!("gemini answered {status}")));
    }
    Ok(resp)
  }
}

impl GenerativeModel for GeminiClient {
  async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
    debug!(model, prompt_chars = prompt.len(), "gemini generateContent");
    let resp = self
      .post(self.url(model, "generateContent"), prompt, Some(REQUEST_TIMEOUT))
      .await?;
    let value: Value = resp.json().await?;
    normalize_response(&value)
  }

  async fn generate_stream(&self, model: &str, prompt: &str) -> Result<TextStream> {
    debug!(model, prompt_chars = prompt.len(), "gemini streamGenerateContent");
    let url = format!("{}?alt=sse", self.url(model, "streamGenerateContent"));
    let resp = self.post(url, prompt, None).await?;
    Ok(sse_text_stream(resp).boxed())
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    routing::post,
  };
  use futures::TryStreamExt as _;
  use tokio::net::TcpListener;

  use super::*;

  #[test]
  fn shapes_in_order() {
    let direct = json!({ "text": "direct", "candidates": [] });
    assert_eq!(normalize_response(&direct).unwrap(), "direct");

    let output = json!({ "output": [{ "content": [{ "text": "from output" }] }] });
    assert_eq!(normalize_response(&output).unwrap(), "from output");

    let candidates = json!({
      "candidates": [{ "content": { "parts": [{ "text": "Hello, " }, { "text": "world." }] } }]
    });
    assert_eq!(normalize_response(&candidates).unwrap(), "Hello, world.");

    let nested = json!({ "response": { "text": "inner" } });
    assert_eq!(normalize_response(&nested).unwrap(), "inner");
  }

  #[test]
  fn unknown_shape_falls_back_to_json() {
    let odd = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
    assert_eq!(
      normalize_response(&odd).unwrap(),
      r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#
    );
    assert!(matches!(normalize_response(&Value::Null), Err(Error::EmptyResponse)));
  }

  #[test]
  fn sse_lines_across_chunk_boundaries() {
    let mut lines = SseLines::default();
    assert!(lines.push(b"data: {\"te").is_empty());
    assert_eq!(lines.push(b"xt\":\"a\"}\r\n\r\n: comment\ndata: [DONE]\n"), vec![
      r#"{"text":"a"}"#.to_string()
    ]);
    assert!(lines.push(b"event: x\ndata:{\"text\":\"b\"}").is_empty());
    assert_eq!(lines.finish().as_deref(), Some(r#"{"text":"b"}"#));
    assert_eq!(lines.finish(), None);
  }

  #[tokio::test]
  async fn missing_key_fails_at_call_time() {
    let client = GeminiClient::new(Some("  ".into())).unwrap();
    assert!(!client.is_configured());
    assert!(matches!(
      client.generate("gemini-2.5-flash", "hi").await,
      Err(Error::NotConfigured)
    ));
    assert!(matches!(
      client.generate_stream("gemini-2.5-flash", "hi").await,
      Err(Error::NotConfigured)
    ));
  }

  async fn fake_gemini() -> String {
    let app = Router::new()
      .route(
        "/models/{call}",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
          assert_eq!(headers["x-goog-api-key"], "k");
          let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap().to_owned();
          Json(json!({
            "candidates": [{ "content": { "parts": [{ "text": format!("echo: {prompt}") }] } }]
          }))
        }),
      )
      .route(
        "/v2/models/{call}",
        post(|| async {
          (
            [("content-type", "text/event-stream")],
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"One. \"}]}}]}\r\n\r\n\
             data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Two.\"}]}}]}\r\n\r\n\
             data: {\"usageMetadata\":{\"totalTokenCount\":5}}\r\n\r\n",
          )
        }),
      )
      .route(
        "/broken/models/{call}",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
      );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  #[tokio::test]
  async fn generate_against_local_endpoint() {
    let base = fake_gemini().await;
    let client = GeminiClient::new(Some("k".into())).unwrap().with_base_url(&base);
    assert_eq!(client.generate("m", "ping").await.unwrap(), "echo: ping");

    let broken = GeminiClient::new(Some("k".into()))
      .unwrap()
      .with_base_url(format!("{base}/broken"));
    assert!(matches!(broken.generate("m", "ping").await, Err(Error::Provider(_))));
  }

  #[tokio::test]
  async fn stream_against_local_endpoint() {
    let base = fake_gemini().await;
    let client = GeminiClient::new(Some("k".into()))
      .unwrap()
      .with_base_url(format!("{base}/v2"));
    let chunks: Vec<String> = client
      .generate_stream("m", "ping")
      .await
      .unwrap()
      .try_collect()
      .await
      .unwrap();
    assert_eq!(chunks, vec!["One. ".to_string(), "Two.".to_string()]);
  }
}
