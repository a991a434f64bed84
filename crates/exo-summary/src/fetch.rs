//! Fetching source pages over HTTP.

use std::time::Duration;

use reqwest::{Client, redirect::Policy};
use tracing::debug;

use crate::{Error, Result, link::is_safe_url};

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
pub const MAX_REDIRECTS: usize = 10;

const USER_AGENT: &str = concat!("exo-browser/", env!("CARGO_PKG_VERSION"));

/// Follows at most [`MAX_REDIRECTS`] hops and refuses any hop that
/// [`is_safe_url`] rejects.
fn redirect_policy() -> Policy {
  Policy::custom(|attempt| {
    if attempt.previous().len() > MAX_REDIRECTS {
      attempt.error("too many redirects")
    } else if !is_safe_url(attempt.url().as_str()) {
      attempt.error("redirect to a disallowed host")
    } else {
      attempt.follow()
    }
  })
}

/// HTTP client for downloading the pages that papers are summarised from.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct PageFetcher {
  client: Client,
}

impl PageFetcher {
  pub fn new() -> Result<Self> { Self::with_timeout(FETCH_TIMEOUT) }

  pub fn with_timeout(timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .redirect(redirect_policy())
      .user_agent(USER_AGENT)
      .build()?;
    Ok(Self { client })
  }

  /// `GET url` and return the body as text.
  ///
  /// The caller is responsible for vetting `url` itself.
  pub async fn fetch_html(&self, url: &str) -> Result<String> {
    debug!(url, "fetching source page");
    let resp = self
      .client
      .get(url)
      .send()
      .await
      .map_err(|e| classify(url, e))?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::FetchStatus {
        url:    url.to_owned(),
        status: status.as_u16(),
      });
    }
    resp.text().await.map_err(|e| classify(url, e))
  }
}

fn classify(url: &str, err: reqwest::Error) -> Error {
  if err.is_timeout() {
    Error::FetchTimeout(url.to_owned())
  } else {
    Error::Http(err)
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    Router,
    http::StatusCode,
    response::{Html, Redirect},
    routing::get,
  };
  use tokio::net::TcpListener;

  use super::*;

  async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  #[tokio::test]
  async fn fetches_body() {
    let base = serve(Router::new().route("/page", get(|| async { Html("<p>hello</p>") }))).await;
    let html = PageFetcher::new()
      .unwrap()
      .fetch_html(&format!("{base}/page"))
      .await
      .unwrap();
    assert_eq!(html, "<p>hello</p>");
  }

  #[tokio::test]
  async fn non_success_status() {
    let base = serve(Router::new().route("/gone", get(|| async { StatusCode::GONE }))).await;
    let err = PageFetcher::new()
      .unwrap()
      .fetch_html(&format!("{base}/gone"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::FetchStatus { status: 410, .. }), "{err:?}");
  }

  #[tokio::test]
  async fn slow_server_times_out() {
    let app = Router::new().route(
      "/slow",
      get(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Html("late")
      }),
    );
    let base = serve(app).await;
    let err = PageFetcher::with_timeout(Duration::from_millis(100))
      .unwrap()
      .fetch_html(&format!("{base}/slow"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::FetchTimeout(_)), "{err:?}");
  }

  #[tokio::test]
  async fn refuses_redirect_to_loopback() {
    let app = Router::new()
      .route("/hop", get(|| async { Redirect::temporary("http://127.0.0.1:1/secret") }));
    let base = serve(app).await;
    let err = PageFetcher::new()
      .unwrap()
      .fetch_html(&format!("{base}/hop"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Http(ref e) if e.is_redirect()), "{err:?}");
  }
}
