//! The summarise-a-planet pipeline: cache lookup, source resolution, prompt,
//! generation, post-pass, cache fill.

use std::sync::Arc;

use exo_core::planet::{Planet, PlanetId};
use futures::{StreamExt as _, stream::BoxStream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
  Result,
  cache::SummaryCache,
  extract::{extract_main_text, require_text},
  fetch::PageFetcher,
  link,
  model::{DEFAULT_MODEL, GenerativeModel, generate_text},
  prompt::{self, PAPER_SENTENCES, RECORD_SENTENCES, postprocess_summary},
  relay::{RelayEvent, relay},
};

// ─── Types ───────────────────────────────────────────────────────────────────

/// A generated summary as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
  pub id:            PlanetId,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_url:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title:         Option<String>,
  pub summary_model: String,
  pub summary:       String,
}

/// What a summary is generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
  /// The paper linked from the record's `pl_refname`.
  #[default]
  Paper,
  /// The catalog record itself.
  Record,
}

impl SummarySource {
  pub fn sentence_cap(self) -> usize {
    match self {
      Self::Paper => PAPER_SENTENCES,
      Self::Record => RECORD_SENTENCES,
    }
  }
}

/// A prompt ready to send, with the provenance that goes into the payload.
#[derive(Debug)]
struct Prepared {
  prompt:     String,
  source_url: Option<String>,
  title:      Option<String>,
}

// ─── Summarizer ──────────────────────────────────────────────────────────────

/// Produces and caches planet summaries.
///
/// Paper and record summaries are cached separately, each keyed by planet
/// id. Failures are never cached. Concurrent misses for one id each run the
/// full pipeline and the last to finish wins.
pub struct Summarizer<M> {
  provider:     Arc<M>,
  models:       Vec<String>,
  fetcher:      PageFetcher,
  paper_cache:  Arc<SummaryCache>,
  record_cache: Arc<SummaryCache>,
}

impl<M: GenerativeModel + 'static> Summarizer<M> {
  pub fn new(provider: Arc<M>) -> Result<Self> {
    Ok(Self {
      provider,
      models: vec![DEFAULT_MODEL.to_owned()],
      fetcher: PageFetcher::new()?,
      paper_cache: Arc::new(SummaryCache::default()),
      record_cache: Arc::new(SummaryCache::default()),
    })
  }

  /// Replace the model list. An empty list leaves the current one in place.
  pub fn with_models(mut self, models: Vec<String>) -> Self {
    if !models.is_empty() {
      self.models = models;
    }
    self
  }

  pub fn with_caches(mut self, paper: SummaryCache, record: SummaryCache) -> Self {
    self.paper_cache = Arc::new(paper);
    self.record_cache = Arc::new(record);
    self
  }

  pub fn provider(&self) -> &Arc<M> { &self.provider }

  pub fn cache(&self, source: SummarySource) -> &Arc<SummaryCache> {
    match source {
      SummarySource::Paper => &self.paper_cache,
      SummarySource::Record => &self.record_cache,
    }
  }

  /// A fresh cached summary of planet `id` from `source`, if any.
  pub fn cached(&self, id: &PlanetId, source: SummarySource) -> Option<Summary> {
    let hit = self.cache(source).get(id);
    if hit.is_some() {
      debug!(%id, ?source, "summary cache hit");
    }
    hit
  }

  /// Replay a finished summary as a one-chunk stream.
  pub fn replay(summary: Summary) -> BoxStream<'static, RelayEvent> {
    let events = [RelayEvent::Chunk(summary.summary), RelayEvent::Done];
    futures::stream::iter(events).boxed()
  }

  fn primary_model(&self) -> &str {
    self.models.first().map(String::as_str).unwrap_or(DEFAULT_MODEL)
  }

  /// Summarise `planet` from `source`, serving a cached result when one is
  /// still fresh.
  pub async fn summarize(&self, planet: &Planet, source: SummarySource) -> Result<Summary> {
    if let Some(hit) = self.cached(&planet.id, source) {
      return Ok(hit);
    }
    let cache = self.cache(source);
    debug!(id = %planet.id, ?source, "summary cache miss");

    let prepared = self.prepare(planet, source).await?;
    let generated = generate_text(self.provider.as_ref(), &self.models, &prepared.prompt).await?;

    let summary = Summary {
      id:            planet.id.clone(),
      source_url:    prepared.source_url,
      title:         prepared.title,
      summary_model: generated.model,
      summary:       postprocess_summary(&generated.text, source.sentence_cap()),
    };
    cache.insert(planet.id.clone(), summary.clone());
    info!(id = %planet.id, ?source, "summary generated");
    Ok(summary)
  }

  /// Stream a summary of `planet` from `source`.
  ///
  /// Errors resolving the source are returned before any event is produced.
  /// A fresh cached summary is sent as one chunk. Otherwise chunks are
  /// relayed as they arrive and, once the stream completes, the
  /// post-processed text is cached. A fallback reply replaces whatever
  /// chunks came before it.
  pub async fn stream(
    &self,
    planet: &Planet,
    source: SummarySource,
  ) -> Result<BoxStream<'static, RelayEvent>> {
    if let Some(hit) = self.cached(&planet.id, source) {
      return Ok(Self::replay(hit));
    }
    let cache = self.cache(source).clone();

    let Prepared {
      prompt,
      source_url,
      title,
    } = self.prepare(planet, source).await?;
    let model = self.primary_model().to_owned();
    let upstream = relay(self.provider.clone(), model.clone(), prompt);
    let id = planet.id.clone();
    let cap = source.sentence_cap();

    let events = async_stream::stream! {
      let mut upstream = std::pin::pin!(upstream);
      let mut collected = String::new();
      while let Some(event) = upstream.next().await {
        match &event {
          RelayEvent::Chunk(text) => collected.push_str(text),
          RelayEvent::Fallback(text) => collected.clone_from(text),
          RelayEvent::Done => cache.insert(id.clone(), Summary {
            id:            id.clone(),
            source_url:    source_url.clone(),
            title:         title.clone(),
            summary_model: model.clone(),
            summary:       postprocess_summary(&collected, cap),
          }),
          RelayEvent::Error(_) => {}
        }
        yield event;
      }
    };
    Ok(events.boxed())
  }

  async fn prepare(&self, planet: &Planet, source: SummarySource) -> Result<Prepared> {
    match source {
      SummarySource::Record => Ok(Prepared {
        prompt:     prompt::record_prompt(planet)?,
        source_url: None,
        title:      None,
      }),
      SummarySource::Paper => {
        let url = link::source_url(planet.pl_refname.as_deref())?;
        self.prepare_paper(planet, url).await
      }
    }
  }

  /// Fetch and extract the paper at `url`, which must already be vetted.
  async fn prepare_paper(&self, planet: &Planet, url: String) -> Result<Prepared> {
    let html = self.fetcher.fetch_html(&url).await?;
    let extracted = require_text(&url, extract_main_text(&html))?;
    debug!(%url, chars = extracted.text.len(), "extracted source text");

    let name = planet.pl_name.as_deref().unwrap_or("this planet");
    Ok(Prepared {
      prompt:     prompt::paper_prompt(name, extracted.title.as_deref(), &extracted.text),
      source_url: Some(url),
      title:      extracted.title,
    })
  }
}
