//! Process-local summary cache with lazy expiry.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
  time::{Duration, Instant},
};

use exo_core::planet::PlanetId;

use crate::summarizer::Summary;

/// How long a generated summary is served before it is regenerated.
pub const SUMMARY_TTL: Duration = Duration::from_secs(60 * 60);

// ─── Clock ───────────────────────────────────────────────────────────────────

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
  fn now(&self) -> Instant;
}

/// The monotonic system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> Instant { Instant::now() }
}

// ─── Cache ───────────────────────────────────────────────────────────────────

struct Entry {
  summary:    Summary,
  created_at: Instant,
}

/// Summaries keyed by planet id.
///
/// An entry is served while `now - created_at < ttl`; the first read at or
/// past that point removes it. Nothing else evicts, so the map grows with the
/// number of distinct ids summarised within an hour. The lock is only held
/// for the map operation itself.
pub struct SummaryCache {
  ttl:     Duration,
  clock:   Arc<dyn Clock>,
  entries: Mutex<HashMap<PlanetId, Entry>>,
}

impl Default for SummaryCache {
  fn default() -> Self { Self::new(SUMMARY_TTL) }
}

impl SummaryCache {
  pub fn new(ttl: Duration) -> Self { Self::with_clock(ttl, Arc::new(SystemClock)) }

  pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
    Self {
      ttl,
      clock,
      entries: Mutex::new(HashMap::new()),
    }
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  pub fn get(&self, id: &PlanetId) -> Option<Summary> {
    let now = self.clock.now();
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    let entry = entries.get(id)?;
    if now.saturating_duration_since(entry.created_at) < self.ttl {
      return Some(entry.summary.clone());
    }
    entries.remove(id);
    None
  }

  /// Store `summary` under `id`, replacing any previous entry.
  pub fn insert(&self, id: PlanetId, summary: Summary) {
    let entry = Entry {
      summary,
      created_at: self.clock.now(),
    };
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(id, entry);
  }

  pub fn len(&self) -> usize {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Test clock ──────────────────────────────────────────────────────────────

/// A clock that only moves when told to.
#[cfg(test)]
pub(crate) struct ManualClock {
  start:  Instant,
  offset: Mutex<Duration>,
}

#[cfg(test)]
impl ManualClock {
  pub(crate) fn new() -> Self {
    Self {
      start:  Instant::now(),
      offset: Mutex::new(Duration::ZERO),
    }
  }

  pub(crate) fn advance(&self, by: Duration) { *self.offset.lock().unwrap() += by; }
}

#[cfg(test)]
impl Clock for ManualClock {
  fn now(&self) -> Instant { self.start + *self.offset.lock().unwrap() }
}
