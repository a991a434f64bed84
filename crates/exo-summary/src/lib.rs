//! Planet summaries for the exoplanet browser.
//!
//! A summary is produced from one of two sources: the discovery paper linked
//! from a record's `pl_refname`, or the record itself. Source text is turned
//! into a prompt, sent to a [`GenerativeModel`], trimmed to a sentence cap,
//! and kept in a process-local [`SummaryCache`] for an hour. The
//! [`relay`](relay::relay) forwards a streamed generation chunk by chunk.

#![allow(async_fn_in_trait)]

pub mod cache;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod gemini;
pub mod link;
pub mod model;
pub mod prompt;
pub mod relay;
pub mod summarizer;

#[cfg(test)]
mod testing;

pub use cache::SummaryCache;
pub use error::{Error, Result};
pub use gemini::GeminiClient;
pub use model::GenerativeModel;
pub use relay::RelayEvent;
pub use summarizer::{Summarizer, Summary, SummarySource};
