//! Prompt templates and the post-pass applied to model output.

use exo_core::planet::Planet;

use crate::Result;

/// The reply a model gives when its source text says nothing useful.
pub const NO_INFO: &str = "No information about this planet was found in the provided text.";

pub const PAPER_SENTENCES: usize = 5;
pub const RECORD_SENTENCES: usize = 3;

/// Longest source text embedded in a prompt, in characters.
pub const MAX_SOURCE_CHARS: usize = 150_000;

/// Cut `text` to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
  match text.char_indices().nth(max) {
    Some((idx, _)) => &text[..idx],
    None => text,
  }
}

fn rules(sentences: usize) -> String {
  format!(
    "Use only the text provided below. Answer with at most {sentences} plain \
     sentences. Do not add a heading, bullet points, or commentary about the \
     task. If the text contains nothing relevant, reply with exactly: {NO_INFO}"
  )
}

/// Prompt for summarising a planet's discovery paper.
pub fn paper_prompt(planet_name: &str, title: Option<&str>, text: &str) -> String {
  let title = title.map(|t| format!("Title: {t}\n")).unwrap_or_default();
  format!(
    "Summarize what this paper reports about the exoplanet {planet_name}.\n{}\n\n\
     {title}Text:\n{}",
    rules(PAPER_SENTENCES),
    truncate_chars(text, MAX_SOURCE_CHARS),
  )
}

/// The catalog record as embedded in a prompt.
pub fn record_text(planet: &Planet) -> Result<String> {
  let json = serde_json::to_string_pretty(planet)?;
  Ok(truncate_chars(&json, MAX_SOURCE_CHARS).to_owned())
}

/// Prompt for summarising a planet from its own catalog record.
pub fn record_prompt(planet: &Planet) -> Result<String> {
  let name = planet.pl_name.as_deref().unwrap_or("this planet");
  Ok(format!(
    "Describe the exoplanet {name} for a general audience using its NASA \
     Exoplanet Archive record. Column names follow the archive conventions.\n{}\n\n\
     Record:\n{}",
    rules(RECORD_SENTENCES),
    record_text(planet)?,
  ))
}

/// Split on `.`, `!` or `?` followed by whitespace or the end of input.
/// A trailing fragment without terminal punctuation counts as a sentence.
fn sentences(text: &str) -> Vec<String> {
  let mut out = Vec::new();
  let mut start = 0;
  let mut chars = text.char_indices().peekable();

  while let Some((idx, c)) = chars.next() {
    let boundary = matches!(c, '.' | '!' | '?')
      && chars.peek().is_none_or(|&(_, next)| next.is_whitespace());
    if boundary {
      let end = idx + c.len_utf8();
      out.push(&text[start..end]);
      start = end;
    }
  }
  out.push(&text[start..]);

  out
    .into_iter()
    .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
    .filter(|s| !s.is_empty())
    .collect()
}

/// Normalise a model reply to at most `cap` sentences.
///
/// The canned [`NO_INFO`] reply (in any case) and empty replies both come
/// back as [`NO_INFO`].
pub fn postprocess_summary(raw: &str, cap: usize) -> String {
  let trimmed = raw.trim();
  if trimmed.eq_ignore_ascii_case(NO_INFO) {
    return NO_INFO.to_owned();
  }
  let sentences = sentences(trimmed);
  if sentences.is_empty() {
    return NO_INFO.to_owned();
  }
  sentences.into_iter().take(cap).collect::<Vec<_>>().join(" ")
}
