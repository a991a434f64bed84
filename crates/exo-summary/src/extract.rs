//! Readable-text extraction from fetched HTML.

use scraper::{ElementRef, Html};

use crate::{Error, Result};

/// Pages yielding less text than this are not worth summarising.
pub const MIN_TEXT_CHARS: usize = 200;

/// Subtrees never counted as content.
const BOILERPLATE: &[&str] = &[
  "script", "style", "noscript", "template", "svg", "nav", "header", "footer", "aside", "form",
];

/// Subtrees skipped even in the whole-body fallback.
const NON_TEXT: &[&str] = &["script", "style", "noscript", "template", "svg"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
  pub title: Option<String>,
  pub text:  String,
}

fn push_words(out: &mut String, text: &str) {
  for word in text.split_whitespace() {
    if !out.is_empty() {
      out.push(' ');
    }
    out.push_str(word);
  }
}

fn collect_text(element: ElementRef<'_>, skip: &[&str], out: &mut String) {
  for child in element.children() {
    if let Some(text) = child.value().as_text() {
      push_words(out, text);
    } else if let Some(child) = ElementRef::wrap(child)
      && !skip.contains(&child.value().name())
    {
      collect_text(child, skip, out);
    }
  }
}

fn text_of(element: ElementRef<'_>, skip: &[&str]) -> String {
  let mut out = String::new();
  collect_text(element, skip, &mut out);
  out
}

fn find_first<'a>(
  root: ElementRef<'a>,
  pred: impl Fn(&ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
  root.descendants().filter_map(ElementRef::wrap).find(|el| pred(el))
}

fn named<'a>(root: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
  find_first(root, |el| el.value().name() == name)
}

/// Pick the main content of a page and flatten it to whitespace-normalised
/// text.
///
/// The content root is the first `<article>`, else `<main>`, else an element
/// with `role="main"`. Navigation, headers, footers, asides, forms and
/// scripts inside it are skipped. If no root is found or it has no text, the
/// whole `<body>` is used instead. The title comes from `<title>`, or the
/// first `<h1>` when that is missing or blank.
pub fn extract_main_text(html: &str) -> Extracted {
  let document = Html::parse_document(html);
  let root = document.root_element();

  let title = ["title", "h1"]
    .into_iter()
    .filter_map(|name| named(root, name))
    .map(|el| text_of(el, NON_TEXT))
    .find(|t| !t.is_empty());

  let content = named(root, "article")
    .or_else(|| named(root, "main"))
    .or_else(|| find_first(root, |el| el.value().attr("role") == Some("main")))
    .map(|el| text_of(el, BOILERPLATE))
    .unwrap_or_default();

  let text = if content.is_empty() {
    named(root, "body")
      .map(|body| text_of(body, NON_TEXT))
      .unwrap_or_default()
  } else {
    content
  };

  Extracted { title, text }
}

/// Reject extractions too short to summarise.
pub fn require_text(source_url: &str, extracted: Extracted) -> Result<Extracted> {
  let len = extracted.text.chars().count();
  if len < MIN_TEXT_CHARS {
    return Err(Error::InsufficientText {
      source_url: source_url.to_owned(),
      len,
    });
  }
  Ok(extracted)
}
