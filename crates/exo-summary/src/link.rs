//! Source-link extraction and outbound URL vetting.
//!
//! `pl_refname` holds an HTML anchor such as
//! `<a refstr=SMITH_ET_AL__2020 href=https://example.org/abs target=ref>`,
//! with the `href` value quoted or not.

use std::net::{Ipv4Addr, Ipv6Addr};

use url::{Host, Url};

use crate::{Error, Result};

const SCHEMES: [&str; 2] = ["http://", "https://"];

fn is_http_url(value: &str) -> bool {
  let lower = value.to_ascii_lowercase();
  SCHEMES
    .iter()
    .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
}

/// Return the first `href=` value in `markup` that is an absolute
/// `http(s)://` URL.
///
/// Matching of `href` and the scheme ignores case. A quoted value must be
/// closed by the same quote; an unquoted value ends at whitespace, a quote,
/// or `>`.
pub fn extract_href(markup: &str) -> Option<String> {
  let lower = markup.to_ascii_lowercase();
  let bytes = markup.as_bytes();
  let mut from = 0;

  while let Some(pos) = lower[from..].find("href=") {
    let start = from + pos + "href=".len();
    from = start;

    let quote = match bytes.get(start) {
      Some(&q) if q == b'"' || q == b'\'' => Some(q),
      _ => None,
    };
    let value_start = start + usize::from(quote.is_some());
    let rest = &markup[value_start..];
    let end = rest
      .find(|c: char| c == '"' || c == '\'' || c == '>' || c.is_whitespace())
      .unwrap_or(rest.len());

    if let Some(q) = quote
      && rest.as_bytes().get(end) != Some(&q)
    {
      continue;
    }

    let value = &rest[..end];
    if is_http_url(value) {
      return Some(value.to_owned());
    }
  }
  None
}

fn blocked_v4(ip: Ipv4Addr) -> bool {
  ip.is_loopback() || ip.is_link_local() || ip.is_unspecified()
}

fn blocked_v6(ip: Ipv6Addr) -> bool {
  let link_local = (ip.segments()[0] & 0xffc0) == 0xfe80;
  ip.is_loopback()
    || ip.is_unspecified()
    || link_local
    || ip.to_ipv4_mapped().is_some_and(blocked_v4)
}

/// Whether the server may fetch `raw` on a client's behalf.
///
/// Only `http`/`https` URLs with a host are allowed. `localhost`, `*.local`,
/// loopback, link-local and unspecified addresses are refused.
pub fn is_safe_url(raw: &str) -> bool {
  let Ok(url) = Url::parse(raw) else {
    return false;
  };
  if !matches!(url.scheme(), "http" | "https") {
    return false;
  }
  match url.host() {
    Some(Host::Domain(domain)) => {
      let domain = domain.trim_end_matches('.').to_ascii_lowercase();
      !(domain == "localhost" || domain.ends_with(".localhost") || domain.ends_with(".local"))
    }
    Some(Host::Ipv4(ip)) => !blocked_v4(ip),
    Some(Host::Ipv6(ip)) => !blocked_v6(ip),
    None => false,
  }
}

/// Resolve the paper URL for a record's `pl_refname`.
pub fn source_url(refname: Option<&str>) -> Result<String> {
  let href = refname.and_then(extract_href).ok_or(Error::NoLink)?;
  if !is_safe_url(&href) {
    return Err(Error::UnsafeUrl(href));
  }
  Ok(href)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unquoted_href() {
    let markup = "<a refstr=KOCH_ET_AL__2010 href=https://ui.adsabs.harvard.edu/abs/2010ApJ/abstract target=ref>Koch et al. 2010</a>";
    assert_eq!(
      extract_href(markup).as_deref(),
      Some("https://ui.adsabs.harvard.edu/abs/2010ApJ/abstract")
    );
  }

  #[test]
  fn quoted_href_and_case() {
    assert_eq!(
      extract_href(r#"<A HREF="HTTP://Example.org/paper">x</A>"#).as_deref(),
      Some("HTTP://Example.org/paper")
    );
    assert_eq!(
      extract_href("<a href='https://example.org/a b'>x</a>"),
      None,
      "a quoted value must close with its quote"
    );
  }

  #[test]
  fn skips_non_http_hrefs() {
    let markup = r#"<a href="mailto:x@y.z">m</a> <a href=https://example.org/second>s</a>"#;
    assert_eq!(extract_href(markup).as_deref(), Some("https://example.org/second"));
    assert_eq!(extract_href("<a href=ftp://example.org>x</a>"), None);
    assert_eq!(extract_href("<a href=https://>x</a>"), None);
  }

  #[test]
  fn missing_link_is_distinct_from_unsafe() {
    assert!(matches!(source_url(None), Err(Error::NoLink)));
    assert!(matches!(source_url(Some("Smith et al. 2020")), Err(Error::NoLink)));
    assert!(matches!(
      source_url(Some("<a href=http://127.0.0.1/admin>x</a>")),
      Err(Error::UnsafeUrl(_))
    ));
    assert_eq!(
      source_url(Some("<a href=https://arxiv.org/abs/1234>x</a>")).unwrap(),
      "https://arxiv.org/abs/1234"
    );
  }

  #[test]
  fn blocks_local_targets() {
    for url in [
      "http://localhost/",
      "http://LOCALHOST:8080/x",
      "http://printer.local/",
      "http://127.0.0.1/",
      "http://127.8.9.10/",
      "http://[::1]/",
      "http://169.254.169.254/latest/meta-data",
      "http://[fe80::1]/",
      "http://0.0.0.0/",
      "http://[::ffff:127.0.0.1]/",
      "file:///etc/passwd",
      "javascript:alert(1)",
      "not a url",
    ] {
      assert!(!is_safe_url(url), "{url} should be refused");
    }
  }

  #[test]
  fn allows_public_targets() {
    for url in [
      "https://arxiv.org/abs/2101.00001",
      "http://exoplanetarchive.ipac.caltech.edu/",
      "https://93.184.216.34/",
    ] {
      assert!(is_safe_url(url), "{url} should be allowed");
    }
  }
}
