//! Translation of raw listing parameters into a store query.
//!
//! Parsing is permissive: malformed numbers are dropped rather than rejected,
//! so a request like `?disc_year=abc` behaves as if the filter were absent.

use serde::{Deserialize, Serialize};

use crate::planet::{Disposition, Planet};

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 200;

/// Parse a finite number. Blank and non-numeric input yield `None`.
pub fn parse_finite(raw: &str) -> Option<f64> {
  raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  #[default]
  Asc,
  Desc,
}

impl Direction {
  /// `-1`, `-0.5`, `desc` → descending; anything else → ascending.
  fn parse(raw: &str) -> Self {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("desc") || raw.eq_ignore_ascii_case("descending") {
      return Self::Desc;
    }
    match parse_finite(raw) {
      Some(n) if n < 0.0 => Self::Desc,
      _ => Self::Asc,
    }
  }
}

/// Ordered list of sort keys. Keys are unique; re-specifying a key updates
/// its direction but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec(Vec<(String, Direction)>);

impl SortSpec {
  /// Parse `field:dir`, `-field` or `field` tokens separated by commas.
  pub fn parse(raw: &str) -> Self {
    let mut spec = Self::default();
    for token in raw.split(',').map(str::trim) {
      if token.is_empty() {
        continue;
      }
      let (key, direction) = match token.split_once(':') {
        Some((key, dir)) => (key.trim(), Direction::parse(dir)),
        None => match token.strip_prefix('-') {
          Some(key) => (key, Direction::Desc),
          None => (token, Direction::Asc),
        },
      };
      if !key.is_empty() {
        spec.push(key, direction);
      }
    }
    spec
  }

  pub fn push(&mut self, key: &str, direction: Direction) {
    match self.0.iter_mut().find(|(k, _)| k == key) {
      Some(entry) => entry.1 = direction,
      None => self.0.push((key.to_owned(), direction)),
    }
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (&str, Direction)> {
    self.0.iter().map(|(k, d)| (k.as_str(), *d))
  }
}

// ─── Paging ──────────────────────────────────────────────────────────────────

/// Result window and ordering for a listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paging {
  /// Always within `1..=MAX_LIMIT`.
  pub limit: usize,
  pub skip:  usize,
  pub sort:  SortSpec,
}

impl Default for Paging {
  fn default() -> Self {
    Self {
      limit: DEFAULT_LIMIT,
      skip:  0,
      sort:  SortSpec::default(),
    }
  }
}

impl Paging {
  pub fn from_params(limit: Option<&str>, skip: Option<&str>, sort: Option<&str>) -> Self {
    let limit = limit
      .and_then(parse_finite)
      .map(|n| n.trunc().clamp(1.0, MAX_LIMIT as f64) as usize)
      .unwrap_or(DEFAULT_LIMIT);
    let skip = skip
      .and_then(parse_finite)
      .map(|n| n.trunc().max(0.0) as usize)
      .unwrap_or(0);
    let sort = sort.map(SortSpec::parse).unwrap_or_default();
    Self { limit, skip, sort }
  }

  /// Same window with a different limit, still clamped.
  pub fn with_limit(mut self, limit: usize) -> Self {
    self.limit = limit.clamp(1, MAX_LIMIT);
    self
  }
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Inclusive numeric range; an open side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
  pub min: Option<f64>,
  pub max: Option<f64>,
}

impl NumericRange {
  pub fn new(min: Option<f64>, max: Option<f64>) -> Option<Self> {
    (min.is_some() || max.is_some()).then_some(Self { min, max })
  }

  /// A range of `target ± target * pct / 100`.
  pub fn around(target: f64, pct: f64) -> Self {
    let delta = (target * pct / 100.0).abs();
    Self {
      min: Some(target - delta),
      max: Some(target + delta),
    }
  }

  pub fn contains(&self, value: f64) -> bool {
    self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
  }
}

/// Store-side filter. Every populated field must match (AND).
///
/// String fields are case-insensitive exact matches against the full value;
/// the input is taken literally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanetFilter {
  pub pl_name:     Option<String>,
  pub hostname:    Option<String>,
  pub disposition: Option<String>,
  pub disc_year:   Option<f64>,
  pub disc_years:  Option<NumericRange>,
  pub sy_dist:     Option<NumericRange>,
  pub pl_orbper:   Option<NumericRange>,
}

impl PlanetFilter {
  pub fn disposition(disposition: Disposition) -> Self {
    Self {
      disposition: Some(disposition.catalog_value().to_owned()),
      ..Self::default()
    }
  }

  /// Reference semantics for the filter. Store backends must agree with it.
  pub fn matches(&self, planet: &Planet) -> bool {
    fn text_eq(want: &Option<String>, have: &Option<String>) -> bool {
      match (want, have) {
        (None, _) => true,
        (Some(w), Some(h)) => w.to_lowercase() == h.to_lowercase(),
        (Some(_), None) => false,
      }
    }
    fn in_range(range: &Option<NumericRange>, value: Option<f64>) -> bool {
      match range {
        None => true,
        Some(r) => value.is_some_and(|v| r.contains(v)),
      }
    }

    let year = planet.disc_year.map(|y| y as f64);
    text_eq(&self.pl_name, &planet.pl_name)
      && text_eq(&self.hostname, &planet.hostname)
      && text_eq(&self.disposition, &planet.disposition)
      && self.disc_year.is_none_or(|want| year == Some(want))
      && in_range(&self.disc_years, year)
      && in_range(&self.sy_dist, planet.sy_dist)
      && in_range(&self.pl_orbper, planet.pl_orbper)
  }
}

// ─── Request parameters ──────────────────────────────────────────────────────

/// Raw query-string parameters for listing endpoints.
///
/// Everything arrives as a string so that malformed numbers can be dropped
/// instead of failing the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
  pub pl_name:       Option<String>,
  pub hostname:      Option<String>,
  pub disposition:   Option<String>,
  pub disc_year:     Option<String>,
  pub disc_year_min: Option<String>,
  pub disc_year_max: Option<String>,
  pub sy_dist_min:   Option<String>,
  pub sy_dist_max:   Option<String>,
  pub limit:         Option<String>,
  pub skip:          Option<String>,
  pub sort:          Option<String>,
}

/// A fully-built store query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanetQuery {
  pub filter: PlanetFilter,
  pub paging: Paging,
}

impl PlanetQuery {
  pub fn new(filter: PlanetFilter, paging: Paging) -> Self { Self { filter, paging } }
}

impl From<ListParams> for PlanetQuery {
  fn from(p: ListParams) -> Self {
    fn non_empty(s: Option<String>) -> Option<String> { s.filter(|s| !s.is_empty()) }
    fn number(s: &Option<String>) -> Option<f64> { s.as_deref().and_then(parse_finite) }

    let paging = Paging::from_params(p.limit.as_deref(), p.skip.as_deref(), p.sort.as_deref());
    let filter = PlanetFilter {
      disc_year:   number(&p.disc_year),
      disc_years:  NumericRange::new(number(&p.disc_year_min), number(&p.disc_year_max)),
      sy_dist:     NumericRange::new(number(&p.sy_dist_min), number(&p.sy_dist_max)),
      pl_orbper:   None,
      pl_name:     non_empty(p.pl_name),
      hostname:    non_empty(p.hostname),
      disposition: non_empty(p.disposition),
    };
    Self { filter, paging }
  }
}
