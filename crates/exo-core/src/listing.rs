//! In-memory filtering, sorting and similarity search over an
//! already-fetched page of planets.
//!
//! Everything here is pure: identical inputs always produce identical,
//! identically-ordered outputs.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{
  planet::{FieldValue, Planet, PlanetId},
  query::{Direction, NumericRange},
};

// ─── Filtering ───────────────────────────────────────────────────────────────

/// Browser-side filter. All populated predicates must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilter {
  /// Case-insensitive substring over `pl_name` or `hostname`.
  pub search:            Option<String>,
  /// Case-insensitive equality.
  pub disposition:       Option<String>,
  /// Membership in any of these discovery methods. Empty means no constraint.
  #[serde(default)]
  pub discovery_methods: Vec<String>,
  pub disc_year:         Option<NumericRange>,
  pub sy_dist:           Option<NumericRange>,
  pub pl_rade:           Option<NumericRange>,
}

impl ListingFilter {
  pub fn matches(&self, planet: &Planet) -> bool {
    if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
      let needle = needle.to_lowercase();
      let hit = [&planet.pl_name, &planet.hostname]
        .into_iter()
        .flatten()
        .any(|s| s.to_lowercase().contains(&needle));
      if !hit {
        return false;
      }
    }

    if let Some(want) = self.disposition.as_deref().filter(|s| !s.is_empty()) {
      match &planet.disposition {
        Some(have) if have.to_lowercase() == want.to_lowercase() => {}
        _ => return false,
      }
    }

    if !self.discovery_methods.is_empty() {
      let Some(method) = &planet.discoverymethod else {
        return false;
      };
      if !self.discovery_methods.iter().any(|m| m.eq_ignore_ascii_case(method)) {
        return false;
      }
    }

    let in_range = |range: &Option<NumericRange>, value: Option<f64>| match range {
      None => true,
      Some(r) => value.is_some_and(|v| r.contains(v)),
    };

    in_range(&self.disc_year, planet.disc_year.map(|y| y as f64))
      && in_range(&self.sy_dist, planet.sy_dist)
      && in_range(&self.pl_rade, planet.pl_rade)
  }
}

pub fn filter_planets(planets: &[Planet], filter: &ListingFilter) -> Vec<Planet> {
  planets.iter().filter(|p| filter.matches(p)).cloned().collect()
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
  pub field:     String,
  #[serde(default)]
  pub direction: Direction,
}

impl Default for SortOption {
  fn default() -> Self {
    Self {
      field:     "pl_name".to_owned(),
      direction: Direction::Asc,
    }
  }
}

fn compare_values(a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
  match (a, b) {
    (FieldValue::Number(x), FieldValue::Number(y)) => x.total_cmp(&y),
    (FieldValue::Text(x), FieldValue::Text(y)) => {
      x.to_lowercase().cmp(&y.to_lowercase()).then_with(|| x.cmp(y))
    }
    // A column is either numeric or text, so mixed pairs never occur.
    (FieldValue::Number(_), FieldValue::Text(_)) => Ordering::Less,
    (FieldValue::Text(_), FieldValue::Number(_)) => Ordering::Greater,
  }
}

/// Stable sort by a single field.
///
/// Records missing the field go after every record that has it, whatever the
/// direction. Ties keep their input order.
pub fn sort_planets(mut planets: Vec<Planet>, sort: &SortOption) -> Vec<Planet> {
  planets.sort_by(|a, b| match (a.field(&sort.field), b.field(&sort.field)) {
    (Some(x), Some(y)) => match sort.direction {
      Direction::Asc => compare_values(x, y),
      Direction::Desc => compare_values(y, x),
    },
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  });
  planets
}

/// Filter then sort, the way the explore view presents a page.
pub fn filter_and_sort(planets: &[Planet], filter: &ListingFilter, sort: &SortOption) -> Vec<Planet> {
  sort_planets(filter_planets(planets, filter), sort)
}

// ─── Similar planets ─────────────────────────────────────────────────────────

pub const DEFAULT_TOLERANCE_PCT: f64 = 10.0;
pub const DEFAULT_SIMILAR_LIMIT: usize = 12;
pub const DEFAULT_CANDIDATE_POOL: usize = 400;

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityOptions {
  /// Half-width of the accepted band, as a percentage of the target period.
  pub tolerance_pct: f64,
  /// Maximum number of results.
  pub limit:         usize,
  /// How many candidates a caller should fetch before calling
  /// [`similar_by_period`].
  pub pool:          usize,
  /// Record to leave out, usually the target planet itself.
  pub exclude:       Option<PlanetId>,
}

impl Default for SimilarityOptions {
  fn default() -> Self {
    Self {
      tolerance_pct: DEFAULT_TOLERANCE_PCT,
      limit:         DEFAULT_SIMILAR_LIMIT,
      pool:          DEFAULT_CANDIDATE_POOL,
      exclude:       None,
    }
  }
}

impl SimilarityOptions {
  /// The period band a store query should restrict the pool to.
  pub fn band(&self, target_period: f64) -> NumericRange {
    NumericRange::around(target_period, self.tolerance_pct)
  }
}

/// Planets whose orbital period lies within the tolerance band around
/// `target_period`, closest first, capped at `opts.limit`.
pub fn similar_by_period(
  pool: &[Planet],
  target_period: f64,
  opts: &SimilarityOptions,
) -> Vec<Planet> {
  let band = opts.band(target_period);

  let mut candidates: Vec<(f64, &Planet)> = pool
    .iter()
    .filter(|p| opts.exclude.as_ref() != Some(&p.id))
    .filter_map(|p| {
      let period = p.pl_orbper?;
      band.contains(period).then_some(((period - target_period).abs(), p))
    })
    .collect();

  candidates.sort_by(|(a, _), (b, _)| a.total_cmp(b));
  candidates
    .into_iter()
    .take(opts.limit)
    .map(|(_, p)| p.clone())
    .collect()
}
