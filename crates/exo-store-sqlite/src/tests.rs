//! Integration tests for `SqliteStore` against an in-memory database.

use exo_core::{
  planet::{Disposition, Planet, PlanetId},
  query::{ListParams, NumericRange, Paging, PlanetFilter, PlanetQuery},
  store::PlanetStore,
};
use serde_json::json;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn names(planets: &[Planet]) -> Vec<&str> {
  planets.iter().map(|p| p.pl_name.as_deref().unwrap_or("")).collect()
}

async fn seeded() -> SqliteStore {
  let s = store().await;
  s.import_json(json!([
    { "_id": "000000000000000000000001", "pl_name": "Kepler-22 b", "hostname": "Kepler-22",
      "disposition": "CONFIRMED", "disc_year": 2011, "sy_dist": 190.0, "pl_orbper": 289.86 },
    { "_id": "000000000000000000000002", "pl_name": "Kepler-22 b II", "hostname": "Kepler-22",
      "disposition": "CANDIDATE", "disc_year": 2015, "pl_orbper": 300.0 },
    { "_id": "000000000000000000000003", "pl_name": "TRAPPIST-1 e", "hostname": "TRAPPIST-1",
      "disposition": "CONFIRMED", "disc_year": 2017, "sy_dist": 12.4, "pl_orbper": 6.1 },
    { "_id": "000000000000000000000004", "pl_name": "KOI-123.01", "hostname": "KOI-123",
      "disposition": "FALSE POSITIVE", "disc_year": 2011, "pl_orbper": 280.0 },
    { "_id": "000000000000000000000005", "pl_name": "51 Peg b", "hostname": "51 Peg",
      "disposition": "Confirmed", "disc_year": 1995.0, "sy_dist": 15.5, "pl_orbper": 4.23 }
  ]))
  .await
  .unwrap();
  s
}

fn query(params: ListParams) -> PlanetQuery { PlanetQuery::from(params) }

// ─── Import / get ────────────────────────────────────────────────────────────

#[tokio::test]
async fn import_then_get() {
  let s = seeded().await;
  assert_eq!(s.count().await.unwrap(), 5);

  let id = PlanetId::parse("000000000000000000000003").unwrap();
  let planet = s.get(&id).await.unwrap().unwrap();
  assert_eq!(planet.pl_name.as_deref(), Some("TRAPPIST-1 e"));
  assert_eq!(planet.id, id);
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = seeded().await;
  let result = s.get(&PlanetId::generate()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn reimport_replaces_by_id() {
  let s = seeded().await;
  s.import_json(json!([
    { "_id": { "$oid": "000000000000000000000003" }, "pl_name": "TRAPPIST-1 e (revised)" }
  ]))
  .await
  .unwrap();

  assert_eq!(s.count().await.unwrap(), 5);
  let id = PlanetId::parse("000000000000000000000003").unwrap();
  let planet = s.get(&id).await.unwrap().unwrap();
  assert_eq!(planet.pl_name.as_deref(), Some("TRAPPIST-1 e (revised)"));
  assert_eq!(planet.hostname, None);
}

#[tokio::test]
async fn import_rejects_non_array() {
  let s = store().await;
  assert!(s.import_json(json!({ "pl_name": "x" })).await.is_err());
}

// ─── Filtering ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn name_filter_is_exact_and_case_insensitive() {
  let s = seeded().await;
  let found = s
    .find(&query(ListParams {
      pl_name: Some("kepler-22 B".into()),
      ..ListParams::default()
    }))
    .await
    .unwrap();
  assert_eq!(names(&found), vec!["Kepler-22 b"]);
}

#[tokio::test]
async fn pattern_characters_are_literal() {
  let s = seeded().await;
  let found = s
    .find(&query(ListParams {
      pl_name: Some("Kepler-22.*".into()),
      ..ListParams::default()
    }))
    .await
    .unwrap();
  assert!(found.is_empty());
}

#[tokio::test]
async fn disposition_filter_ignores_case() {
  let s = seeded().await;
  let found = s
    .find(&PlanetQuery::new(
      PlanetFilter::disposition(Disposition::Confirmed),
      Paging::default(),
    ))
    .await
    .unwrap();
  assert_eq!(names(&found), vec!["Kepler-22 b", "TRAPPIST-1 e", "51 Peg b"]);
}

#[tokio::test]
async fn year_equality_and_junk_year() {
  let s = seeded().await;
  let found = s
    .find(&query(ListParams {
      disc_year: Some("2011".into()),
      ..ListParams::default()
    }))
    .await
    .unwrap();
  assert_eq!(names(&found), vec!["Kepler-22 b", "KOI-123.01"]);

  let found = s
    .find(&query(ListParams {
      disc_year: Some("soon".into()),
      ..ListParams::default()
    }))
    .await
    .unwrap();
  assert_eq!(found.len(), 5);
}

#[tokio::test]
async fn distance_range_excludes_missing() {
  let s = seeded().await;
  let found = s
    .find(&query(ListParams {
      sy_dist_max: Some("100".into()),
      ..ListParams::default()
    }))
    .await
    .unwrap();
  assert_eq!(names(&found), vec!["TRAPPIST-1 e", "51 Peg b"]);
}

#[tokio::test]
async fn period_band() {
  let s = seeded().await;
  let filter = PlanetFilter {
    pl_orbper: Some(NumericRange::around(290.0, 5.0)),
    ..PlanetFilter::default()
  };
  let found = s.find(&PlanetQuery::new(filter, Paging::default())).await.unwrap();
  assert_eq!(names(&found), vec!["Kepler-22 b", "Kepler-22 b II", "KOI-123.01"]);
}

#[tokio::test]
async fn sql_agrees_with_reference_filter() {
  let s = seeded().await;
  let all = s.find(&PlanetQuery::default()).await.unwrap();

  let filters = [
    PlanetFilter::default(),
    PlanetFilter { hostname: Some("KEPLER-22".into()), ..PlanetFilter::default() },
    PlanetFilter { disc_year: Some(1995.0), ..PlanetFilter::default() },
    PlanetFilter { disc_years: NumericRange::new(Some(2012.0), None), ..PlanetFilter::default() },
    PlanetFilter {
      disposition: Some("confirmed".into()),
      sy_dist: NumericRange::new(None, Some(20.0)),
      ..PlanetFilter::default()
    },
  ];

  for filter in filters {
    let expected: Vec<_> = all.iter().filter(|p| filter.matches(p)).cloned().collect();
    let found = s
      .find(&PlanetQuery::new(filter.clone(), Paging::default()))
      .await
      .unwrap();
    assert_eq!(found, expected, "{filter:?}");
  }
}

// ─── Sorting and paging ──────────────────────────────────────────────────────

#[tokio::test]
async fn sort_year_desc_then_name() {
  let s = seeded().await;
  let found = s
    .find(&query(ListParams {
      sort: Some("disc_year:-1,pl_name".into()),
      ..ListParams::default()
    }))
    .await
    .unwrap();
  assert_eq!(
    names(&found),
    vec!["TRAPPIST-1 e", "Kepler-22 b II", "KOI-123.01", "Kepler-22 b", "51 Peg b"]
  );
}

#[tokio::test]
async fn unknown_sort_key_is_ignored() {
  let s = seeded().await;
  let found = s
    .find(&query(ListParams {
      sort: Some("bogus:-1".into()),
      ..ListParams::default()
    }))
    .await
    .unwrap();
  assert_eq!(found.len(), 5);
}

#[tokio::test]
async fn limit_and_skip() {
  let s = seeded().await;
  let found = s
    .find(&query(ListParams {
      sort: Some("_id".into()),
      limit: Some("2".into()),
      skip: Some("1".into()),
      ..ListParams::default()
    }))
    .await
    .unwrap();
  assert_eq!(names(&found), vec!["Kepler-22 b II", "TRAPPIST-1 e"]);
}
