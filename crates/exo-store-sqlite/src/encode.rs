//! Translation between domain types and the SQL stored in SQLite.
//!
//! Filters become `json_extract` predicates over the `doc` column. Column
//! names interpolated into SQL always come from [`Planet::FIELD_NAMES`] or
//! from string literals in this module, never from request input; values are
//! always bound as parameters.

use exo_core::{
  planet::{Planet, PlanetId},
  query::{Direction, NumericRange, PlanetFilter, PlanetQuery},
};
use rusqlite::types::Value;
use serde_json::{Map, Value as Json};
use tracing::debug;

use crate::{Error, Result};

// ─── Query building ──────────────────────────────────────────────────────────

/// SQL text with its positional parameters.
#[derive(Debug)]
pub struct SqlQuery {
  pub sql:    String,
  pub params: Vec<Value>,
}

fn column(field: &str) -> String { format!("json_extract(doc, '$.{field}')") }

#[derive(Default)]
struct WhereBuilder {
  conds:  Vec<String>,
  params: Vec<Value>,
}

impl WhereBuilder {
  fn bind(&mut self, value: Value) -> String {
    self.params.push(value);
    format!("?{}", self.params.len())
  }

  fn text_eq(&mut self, field: &str, value: &Option<String>) {
    if let Some(v) = value {
      let p = self.bind(Value::Text(v.clone()));
      self.conds.push(format!("lower({}) = lower({p})", column(field)));
    }
  }

  fn number_eq(&mut self, field: &str, value: Option<f64>) {
    if let Some(v) = value {
      let p = self.bind(Value::Real(v));
      self.conds.push(format!("{} = {p}", column(field)));
    }
  }

  fn range(&mut self, field: &str, range: &Option<NumericRange>) {
    let Some(range) = range else { return };
    // A record without the field never satisfies an active range.
    self.conds.push(format!("{} IS NOT NULL", column(field)));
    if let Some(min) = range.min {
      let p = self.bind(Value::Real(min));
      self.conds.push(format!("{} >= {p}", column(field)));
    }
    if let Some(max) = range.max {
      let p = self.bind(Value::Real(max));
      self.conds.push(format!("{} <= {p}", column(field)));
    }
  }

  fn filter(&mut self, filter: &PlanetFilter) {
    self.text_eq("pl_name", &filter.pl_name);
    self.text_eq("hostname", &filter.hostname);
    self.text_eq("disposition", &filter.disposition);
    self.number_eq("disc_year", filter.disc_year);
    self.range("disc_year", &filter.disc_years);
    self.range("sy_dist", &filter.sy_dist);
    self.range("pl_orbper", &filter.pl_orbper);
  }
}

fn order_by(query: &PlanetQuery) -> String {
  let mut terms = Vec::new();
  for (key, direction) in query.paging.sort.iter() {
    let expr = if key == "_id" {
      "planet_id".to_owned()
    } else if Planet::has_field(key) {
      column(key)
    } else {
      debug!(key, "ignoring unknown sort key");
      continue;
    };
    let dir = match direction {
      Direction::Asc => "ASC",
      Direction::Desc => "DESC",
    };
    terms.push(format!("{expr} {dir}"));
  }
  // Deterministic paging regardless of the requested order.
  terms.push("planet_id ASC".to_owned());
  terms.join(", ")
}

/// Build the `SELECT doc ...` statement for [`PlanetStore::find`](exo_core::store::PlanetStore::find).
pub fn build_find(query: &PlanetQuery) -> SqlQuery {
  let mut builder = WhereBuilder::default();
  builder.filter(&query.filter);

  let where_clause = if builder.conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", builder.conds.join(" AND "))
  };

  let limit = builder.bind(Value::Integer(query.paging.limit as i64));
  let offset = builder.bind(Value::Integer(query.paging.skip as i64));

  let sql = format!(
    "SELECT doc FROM planets {where_clause} ORDER BY {} LIMIT {limit} OFFSET {offset}",
    order_by(query)
  );

  SqlQuery {
    sql,
    params: builder.params,
  }
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// Work out the id of an imported document.
///
/// Accepts a plain string, the extended-JSON form `{"$oid": "..."}`, or
/// nothing at all (a fresh id is minted).
fn import_id(doc: &Map<String, Json>) -> Result<PlanetId> {
  match doc.get("_id") {
    None | Some(Json::Null) => Ok(PlanetId::generate()),
    Some(Json::String(s)) => Ok(PlanetId::parse(s)?),
    Some(Json::Object(o)) => match o.get("$oid") {
      Some(Json::String(s)) => Ok(PlanetId::parse(s)?),
      _ => Err(Error::InvalidImport("`_id` object without `$oid`".into())),
    },
    Some(other) => Err(Error::InvalidImport(format!("unsupported `_id`: {other}"))),
  }
}

/// Parse one catalog document into a [`Planet`].
pub fn decode_import(value: Json) -> Result<Planet> {
  let Json::Object(mut doc) = value else {
    return Err(Error::InvalidImport("expected a JSON object".into()));
  };
  let id = import_id(&doc)?;
  doc.insert("_id".into(), Json::String(id.to_string()));
  Ok(serde_json::from_value(Json::Object(doc))?)
}

pub fn encode_planet(planet: &Planet) -> Result<(String, String)> {
  Ok((planet.id.to_string(), serde_json::to_string(planet)?))
}

pub fn decode_planet(doc: &str) -> Result<Planet> { Ok(serde_json::from_str(doc)?) }
