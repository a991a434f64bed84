//! SQL schema for the planet store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One JSON document per catalog row. The document repeats the id under `_id`.
CREATE TABLE IF NOT EXISTS planets (
    planet_id TEXT PRIMARY KEY,
    doc       TEXT NOT NULL CHECK (json_valid(doc))
);

CREATE INDEX IF NOT EXISTS planets_name_idx
    ON planets(lower(json_extract(doc, '$.pl_name')));
CREATE INDEX IF NOT EXISTS planets_host_idx
    ON planets(lower(json_extract(doc, '$.hostname')));
CREATE INDEX IF NOT EXISTS planets_disposition_idx
    ON planets(lower(json_extract(doc, '$.disposition')));
CREATE INDEX IF NOT EXISTS planets_period_idx
    ON planets(json_extract(doc, '$.pl_orbper'));

PRAGMA user_version = 1;
";
