//! SQLite backend for the planet catalog.
//!
//! Each planet is kept as a JSON document and queried through
//! `json_extract`, so the table never needs a column per catalog field.
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
