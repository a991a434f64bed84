//! The planet record: one row of the exoplanet catalog.
//!
//! Field names follow the NASA Exoplanet Archive column names so that catalog
//! exports load without a mapping step. Every field is optional; the archive
//! leaves many columns blank. The three date-like columns (`rowupdate`,
//! `pl_pubdate`, `releasedate`) are opaque strings and are never parsed.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Identifier ──────────────────────────────────────────────────────────────

/// Opaque store-assigned identifier: 24 lowercase hex characters, the shape
/// of a document-store object id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlanetId(String);

impl PlanetId {
  pub const LEN: usize = 24;

  /// Validate the shape of `s`. Upper-case hex is accepted and normalised.
  pub fn parse(s: &str) -> Result<Self> {
    if s.len() == Self::LEN && s.bytes().all(|b| b.is_ascii_hexdigit()) {
      Ok(Self(s.to_ascii_lowercase()))
    } else {
      Err(Error::InvalidId(s.to_owned()))
    }
  }

  /// Mint a fresh random identifier.
  pub fn generate() -> Self {
    let mut hex = Uuid::new_v4().simple().to_string();
    hex.truncate(Self::LEN);
    Self(hex)
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PlanetId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl FromStr for PlanetId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for PlanetId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<PlanetId> for String {
  fn from(id: PlanetId) -> Self { id.0 }
}

// ─── Disposition ─────────────────────────────────────────────────────────────

/// Catalog status of a planet candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
  Confirmed,
  Candidate,
  FalsePositive,
}

impl Disposition {
  /// The value as it appears in the catalog's `disposition` column.
  pub fn catalog_value(self) -> &'static str {
    match self {
      Self::Confirmed => "CONFIRMED",
      Self::Candidate => "CANDIDATE",
      Self::FalsePositive => "FALSE POSITIVE",
    }
  }
}

// ─── Field access ────────────────────────────────────────────────────────────

/// A borrowed scalar read out of a [`Planet`] by field name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
  Number(f64),
  Text(&'a str),
}

impl FieldValue<'_> {
  pub fn as_number(&self) -> Option<f64> {
    match self {
      Self::Number(n) => Some(*n),
      Self::Text(_) => None,
    }
  }
}

/// Accept JSON integers and integral floats (`2016.0`) for integer columns.
/// Catalog exports routinely write every numeric column as a double.
fn lenient_int<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
  D: Deserializer<'de>,
{
  let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
    return Ok(None);
  };
  if let Some(i) = number.as_i64() {
    return Ok(Some(i));
  }
  match number.as_f64() {
    Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(f as i64)),
    _ => Err(D::Error::custom(format!("expected an integer, got {number}"))),
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

macro_rules! planet_record {
  (
    text    { $($text:ident),* $(,)? }
    integer { $($int:ident),* $(,)? }
    number  { $($num:ident),* $(,)? }
  ) => {
    /// A single catalog record. Absent columns are omitted when serialised.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Planet {
      #[serde(rename = "_id")]
      pub id: PlanetId,
      $(
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub $text: Option<String>,
      )*
      $(
        #[serde(
          default,
          skip_serializing_if = "Option::is_none",
          deserialize_with = "lenient_int"
        )]
        pub $int: Option<i64>,
      )*
      $(
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub $num: Option<f64>,
      )*
    }

    impl Planet {
      /// Every data column name, excluding `_id`.
      pub const FIELD_NAMES: &'static [&'static str] = &[
        $(stringify!($text),)*
        $(stringify!($int),)*
        $(stringify!($num),)*
      ];

      /// A record with only its identifier set.
      pub fn new(id: PlanetId) -> Self {
        Self {
          id,
          $($text: None,)*
          $($int: None,)*
          $($num: None,)*
        }
      }

      /// Read a column by name. Returns `None` for unknown names and for
      /// columns the record leaves blank.
      pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
          $(stringify!($text) => self.$text.as_deref().map(FieldValue::Text),)*
          $(stringify!($int) => self.$int.map(|v| FieldValue::Number(v as f64)),)*
          $(stringify!($num) => self.$num.map(FieldValue::Number),)*
          _ => None,
        }
      }

      /// Whether the record type has a column called `name`.
      pub fn has_field(name: &str) -> bool { Self::FIELD_NAMES.contains(&name) }

      /// Whether `name` is a numeric column.
      pub fn is_numeric_field(name: &str) -> bool {
        matches!(name, $(stringify!($int))|* | $(stringify!($num))|*)
      }
    }
  };
}

planet_record! {
  text {
    pl_name, hostname, disposition, disp_refname, discoverymethod,
    disc_facility, soltype, pl_refname, st_refname, st_metratio, sy_refname,
    rastr, decstr, rowupdate, pl_pubdate, releasedate,
  }
  integer {
    default_flag, sy_snum, sy_pnum, disc_year, pl_controv_flag, ttv_flag,
    pl_orbperlim, pl_orbsmaxlim, pl_orbeccenlim, pl_radelim, pl_radjlim,
    pl_bmasselim, pl_bmassjlim, pl_eqtlim, pl_insollim, st_tefflim, st_radlim,
    st_masslim, st_metlim, st_logglim,
  }
  number {
    pl_orbper, pl_orbpererr1, pl_orbpererr2,
    pl_orbsmax, pl_orbsmaxerr1, pl_orbsmaxerr2,
    pl_orbeccen, pl_orbeccenerr1, pl_orbeccenerr2,
    pl_rade, pl_radeerr1, pl_radeerr2,
    pl_radj, pl_radjerr1, pl_radjerr2,
    pl_bmasse, pl_bmasseerr1, pl_bmasseerr2,
    pl_bmassj, pl_bmassjerr1, pl_bmassjerr2,
    pl_eqt, pl_eqterr1, pl_eqterr2,
    pl_insol, pl_insolerr1, pl_insolerr2,
    st_teff, st_tefferr1, st_tefferr2,
    st_rad, st_raderr1, st_raderr2,
    st_mass, st_masserr1, st_masserr2,
    st_met, st_meterr1, st_meterr2,
    st_logg, st_loggerr1, st_loggerr2,
    ra, dec,
    sy_dist, sy_disterr1, sy_disterr2,
    sy_vmag, sy_vmagerr1, sy_vmagerr2,
    sy_kmag, sy_kmagerr1, sy_kmagerr2,
    sy_gaiamag, sy_gaiamagerr1, sy_gaiamagerr2,
  }
}
