// strata/src/catalog/version.rs

//! Version selection rules: how one physical file is chosen among the
//! candidates sharing a logical dataset name.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

/// Strict ordering over version suffixes.
///
/// Each comparator also defines which suffixes are versions at all. A
/// sibling such as `<stem>_with_controls.csv` is not part of a numeric
/// series and is never ranked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionComparator {
  /// Byte order of suffixes that fully match this regular expression.
  Lexical(String),
  /// `v?N([._-]N)*`: digit groups compared by value, so `v10` beats `v9`.
  Numeric,
  /// The suffix is parsed with this chrono format string.
  Timestamp(String),
}

/// A comparable version extracted from a suffix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum VersionKey {
  Lexical(Vec<u8>),
  Numeric(Vec<NumericPart>),
  Timestamp(NaiveDateTime),
}

/// One digit group of a numeric version.
///
/// Stored without leading zeros and ordered by length first, which orders
/// groups by value without overflow.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NumericPart {
  len: usize,
  digits: String,
}

impl VersionComparator {
  /// Returns `None` when the suffix is not a version under this comparator.
  pub fn key(&self, suffix: &str) -> Option<VersionKey> {
    match self {
      VersionComparator::Lexical(pattern) => lexical_pattern(pattern)
        .ok()
        .filter(|re| re.is_match(suffix))
        .map(|_| VersionKey::Lexical(suffix.as_bytes().to_vec())),
      VersionComparator::Numeric => numeric_parts(suffix).map(VersionKey::Numeric),
      VersionComparator::Timestamp(format) => NaiveDateTime::parse_from_str(suffix, format)
        .ok()
        .or_else(|| {
          NaiveDate::parse_from_str(suffix, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(VersionKey::Timestamp),
    }
  }

  /// Orders two suffixes. Suffixes that are not versions sort first.
  pub fn compare(&self, a: &str, b: &str) -> Ordering {
    self.key(a).cmp(&self.key(b))
  }

  /// Rejects a comparator that can never accept a suffix.
  pub fn check(&self) -> Result<(), String> {
    match self {
      VersionComparator::Lexical(pattern) => lexical_pattern(pattern)
        .map(|_| ())
        .map_err(|e| format!("invalid lexical version pattern '{}': {}", pattern, e)),
      VersionComparator::Timestamp(format) if format.trim().is_empty() => {
        Err("timestamp version format must not be empty".to_string())
      }
      _ => Ok(()),
    }
  }
}

impl fmt::Display for VersionComparator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionComparator::Lexical(pattern) => write!(f, "lexical({})", pattern),
      VersionComparator::Numeric => f.write_str("numeric"),
      VersionComparator::Timestamp(format) => write!(f, "timestamp({})", format),
    }
  }
}

/// The pattern must match the whole suffix.
fn lexical_pattern(pattern: &str) -> Result<Regex, regex::Error> {
  Regex::new(&format!("^(?:{})$", pattern))
}

fn numeric_parts(suffix: &str) -> Option<Vec<NumericPart>> {
  let body = suffix.strip_prefix(['v', 'V']).unwrap_or(suffix);
  body
    .split(['.', '_', '-'])
    .map(|group| {
      if group.is_empty() || !group.bytes().all(|b| b.is_ascii_digit()) {
        return None;
      }
      let digits = group.trim_start_matches('0');
      Some(NumericPart {
        len: digits.len(),
        digits: digits.to_string(),
      })
    })
    .collect()
}

/// How a dataset's canonical file is located. Paths are relative to the data root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum VersionRule {
  /// Exactly one well-known file.
  FixedPath { path: PathBuf },
  /// The greatest version among `<stem><sep><suffix>.<extension>` files in `dir`.
  /// The un-suffixed `<stem>.<extension>` ranks below every suffixed version.
  Latest {
    dir: PathBuf,
    stem: String,
    extension: String,
    comparator: VersionComparator,
  },
  /// The first of `primary` then `fallbacks` that exists.
  PreferNamed { primary: PathBuf, fallbacks: Vec<PathBuf> },
}

impl VersionRule {
  pub fn fixed(path: impl Into<PathBuf>) -> Self {
    VersionRule::FixedPath { path: path.into() }
  }

  pub fn latest(
    dir: impl Into<PathBuf>,
    stem: impl Into<String>,
    extension: impl Into<String>,
    comparator: VersionComparator,
  ) -> Self {
    VersionRule::Latest {
      dir: dir.into(),
      stem: stem.into(),
      extension: extension.into(),
      comparator,
    }
  }

  pub fn prefer_named<P: Into<PathBuf>>(primary: impl Into<PathBuf>, fallbacks: impl IntoIterator<Item = P>) -> Self {
    VersionRule::PreferNamed {
      primary: primary.into(),
      fallbacks: fallbacks.into_iter().map(Into::into).collect(),
    }
  }

  /// Short human-readable form for listings.
  pub fn describe(&self) -> String {
    match self {
      VersionRule::FixedPath { path } => format!("fixed_path({})", path.display()),
      VersionRule::Latest {
        dir,
        stem,
        extension,
        comparator,
      } => format!("latest({}/{}*.{}, {})", dir.display(), stem, extension, comparator),
      VersionRule::PreferNamed { primary, fallbacks } => {
        let mut names = vec![primary.display().to_string()];
        names.extend(fallbacks.iter().map(|p| p.display().to_string()));
        format!("prefer_named({})", names.join(" > "))
      }
    }
  }
}

