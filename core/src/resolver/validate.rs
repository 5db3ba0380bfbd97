// strata/src/resolver/validate.rs

//! Header and row-level join-key checks on a chosen CSV file.

use crate::catalog::layer::JoinKeySchema;
use crate::error::{StrataError, StrataResult};
use crate::resolver::diagnostics::UnmatchedSink;
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;

/// Values dataframe tooling writes for a missing cell.
const NULL_SPELLINGS: [&str; 5] = ["nan", "none", "null", "na", "<na>"];

pub(crate) fn is_null(value: &str) -> bool {
  let value = value.trim();
  value.is_empty() || NULL_SPELLINGS.iter().any(|n| value.eq_ignore_ascii_case(n))
}

/// Lowercase, alphanumerics only. Used to match free-text names against overrides.
pub(crate) fn normalize_name(value: &str) -> String {
  value
    .chars()
    .filter(|c| c.is_alphanumeric())
    .flat_map(|c| c.to_lowercase())
    .collect()
}

/// Column appended to diverted rows when a key hint applies.
pub(crate) const OVERRIDE_COLUMN: &str = "override_available";

/// Override lookup for one missing key.
pub(crate) struct HintLookup {
  /// Index of the key's column in the scanned file.
  pub key_column: usize,
  /// Index of the free-text column the overrides are keyed by.
  pub hint_column: usize,
  pub known: HashSet<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RowScan {
  pub total: u64,
  pub matched: u64,
  pub unmatched: u64,
  /// Unmatched rows whose missing key a manual override could supply.
  pub hinted: u64,
}

fn open(path: &Path) -> StrataResult<csv::Reader<std::fs::File>> {
  ReaderBuilder::new()
    .flexible(true)
    .from_path(path)
    .map_err(|e| StrataError::Csv {
      path: path.to_path_buf(),
      source: e,
    })
}

fn csv_err(path: &Path) -> impl Fn(csv::Error) -> StrataError + '_ {
  move |e| StrataError::Csv {
    path: path.to_path_buf(),
    source: e,
  }
}

/// Reads only the header row and returns the indices of the required key columns.
pub(crate) fn check_header(dataset: &str, path: &Path, schema: &JoinKeySchema) -> StrataResult<Vec<usize>> {
  let mut reader = open(path)?;
  let headers = reader.headers().map_err(csv_err(path))?.clone();
  let position = |column: &str| headers.iter().position(|h| h.trim() == column);

  let mut indices = Vec::new();
  let mut missing = Vec::new();
  for column in schema.columns() {
    match position(column) {
      Some(idx) => indices.push(idx),
      None => missing.push(column.to_string()),
    }
  }
  if !missing.is_empty() {
    return Err(StrataError::SchemaMismatch {
      dataset: dataset.to_string(),
      path: path.to_path_buf(),
      missing,
    });
  }
  Ok(indices)
}

pub(crate) fn header_index(path: &Path, column: &str) -> StrataResult<Option<usize>> {
  let mut reader = open(path)?;
  let headers = reader.headers().map_err(csv_err(path))?;
  Ok(headers.iter().position(|h| h.trim() == column))
}

/// Counts rows, streaming those with a null key column into `sink`.
///
/// A row with a null key is never matched. When a hint applies, the
/// diverted rows carry an extra `OVERRIDE_COLUMN` saying whether a manual
/// override names the missing key, and such rows are tallied as hinted.
pub(crate) fn scan_rows(
  path: &Path,
  key_columns: &[usize],
  hint: Option<&HintLookup>,
  sink: &mut UnmatchedSink,
) -> StrataResult<RowScan> {
  let mut reader = open(path)?;
  let mut headers = reader.headers().map_err(csv_err(path))?.clone();
  if hint.is_some() {
    headers.push_field(OVERRIDE_COLUMN);
  }
  let mut scan = RowScan::default();

  for record in reader.records() {
    let mut record = record.map_err(csv_err(path))?;
    scan.total += 1;

    let missing: Vec<usize> = key_columns
      .iter()
      .copied()
      .filter(|&idx| record.get(idx).map_or(true, is_null))
      .collect();

    if missing.is_empty() {
      scan.matched += 1;
      continue;
    }

    scan.unmatched += 1;
    if let Some(hint) = hint {
      let recoverable = missing == [hint.key_column]
        && record
          .get(hint.hint_column)
          .filter(|v| !is_null(v))
          .is_some_and(|v| hint.known.contains(&normalize_name(v)));
      if recoverable {
        scan.hinted += 1;
      }
      record.push_field(if recoverable { "true" } else { "false" });
    }
    sink.push(&headers, &record)?;
  }
  Ok(scan)
}

/// Loads the normalized `from_column` values of an override table whose `to_column` is set.
pub(crate) fn load_overrides(path: &Path, from_column: &str, to_column: &str) -> StrataResult<HashSet<String>> {
  let mut reader = open(path)?;
  let headers = reader.headers().map_err(csv_err(path))?.clone();
  let find = |column: &str| headers.iter().position(|h| h.trim() == column);
  let (Some(from_idx), Some(to_idx)) = (find(from_column), find(to_column)) else {
    return Ok(HashSet::new());
  };

  let mut known = HashSet::new();
  for record in reader.records() {
    let record = record.map_err(csv_err(path))?;
    let (Some(from), Some(to)) = (record.get(from_idx), record.get(to_idx)) else { continue };
    if !is_null(from) && !is_null(to) {
      known.insert(normalize_name(from));
    }
  }
  Ok(known)
}
