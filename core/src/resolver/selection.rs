// strata/src/resolver/selection.rs

//! What a resolution call returns.

use crate::catalog::layer::DatasetLayer;
use crate::error::{StrataError, StrataResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
  pub matched_row_count: u64,
  pub unmatched_row_count: u64,
  /// Unmatched rows whose missing key a manual override names. Never part of `matched_row_count`.
  pub hinted_row_count: u64,
  pub total_row_count: u64,
  pub unmatched_sample_paths: Vec<PathBuf>,
}

/// The single file chosen for a logical dataset, with its validation counts.
///
/// Resolving the same dataset twice without a filesystem change yields an
/// equal selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSelection {
  pub logical_dataset_name: String,
  pub resolved_path: PathBuf,
  pub layer: DatasetLayer,
  pub candidates: Vec<PathBuf>,
  pub validation: ValidationReport,
}

impl CanonicalSelection {
  pub fn is_fully_matched(&self) -> bool {
    self.validation.unmatched_row_count == 0
  }

  /// Persists the selection as pretty JSON. Nothing is written unless this is called.
  pub fn write_to(&self, path: &Path) -> StrataResult<()> {
    write_json(self, path)
  }
}

/// Every panel-joinable dataset resolved together, ordered by dataset name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelManifest {
  pub selections: Vec<CanonicalSelection>,
  /// Optional datasets with no file on disk.
  pub skipped: Vec<String>,
}

impl PanelManifest {
  pub fn get(&self, dataset: &str) -> Option<&CanonicalSelection> {
    self.selections.iter().find(|s| s.logical_dataset_name == dataset)
  }

  pub fn unmatched_row_count(&self) -> u64 {
    self.selections.iter().map(|s| s.validation.unmatched_row_count).sum()
  }

  pub fn write_to(&self, path: &Path) -> StrataResult<()> {
    write_json(self, path)
  }
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> StrataResult<()> {
  let json = serde_json::to_vec_pretty(value).map_err(|e| StrataError::Json {
    path: path.to_path_buf(),
    source: e,
  })?;
  fs::write(path, json).map_err(|e| StrataError::io(path, e))
}
