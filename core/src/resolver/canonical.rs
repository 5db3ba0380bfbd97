// strata/src/resolver/canonical.rs

//! Contains the `Resolver`, which turns a logical dataset name into one
//! validated physical file.

use crate::catalog::layer::DatasetLayer;
use crate::catalog::registry::{Catalog, CatalogEntry, DatasetFormat};
use crate::error::{StrataError, StrataResult};
use crate::resolver::candidates::{locate, Located};
use crate::resolver::diagnostics::UnmatchedSink;
use crate::resolver::selection::{CanonicalSelection, PanelManifest, ValidationReport};
use crate::resolver::validate::{check_header, header_index, load_overrides, scan_rows, HintLookup};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Resolves datasets against a data root.
///
/// Source files are only ever read. The only writes go to `diagnostics_dir`.
#[derive(Debug, Clone)]
pub struct Resolver {
  catalog: Arc<Catalog>,
  data_root: PathBuf,
  diagnostics_dir: PathBuf,
}

impl Resolver {
  pub fn new(catalog: Arc<Catalog>, data_root: impl Into<PathBuf>, diagnostics_dir: impl Into<PathBuf>) -> Self {
    Self {
      catalog,
      data_root: data_root.into(),
      diagnostics_dir: diagnostics_dir.into(),
    }
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  pub fn data_root(&self) -> &Path {
    &self.data_root
  }

  pub fn diagnostics_dir(&self) -> &Path {
    &self.diagnostics_dir
  }

  /// Picks the file for `name` without reading it.
  pub fn locate(&self, name: &str) -> StrataResult<PathBuf> {
    let entry = self.catalog.lookup(name)?;
    Ok(locate(entry.name(), &self.data_root, entry.rule())?.chosen)
  }

  /// Selects and validates the canonical file for a dataset of any layer.
  #[instrument(name = "Resolver::resolve", skip(self), err(Display))]
  pub fn resolve(&self, name: &str) -> StrataResult<CanonicalSelection> {
    let entry = self.catalog.lookup(name)?;
    self.resolve_entry(&entry)
  }

  /// Like `resolve`, but only for datasets that may feed the joined panel.
  #[instrument(name = "Resolver::resolve_for_panel", skip(self), err(Display))]
  pub fn resolve_for_panel(&self, name: &str) -> StrataResult<CanonicalSelection> {
    let entry = self.catalog.lookup(name)?;
    if entry.layer() == DatasetLayer::ExternalBenchmark || !entry.is_panel_joinable() {
      return Err(StrataError::NotJoinable {
        dataset: entry.name().to_string(),
        layer: entry.layer().to_string(),
      });
    }
    self.resolve_entry(&entry)
  }

  /// Resolves every panel-joinable dataset in name order.
  ///
  /// Optional datasets with no file are listed as skipped. Any other failure ends the call.
  #[instrument(name = "Resolver::resolve_panel", skip(self), err(Display))]
  pub fn resolve_panel(&self) -> StrataResult<PanelManifest> {
    let mut manifest = PanelManifest::default();
    for entry in self.catalog.panel_datasets() {
      match self.resolve_entry(entry) {
        Ok(selection) => manifest.selections.push(selection),
        Err(StrataError::NoCandidate { dataset, searched }) if !entry.is_required() => {
          event!(Level::INFO, %dataset, searched = %searched.display(), "Optional panel dataset absent; skipping.");
          manifest.skipped.push(dataset);
        }
        Err(e) => return Err(e),
      }
    }
    event!(
      Level::INFO,
      resolved = manifest.selections.len(),
      skipped = manifest.skipped.len(),
      unmatched_rows = manifest.unmatched_row_count(),
      "Panel resolved."
    );
    Ok(manifest)
  }

  fn resolve_entry(&self, entry: &CatalogEntry) -> StrataResult<CanonicalSelection> {
    let Located { chosen, candidates } = locate(entry.name(), &self.data_root, entry.rule())?;
    event!(Level::DEBUG, dataset = entry.name(), path = %chosen.display(), num_candidates = candidates.len(), "Candidate selected.");

    let validation = match entry.format() {
      DatasetFormat::Opaque => ValidationReport::default(),
      DatasetFormat::Csv => self.validate(entry, &chosen)?,
    };

    Ok(CanonicalSelection {
      logical_dataset_name: entry.name().to_string(),
      resolved_path: chosen,
      layer: entry.layer(),
      candidates,
      validation,
    })
  }

  fn validate(&self, entry: &CatalogEntry, path: &Path) -> StrataResult<ValidationReport> {
    let key_columns = match entry.schema() {
      Some(schema) => check_header(entry.name(), path, schema)?,
      None => Vec::new(),
    };
    let hint = match entry.schema() {
      Some(_) => self.hint_lookup(entry, path)?,
      None => None,
    };

    let mut sink = UnmatchedSink::new(&self.diagnostics_dir, entry.name());
    let scan = match scan_rows(path, &key_columns, hint.as_ref(), &mut sink) {
      Ok(scan) => scan,
      Err(e) => {
        sink.discard();
        return Err(e);
      }
    };
    let unmatched_path = sink.finish()?;
    if scan.hinted > 0 {
      event!(
        Level::INFO,
        dataset = entry.name(),
        hinted = scan.hinted,
        "Unmatched rows have a manual key override; regenerate the source to apply it."
      );
    }

    Ok(ValidationReport {
      matched_row_count: scan.matched,
      unmatched_row_count: scan.unmatched,
      hinted_row_count: scan.hinted,
      total_row_count: scan.total,
      unmatched_sample_paths: unmatched_path.into_iter().collect(),
    })
  }

  /// Builds the override lookup for an entry's key hint, if one applies.
  fn hint_lookup(&self, entry: &CatalogEntry, path: &Path) -> StrataResult<Option<HintLookup>> {
    let Some(hint) = entry.key_hint() else { return Ok(None) };
    let (Some(key_column), Some(hint_column)) = (header_index(path, hint.key.column())?, header_index(path, &hint.hint_column)?) else {
      event!(Level::DEBUG, dataset = entry.name(), column = %hint.hint_column, "Hint column absent; overrides unused.");
      return Ok(None);
    };

    let mapping = self.catalog.lookup(&hint.mapping_dataset)?;
    let table = match locate(mapping.name(), &self.data_root, mapping.rule()) {
      Ok(located) => located.chosen,
      Err(StrataError::NoCandidate { .. }) => {
        event!(Level::DEBUG, dataset = entry.name(), mapping = mapping.name(), "Override table absent.");
        return Ok(None);
      }
      Err(e) => return Err(e),
    };

    let known = load_overrides(&table, &hint.from_column, &hint.to_column)?;
    event!(Level::DEBUG, dataset = entry.name(), overrides = known.len(), "Loaded key overrides.");
    Ok(Some(HintLookup {
      key_column,
      hint_column,
      known,
    }))
  }
}
