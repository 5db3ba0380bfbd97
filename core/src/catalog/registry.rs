// strata/src/catalog/registry.rs

//! Defines the `Catalog`, a name-keyed, read-only registry of logical datasets.
//! Entries are validated once by the `CatalogBuilder` and never change afterwards.

use crate::catalog::layer::{DatasetLayer, JoinKey, JoinKeySchema};
use crate::catalog::version::VersionRule;
use crate::error::{StrataError, StrataResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFormat {
  Csv,
  /// Checkpoints and JSON blobs. Header and row checks are skipped.
  Opaque,
}

/// A manual override table that can supply a key a row is missing.
///
/// A row whose `key` is null but whose `hint_column` value (normalized)
/// appears in `mapping_dataset.from_column` counts as matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyHint {
  pub key: JoinKey,
  pub hint_column: String,
  pub mapping_dataset: String,
  pub from_column: String,
  pub to_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
  name: String,
  description: String,
  layer: DatasetLayer,
  schema: Option<JoinKeySchema>,
  rule: VersionRule,
  format: DatasetFormat,
  required: bool,
  panel_joinable: bool,
  key_hint: Option<KeyHint>,
}

impl CatalogEntry {
  /// A required CSV dataset with no join keys.
  pub fn new(name: impl Into<String>, layer: DatasetLayer, rule: VersionRule) -> Self {
    Self {
      name: name.into(),
      description: String::new(),
      layer,
      schema: None,
      rule,
      format: DatasetFormat::Csv,
      required: true,
      panel_joinable: false,
      key_hint: None,
    }
  }

  pub fn described(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn with_schema(mut self, schema: JoinKeySchema) -> Self {
    self.schema = Some(schema);
    self
  }

  pub fn with_format(mut self, format: DatasetFormat) -> Self {
    self.format = format;
    self
  }

  pub fn optional(mut self) -> Self {
    self.required = false;
    self
  }

  pub fn panel_joinable(mut self) -> Self {
    self.panel_joinable = true;
    self
  }

  pub fn with_key_hint(mut self, hint: KeyHint) -> Self {
    self.key_hint = Some(hint);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn layer(&self) -> DatasetLayer {
    self.layer
  }

  pub fn schema(&self) -> Option<&JoinKeySchema> {
    self.schema.as_ref()
  }

  pub fn rule(&self) -> &VersionRule {
    &self.rule
  }

  pub fn format(&self) -> DatasetFormat {
    self.format
  }

  pub fn is_required(&self) -> bool {
    self.required
  }

  pub fn is_panel_joinable(&self) -> bool {
    self.panel_joinable
  }

  pub fn key_hint(&self) -> Option<&KeyHint> {
    self.key_hint.as_ref()
  }

  fn validate(&self) -> StrataResult<()> {
    let reject = |message: &str| Err(StrataError::configuration(&self.name, message));

    if self.name.trim().is_empty() {
      return reject("dataset name must not be empty");
    }
    match self.layer {
      DatasetLayer::ExternalBenchmark => {
        if self.schema.is_some() {
          return reject("external benchmarks must not declare join keys");
        }
        if self.panel_joinable {
          return reject("external benchmarks are never panel-joinable");
        }
      }
      DatasetLayer::Gold | DatasetLayer::IntermediateNormalized if self.panel_joinable => {
        if self.schema.as_ref().map_or(true, |s| s.required_keys().is_empty()) {
          return reject("panel datasets must declare a non-empty join-key schema");
        }
      }
      _ => {}
    }
    if self.panel_joinable && self.schema.is_none() {
      return reject("panel-joinable datasets need a join-key schema");
    }
    if self.format == DatasetFormat::Opaque && (self.schema.is_some() || self.panel_joinable) {
      return reject("opaque datasets cannot carry join keys");
    }
    if let VersionRule::Latest { comparator, .. } = &self.rule {
      if let Err(message) = comparator.check() {
        return reject(message.as_str());
      }
    }
    if let Some(hint) = &self.key_hint {
      if !self.schema.as_ref().is_some_and(|s| s.contains(hint.key)) {
        return reject("key hint targets a key the schema does not require");
      }
    }
    Ok(())
  }
}

/// Collects entries, then checks cross-entry references in `build`.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
  entries: BTreeMap<String, CatalogEntry>,
}

impl CatalogBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds one dataset. Names are unique.
  pub fn register(mut self, entry: CatalogEntry) -> StrataResult<Self> {
    entry.validate()?;
    if self.entries.contains_key(entry.name()) {
      return Err(StrataError::configuration(entry.name(), "dataset already registered"));
    }
    event!(Level::TRACE, dataset = entry.name(), layer = %entry.layer(), "Registering dataset.");
    self.entries.insert(entry.name().to_string(), entry);
    Ok(self)
  }

  #[instrument(name = "CatalogBuilder::build", skip_all, fields(num_entries = self.entries.len()), err(Display))]
  pub fn build(self) -> StrataResult<Catalog> {
    for entry in self.entries.values() {
      let Some(hint) = entry.key_hint() else { continue };
      match self.entries.get(&hint.mapping_dataset) {
        Some(mapping) if mapping.layer() == DatasetLayer::Diagnostic => {}
        Some(_) => {
          return Err(StrataError::configuration(
            entry.name(),
            format!("key hint table '{}' is not a diagnostic dataset", hint.mapping_dataset),
          ))
        }
        None => {
          return Err(StrataError::configuration(
            entry.name(),
            format!("key hint table '{}' is not registered", hint.mapping_dataset),
          ))
        }
      }
    }
    event!(Level::DEBUG, "Catalog built.");
    Ok(Catalog {
      entries: self.entries.into_iter().map(|(k, v)| (k, Arc::new(v))).collect(),
    })
  }
}

/// The dataset registry.
#[derive(Debug, Clone)]
pub struct Catalog {
  entries: BTreeMap<String, Arc<CatalogEntry>>,
}

impl Catalog {
  pub fn builder() -> CatalogBuilder {
    CatalogBuilder::new()
  }

  pub fn lookup(&self, name: &str) -> StrataResult<Arc<CatalogEntry>> {
    self.entries.get(name).cloned().ok_or_else(|| {
      event!(Level::WARN, dataset = name, "Lookup of unregistered dataset.");
      StrataError::UnknownDataset { name: name.to_string() }
    })
  }

  pub fn contains(&self, name: &str) -> bool {
    self.entries.contains_key(name)
  }

  /// All entries in name order.
  pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
    self.entries.values().map(|e| e.as_ref())
  }

  /// Panel-joinable entries in name order.
  pub fn panel_datasets(&self) -> impl Iterator<Item = &CatalogEntry> {
    self.entries().filter(|e| e.is_panel_joinable())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
