// strata/src/error.rs
use anyhow::Error as AnyhowError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrataError {
  /// Run setup or durable-artifact failure. Fatal before any stage runs.
  #[error("Environment error at '{}': {source}", path.display())]
  Environment {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Unknown dataset: {name}")]
  UnknownDataset { name: String },

  #[error("No candidate file found for dataset '{dataset}' (searched {})", searched.display())]
  NoCandidate { dataset: String, searched: PathBuf },

  #[error("Ambiguous version for dataset '{dataset}': {} candidates tie", tied.len())]
  AmbiguousVersion { dataset: String, tied: Vec<PathBuf> },

  #[error("Schema mismatch for dataset '{dataset}' in '{}': missing key column(s) {missing:?}", path.display())]
  SchemaMismatch {
    dataset: String,
    path: PathBuf,
    missing: Vec<String>,
  },

  #[error("Dataset '{dataset}' ({layer}) is not joinable into the panel")]
  NotJoinable { dataset: String, layer: String },

  #[error("Configuration error for '{subject}': {message}")]
  Configuration { subject: String, message: String },

  #[error("I/O error on '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("CSV error in '{}': {source}", path.display())]
  Csv {
    path: PathBuf,
    #[source]
    source: csv::Error,
  },

  #[error("JSON error for '{}': {source}", path.display())]
  Json {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("Error in collaborator or external operation. Source: {source}")]
  External {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal strata error: {0}")]
  Internal(String),
}

impl StrataError {
  pub fn environment(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    StrataError::Environment {
      path: path.into(),
      source,
    }
  }

  pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    StrataError::Io {
      path: path.into(),
      source,
    }
  }

  pub fn configuration(subject: impl Into<String>, message: impl Into<String>) -> Self {
    StrataError::Configuration {
      subject: subject.into(),
      message: message.into(),
    }
  }

  /// True for resolver failures. These end one `resolve` call and leave no partial writes.
  pub fn is_resolution_error(&self) -> bool {
    matches!(
      self,
      StrataError::UnknownDataset { .. }
        | StrataError::NoCandidate { .. }
        | StrataError::AmbiguousVersion { .. }
        | StrataError::SchemaMismatch { .. }
        | StrataError::NotJoinable { .. }
    )
  }
}

impl From<AnyhowError> for StrataError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap a StrataError that was only carried through anyhow.
    match err.downcast::<StrataError>() {
      Ok(inner) => inner,
      Err(err) => StrataError::External { source: err },
    }
  }
}

pub type StrataResult<T, E = StrataError> = std::result::Result<T, E>;
