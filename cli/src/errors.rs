// strata-cli/src/errors.rs

use std::path::PathBuf;
use strata::StrataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Invalid pipeline manifest '{}': {source}", path.display())]
  Manifest {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("I/O Error on '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Output Error: {0}")]
  Output(#[from] serde_json::Error),

  #[error("Strata Error: {source}")]
  Strata {
    #[from]
    source: StrataError,
  },
}

impl CliError {
  /// Process exit code: 1 for a failed resolution, 2 for anything that stops a command from starting.
  pub fn exit_code(&self) -> u8 {
    match self {
      CliError::Strata { source } if source.is_resolution_error() => 1,
      _ => 2,
    }
  }
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;
