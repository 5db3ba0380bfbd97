// strata-cli/src/config.rs

use crate::errors::{CliError, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Directory and collaborator settings, from the environment (and `.env`).
/// Command-line flags override individual values afterwards.
#[derive(Debug, Clone)]
pub struct StrataConfig {
  /// Parent of the per-run log directories.
  pub log_dir: PathBuf,
  /// Parent of the per-run output directories.
  pub output_dir: PathBuf,
  /// Root the dataset catalog's paths are relative to. Stages run with this as their working directory.
  pub data_dir: PathBuf,
  pub diagnostics_dir: PathBuf,
  pub stage_timeout: Option<Duration>,
  /// Interpreter for the collaborator scripts.
  pub python: PathBuf,
  pub scripts_dir: PathBuf,
}

impl StrataConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());

    let data_dir = PathBuf::from(get_env("STRATA_DATA_DIR").unwrap_or_else(|| ".".to_string()));
    let log_dir = PathBuf::from(get_env("STRATA_LOG_DIR").unwrap_or_else(|| "logs".to_string()));
    let output_dir = PathBuf::from(get_env("STRATA_OUTPUT_DIR").unwrap_or_else(|| "outputs/runs".to_string()));
    let diagnostics_dir = get_env("STRATA_DIAGNOSTICS_DIR")
      .map(PathBuf::from)
      .unwrap_or_else(|| data_dir.join("diagnostics"));
    let stage_timeout = get_env("STRATA_STAGE_TIMEOUT_SECS")
      .map(|raw| parse_timeout(&raw))
      .transpose()?;
    let python = PathBuf::from(get_env("STRATA_PYTHON").unwrap_or_else(|| "python3".to_string()));
    let scripts_dir = PathBuf::from(get_env("STRATA_SCRIPTS_DIR").unwrap_or_else(|| ".".to_string()));

    tracing::debug!(
      data_dir = %data_dir.display(),
      log_dir = %log_dir.display(),
      output_dir = %output_dir.display(),
      "Configuration loaded."
    );

    Ok(Self {
      log_dir,
      output_dir,
      data_dir,
      diagnostics_dir,
      stage_timeout,
      python,
      scripts_dir,
    })
  }
}

/// Whole seconds, greater than zero.
pub fn parse_timeout(raw: &str) -> Result<Duration> {
  let secs = raw
    .trim()
    .parse::<u64>()
    .map_err(|e| CliError::Config(format!("Invalid stage timeout '{}': {}", raw, e)))?;
  if secs == 0 {
    return Err(CliError::Config("Stage timeout must be at least one second".to_string()));
  }
  Ok(Duration::from_secs(secs))
}
