// strata-cli/src/manifest.rs

//! JSON pipeline manifests for custom stage lists.
//!
//! ```json
//! { "stages": [
//!   { "name": "fetch", "script": "fetch.py", "required": true,
//!     "checkpoint": "outputs/ckpt.json", "timeout_secs": 3600 },
//!   { "name": "scan", "program": "slither", "args": ["."], "required": false }
//! ] }
//! ```

use crate::config::StrataConfig;
use crate::errors::{CliError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use strata::{Pipeline, ProcessExecutable, StageDescriptor};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineManifest {
  pub stages: Vec<StageSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageSpec {
  pub name: String,
  /// Run through the configured interpreter; relative paths are under the scripts dir.
  #[serde(default)]
  pub script: Option<PathBuf>,
  #[serde(default)]
  pub program: Option<PathBuf>,
  #[serde(default)]
  pub args: Vec<String>,
  #[serde(default = "default_required")]
  pub required: bool,
  #[serde(default)]
  pub timeout_secs: Option<u64>,
  /// Relative to the data dir.
  #[serde(default)]
  pub checkpoint: Option<PathBuf>,
  /// Defaults to the data dir.
  #[serde(default)]
  pub working_dir: Option<PathBuf>,
  #[serde(default)]
  pub env: BTreeMap<String, String>,
}

fn default_required() -> bool {
  true
}

impl PipelineManifest {
  pub fn load(path: &Path) -> Result<Self> {
    let bytes = fs::read(path).map_err(|e| CliError::Io {
      path: path.to_path_buf(),
      source: e,
    })?;
    Self::parse(&bytes, path)
  }

  pub fn parse(bytes: &[u8], path: &Path) -> Result<Self> {
    serde_json::from_slice(bytes).map_err(|e| CliError::Manifest {
      path: path.to_path_buf(),
      source: e,
    })
  }

  pub fn to_pipeline(&self, config: &StrataConfig) -> Result<Pipeline> {
    let stages = self
      .stages
      .iter()
      .map(|spec| spec.to_descriptor(config))
      .collect::<Result<Vec<_>>>()?;
    Ok(Pipeline::new(stages)?)
  }
}

impl StageSpec {
  fn to_descriptor(&self, config: &StrataConfig) -> Result<StageDescriptor> {
    let mut executable = match (&self.script, &self.program) {
      (Some(script), None) => ProcessExecutable::script(&config.python, config.scripts_dir.join(script)),
      (Some(script), Some(program)) => ProcessExecutable::script(program, config.scripts_dir.join(script)),
      (None, Some(program)) => ProcessExecutable::new(program),
      (None, None) => {
        return Err(CliError::Config(format!(
          "Stage '{}' needs a 'script' or a 'program'",
          self.name
        )))
      }
    };
    executable = executable
      .args(&self.args)
      .current_dir(self.working_dir.clone().unwrap_or_else(|| config.data_dir.clone()));
    for (key, value) in &self.env {
      executable = executable.env(key, value);
    }

    let mut descriptor = StageDescriptor::new(self.name.clone(), Arc::new(executable), self.required);
    if let Some(secs) = self.timeout_secs {
      if secs == 0 {
        return Err(CliError::Config(format!("Stage '{}' has a zero timeout", self.name)));
      }
      descriptor = descriptor.with_timeout(Duration::from_secs(secs));
    }
    if let Some(checkpoint) = &self.checkpoint {
      descriptor = descriptor.with_checkpoint(config.data_dir.join(checkpoint));
    }
    Ok(descriptor)
  }
}
