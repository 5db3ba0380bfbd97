// strata/src/pipeline/summary.rs

//! The durable record of one run, written to `<output_dir>/run_summary.json`.

use crate::core::control::{HaltReason, RunOutcome, StageStatus};
use crate::core::result::StageResult;
use crate::error::{StrataError, StrataResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
  pub run_id: String,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub outcome: RunOutcome,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub halted_at: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub halt_reason: Option<HaltReason>,
  /// Ordered by stage index.
  pub results: Vec<StageResult>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub deselected: Vec<String>,
  pub log_dir: PathBuf,
  pub output_dir: PathBuf,
}

impl RunSummary {
  /// Process exit code for the CLI: 0 when completed, non-zero when halted.
  pub fn exit_code(&self) -> i32 {
    self.outcome.exit_code()
  }

  pub fn is_completed(&self) -> bool {
    self.outcome == RunOutcome::Completed
  }

  pub fn result(&self, stage_name: &str) -> Option<&StageResult> {
    self.results.iter().find(|r| r.stage_name == stage_name)
  }

  pub fn count(&self, status: StageStatus) -> usize {
    self.results.iter().filter(|r| r.status == status).count()
  }

  /// Writes pretty JSON through a temporary sibling so a reader never sees half a summary.
  pub fn write_to(&self, path: &Path) -> StrataResult<()> {
    let json = serde_json::to_vec_pretty(self).map_err(|e| StrataError::Json {
      path: path.to_path_buf(),
      source: e,
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| StrataError::environment(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StrataError::environment(path, e))
  }

  pub fn read_from(path: &Path) -> StrataResult<Self> {
    let bytes = fs::read(path).map_err(|e| StrataError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| StrataError::Json {
      path: path.to_path_buf(),
      source: e,
    })
  }
}
