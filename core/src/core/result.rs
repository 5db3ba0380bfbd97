// strata/src/core/result.rs

//! The immutable record produced for every stage a run reaches.

use crate::core::control::{FailureReason, StageStatus};
use crate::stage::checkpoint::CheckpointTransition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
  pub stage_name: String,
  /// Position of the stage within the executed sequence.
  pub stage_index: usize,
  pub required: bool,
  pub status: StageStatus,
  pub exit_code: Option<i32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reason: Option<FailureReason>,
  pub log_path: PathBuf,
  pub started_at: DateTime<Utc>,
  #[serde(with = "duration_secs")]
  pub duration: Duration,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub checkpoint: Option<CheckpointTransition>,
}

impl StageResult {
  pub fn is_success(&self) -> bool {
    self.status == StageStatus::Success
  }

  /// A required stage that did not succeed stops the line.
  pub fn halts_run(&self) -> bool {
    self.required && self.status != StageStatus::Success
  }
}

pub(crate) mod duration_secs {
  use serde::{Deserialize, Deserializer, Serializer};
  use std::time::Duration;

  pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let secs = f64::deserialize(deserializer)?;
    if !secs.is_finite() || secs < 0.0 {
      return Err(serde::de::Error::custom(format!("invalid duration: {}", secs)));
    }
    Ok(Duration::from_secs_f64(secs))
  }
}
