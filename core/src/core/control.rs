// strata/src/core/control.rs

//! Signals for controlling pipeline flow and the recorded outcomes of stages and runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Signal from a lifecycle hook indicating whether the run should continue or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  /// Continue with the current stage and subsequent stages.
  Continue,
  /// Halt the run. No further stages are started.
  Stop,
}

/// Classified outcome of one stage invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
  Success,
  Failed,
  /// The collaborator could not be located. Always recorded, never omitted.
  SkippedMissing,
}

impl fmt::Display for StageStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      StageStatus::Success => "success",
      StageStatus::Failed => "failed",
      StageStatus::SkippedMissing => "skipped_missing",
    };
    f.write_str(s)
  }
}

/// Why a stage ended up `failed` or `skipped_missing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
  ExitCode { code: i32 },
  /// Process ended without an exit code (killed by a signal).
  Terminated,
  TimedOut { limit_ms: u64 },
  LaunchError { message: String },
  Missing { detail: String },
}

impl FailureReason {
  pub fn timed_out(limit: Duration) -> Self {
    FailureReason::TimedOut {
      limit_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
    }
  }
}

impl fmt::Display for FailureReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FailureReason::ExitCode { code } => write!(f, "exited with code {}", code),
      FailureReason::Terminated => f.write_str("terminated without exit code"),
      FailureReason::TimedOut { limit_ms } => write!(f, "timed out after {:?}", Duration::from_millis(*limit_ms)),
      FailureReason::LaunchError { message } => write!(f, "failed to launch: {}", message),
      FailureReason::Missing { detail } => write!(f, "collaborator missing: {}", detail),
    }
  }
}

/// Outcome of a full pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
  /// Every selected stage was run (optional stages may have failed).
  Completed,
  /// The run stopped before its last stage finished.
  Halted,
}

impl RunOutcome {
  pub fn exit_code(self) -> i32 {
    match self {
      RunOutcome::Completed => 0,
      RunOutcome::Halted => 1,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
  RequiredStageFailed,
  RequiredStageMissing,
  StoppedByHook,
  /// A stage log or the summary could not be written; the run was aborted.
  ArtifactWriteFailed,
}

impl fmt::Display for HaltReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      HaltReason::RequiredStageFailed => "required stage failed",
      HaltReason::RequiredStageMissing => "required stage collaborator missing",
      HaltReason::StoppedByHook => "stopped by hook",
      HaltReason::ArtifactWriteFailed => "run artifacts could not be written",
    };
    f.write_str(s)
  }
}
