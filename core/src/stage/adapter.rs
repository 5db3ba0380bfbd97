// strata/src/stage/adapter.rs

//! Runs one stage descriptor against a run context and classifies the outcome.
//!
//! The adapter owns exactly one artifact per stage: its log file. Everything
//! the collaborator prints lands there, framed by a header and a footer line
//! written by the adapter, so a post-mortem never depends on terminal output.

use crate::core::control::{FailureReason, StageStatus};
use crate::core::result::StageResult;
use crate::core::run_context::RunContext;
use crate::core::stage::StageDescriptor;
use crate::error::{StrataError, StrataResult};
use crate::stage::checkpoint::{self, CheckpointTransition};
use crate::stage::executable::{Completion, Invocation};
use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{event, instrument, Level};

/// Runs a stage at position 0 with no default timeout.
pub async fn run_stage(descriptor: &StageDescriptor, ctx: &RunContext) -> StrataResult<StageResult> {
  run_stage_with(descriptor, ctx, 0, None).await
}

/// Runs a stage and records its result.
///
/// Collaborator failures never surface as `Err`; they are classified into the
/// returned `StageResult`. `Err` is reserved for the adapter's own durable
/// artifacts (the stage log or the stage directory) being unwritable.
#[instrument(
  name = "run_stage",
  skip_all,
  fields(
    stage = descriptor.name(),
    stage_index = index,
    run_id = ctx.run_id(),
    required = descriptor.is_required(),
  ),
  err(Display)
)]
pub async fn run_stage_with(
  descriptor: &StageDescriptor,
  ctx: &RunContext,
  index: usize,
  default_timeout: Option<Duration>,
) -> StrataResult<StageResult> {
  let stage_name = descriptor.name();
  let executable = descriptor.executable();
  let log_path = ctx.stage_log_path(index, stage_name);

  let mut log = OpenOptions::new()
    .create_new(true)
    .append(true)
    .open(&log_path)
    .map_err(|e| StrataError::environment(&log_path, e))?;

  let started_at = Utc::now();
  let clock = Instant::now();
  write_line(
    &mut log,
    &log_path,
    &format!(
      "# strata: stage '{}' run {} started {} -> {}",
      stage_name,
      ctx.run_id(),
      started_at.to_rfc3339(),
      executable.describe()
    ),
  )?;

  let checkpoint_before = descriptor.checkpoint().map(checkpoint::observe);

  let (status, exit_code, reason) = match executable.locate() {
    Err(detail) => {
      write_line(&mut log, &log_path, &format!("# strata: collaborator missing: {}", detail))?;
      (StageStatus::SkippedMissing, None, Some(FailureReason::Missing { detail }))
    }
    Ok(()) => {
      let stage_dir = ctx.stage_dir(stage_name);
      fs::create_dir_all(&stage_dir).map_err(|e| StrataError::environment(&stage_dir, e))?;
      let sink = log.try_clone().map_err(|e| StrataError::environment(&log_path, e))?;
      let invocation = Invocation {
        run_id: ctx.run_id(),
        stage_name,
        stage_dir: &stage_dir,
        output_dir: ctx.output_dir(),
        log: sink,
      };

      let limit = descriptor.timeout().or(default_timeout);
      event!(Level::DEBUG, collaborator = %executable.describe(), timeout = ?limit, "Invoking collaborator.");
      let outcome = match limit {
        Some(limit) => match tokio::time::timeout(limit, executable.invoke(invocation)).await {
          Ok(completed) => InvokeOutcome::Finished(completed),
          Err(_) => InvokeOutcome::TimedOut(limit),
        },
        None => InvokeOutcome::Finished(executable.invoke(invocation).await),
      };
      classify(outcome)
    }
  };

  let duration = clock.elapsed();
  let footer = match &reason {
    Some(reason) => format!("# strata: stage '{}' {} ({}) after {:.3}s", stage_name, status, reason, duration.as_secs_f64()),
    None => format!("# strata: stage '{}' {} after {:.3}s", stage_name, status, duration.as_secs_f64()),
  };
  write_line(&mut log, &log_path, &footer)?;

  let checkpoint = match (descriptor.checkpoint(), checkpoint_before) {
    (Some(path), Some(before)) => Some(CheckpointTransition {
      path: path.to_path_buf(),
      before,
      after: checkpoint::observe(path),
    }),
    _ => None,
  };

  report(stage_name, descriptor.is_required(), status, reason.as_ref(), &log_path);

  Ok(StageResult {
    stage_name: stage_name.to_string(),
    stage_index: index,
    required: descriptor.is_required(),
    status,
    exit_code,
    reason,
    log_path,
    started_at,
    duration,
    checkpoint,
  })
}

enum InvokeOutcome {
  Finished(io::Result<Completion>),
  TimedOut(Duration),
}

fn classify(outcome: InvokeOutcome) -> (StageStatus, Option<i32>, Option<FailureReason>) {
  match outcome {
    InvokeOutcome::Finished(Ok(completion)) => match completion.exit_code {
      Some(0) => (StageStatus::Success, Some(0), None),
      Some(code) => (StageStatus::Failed, Some(code), Some(FailureReason::ExitCode { code })),
      None => (StageStatus::Failed, None, Some(FailureReason::Terminated)),
    },
    InvokeOutcome::Finished(Err(e)) => (
      StageStatus::Failed,
      None,
      Some(FailureReason::LaunchError { message: e.to_string() }),
    ),
    InvokeOutcome::TimedOut(limit) => (StageStatus::Failed, None, Some(FailureReason::timed_out(limit))),
  }
}

fn report(stage: &str, required: bool, status: StageStatus, reason: Option<&FailureReason>, log_path: &Path) {
  let log = log_path.display();
  match (status, required) {
    (StageStatus::Success, _) => {
      event!(Level::INFO, %stage, %status, log = %log, "Stage finished.");
    }
    (_, true) => {
      event!(Level::ERROR, %stage, %status, reason = ?reason, log = %log, "Required stage did not succeed.");
    }
    (_, false) => {
      event!(Level::WARN, %stage, %status, reason = ?reason, log = %log, "Optional stage did not succeed.");
    }
  }
}

fn write_line(log: &mut File, path: &Path, line: &str) -> StrataResult<()> {
  writeln!(log, "{}", line)
    .and_then(|_| log.flush())
    .map_err(|e| StrataError::environment(path, e))
}
