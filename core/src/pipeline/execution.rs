// strata/src/pipeline/execution.rs

//! Contains the `Orchestrator`, responsible for running a pipeline's stages
//! strictly in order and turning their outcomes into a `RunSummary`.

use crate::core::control::{HaltReason, PipelineControl, RunOutcome, StageStatus};
use crate::core::progress::{ProgressHandle, RunState};
use crate::core::result::StageResult;
use crate::core::run_context::{RunContext, RunLayout};
use crate::error::StrataResult;
use crate::pipeline::definition::Pipeline;
use crate::pipeline::hooks::run_hooks;
use crate::pipeline::summary::RunSummary;
use crate::stage::adapter::run_stage_with;
use chrono::Utc;
use std::time::Duration;
use tracing::{event, instrument, span, Instrument, Level};

/// Run-wide policy. Per-stage settings on a descriptor take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPolicy {
  pub default_timeout: Option<Duration>,
}

impl ExecutionPolicy {
  pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
    self.default_timeout = Some(timeout);
    self
  }
}

pub struct Orchestrator {
  layout: RunLayout,
  policy: ExecutionPolicy,
  progress: ProgressHandle,
}

impl Orchestrator {
  pub fn new(layout: RunLayout) -> Self {
    Self {
      layout,
      policy: ExecutionPolicy::default(),
      progress: ProgressHandle::new(),
    }
  }

  pub fn with_policy(mut self, policy: ExecutionPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn layout(&self) -> &RunLayout {
    &self.layout
  }

  pub fn policy(&self) -> &ExecutionPolicy {
    &self.policy
  }

  /// Handle on the progress of the current (or last) run.
  pub fn progress(&self) -> ProgressHandle {
    self.progress.clone()
  }

  /// Runs the pipeline in a freshly created run namespace.
  ///
  /// Each call creates a new `RunContext`, so repeated calls never touch a
  /// previous run's artifacts.
  pub async fn execute(&self, pipeline: &Pipeline) -> StrataResult<RunSummary> {
    let ctx = RunContext::create(&self.layout)?;
    self.execute_in(pipeline, &ctx).await
  }

  /// Runs the pipeline inside an existing run context.
  ///
  /// Stage failures are recorded, never returned. `Err` means the run could
  /// not keep its durable artifacts (a stage log or the summary).
  #[instrument(
    name = "Orchestrator::execute",
    skip_all,
    fields(run_id = ctx.run_id(), num_stages = pipeline.len()),
    err(Display)
  )]
  pub async fn execute_in(&self, pipeline: &Pipeline, ctx: &RunContext) -> StrataResult<RunSummary> {
    event!(Level::INFO, "Pipeline run starting.");
    self.progress.reset(ctx.run_id());

    let mut results: Vec<StageResult> = Vec::with_capacity(pipeline.len());
    let mut halt: Option<(String, HaltReason)> = None;

    for (stage_idx, descriptor) in pipeline.stages.iter().enumerate() {
      let stage_name = descriptor.name();
      let stage_span = span!(
        Level::INFO,
        "pipeline_stage",
        stage = stage_name,
        stage_index = stage_idx,
        required = descriptor.is_required()
      );

      self.progress.set_state(RunState::Running {
        index: stage_idx,
        stage: stage_name.to_string(),
      });

      let control = run_hooks(&pipeline.before, &self.progress, "before_stage")
        .instrument(stage_span.clone())
        .await;
      if control == PipelineControl::Stop {
        halt = Some((stage_name.to_string(), HaltReason::StoppedByHook));
        break;
      }

      let result = match run_stage_with(descriptor, ctx, stage_idx, self.policy.default_timeout)
        .instrument(stage_span.clone())
        .await
      {
        Ok(result) => result,
        Err(e) => {
          event!(Level::ERROR, error = %e, "Stage artifacts could not be written; aborting run.");
          self.progress.set_state(RunState::Halted {
            stage: stage_name.to_string(),
          });
          // Best effort: leave a summary of what did run.
          let partial = self.summarize(
            ctx,
            pipeline,
            results,
            Some((stage_name.to_string(), HaltReason::ArtifactWriteFailed)),
          );
          if let Err(write_err) = partial.write_to(&ctx.summary_path()) {
            event!(Level::ERROR, error = %write_err, "Partial run summary could not be written.");
          }
          return Err(e);
        }
      };

      let halt_reason = if result.halts_run() {
        Some(match result.status {
          StageStatus::SkippedMissing => HaltReason::RequiredStageMissing,
          _ => HaltReason::RequiredStageFailed,
        })
      } else {
        None
      };

      self.progress.record(result.clone());
      results.push(result);

      if let Some(reason) = halt_reason {
        event!(Level::ERROR, %reason, "Halting run; later stages depend on this stage's output.");
        halt = Some((stage_name.to_string(), reason));
        break;
      }

      let control = run_hooks(&pipeline.after, &self.progress, "after_stage")
        .instrument(stage_span.clone())
        .await;
      if control == PipelineControl::Stop {
        if stage_idx + 1 == pipeline.len() {
          event!(Level::INFO, stage = stage_name, "Hook stop after the final stage; run is complete.");
          break;
        }
        halt = Some((stage_name.to_string(), HaltReason::StoppedByHook));
        break;
      }
    }

    let final_state = match &halt {
      Some((stage, _)) => RunState::Halted { stage: stage.clone() },
      None => RunState::Completed,
    };
    let summary = self.summarize(ctx, pipeline, results, halt);
    summary.write_to(&ctx.summary_path())?;
    self.progress.set_state(final_state);

    event!(
      Level::INFO,
      outcome = ?summary.outcome,
      succeeded = summary.count(StageStatus::Success),
      failed = summary.count(StageStatus::Failed),
      skipped_missing = summary.count(StageStatus::SkippedMissing),
      summary = %ctx.summary_path().display(),
      "Pipeline run finished."
    );
    Ok(summary)
  }

  fn summarize(
    &self,
    ctx: &RunContext,
    pipeline: &Pipeline,
    results: Vec<StageResult>,
    halt: Option<(String, HaltReason)>,
  ) -> RunSummary {
    let (outcome, halted_at, halt_reason) = match halt {
      Some((stage, reason)) => (RunOutcome::Halted, Some(stage), Some(reason)),
      None => (RunOutcome::Completed, None, None),
    };
    RunSummary {
      run_id: ctx.run_id().to_string(),
      started_at: ctx.started_at(),
      finished_at: Utc::now(),
      outcome,
      halted_at,
      halt_reason,
      results,
      deselected: pipeline.deselected.clone(),
      log_dir: ctx.log_dir().to_path_buf(),
      output_dir: ctx.output_dir().to_path_buf(),
    }
  }
}
