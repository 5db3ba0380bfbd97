use crate::config::StrataConfig;
use crate::errors::Result;
use crate::manifest::PipelineManifest;
use crate::pipelines::default_pipeline;
use std::path::Path;
use strata::{ExecutionPolicy, Orchestrator, RunLayout, RunSummary, StageStatus};

/// Execute the `run` command: build the stage list, run it, report the summary.
///
/// Returns the run's exit code (0 when completed, 1 when halted).
pub async fn execute(config: &StrataConfig, manifest: Option<&Path>, only: &[String]) -> Result<u8> {
  let mut pipeline = match manifest {
    Some(path) => PipelineManifest::load(path)?.to_pipeline(config)?,
    None => default_pipeline(config)?,
  };
  if !only.is_empty() {
    pipeline = pipeline.select(only)?;
  }

  let mut policy = ExecutionPolicy::default();
  if let Some(timeout) = config.stage_timeout {
    policy = policy.with_default_timeout(timeout);
  }
  let orchestrator = Orchestrator::new(RunLayout::new(&config.log_dir, &config.output_dir)).with_policy(policy);

  tracing::info!(
    stages = pipeline.len(),
    deselected = pipeline.deselected().len(),
    "Pipeline assembled."
  );
  let summary = orchestrator.execute(&pipeline).await?;
  print_summary(&summary);

  Ok(summary.exit_code() as u8)
}

fn print_summary(summary: &RunSummary) {
  println!("Run {}: {:?}", summary.run_id, summary.outcome);
  for result in &summary.results {
    let marker = match result.status {
      StageStatus::Success => "ok",
      StageStatus::Failed => "FAILED",
      StageStatus::SkippedMissing => "MISSING",
    };
    let reason = result.reason.as_ref().map(|r| format!(" ({})", r)).unwrap_or_default();
    println!(
      "  [{:>2}] {:<20} {:<8}{} {:.1}s  {}",
      result.stage_index,
      result.stage_name,
      marker,
      reason,
      result.duration.as_secs_f64(),
      result.log_path.display()
    );
    if let Some(ckpt) = &result.checkpoint {
      if ckpt.advanced() {
        println!("       checkpoint advanced: {}", ckpt.path.display());
      }
    }
  }
  for name in &summary.deselected {
    println!("  [--] {:<20} deselected", name);
  }
  if let (Some(stage), Some(reason)) = (&summary.halted_at, &summary.halt_reason) {
    println!("Halted at '{}': {}", stage, reason);
  }
  println!("Summary: {}", summary.output_dir.join("run_summary.json").display());
}
