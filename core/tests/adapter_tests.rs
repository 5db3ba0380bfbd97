// tests/adapter_tests.rs
mod common;

use common::*;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use strata::{
  create_run, run_stage, run_stage_with, Completion, FailureReason, ProcessExecutable, StageDescriptor, StageStatus,
  StrataError,
};
use tempfile::TempDir;

#[tokio::test]
async fn test_success_streams_output_into_stage_log() {
  setup_tracing();
  let tmp = TempDir::new().unwrap();
  let ctx = create_run(&test_layout(&tmp)).unwrap();
  let calls = call_log();

  let result = run_stage_with(&ok_stage("fetch", true, &calls), &ctx, 2, None).await.unwrap();

  assert_eq!(result.status, StageStatus::Success);
  assert_eq!(result.exit_code, Some(0));
  assert_eq!(result.reason, None);
  assert_eq!(result.stage_index, 2);
  assert_eq!(result.log_path, ctx.stage_log_path(2, "fetch"));

  let log = fs::read_to_string(&result.log_path).unwrap();
  assert!(log.contains("scripted:fetch"), "header names the collaborator: {}", log);
  assert!(log.contains("fetch working"));
  assert!(ctx.stage_dir("fetch").is_dir());
}

#[tokio::test]
async fn test_non_zero_completion_is_failed_with_exit_code() {
  setup_tracing();
  let tmp = TempDir::new().unwrap();
  let ctx = create_run(&test_layout(&tmp)).unwrap();
  let calls = call_log();

  let result = run_stage(&failing_stage("scan", true, 3, &calls), &ctx).await.unwrap();

  assert_eq!(result.status, StageStatus::Failed);
  assert_eq!(result.exit_code, Some(3));
  assert_eq!(result.reason, Some(FailureReason::ExitCode { code: 3 }));
  assert!(result.halts_run());
  // Output is kept for post-mortem even on failure.
  assert!(fs::read_to_string(&result.log_path).unwrap().contains("scan working"));
}

#[tokio::test]
async fn test_missing_collaborator_is_skipped_and_logged() {
  setup_tracing();
  let tmp = TempDir::new().unwrap();
  let ctx = create_run(&test_layout(&tmp)).unwrap();

  let result = run_stage(&missing_stage("fuzz", false), &ctx).await.unwrap();

  assert_eq!(result.status, StageStatus::SkippedMissing);
  assert_eq!(result.exit_code, None);
  assert!(matches!(result.reason, Some(FailureReason::Missing { .. })));
  assert!(!result.halts_run());
  let log = fs::read_to_string(&result.log_path).unwrap();
  assert!(log.contains("'fuzz' is not installed"));
  assert!(!ctx.stage_dir("fuzz").exists());
}

#[tokio::test]
async fn test_terminated_collaborator_is_failed() {
  let tmp = TempDir::new().unwrap();
  let ctx = create_run(&test_layout(&tmp)).unwrap();
  let calls = call_log();
  let descriptor = StageDescriptor::optional(
    "killed",
    Arc::new(ScriptedStage::new("killed", Completion::terminated(), &calls)),
  );

  let result = run_stage(&descriptor, &ctx).await.unwrap();

  assert_eq!(result.status, StageStatus::Failed);
  assert_eq!(result.reason, Some(FailureReason::Terminated));
}

#[tokio::test]
async fn test_timeout_marks_stage_failed_with_timed_out() {
  setup_tracing();
  let tmp = TempDir::new().unwrap();
  let ctx = create_run(&test_layout(&tmp)).unwrap();
  let calls = call_log();
  let descriptor = StageDescriptor::required(
    "slow",
    Arc::new(SlowStage {
      delay: Duration::from_secs(30),
      calls: calls.clone(),
    }),
  )
  .with_timeout(Duration::from_millis(100));

  let result = run_stage(&descriptor, &ctx).await.unwrap();

  assert_eq!(result.status, StageStatus::Failed);
  let reason = result.reason.clone().unwrap();
  assert_eq!(reason, FailureReason::TimedOut { limit_ms: 100 });
  assert_eq!(reason.to_string(), "timed out after 100ms");
  assert!(result.duration < Duration::from_secs(30));
}

#[tokio::test]
async fn test_default_timeout_applies_when_stage_has_none() {
  let tmp = TempDir::new().unwrap();
  let ctx = create_run(&test_layout(&tmp)).unwrap();
  let calls = call_log();
  let descriptor = StageDescriptor::optional(
    "slow",
    Arc::new(SlowStage {
      delay: Duration::from_secs(30),
      calls: calls.clone(),
    }),
  );

  let result = run_stage_with(&descriptor, &ctx, 0, Some(Duration::from_millis(50))).await.unwrap();

  assert!(matches!(result.reason, Some(FailureReason::TimedOut { .. })));
}

#[tokio::test]
async fn test_launch_error_is_failed_not_err() {
  let tmp = TempDir::new().unwrap();
  let ctx = create_run(&test_layout(&tmp)).unwrap();
  let descriptor = StageDescriptor::required("broken", Arc::new(UnlaunchableStage));

  let result = run_stage(&descriptor, &ctx).await.unwrap();

  assert_eq!(result.status, StageStatus::Failed);
  assert!(matches!(result.reason, Some(FailureReason::LaunchError { .. })));
}

#[tokio::test]
async fn test_existing_stage_log_is_never_overwritten() {
  let tmp = TempDir::new().unwrap();
  let ctx = create_run(&test_layout(&tmp)).unwrap();
  let calls = call_log();
  let descriptor = ok_stage("fetch", true, &calls);

  run_stage(&descriptor, &ctx).await.unwrap();
  let err = run_stage(&descriptor, &ctx).await.unwrap_err();

  assert!(matches!(err, StrataError::Environment { .. }));
  assert_eq!(calls.lock().len(), 1);
}

#[tokio::test]
async fn test_checkpoint_transition_is_observed() {
  let tmp = TempDir::new().unwrap();
  let ctx = create_run(&test_layout(&tmp)).unwrap();
  let calls = call_log();
  let ckpt = tmp.path().join("ckpt_fetch_sources.json");
  let descriptor = StageDescriptor::required(
    "fetch",
    Arc::new(ScriptedStage::new("fetch", Completion::success(), &calls).writing(&ckpt, r#"{"done": 12, "cursor": "0xabc"}"#)),
  )
  .with_checkpoint(&ckpt);

  let result = run_stage(&descriptor, &ctx).await.unwrap();

  let transition = result.checkpoint.expect("checkpoint observed");
  assert!(!transition.before.exists);
  assert!(transition.after.exists);
  assert!(transition.advanced());
  assert_eq!(
    transition.after.json_keys,
    Some(vec!["cursor".to_string(), "done".to_string()])
  );
}

#[tokio::test]
async fn test_process_script_missing_is_skipped() {
  let tmp = TempDir::new().unwrap();
  let ctx = create_run(&test_layout(&tmp)).unwrap();
  let exe = ProcessExecutable::script("sh", tmp.path().join("no_such_script.sh"));
  let descriptor = StageDescriptor::optional("dynamic_analysis", Arc::new(exe));

  let result = run_stage(&descriptor, &ctx).await.unwrap();

  assert_eq!(result.status, StageStatus::SkippedMissing);
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_combined_output_and_exit_code() {
  setup_tracing();
  let tmp = TempDir::new().unwrap();
  let ctx = create_run(&test_layout(&tmp)).unwrap();
  let exe = ProcessExecutable::new("sh")
    .arg("-c")
    .arg("echo to-stdout; echo to-stderr 1>&2; echo \"$STRATA_STAGE\"; exit 4");
  let descriptor = StageDescriptor::required("shell", Arc::new(exe));

  let result = run_stage(&descriptor, &ctx).await.unwrap();

  assert_eq!(result.status, StageStatus::Failed);
  assert_eq!(result.exit_code, Some(4));
  let log = fs::read_to_string(&result.log_path).unwrap();
  assert!(log.contains("to-stdout"));
  assert!(log.contains("to-stderr"));
  assert!(log.contains("shell\n"));
}
