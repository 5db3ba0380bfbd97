// strata/src/pipeline/hooks.rs

//! Contains methods for registering `before_stage` and `after_stage` hooks.
//! Hooks observe the shared run progress and may halt the run.

use crate::core::control::PipelineControl;
use crate::core::progress::ProgressHandle;
use crate::pipeline::definition::Pipeline;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{event, Level};

/// A lifecycle hook.
///
/// A hook takes a clone of the run's `ProgressHandle` and resolves to
/// `PipelineControl::Stop` to halt the run. An `Err` also halts it.
///
/// Read guards taken on the handle MUST be dropped before any `.await`.
pub type StageHook = Arc<
  dyn Fn(ProgressHandle) -> Pin<Box<dyn Future<Output = anyhow::Result<PipelineControl>> + Send>> + Send + Sync,
>;

impl Pipeline {
  /// Registers a hook run before every stage starts.
  /// The progress state is already `Running` for that stage.
  pub fn before_stage<F>(&mut self, hook_fn: impl Fn(ProgressHandle) -> F + Send + Sync + 'static)
  where
    F: Future<Output = anyhow::Result<PipelineControl>> + Send + 'static,
  {
    self.before.push(Arc::new(move |progress| Box::pin(hook_fn(progress))));
  }

  /// Registers a hook run after every stage's result is recorded.
  /// Not called for a stage that halts the run on its own. A stop after the
  /// final stage leaves the run `Completed`.
  pub fn after_stage<F>(&mut self, hook_fn: impl Fn(ProgressHandle) -> F + Send + Sync + 'static)
  where
    F: Future<Output = anyhow::Result<PipelineControl>> + Send + 'static,
  {
    self.after.push(Arc::new(move |progress| Box::pin(hook_fn(progress))));
  }
}

/// Runs hooks in registration order until one stops the run.
pub(crate) async fn run_hooks(hooks: &[StageHook], progress: &ProgressHandle, phase: &'static str) -> PipelineControl {
  for (hook_idx, hook_fn) in hooks.iter().enumerate() {
    match hook_fn(progress.clone()).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => {
        event!(Level::INFO, phase, hook_index = hook_idx, "Run stopped by hook.");
        return PipelineControl::Stop;
      }
      Err(e) => {
        event!(Level::ERROR, phase, hook_index = hook_idx, error = %e, "Hook failed; stopping run.");
        return PipelineControl::Stop;
      }
    }
  }
  PipelineControl::Continue
}
