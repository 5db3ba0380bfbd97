// strata/src/core/progress.rs
use crate::core::result::StageResult;
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use std::sync::Arc;

/// Orchestrator state machine: `Pending → Running(i) → {Running(i+1) | Halted | Completed}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
  #[default]
  Pending,
  Running { index: usize, stage: String },
  Halted { stage: String },
  Completed,
}

impl RunState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, RunState::Halted { .. } | RunState::Completed)
  }
}

#[derive(Debug, Clone, Default)]
pub struct RunProgress {
  pub run_id: Option<String>,
  pub state: RunState,
  pub results: Vec<StageResult>,
}

/// Shared handle on the progress of one run.
///
/// Lock guards obtained here are blocking and MUST NOT be held across
/// `.await` points. Only the orchestrator writes through it.
#[derive(Debug)]
pub struct ProgressHandle(Arc<RwLock<RunProgress>>);

impl ProgressHandle {
  pub fn new() -> Self {
    ProgressHandle(Arc::new(RwLock::new(RunProgress::default())))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, RunProgress> {
    self.0.read()
  }

  pub fn try_read(&self) -> Option<RwLockReadGuard<'_, RunProgress>> {
    self.0.try_read()
  }

  pub fn state(&self) -> MappedRwLockReadGuard<'_, RunState> {
    RwLockReadGuard::map(self.read(), |p| &p.state)
  }

  /// Owned copy of the current progress.
  pub fn snapshot(&self) -> RunProgress {
    self.read().clone()
  }

  pub(crate) fn reset(&self, run_id: &str) {
    let mut guard = self.0.write();
    guard.run_id = Some(run_id.to_string());
    guard.state = RunState::Pending;
    guard.results.clear();
  }

  pub(crate) fn set_state(&self, state: RunState) {
    self.0.write().state = state;
  }

  pub(crate) fn record(&self, result: StageResult) {
    self.0.write().results.push(result);
  }
}

impl Default for ProgressHandle {
  fn default() -> Self {
    Self::new()
  }
}

impl Clone for ProgressHandle {
  fn clone(&self) -> Self {
    ProgressHandle(Arc::clone(&self.0))
  }
}
