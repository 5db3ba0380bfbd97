// strata/src/core/stage.rs

//! Defines a single stage of a pipeline: a named, policy-annotated reference
//! to an external collaborator.

use crate::stage::executable::StageExecutable;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Definition of a pipeline stage.
///
/// Descriptors are immutable values; policy changes made through `Pipeline`
/// replace the descriptor rather than mutating a shared one.
#[derive(Clone)]
pub struct StageDescriptor {
  name: String,
  executable: Arc<dyn StageExecutable>,
  required: bool,
  // Overrides the policy-wide default when set.
  timeout: Option<Duration>,
  // Resumption state owned by the collaborator. Observed, never written.
  checkpoint: Option<PathBuf>,
}

impl StageDescriptor {
  pub fn new(name: impl Into<String>, executable: Arc<dyn StageExecutable>, required: bool) -> Self {
    Self {
      name: name.into(),
      executable,
      required,
      timeout: None,
      checkpoint: None,
    }
  }

  /// A stage whose failure halts the run.
  pub fn required(name: impl Into<String>, executable: Arc<dyn StageExecutable>) -> Self {
    Self::new(name, executable, true)
  }

  /// A stage whose failure is recorded and then stepped over.
  pub fn optional(name: impl Into<String>, executable: Arc<dyn StageExecutable>) -> Self {
    Self::new(name, executable, false)
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  pub fn with_checkpoint(mut self, checkpoint: impl Into<PathBuf>) -> Self {
    self.checkpoint = Some(checkpoint.into());
    self
  }

  pub(crate) fn with_required(mut self, required: bool) -> Self {
    self.required = required;
    self
  }

  pub(crate) fn with_timeout_opt(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn executable(&self) -> &Arc<dyn StageExecutable> {
    &self.executable
  }

  pub fn is_required(&self) -> bool {
    self.required
  }

  pub fn timeout(&self) -> Option<Duration> {
    self.timeout
  }

  pub fn checkpoint(&self) -> Option<&Path> {
    self.checkpoint.as_deref()
  }
}

impl std::fmt::Debug for StageDescriptor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StageDescriptor")
      .field("name", &self.name)
      .field("executable", &self.executable.describe())
      .field("required", &self.required)
      .field("timeout", &self.timeout)
      .field("checkpoint", &self.checkpoint)
      .finish()
  }
}
