// strata/src/pipeline/definition.rs

//! Contains the `Pipeline` struct: the ordered stage list as data, plus the
//! structural edits allowed before a run starts.

use crate::core::stage::StageDescriptor;
use crate::error::{StrataError, StrataResult};
use crate::pipeline::hooks::StageHook;
use std::collections::HashSet;
use std::time::Duration;

/// An ordered, linear sequence of stages.
///
/// The order encodes real data dependencies (contracts must exist before
/// they are scanned), so it is never rearranged implicitly. Stage names are
/// unique within a pipeline.
#[derive(Default, Clone)]
pub struct Pipeline {
  pub(crate) stages: Vec<StageDescriptor>,
  pub(crate) before: Vec<StageHook>,
  pub(crate) after: Vec<StageHook>,
  /// Stages dropped by `select`, reported in the run summary.
  pub(crate) deselected: Vec<String>,
}

impl Pipeline {
  /// Creates a pipeline from an ordered list of descriptors.
  pub fn new(stages: Vec<StageDescriptor>) -> StrataResult<Self> {
    let mut seen = HashSet::new();
    for stage in &stages {
      if !seen.insert(stage.name().to_string()) {
        return Err(duplicate(stage.name()));
      }
    }
    Ok(Self {
      stages,
      ..Default::default()
    })
  }

  pub fn stages(&self) -> &[StageDescriptor] {
    &self.stages
  }

  pub fn stage_names(&self) -> Vec<&str> {
    self.stages.iter().map(|s| s.name()).collect()
  }

  pub fn get(&self, name: &str) -> Option<&StageDescriptor> {
    self.stages.iter().find(|s| s.name() == name)
  }

  pub fn len(&self) -> usize {
    self.stages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.stages.is_empty()
  }

  pub fn deselected(&self) -> &[String] {
    &self.deselected
  }

  fn position(&self, name: &str) -> StrataResult<usize> {
    self
      .stages
      .iter()
      .position(|s| s.name() == name)
      .ok_or_else(|| StrataError::configuration(name, "stage not found in pipeline definition"))
  }

  fn ensure_absent(&self, name: &str) -> StrataResult<()> {
    if self.get(name).is_some() {
      return Err(duplicate(name));
    }
    Ok(())
  }

  // --- Structural edits ---

  pub fn push(&mut self, stage: StageDescriptor) -> StrataResult<()> {
    self.ensure_absent(stage.name())?;
    self.stages.push(stage);
    Ok(())
  }

  pub fn insert_before(&mut self, existing: &str, stage: StageDescriptor) -> StrataResult<()> {
    let idx = self.position(existing)?;
    self.ensure_absent(stage.name())?;
    self.stages.insert(idx, stage);
    Ok(())
  }

  pub fn insert_after(&mut self, existing: &str, stage: StageDescriptor) -> StrataResult<()> {
    let idx = self.position(existing)?;
    self.ensure_absent(stage.name())?;
    self.stages.insert(idx + 1, stage);
    Ok(())
  }

  /// Removing a stage that is not present is a no-op.
  pub fn remove_stage(&mut self, name: &str) -> Option<StageDescriptor> {
    let idx = self.stages.iter().position(|s| s.name() == name)?;
    Some(self.stages.remove(idx))
  }

  pub fn set_required(&mut self, name: &str, required: bool) -> StrataResult<()> {
    let idx = self.position(name)?;
    let updated = self.stages[idx].clone().with_required(required);
    self.stages[idx] = updated;
    Ok(())
  }

  pub fn set_timeout(&mut self, name: &str, timeout: Option<Duration>) -> StrataResult<()> {
    let idx = self.position(name)?;
    let updated = self.stages[idx].clone().with_timeout_opt(timeout);
    self.stages[idx] = updated;
    Ok(())
  }

  /// The sub-pipeline made of exactly `names`, kept in definition order.
  ///
  /// Every name must exist. Hooks carry over; the dropped stage names are
  /// remembered so the run summary can list them.
  pub fn select<S: AsRef<str>>(&self, names: &[S]) -> StrataResult<Pipeline> {
    let wanted: HashSet<&str> = names.iter().map(|n| n.as_ref()).collect();
    let unknown: Vec<&str> = wanted.iter().copied().filter(|n| self.get(n).is_none()).collect();
    if !unknown.is_empty() {
      let mut unknown = unknown;
      unknown.sort_unstable();
      return Err(StrataError::configuration(
        "stage_selection",
        format!("unknown stage(s): {}", unknown.join(", ")),
      ));
    }

    let (kept, dropped): (Vec<_>, Vec<_>) = self.stages.iter().cloned().partition(|s| wanted.contains(s.name()));
    let mut deselected = self.deselected.clone();
    deselected.extend(dropped.into_iter().map(|s| s.name().to_string()));

    Ok(Pipeline {
      stages: kept,
      before: self.before.clone(),
      after: self.after.clone(),
      deselected,
    })
  }
}

impl std::fmt::Debug for Pipeline {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pipeline")
      .field("stages", &self.stages)
      .field("before_hooks", &self.before.len())
      .field("after_hooks", &self.after.len())
      .field("deselected", &self.deselected)
      .finish()
  }
}

fn duplicate(name: &str) -> StrataError {
  StrataError::configuration(name, "stage already exists in pipeline definition")
}
