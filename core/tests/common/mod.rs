// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use strata::{Completion, Invocation, RunLayout, StageDescriptor, StageExecutable};
use tempfile::TempDir;
use tracing::Level;

// --- Call-order recorder shared by fake collaborators ---
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
  Arc::new(Mutex::new(Vec::new()))
}

// --- Fake collaborators ---

/// Prints its lines to the stage log and ends with a fixed completion.
pub struct ScriptedStage {
  pub label: String,
  pub lines: Vec<String>,
  pub completion: Completion,
  pub calls: CallLog,
  /// Written (with `contents`) before completing, to mimic a checkpointing collaborator.
  pub writes: Option<(PathBuf, String)>,
}

impl ScriptedStage {
  pub fn new(label: &str, completion: Completion, calls: &CallLog) -> Self {
    Self {
      label: label.to_string(),
      lines: vec![format!("{} working", label)],
      completion,
      calls: Arc::clone(calls),
      writes: None,
    }
  }

  pub fn writing(mut self, path: impl Into<PathBuf>, contents: &str) -> Self {
    self.writes = Some((path.into(), contents.to_string()));
    self
  }
}

#[async_trait]
impl StageExecutable for ScriptedStage {
  fn describe(&self) -> String {
    format!("scripted:{}", self.label)
  }

  fn locate(&self) -> Result<(), String> {
    Ok(())
  }

  async fn invoke(&self, invocation: Invocation<'_>) -> io::Result<Completion> {
    self.calls.lock().push(self.label.clone());
    let mut log = invocation.log;
    for line in &self.lines {
      writeln!(log, "{}", line)?;
    }
    if let Some((path, contents)) = &self.writes {
      fs::write(path, contents)?;
    }
    Ok(self.completion)
  }
}

/// A collaborator that cannot be found.
pub struct MissingStage {
  pub label: String,
}

#[async_trait]
impl StageExecutable for MissingStage {
  fn describe(&self) -> String {
    format!("missing:{}", self.label)
  }

  fn locate(&self) -> Result<(), String> {
    Err(format!("'{}' is not installed", self.label))
  }

  async fn invoke(&self, _invocation: Invocation<'_>) -> io::Result<Completion> {
    panic!("a missing collaborator must never be invoked");
  }
}

/// Sleeps before succeeding.
pub struct SlowStage {
  pub delay: Duration,
  pub calls: CallLog,
}

#[async_trait]
impl StageExecutable for SlowStage {
  fn describe(&self) -> String {
    format!("slow:{:?}", self.delay)
  }

  fn locate(&self) -> Result<(), String> {
    Ok(())
  }

  async fn invoke(&self, _invocation: Invocation<'_>) -> io::Result<Completion> {
    self.calls.lock().push("slow".to_string());
    tokio::time::sleep(self.delay).await;
    Ok(Completion::success())
  }
}

/// Found, but cannot be launched.
pub struct UnlaunchableStage;

#[async_trait]
impl StageExecutable for UnlaunchableStage {
  fn describe(&self) -> String {
    "unlaunchable".to_string()
  }

  fn locate(&self) -> Result<(), String> {
    Ok(())
  }

  async fn invoke(&self, _invocation: Invocation<'_>) -> io::Result<Completion> {
    Err(io::Error::new(io::ErrorKind::PermissionDenied, "exec format error"))
  }
}

// --- Descriptor shorthands ---

pub fn ok_stage(name: &str, required: bool, calls: &CallLog) -> StageDescriptor {
  StageDescriptor::new(name, Arc::new(ScriptedStage::new(name, Completion::success(), calls)), required)
}

pub fn failing_stage(name: &str, required: bool, code: i32, calls: &CallLog) -> StageDescriptor {
  StageDescriptor::new(name, Arc::new(ScriptedStage::new(name, Completion::code(code), calls)), required)
}

pub fn missing_stage(name: &str, required: bool) -> StageDescriptor {
  StageDescriptor::new(name, Arc::new(MissingStage { label: name.to_string() }), required)
}

// --- Filesystem fixtures ---

pub fn test_layout(tmp: &TempDir) -> RunLayout {
  RunLayout::new(tmp.path().join("logs"), tmp.path().join("outputs"))
}

/// Writes `contents` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) -> PathBuf {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).expect("create fixture dir");
  }
  fs::write(&path, contents).expect("write fixture");
  path
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
