// strata/src/stage/executable.rs

//! The narrow interface every external collaborator is reached through, and
//! the process-backed implementation used for real analysis tools.

use async_trait::async_trait;
use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{event, Level};

/// Everything a collaborator is handed for one invocation.
pub struct Invocation<'a> {
  pub run_id: &'a str,
  pub stage_name: &'a str,
  /// Working area reserved for this stage inside the run's output directory.
  pub stage_dir: &'a Path,
  pub output_dir: &'a Path,
  /// Sink for the collaborator's combined stdout and stderr.
  pub log: File,
}

/// Completion signal of a collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
  /// `None` when the process ended without an exit code (e.g. killed by a signal).
  pub exit_code: Option<i32>,
}

impl Completion {
  pub fn success() -> Self {
    Completion { exit_code: Some(0) }
  }

  pub fn code(code: i32) -> Self {
    Completion { exit_code: Some(code) }
  }

  pub fn terminated() -> Self {
    Completion { exit_code: None }
  }

  pub fn is_success(&self) -> bool {
    self.exit_code == Some(0)
  }
}

/// A runnable external capability (fetcher, static analyzer, fuzzer, ...).
///
/// The orchestration core never looks past this trait: it does not know what
/// a collaborator computes, only whether it could be found and how it ended.
#[async_trait]
pub trait StageExecutable: Send + Sync {
  /// Human-readable reference used in logs and summaries.
  fn describe(&self) -> String;

  /// `Err(detail)` when the collaborator cannot be located.
  fn locate(&self) -> Result<(), String>;

  fn is_available(&self) -> bool {
    self.locate().is_ok()
  }

  /// Runs the collaborator to completion. An `Err` means it could not be launched or awaited.
  async fn invoke(&self, invocation: Invocation<'_>) -> io::Result<Completion>;
}

/// A collaborator run as a child process.
#[derive(Debug, Clone)]
pub struct ProcessExecutable {
  program: PathBuf,
  args: Vec<OsString>,
  working_dir: Option<PathBuf>,
  env: Vec<(OsString, OsString)>,
  requires: Vec<PathBuf>,
}

impl ProcessExecutable {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      working_dir: None,
      env: Vec::new(),
      requires: Vec::new(),
    }
  }

  /// `interpreter script`, where the script file must exist for the stage to be runnable.
  pub fn script(interpreter: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
    let script = script.into();
    Self::new(interpreter).arg(script.as_os_str()).requires(script)
  }

  pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.working_dir = Some(dir.into());
    self
  }

  pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
    self.env.push((key.into(), value.into()));
    self
  }

  /// Declares a file that must exist before the process is worth launching.
  pub fn requires(mut self, path: impl Into<PathBuf>) -> Self {
    self.requires.push(path.into());
    self
  }

  pub fn program(&self) -> &Path {
    &self.program
  }

  fn anchored(&self, path: &Path) -> PathBuf {
    match &self.working_dir {
      Some(dir) if path.is_relative() => dir.join(path),
      _ => path.to_path_buf(),
    }
  }

  fn resolve_program(&self) -> Option<PathBuf> {
    let is_bare_name = self.program.components().count() == 1 && !self.program.is_absolute();
    if !is_bare_name {
      return self.program.is_file().then(|| self.program.clone());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
      let candidate = dir.join(&self.program);
      if candidate.is_file() {
        return Some(candidate);
      }
      if cfg!(windows) {
        let exe = candidate.with_extension("exe");
        if exe.is_file() {
          return Some(exe);
        }
      }
      None
    })
  }
}

#[async_trait]
impl StageExecutable for ProcessExecutable {
  fn describe(&self) -> String {
    let mut parts = vec![self.program.display().to_string()];
    parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
  }

  fn locate(&self) -> Result<(), String> {
    if self.resolve_program().is_none() {
      return Err(format!("program '{}' not found", self.program.display()));
    }
    for required in &self.requires {
      let path = self.anchored(required);
      if !path.exists() {
        return Err(format!("required file '{}' not found", path.display()));
      }
    }
    Ok(())
  }

  async fn invoke(&self, invocation: Invocation<'_>) -> io::Result<Completion> {
    let stdout = invocation.log.try_clone()?;
    let stderr = invocation.log;

    let mut cmd = Command::new(&self.program);
    cmd
      .args(&self.args)
      .stdin(Stdio::null())
      .stdout(Stdio::from(stdout))
      .stderr(Stdio::from(stderr))
      .env("STRATA_RUN_ID", invocation.run_id)
      .env("STRATA_STAGE", invocation.stage_name)
      .env("STRATA_OUTPUT_DIR", invocation.output_dir)
      .env("STRATA_STAGE_DIR", invocation.stage_dir)
      // A dropped invocation (timeout) must not leave the process behind.
      .kill_on_drop(true);
    if let Some(dir) = &self.working_dir {
      cmd.current_dir(dir);
    }
    for (key, value) in &self.env {
      cmd.env(key, value);
    }

    let mut child = cmd.spawn()?;
    event!(Level::DEBUG, pid = ?child.id(), program = %self.program.display(), "Collaborator process spawned.");
    let status = child.wait().await?;
    Ok(Completion {
      exit_code: status.code(),
    })
  }
}
