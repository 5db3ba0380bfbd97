// strata/src/core/run_context.rs

//! Run identity and the directory namespace each run owns exclusively.
//!
//! A run id is the UTC wall-clock time at minute granularity (`YYYYMMDD_HHMM`).
//! When that id is already taken on disk a numeric suffix is appended
//! (`_1`, `_2`, ...). The id is claimed by creating its log directory with a
//! non-recursive `create_dir`, which fails if the directory exists, so two
//! runs never end up sharing a namespace and a previous run's logs are never
//! written into.

use crate::error::{StrataError, StrataResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{event, Level};

const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M";
const MAX_SUFFIX: usize = 10_000;

/// Scratch subdirectories created inside every run's output directory.
pub const SCRATCH_SUBDIRS: &[&str] = &["stages", "tmp"];

pub const SUMMARY_FILE_NAME: &str = "run_summary.json";

/// Parent directories under which runs are namespaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLayout {
  pub log_root: PathBuf,
  pub output_root: PathBuf,
}

impl RunLayout {
  pub fn new(log_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
    Self {
      log_root: log_root.into(),
      output_root: output_root.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
  run_id: String,
  log_dir: PathBuf,
  output_dir: PathBuf,
  started_at: DateTime<Utc>,
}

/// Creates a fresh run namespace stamped with the current time.
pub fn create_run(layout: &RunLayout) -> StrataResult<RunContext> {
  RunContext::create(layout)
}

impl RunContext {
  pub fn create(layout: &RunLayout) -> StrataResult<Self> {
    Self::create_at(layout, Utc::now())
  }

  /// Creates the run namespace for an explicit timestamp.
  pub fn create_at(layout: &RunLayout, now: DateTime<Utc>) -> StrataResult<Self> {
    if layout.log_root == layout.output_root {
      return Err(StrataError::configuration(
        "run_layout",
        format!(
          "log root and output root must differ (both '{}')",
          layout.log_root.display()
        ),
      ));
    }
    fs::create_dir_all(&layout.log_root).map_err(|e| StrataError::environment(&layout.log_root, e))?;
    fs::create_dir_all(&layout.output_root).map_err(|e| StrataError::environment(&layout.output_root, e))?;

    let base_id = now.format(RUN_ID_FORMAT).to_string();
    for attempt in 0..MAX_SUFFIX {
      let run_id = if attempt == 0 {
        base_id.clone()
      } else {
        format!("{}_{}", base_id, attempt)
      };
      let log_dir = layout.log_root.join(&run_id);
      let output_dir = layout.output_root.join(&run_id);

      if output_dir.exists() {
        continue;
      }
      if !claim_dir(&log_dir)? {
        continue;
      }
      if !claim_dir(&output_dir)? {
        // Someone else owns this output namespace; give the log dir back.
        let _ = fs::remove_dir(&log_dir);
        continue;
      }
      for sub in SCRATCH_SUBDIRS {
        let path = output_dir.join(sub);
        fs::create_dir(&path).map_err(|e| StrataError::environment(&path, e))?;
      }

      event!(Level::INFO, %run_id, log_dir = %log_dir.display(), output_dir = %output_dir.display(), "Run namespace created.");
      return Ok(Self {
        run_id,
        log_dir,
        output_dir,
        started_at: now,
      });
    }

    Err(StrataError::environment(
      layout.log_root.join(&base_id),
      io::Error::new(io::ErrorKind::AlreadyExists, "no free run id suffix left"),
    ))
  }

  pub fn run_id(&self) -> &str {
    &self.run_id
  }

  pub fn log_dir(&self) -> &Path {
    &self.log_dir
  }

  pub fn output_dir(&self) -> &Path {
    &self.output_dir
  }

  pub fn started_at(&self) -> DateTime<Utc> {
    self.started_at
  }

  /// `<log_dir>/<NN>_<stage>.log`; the index prefix keeps listings in run order.
  pub fn stage_log_path(&self, index: usize, stage_name: &str) -> PathBuf {
    self.log_dir.join(format!("{:02}_{}.log", index, sanitize(stage_name)))
  }

  /// Per-stage working directory under `<output_dir>/stages/`. Not created eagerly.
  pub fn stage_dir(&self, stage_name: &str) -> PathBuf {
    self.output_dir.join("stages").join(sanitize(stage_name))
  }

  pub fn scratch_dir(&self) -> PathBuf {
    self.output_dir.join("tmp")
  }

  pub fn summary_path(&self) -> PathBuf {
    self.output_dir.join(SUMMARY_FILE_NAME)
  }
}

// Ok(false) when the directory already exists.
fn claim_dir(path: &Path) -> StrataResult<bool> {
  match fs::create_dir(path) {
    Ok(()) => Ok(true),
    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
    Err(e) => Err(StrataError::environment(path, e)),
  }
}

fn sanitize(name: &str) -> String {
  name
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
    .collect()
}
