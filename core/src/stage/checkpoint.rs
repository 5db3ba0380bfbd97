// strata/src/stage/checkpoint.rs

//! Read-only observation of a stage's resumption checkpoint.
//!
//! Checkpoints belong to the collaborator that writes them. The core only
//! looks at them before and after a stage so a summary shows whether a
//! resumable stage moved forward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{event, Level};

// Larger files are not parsed for their keys.
const MAX_INSPECT_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointObservation {
  pub exists: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub size_bytes: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub modified_at: Option<DateTime<Utc>>,
  /// Top-level keys when the checkpoint is a JSON object.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub json_keys: Option<Vec<String>>,
}

impl CheckpointObservation {
  fn absent() -> Self {
    Self {
      exists: false,
      size_bytes: None,
      modified_at: None,
      json_keys: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointTransition {
  pub path: PathBuf,
  pub before: CheckpointObservation,
  pub after: CheckpointObservation,
}

impl CheckpointTransition {
  /// Created, rewritten or resized during the stage.
  pub fn advanced(&self) -> bool {
    self.after.exists
      && (!self.before.exists
        || self.before.modified_at != self.after.modified_at
        || self.before.size_bytes != self.after.size_bytes)
  }
}

/// Never fails: an unreadable checkpoint is reported as existing with unknown details.
pub fn observe(path: &Path) -> CheckpointObservation {
  let meta = match fs::metadata(path) {
    Ok(meta) if meta.is_file() => meta,
    Ok(_) => {
      event!(Level::WARN, path = %path.display(), "Checkpoint path is not a file.");
      return CheckpointObservation::absent();
    }
    Err(_) => return CheckpointObservation::absent(),
  };

  let modified_at = meta.modified().ok().map(DateTime::<Utc>::from);
  let json_keys = if meta.len() <= MAX_INSPECT_BYTES {
    fs::read(path)
      .ok()
      .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(&bytes).ok())
      .and_then(|value| match value {
        serde_json::Value::Object(map) => Some(map.keys().cloned().collect()),
        _ => None,
      })
  } else {
    None
  };

  CheckpointObservation {
    exists: true,
    size_bytes: Some(meta.len()),
    modified_at,
    json_keys,
  }
}
