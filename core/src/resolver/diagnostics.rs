// strata/src/resolver/diagnostics.rs

//! Writes rows that failed key validation to `unmatched_<dataset>.csv`.

use crate::error::{StrataError, StrataResult};
use csv::{StringRecord, Writer, WriterBuilder};
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{event, Level};

pub(crate) fn unmatched_path(diagnostics_dir: &Path, dataset: &str) -> PathBuf {
  diagnostics_dir.join(format!("unmatched_{}.csv", dataset))
}

fn csv_err(path: &Path) -> impl Fn(csv::Error) -> StrataError {
  let path = path.to_path_buf();
  move |e| StrataError::Csv {
    path: path.clone(),
    source: e,
  }
}

/// Streams diverted rows into a temporary sibling of the dataset's
/// diagnostics file.
///
/// The temporary file is opened on the first row. `finish` renames it into
/// place, or removes a stale diagnostics file when no row arrived.
/// `discard` drops a partial file after a failed scan.
pub(crate) struct UnmatchedSink {
  dataset: String,
  diagnostics_dir: PathBuf,
  target: PathBuf,
  tmp: PathBuf,
  writer: Option<Writer<File>>,
  rows: u64,
}

impl UnmatchedSink {
  pub(crate) fn new(diagnostics_dir: &Path, dataset: &str) -> Self {
    let target = unmatched_path(diagnostics_dir, dataset);
    Self {
      dataset: dataset.to_string(),
      diagnostics_dir: diagnostics_dir.to_path_buf(),
      tmp: target.with_extension("csv.tmp"),
      target,
      writer: None,
      rows: 0,
    }
  }

  /// Appends one row. `headers` is written ahead of the first row only.
  pub(crate) fn push(&mut self, headers: &StringRecord, row: &StringRecord) -> StrataResult<()> {
    if self.writer.is_none() {
      fs::create_dir_all(&self.diagnostics_dir).map_err(|e| StrataError::io(&self.diagnostics_dir, e))?;
      let mut writer = WriterBuilder::new()
        .flexible(true)
        .from_path(&self.tmp)
        .map_err(csv_err(&self.tmp))?;
      writer.write_record(headers).map_err(csv_err(&self.tmp))?;
      self.writer = Some(writer);
    }
    if let Some(writer) = self.writer.as_mut() {
      writer.write_record(row).map_err(csv_err(&self.tmp))?;
    }
    self.rows += 1;
    Ok(())
  }

  /// Publishes the diagnostics file. Returns the path written, if any.
  pub(crate) fn finish(mut self) -> StrataResult<Option<PathBuf>> {
    let Some(mut writer) = self.writer.take() else {
      match fs::remove_file(&self.target) {
        Ok(()) => {
          event!(Level::DEBUG, dataset = %self.dataset, path = %self.target.display(), "Removed stale diagnostics file.");
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(StrataError::io(&self.target, e)),
      }
      return Ok(None);
    };

    writer.flush().map_err(|e| StrataError::io(&self.tmp, e))?;
    drop(writer);
    fs::rename(&self.tmp, &self.target).map_err(|e| StrataError::io(&self.target, e))?;
    event!(
      Level::WARN,
      dataset = %self.dataset,
      unmatched = self.rows,
      path = %self.target.display(),
      "Rows with null join keys diverted to diagnostics."
    );
    Ok(Some(self.target))
  }

  /// Drops the partial temporary file. An earlier diagnostics file is left as it was.
  pub(crate) fn discard(mut self) {
    if self.writer.take().is_some() {
      if let Err(e) = fs::remove_file(&self.tmp) {
        event!(Level::WARN, dataset = %self.dataset, error = %e, path = %self.tmp.display(), "Partial diagnostics file could not be removed.");
      }
    }
  }
}
