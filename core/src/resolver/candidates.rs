// strata/src/resolver/candidates.rs

//! Finds the physical files behind a version rule and picks exactly one.

use crate::catalog::version::{VersionComparator, VersionKey, VersionRule};
use crate::error::{StrataError, StrataResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{event, Level};

const VERSION_SEPARATORS: [char; 3] = ['_', '-', '.'];

/// The outcome of applying a rule to the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Located {
  pub chosen: PathBuf,
  /// Every existing candidate, sorted by path.
  pub candidates: Vec<PathBuf>,
}

/// Splits `file_name` against `<stem>[<sep><suffix>].<extension>`.
///
/// `Some(None)` is the un-suffixed base file, `Some(Some(suffix))` a
/// versioned one, `None` a file that does not belong to the series.
pub(crate) fn version_suffix<'a>(file_name: &'a str, stem: &str, extension: &str) -> Option<Option<&'a str>> {
  let rest = file_name.strip_prefix(stem)?;
  let rest = rest.strip_suffix(extension)?.strip_suffix('.')?;
  if rest.is_empty() {
    return Some(None);
  }
  let mut chars = rest.chars();
  let sep = chars.next()?;
  let suffix = chars.as_str();
  if VERSION_SEPARATORS.contains(&sep) && !suffix.is_empty() {
    Some(Some(suffix))
  } else {
    None
  }
}

pub(crate) fn locate(dataset: &str, data_root: &Path, rule: &VersionRule) -> StrataResult<Located> {
  match rule {
    VersionRule::FixedPath { path } => {
      let full = data_root.join(path);
      if full.is_file() {
        Ok(Located {
          chosen: full.clone(),
          candidates: vec![full],
        })
      } else {
        Err(no_candidate(dataset, full))
      }
    }
    VersionRule::PreferNamed { primary, fallbacks } => {
      let ordered: Vec<PathBuf> = std::iter::once(primary)
        .chain(fallbacks.iter())
        .map(|p| data_root.join(p))
        .collect();
      let mut candidates: Vec<PathBuf> = ordered.iter().filter(|p| p.is_file()).cloned().collect();
      let chosen = candidates.first().cloned().ok_or_else(|| no_candidate(dataset, data_root.join(primary)))?;
      if chosen != ordered[0] {
        event!(Level::INFO, dataset, chosen = %chosen.display(), "Preferred file absent; using fallback.");
      }
      candidates.sort();
      Ok(Located { chosen, candidates })
    }
    VersionRule::Latest {
      dir,
      stem,
      extension,
      comparator,
    } => locate_latest(dataset, &data_root.join(dir), stem, extension, comparator),
  }
}

fn locate_latest(
  dataset: &str,
  dir: &Path,
  stem: &str,
  extension: &str,
  comparator: &VersionComparator,
) -> StrataResult<Located> {
  let listing = match fs::read_dir(dir) {
    Ok(listing) => listing,
    Err(e) if e.kind() == ErrorKind::NotFound => return Err(no_candidate(dataset, dir.to_path_buf())),
    Err(e) => return Err(StrataError::io(dir, e)),
  };

  let mut candidates = Vec::new();
  for entry in listing {
    let entry = entry.map_err(|e| StrataError::io(dir, e))?;
    let path = entry.path();
    if !path.is_file() {
      continue;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else { continue };
    if version_suffix(name, stem, extension).is_some() {
      candidates.push(path);
    }
  }
  candidates.sort();

  // The base file ranks lowest: `None` orders before any `Some(key)`.
  let mut ranked: Vec<(Option<VersionKey>, &PathBuf)> = Vec::with_capacity(candidates.len());
  for path in &candidates {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    match version_suffix(name, stem, extension) {
      Some(None) => ranked.push((None, path)),
      Some(Some(suffix)) => match comparator.key(suffix) {
        Some(key) => ranked.push((Some(key), path)),
        None => {
          event!(Level::WARN, dataset, file = %path.display(), %comparator, "Ignoring candidate whose suffix is not a version.");
        }
      },
      None => {}
    }
  }

  let best_key = match ranked.iter().map(|(key, _)| key).max() {
    Some(key) => key.clone(),
    None => return Err(no_candidate(dataset, dir.to_path_buf())),
  };
  let tied: Vec<PathBuf> = ranked
    .iter()
    .filter(|(key, _)| *key == best_key)
    .map(|(_, path)| (*path).clone())
    .collect();
  if tied.len() > 1 {
    event!(Level::ERROR, dataset, num_tied = tied.len(), "Version tie cannot be broken.");
    return Err(StrataError::AmbiguousVersion {
      dataset: dataset.to_string(),
      tied,
    });
  }
  let chosen = tied.into_iter().next().ok_or_else(|| no_candidate(dataset, dir.to_path_buf()))?;
  Ok(Located { chosen, candidates })
}

fn no_candidate(dataset: &str, searched: PathBuf) -> StrataError {
  StrataError::NoCandidate {
    dataset: dataset.to_string(),
    searched,
  }
}
