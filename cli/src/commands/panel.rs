use super::{print_json, resolver};
use crate::config::StrataConfig;
use crate::errors::Result;
use std::path::Path;

/// Execute the `panel` command: resolve every panel-joinable dataset.
pub fn execute(config: &StrataConfig, write: Option<&Path>) -> Result<()> {
  let manifest = resolver(config)?.resolve_panel()?;
  if let Some(path) = write {
    manifest.write_to(path)?;
  }
  print_json(&manifest)
}
