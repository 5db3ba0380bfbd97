use super::{print_json, resolver};
use crate::config::StrataConfig;
use crate::errors::Result;
use std::path::Path;

/// Execute the `resolve` command: select and validate one dataset, print it as JSON.
pub fn execute(config: &StrataConfig, dataset: &str, for_panel: bool, write: Option<&Path>) -> Result<()> {
  let resolver = resolver(config)?;
  let selection = if for_panel {
    resolver.resolve_for_panel(dataset)?
  } else {
    resolver.resolve(dataset)?
  };

  if let Some(path) = write {
    selection.write_to(path)?;
    tracing::info!(path = %path.display(), "Selection written.");
  }
  print_json(&selection)
}
