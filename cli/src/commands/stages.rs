use crate::config::StrataConfig;
use crate::errors::Result;
use crate::manifest::PipelineManifest;
use crate::pipelines::default_pipeline;
use std::path::Path;

/// Execute the `stages` command: list stages and whether each collaborator can be found.
pub fn execute(config: &StrataConfig, manifest: Option<&Path>) -> Result<()> {
  let pipeline = match manifest {
    Some(path) => PipelineManifest::load(path)?.to_pipeline(config)?,
    None => default_pipeline(config)?,
  };

  for (idx, stage) in pipeline.stages().iter().enumerate() {
    let executable = stage.executable();
    let availability = match executable.locate() {
      Ok(()) => "available".to_string(),
      Err(detail) => format!("missing: {}", detail),
    };
    println!(
      "[{:>2}] {:<20} {:<9} {}",
      idx,
      stage.name(),
      if stage.is_required() { "required" } else { "optional" },
      availability
    );
    println!("     {}", executable.describe());
  }
  Ok(())
}
