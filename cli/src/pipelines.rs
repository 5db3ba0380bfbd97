// strata-cli/src/pipelines.rs

//! The research pipeline: each collaborator script, in data-dependency order.

use crate::config::StrataConfig;
use std::sync::Arc;
use strata::{Pipeline, ProcessExecutable, StageDescriptor, StrataResult};

/// (stage name, script, required, checkpoint relative to the data dir)
const DEFAULT_STAGES: &[(&str, &str, bool, Option<&str>)] = &[
  (
    "fetch_contracts",
    "fetch_sources_from_chain_known_seeds.py",
    true,
    Some("outputs/ckpt_fetch_sources.json"),
  ),
  ("static_analysis", "run_slither_batch.py", true, None),
  ("exploit_collection", "merge_hack_events.py", false, None),
  ("label_merge", "merge_security_results.py", true, None),
  ("severity_scoring", "compute_severity_scores.py", false, None),
  ("dynamic_analysis", "run_dynamic_batch.py", false, None),
];

pub fn default_pipeline(config: &StrataConfig) -> StrataResult<Pipeline> {
  let stages = DEFAULT_STAGES
    .iter()
    .map(|(name, script, required, checkpoint)| {
      let executable = ProcessExecutable::script(&config.python, config.scripts_dir.join(script))
        .current_dir(&config.data_dir)
        .env("PYTHONUNBUFFERED", "1");
      let descriptor = StageDescriptor::new(*name, Arc::new(executable), *required);
      match checkpoint {
        Some(path) => descriptor.with_checkpoint(config.data_dir.join(path)),
        None => descriptor,
      }
    })
    .collect();
  Pipeline::new(stages)
}
