// src/lib.rs

//! Strata: staged pipeline orchestration and canonical dataset resolution
//! for reproducible DeFi security research panels.
//!
//! Strata has two halves:
//!  - An orchestrator that runs an ordered list of external collaborators
//!    (fetchers, analyzers, mergers) as stages, one at a time, with
//!    required/optional failure policy, per-stage logs and timeouts, and a
//!    durable run summary under a fresh, timestamped run directory.
//!  - A resolver that maps a logical dataset name onto exactly one physical
//!    file using the dataset catalog's version rule, checks the file's join
//!    keys, and diverts rows with null keys to diagnostics.

pub mod catalog;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod stage;

// --- Re-exports for the Public API ---

// Run model
pub use crate::core::control::{FailureReason, HaltReason, PipelineControl, RunOutcome, StageStatus};
pub use crate::core::progress::{ProgressHandle, RunProgress, RunState};
pub use crate::core::result::StageResult;
pub use crate::core::run_context::{create_run, RunContext, RunLayout};
pub use crate::core::stage::StageDescriptor;

// Collaborators
pub use crate::stage::adapter::{run_stage, run_stage_with};
pub use crate::stage::checkpoint::{CheckpointObservation, CheckpointTransition};
pub use crate::stage::executable::{Completion, Invocation, ProcessExecutable, StageExecutable};

// The pipeline and the orchestrator that runs it
pub use crate::pipeline::definition::Pipeline;
pub use crate::pipeline::execution::{ExecutionPolicy, Orchestrator};
pub use crate::pipeline::summary::RunSummary;

// Datasets
pub use crate::catalog::{
  Catalog, CatalogBuilder, CatalogEntry, DatasetFormat, DatasetLayer, JoinKey, JoinKeySchema, KeyHint, KeyRole,
  VersionComparator, VersionRule,
};
pub use crate::resolver::{CanonicalSelection, PanelManifest, Resolver, ValidationReport};

pub use crate::error::{StrataError, StrataResult};

/*
    Core Workflow:
    1. Describe each collaborator as a `StageExecutable` (usually a `ProcessExecutable`).
    2. Wrap each in a `StageDescriptor`, marking it required or optional.
    3. Build a `Pipeline` from the descriptors in dependency order.
    4. Create an `Orchestrator` over a `RunLayout` and call `execute(&pipeline).await`.
    5. Inspect the returned `RunSummary` (also written to `<output_dir>/run_summary.json`).
    6. Resolve the resulting gold files with a `Resolver` over `Catalog::defi_default()`.
*/
