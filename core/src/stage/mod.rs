// strata/src/stage/mod.rs

//! Wraps external collaborators as uniform pipeline stages.

pub mod adapter;
pub mod checkpoint;
pub mod executable;

pub use adapter::{run_stage, run_stage_with};
pub use checkpoint::{CheckpointObservation, CheckpointTransition};
pub use executable::{Completion, Invocation, ProcessExecutable, StageExecutable};
