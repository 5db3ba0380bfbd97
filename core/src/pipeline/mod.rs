// strata/src/pipeline/mod.rs

//! Defines the `Pipeline` stage list, its hooks, and the `Orchestrator` that runs it.

pub mod definition;
pub mod execution;
pub mod hooks;
pub mod summary;

pub use definition::Pipeline;
pub use execution::{ExecutionPolicy, Orchestrator};
pub use hooks::StageHook;
pub use summary::RunSummary;
