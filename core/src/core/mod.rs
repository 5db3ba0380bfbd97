pub mod control;
pub mod progress;
pub mod result;
pub mod run_context;
pub mod stage;

// Re-export key types for easier access from other strata modules (and lib.rs)
pub use control::{FailureReason, HaltReason, PipelineControl, RunOutcome, StageStatus};
pub use progress::{ProgressHandle, RunProgress, RunState};
pub use result::StageResult;
pub use run_context::{create_run, RunContext, RunLayout};
pub use stage::StageDescriptor;
