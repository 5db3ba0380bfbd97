// strata/src/resolver/mod.rs

//! The canonical dataset resolver.

pub mod canonical;
pub(crate) mod candidates;
pub(crate) mod diagnostics;
pub mod selection;
pub(crate) mod validate;

pub use canonical::Resolver;
pub use selection::{CanonicalSelection, PanelManifest, ValidationReport};
