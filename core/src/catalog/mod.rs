// strata/src/catalog/mod.rs

//! The dataset layer catalog: which logical datasets exist, where they live,
//! and which join keys they promise.

pub mod defaults;
pub mod layer;
pub mod registry;
pub mod version;

pub use layer::{DatasetLayer, JoinKey, JoinKeySchema, KeyRole};
pub use registry::{Catalog, CatalogBuilder, CatalogEntry, DatasetFormat, KeyHint};
pub use version::{VersionComparator, VersionRule};
