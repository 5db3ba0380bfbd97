pub mod catalog;
pub mod panel;
pub mod resolve;
pub mod run;
pub mod stages;

use crate::config::StrataConfig;
use crate::errors::Result;
use std::sync::Arc;
use strata::{Catalog, Resolver};

pub(crate) fn resolver(config: &StrataConfig) -> Result<Resolver> {
  let catalog = Arc::new(Catalog::defi_default()?);
  Ok(Resolver::new(catalog, &config.data_dir, &config.diagnostics_dir))
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
