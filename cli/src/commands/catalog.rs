use crate::errors::Result;
use strata::Catalog;

/// Execute the `catalog` command: list the registered datasets.
pub fn execute(json: bool) -> Result<()> {
  let catalog = Catalog::defi_default()?;
  if json {
    let entries: Vec<_> = catalog.entries().collect();
    return super::print_json(&entries);
  }

  println!("{:<28} {:<24} {:<22} {:<9} RULE", "DATASET", "LAYER", "KEYS", "FLAGS");
  for entry in catalog.entries() {
    let keys = entry
      .schema()
      .map(|s| s.columns().join("+"))
      .unwrap_or_else(|| "-".to_string());
    let flags = format!(
      "{}{}",
      if entry.is_required() { "R" } else { "o" },
      if entry.is_panel_joinable() { "P" } else { "" }
    );
    println!(
      "{:<28} {:<24} {:<22} {:<9} {}",
      entry.name(),
      entry.layer().to_string(),
      keys,
      flags,
      entry.rule().describe()
    );
  }
  Ok(())
}
