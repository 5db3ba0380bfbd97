// tests/resolver_tests.rs
mod common;

use common::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use strata::{
  Catalog, CatalogEntry, DatasetFormat, DatasetLayer, JoinKey, JoinKeySchema, KeyHint, Resolver, StrataError,
  VersionComparator, VersionRule,
};
use tempfile::TempDir;

const AUDITS_WITH_GAPS: &str = "\
slug,protocol_name_raw,auditor
aave,Aave,Trail of Bits
,Uniswap V3,OpenZeppelin
NaN,Mystery Finance,Unknown
<NA>,,Someone
compound,Compound,ChainSecurity
";

const MANUAL_OVERRIDES: &str = "\
protocol_name_raw,slug
uniswap v3,uniswap-v3
Ghost Protocol,
";

fn test_catalog() -> Arc<Catalog> {
  let catalog = Catalog::builder()
    .register(
      CatalogEntry::new("audits", DatasetLayer::Gold, VersionRule::fixed("gold/audits.csv"))
        .with_schema(JoinKeySchema::protocol())
        .panel_joinable()
        .with_key_hint(KeyHint {
          key: JoinKey::Slug,
          hint_column: "protocol_name_raw".to_string(),
          mapping_dataset: "manual_name_to_slug".to_string(),
          from_column: "protocol_name_raw".to_string(),
          to_column: "slug".to_string(),
        }),
    )
    .unwrap()
    .register(
      CatalogEntry::new(
        "manual_name_to_slug",
        DatasetLayer::Diagnostic,
        VersionRule::fixed("diag/manual_name_to_slug.csv"),
      )
      .optional(),
    )
    .unwrap()
    .register(
      CatalogEntry::new(
        "verified",
        DatasetLayer::Gold,
        VersionRule::latest("contracts", "verified_contracts_merged", "csv", VersionComparator::Numeric),
      )
      .with_schema(JoinKeySchema::contract())
      .panel_joinable(),
    )
    .unwrap()
    .register(
      CatalogEntry::new(
        "snapshots",
        DatasetLayer::RawArchive,
        VersionRule::latest("snapshots", "llama", "csv", VersionComparator::Timestamp("%Y%m%d".to_string())),
      )
      .optional(),
    )
    .unwrap()
    .register(
      CatalogEntry::new(
        "bridge",
        DatasetLayer::Gold,
        VersionRule::prefer_named("contracts/bridge_chain_known.csv", ["contracts/bridge.csv"]),
      )
      .with_schema(JoinKeySchema::contract())
      .panel_joinable(),
    )
    .unwrap()
    .register(
      CatalogEntry::new("events", DatasetLayer::IntermediateNormalized, VersionRule::fixed("events.csv"))
        .with_schema(JoinKeySchema::protocol())
        .panel_joinable()
        .optional(),
    )
    .unwrap()
    .register(
      CatalogEntry::new("bench", DatasetLayer::ExternalBenchmark, VersionRule::fixed("bench/index.csv")).optional(),
    )
    .unwrap()
    .register(
      CatalogEntry::new("ckpt", DatasetLayer::RawArchive, VersionRule::fixed("outputs/ckpt.json"))
        .with_format(DatasetFormat::Opaque)
        .optional(),
    )
    .unwrap()
    .build()
    .unwrap();
  Arc::new(catalog)
}

fn resolver(tmp: &TempDir) -> Resolver {
  Resolver::new(test_catalog(), tmp.path().join("data"), tmp.path().join("diagnostics"))
}

fn data(tmp: &TempDir) -> std::path::PathBuf {
  tmp.path().join("data")
}

fn write_contracts(root: &Path, relative: &str) {
  write_file(root, relative, "chain,address,name\nethereum,0xabc,Vault\nbsc,0xdef,Router\n");
}

#[test]
fn test_missing_key_column_is_schema_mismatch() {
  setup_tracing();
  let tmp = TempDir::new().unwrap();
  write_file(&data(&tmp), "gold/audits.csv", "protocol,auditor\naave,Trail of Bits\n");

  let err = resolver(&tmp).resolve("audits").unwrap_err();

  match err {
    StrataError::SchemaMismatch { dataset, missing, .. } => {
      assert_eq!(dataset, "audits");
      assert_eq!(missing, vec!["slug".to_string()]);
    }
    other => panic!("expected SchemaMismatch, got {:?}", other),
  }
  assert!(!tmp.path().join("diagnostics").exists());
}

#[test]
fn test_latest_picks_greatest_suffix_deterministically() {
  setup_tracing();
  let tmp = TempDir::new().unwrap();
  let root = data(&tmp);
  write_contracts(&root, "contracts/verified_contracts_merged.csv");
  write_contracts(&root, "contracts/verified_contracts_merged_v2.csv");
  write_contracts(&root, "contracts/verified_contracts_merged_v10.csv");
  write_contracts(&root, "contracts/verified_contracts_merged_v9.csv");
  write_file(&root, "contracts/unrelated.csv", "x\n1\n");
  let resolver = resolver(&tmp);

  let first = resolver.resolve("verified").unwrap();
  let second = resolver.resolve("verified").unwrap();

  assert_eq!(first.resolved_path, root.join("contracts/verified_contracts_merged_v10.csv"));
  assert_eq!(first.candidates.len(), 4);
  assert_eq!(first, second);
  assert_eq!(first.validation.total_row_count, 2);
  assert_eq!(first.validation.matched_row_count, 2);
}

#[test]
fn test_non_version_siblings_never_outrank_versions() {
  setup_tracing();
  let tmp = TempDir::new().unwrap();
  let root = data(&tmp);
  write_contracts(&root, "contracts/verified_contracts_merged_v2.csv");
  write_contracts(&root, "contracts/verified_contracts_merged_v10.csv");
  write_contracts(&root, "contracts/verified_contracts_merged_with_controls.csv");
  write_contracts(&root, "contracts/verified_contracts_merged_dedup.csv");

  let selection = resolver(&tmp).resolve("verified").unwrap();

  assert_eq!(selection.resolved_path, root.join("contracts/verified_contracts_merged_v10.csv"));
  assert_eq!(selection.candidates.len(), 4);
}

#[test]
fn test_only_non_version_siblings_is_no_candidate() {
  let tmp = TempDir::new().unwrap();
  write_contracts(&data(&tmp), "contracts/verified_contracts_merged_with_controls.csv");

  let err = resolver(&tmp).resolve("verified").unwrap_err();
  assert!(matches!(err, StrataError::NoCandidate { .. }));
}

#[test]
fn test_base_file_ranks_below_versions() {
  let tmp = TempDir::new().unwrap();
  let root = data(&tmp);
  write_contracts(&root, "contracts/verified_contracts_merged.csv");
  assert_eq!(
    resolver(&tmp).locate("verified").unwrap(),
    root.join("contracts/verified_contracts_merged.csv")
  );

  write_contracts(&root, "contracts/verified_contracts_merged_1.csv");
  assert_eq!(
    resolver(&tmp).locate("verified").unwrap(),
    root.join("contracts/verified_contracts_merged_1.csv")
  );
}

#[test]
fn test_version_tie_is_ambiguous() {
  let tmp = TempDir::new().unwrap();
  let root = data(&tmp);
  write_contracts(&root, "contracts/verified_contracts_merged_2.csv");
  write_contracts(&root, "contracts/verified_contracts_merged-02.csv");
  write_contracts(&root, "contracts/verified_contracts_merged_1.csv");

  let err = resolver(&tmp).resolve("verified").unwrap_err();

  match err {
    StrataError::AmbiguousVersion { dataset, tied } => {
      assert_eq!(dataset, "verified");
      assert_eq!(tied.len(), 2);
    }
    other => panic!("expected AmbiguousVersion, got {:?}", other),
  }
}

#[test]
fn test_timestamp_versions_ignore_unreadable_suffixes() {
  let tmp = TempDir::new().unwrap();
  let root = data(&tmp);
  write_file(&root, "snapshots/llama_20240101.csv", "slug\naave\n");
  write_file(&root, "snapshots/llama_20240301.csv", "slug\naave\n");
  write_file(&root, "snapshots/llama_final.csv", "slug\naave\n");

  let selection = resolver(&tmp).resolve("snapshots").unwrap();

  assert_eq!(selection.resolved_path, root.join("snapshots/llama_20240301.csv"));
  assert_eq!(selection.candidates.len(), 3);
}

#[test]
fn test_prefer_named_falls_back_then_prefers_primary() {
  let tmp = TempDir::new().unwrap();
  let root = data(&tmp);
  write_contracts(&root, "contracts/bridge.csv");

  let fallback = resolver(&tmp).resolve("bridge").unwrap();
  assert_eq!(fallback.resolved_path, root.join("contracts/bridge.csv"));

  write_contracts(&root, "contracts/bridge_chain_known.csv");
  let primary = resolver(&tmp).resolve("bridge").unwrap();
  assert_eq!(primary.resolved_path, root.join("contracts/bridge_chain_known.csv"));
  assert_eq!(primary.candidates.len(), 2);
}

#[test]
fn test_no_candidate_and_unknown_dataset() {
  let tmp = TempDir::new().unwrap();
  let resolver = resolver(&tmp);

  assert!(matches!(resolver.resolve("bridge"), Err(StrataError::NoCandidate { .. })));
  assert!(matches!(resolver.resolve("verified"), Err(StrataError::NoCandidate { .. })));
  assert!(matches!(resolver.resolve("nope"), Err(StrataError::UnknownDataset { .. })));
}

#[test]
fn test_null_keys_are_diverted_to_diagnostics() {
  setup_tracing();
  let tmp = TempDir::new().unwrap();
  let source = write_file(&data(&tmp), "gold/audits.csv", AUDITS_WITH_GAPS);

  let selection = resolver(&tmp).resolve("audits").unwrap();

  let v = &selection.validation;
  assert_eq!(v.total_row_count, 5);
  assert_eq!(v.matched_row_count, 2);
  assert_eq!(v.unmatched_row_count, 3);
  assert_eq!(v.hinted_row_count, 0);
  assert!(!selection.is_fully_matched());

  let diag = tmp.path().join("diagnostics").join("unmatched_audits.csv");
  assert_eq!(v.unmatched_sample_paths, vec![diag.clone()]);
  let written = fs::read_to_string(&diag).unwrap();
  assert!(written.starts_with("slug,protocol_name_raw,auditor\n"));
  assert_eq!(written.lines().count(), 4);
  assert!(written.contains("Mystery Finance"));
  assert!(written.contains("Uniswap V3"));

  // Source data is never touched.
  assert_eq!(fs::read_to_string(&source).unwrap(), AUDITS_WITH_GAPS);
}

#[test]
fn test_manual_override_only_annotates_unmatched_rows() {
  setup_tracing();
  let tmp = TempDir::new().unwrap();
  let root = data(&tmp);
  write_file(&root, "gold/audits.csv", AUDITS_WITH_GAPS);
  write_file(&root, "diag/manual_name_to_slug.csv", MANUAL_OVERRIDES);

  let selection = resolver(&tmp).resolve("audits").unwrap();

  let v = &selection.validation;
  assert_eq!(v.total_row_count, 5);
  assert_eq!(v.matched_row_count, 2);
  assert_eq!(v.unmatched_row_count, 3);
  assert_eq!(v.hinted_row_count, 1);

  let written = fs::read_to_string(&v.unmatched_sample_paths[0]).unwrap();
  let lines: Vec<&str> = written.lines().collect();
  assert_eq!(lines[0], "slug,protocol_name_raw,auditor,override_available");
  assert_eq!(lines.len(), 4);
  assert!(lines.contains(&",Uniswap V3,OpenZeppelin,true"));
  assert!(lines.contains(&"NaN,Mystery Finance,Unknown,false"));
}

#[test]
fn test_blank_slug_never_joins_the_panel_through_an_override() {
  let tmp = TempDir::new().unwrap();
  let root = data(&tmp);
  write_file(&root, "gold/audits.csv", "slug,protocol_name_raw\naave,Aave\n,Uniswap V3\n");
  write_file(&root, "diag/manual_name_to_slug.csv", "protocol_name_raw,slug\nUniswap V3,uniswap-v3\n");

  let selection = resolver(&tmp).resolve_for_panel("audits").unwrap();

  let v = &selection.validation;
  assert_eq!(v.matched_row_count, 1);
  assert_eq!(v.unmatched_row_count, 1);
  assert_eq!(v.hinted_row_count, 1);
  assert!(!selection.is_fully_matched());
  let diag = tmp.path().join("diagnostics").join("unmatched_audits.csv");
  assert_eq!(v.unmatched_sample_paths, vec![diag.clone()]);
  assert!(fs::read_to_string(&diag).unwrap().contains("Uniswap V3"));
  assert!(!tmp.path().join("diagnostics").join("unmatched_audits.csv.tmp").exists());
}

#[test]
fn test_stale_diagnostics_are_removed_once_clean() {
  let tmp = TempDir::new().unwrap();
  let root = data(&tmp);
  write_file(&root, "gold/audits.csv", AUDITS_WITH_GAPS);
  let resolver = resolver(&tmp);
  let diag = tmp.path().join("diagnostics").join("unmatched_audits.csv");

  resolver.resolve("audits").unwrap();
  assert!(diag.is_file());

  write_file(&root, "gold/audits.csv", "slug,protocol_name_raw\naave,Aave\n");
  let clean = resolver.resolve("audits").unwrap();

  assert!(clean.is_fully_matched());
  assert!(clean.validation.unmatched_sample_paths.is_empty());
  assert!(!diag.exists());
}

#[test]
fn test_repeated_resolution_is_identical() {
  let tmp = TempDir::new().unwrap();
  write_file(&data(&tmp), "gold/audits.csv", AUDITS_WITH_GAPS);
  let resolver = resolver(&tmp);

  let first = resolver.resolve("audits").unwrap();
  let second = resolver.resolve("audits").unwrap();

  assert_eq!(first, second);
}

#[test]
fn test_benchmark_never_joins_the_panel() {
  let tmp = TempDir::new().unwrap();
  write_file(&data(&tmp), "bench/index.csv", "contract,label\nA.sol,reentrancy\n");
  let resolver = resolver(&tmp);

  let err = resolver.resolve_for_panel("bench").unwrap_err();
  assert!(matches!(err, StrataError::NotJoinable { ref layer, .. } if layer == "external_benchmark"));

  // Still resolvable on its own; no keys means every row counts.
  let standalone = resolver.resolve("bench").unwrap();
  assert_eq!(standalone.layer, DatasetLayer::ExternalBenchmark);
  assert_eq!(standalone.validation.matched_row_count, 1);
}

#[test]
fn test_resolve_panel_skips_absent_optional_datasets() {
  setup_tracing();
  let tmp = TempDir::new().unwrap();
  let root = data(&tmp);
  write_file(&root, "gold/audits.csv", "slug\naave\n");
  write_contracts(&root, "contracts/verified_contracts_merged_3.csv");
  write_contracts(&root, "contracts/bridge.csv");
  write_file(&root, "bench/index.csv", "contract\nA.sol\n");

  let manifest = resolver(&tmp).resolve_panel().unwrap();

  let names: Vec<&str> = manifest.selections.iter().map(|s| s.logical_dataset_name.as_str()).collect();
  assert_eq!(names, vec!["audits", "bridge", "verified"]);
  assert_eq!(manifest.skipped, vec!["events".to_string()]);
  assert!(manifest.get("bench").is_none());
  assert_eq!(manifest.unmatched_row_count(), 0);
}

#[test]
fn test_resolve_panel_fails_on_missing_required_dataset() {
  let tmp = TempDir::new().unwrap();
  write_file(&data(&tmp), "gold/audits.csv", "slug\naave\n");

  let err = resolver(&tmp).resolve_panel().unwrap_err();
  assert!(matches!(err, StrataError::NoCandidate { .. }));
}

#[test]
fn test_opaque_checkpoint_is_located_without_row_checks() {
  let tmp = TempDir::new().unwrap();
  write_file(&data(&tmp), "outputs/ckpt.json", r#"{"done": ["0xabc"]}"#);

  let selection = resolver(&tmp).resolve("ckpt").unwrap();

  assert_eq!(selection.validation.total_row_count, 0);
  assert!(selection.validation.unmatched_sample_paths.is_empty());
}

#[test]
fn test_selection_is_persisted_only_on_request() {
  let tmp = TempDir::new().unwrap();
  write_contracts(&data(&tmp), "contracts/bridge.csv");
  let selection = resolver(&tmp).resolve("bridge").unwrap();
  let out = tmp.path().join("bridge_selection.json");
  assert!(!out.exists());

  selection.write_to(&out).unwrap();

  let raw: serde_json::Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
  assert_eq!(raw["logical_dataset_name"], "bridge");
  assert_eq!(raw["layer"], "gold");
  assert_eq!(raw["validation"]["matched_row_count"], 2);
}
