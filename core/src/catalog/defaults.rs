// strata/src/catalog/defaults.rs

//! The DeFi security dataset taxonomy, as laid out under the data root.

use crate::catalog::layer::{DatasetLayer, JoinKey, JoinKeySchema, KeyRole};
use crate::catalog::registry::{Catalog, CatalogEntry, DatasetFormat, KeyHint};
use crate::catalog::version::{VersionComparator, VersionRule};
use crate::error::StrataResult;

pub const AUDIT_GROUND_TRUTH: &str = "audit_ground_truth";
pub const CONTRACT_BRIDGE: &str = "contract_bridge";
pub const VERIFIED_CONTRACTS_MERGED: &str = "verified_contracts_merged";
pub const PANEL_PROTOCOL_YEAR: &str = "panel_protocol_year";
pub const MANUAL_NAME_TO_SLUG: &str = "manual_name_to_slug";
pub const BENCHMARK_INDEX: &str = "benchmark_index";

impl Catalog {
  /// The catalog of the DeFi security research dataset.
  pub fn defi_default() -> StrataResult<Catalog> {
    let contract_with_protocol = JoinKeySchema::new(KeyRole::Contract, [JoinKey::Chain, JoinKey::Address, JoinKey::Slug])?;

    Catalog::builder()
      .register(
        CatalogEntry::new(
          "exploit_archive_rekt",
          DatasetLayer::RawArchive,
          VersionRule::fixed("data_raw/exploits/exploit_events_rekt.csv"),
        )
        .described("Exploit events scraped from the rekt.news archive.")
        .optional(),
      )?
      .register(
        CatalogEntry::new(
          "exploit_archive_defillama",
          DatasetLayer::RawArchive,
          VersionRule::fixed("data_raw/exploits/exploit_events_defillama.csv"),
        )
        .described("Exploit events mined from the DefiLlama hacks feed.")
        .optional(),
      )?
      .register(
        CatalogEntry::new(
          "exploit_events",
          DatasetLayer::IntermediateNormalized,
          VersionRule::fixed("merged_hack_events.csv"),
        )
        .described("Deduplicated exploit events merged across all archives.")
        .optional(),
      )?
      .register(
        CatalogEntry::new(
          "security_events",
          DatasetLayer::IntermediateNormalized,
          VersionRule::fixed("data_raw/security/security_events.csv"),
        )
        .described("Audit and exploit events on one protocol timeline.")
        .with_schema(JoinKeySchema::protocol())
        .panel_joinable()
        .optional(),
      )?
      .register(
        CatalogEntry::new(
          AUDIT_GROUND_TRUTH,
          DatasetLayer::Gold,
          VersionRule::prefer_named(
            "data_raw/audits/audit_master_with_slug_defi_only_dedup.csv",
            ["data_raw/audits/audit_master_with_slug.csv"],
          ),
        )
        .described("Audit records mapped to protocol slugs.")
        .with_schema(JoinKeySchema::protocol())
        .panel_joinable()
        .with_key_hint(KeyHint {
          key: JoinKey::Slug,
          hint_column: "protocol_name_raw".to_string(),
          mapping_dataset: MANUAL_NAME_TO_SLUG.to_string(),
          from_column: "protocol_name_raw".to_string(),
          to_column: "slug".to_string(),
        }),
      )?
      .register(
        CatalogEntry::new(
          CONTRACT_BRIDGE,
          DatasetLayer::Gold,
          VersionRule::prefer_named(
            "data_raw/contracts/master_contracts_llama_adapters_chain_known.csv",
            [
              "data_raw/contracts/master_contracts_llama_adapters.csv",
              "data_raw/contracts/master_contracts.csv",
            ],
          ),
        )
        .described("Contract-to-protocol bridge table.")
        .with_schema(contract_with_protocol.clone())
        .panel_joinable(),
      )?
      .register(
        CatalogEntry::new(
          VERIFIED_CONTRACTS_MERGED,
          DatasetLayer::Gold,
          VersionRule::latest(
            "data_raw/contracts",
            "verified_contracts_merged",
            "csv",
            VersionComparator::Numeric,
          ),
        )
        .described("Verified contract sources merged across explorers; multi-version series.")
        .with_schema(JoinKeySchema::contract())
        .panel_joinable(),
      )?
      .register(
        CatalogEntry::new(
          "verification_enrichment",
          DatasetLayer::IntermediateNormalized,
          VersionRule::prefer_named(
            "data_raw/contracts/verified_with_controls.csv",
            ["data_raw/contracts/verified_contracts.csv"],
          ),
        )
        .described("Verification status and control-protocol flags per contract.")
        .with_schema(JoinKeySchema::contract())
        .optional(),
      )?
      .register(
        CatalogEntry::new(
          "static_analysis_findings",
          DatasetLayer::IntermediateNormalized,
          VersionRule::prefer_named(
            "outputs/slither_vulnerabilities.csv",
            ["data_raw/contracts/slither_vulnerabilities.csv"],
          ),
        )
        .described("Static-analysis finding counts per contract.")
        .optional(),
      )?
      .register(
        CatalogEntry::new(
          "severity_scores",
          DatasetLayer::IntermediateNormalized,
          VersionRule::fixed("outputs/severity_scored.csv"),
        )
        .described("Severity-weighted vulnerability scores.")
        .optional(),
      )?
      .register(
        CatalogEntry::new(
          "exploit_labels",
          DatasetLayer::IntermediateNormalized,
          VersionRule::fixed("outputs/exploit_labels_merged.csv"),
        )
        .described("Contracts labelled with the exploits that hit them.")
        .with_schema(contract_with_protocol)
        .panel_joinable()
        .optional(),
      )?
      .register(
        CatalogEntry::new(
          PANEL_PROTOCOL_YEAR,
          DatasetLayer::Gold,
          VersionRule::prefer_named(
            "data_raw/panel/panel_protocol_year_canonical.csv",
            ["data_clean/panel_protocol_year.csv"],
          ),
        )
        .described("Protocol-by-year analysis panel.")
        .with_schema(JoinKeySchema::protocol_year())
        .panel_joinable(),
      )?
      .register(
        CatalogEntry::new(
          "fetch_checkpoint",
          DatasetLayer::RawArchive,
          VersionRule::fixed("outputs/ckpt_fetch_sources.json"),
        )
        .described("Resumption state of the contract source fetcher.")
        .with_format(DatasetFormat::Opaque)
        .optional(),
      )?
      .register(
        CatalogEntry::new(
          "unmatched_audit_protocols",
          DatasetLayer::Diagnostic,
          VersionRule::fixed("data_raw/audits/unmatched_audit_protocols.csv"),
        )
        .described("Audited protocol names that could not be mapped to a slug.")
        .optional(),
      )?
      .register(
        CatalogEntry::new(
          MANUAL_NAME_TO_SLUG,
          DatasetLayer::Diagnostic,
          VersionRule::fixed("data_raw/audits/manual_name_to_slug.csv"),
        )
        .described("Hand-curated protocol name to slug overrides.")
        .optional(),
      )?
      .register(
        CatalogEntry::new(
          BENCHMARK_INDEX,
          DatasetLayer::ExternalBenchmark,
          VersionRule::fixed("data_benchmark/messiq_contracts_index.csv"),
        )
        .described("Index of an external labelled-contract benchmark. Never joined into the panel.")
        .optional(),
      )?
      .build()
  }
}
