// strata/src/catalog/layer.rs

//! Data-layer taxonomy and the join-key contract a dataset declares.

use crate::error::{StrataError, StrataResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetLayer {
  RawArchive,
  IntermediateNormalized,
  Gold,
  Diagnostic,
  ExternalBenchmark,
}

impl DatasetLayer {
  pub fn as_str(&self) -> &'static str {
    match self {
      DatasetLayer::RawArchive => "raw_archive",
      DatasetLayer::IntermediateNormalized => "intermediate_normalized",
      DatasetLayer::Gold => "gold",
      DatasetLayer::Diagnostic => "diagnostic",
      DatasetLayer::ExternalBenchmark => "external_benchmark",
    }
  }
}

impl fmt::Display for DatasetLayer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A column name that links rows across datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKey {
  Slug,
  Chain,
  Address,
  Month,
  Year,
}

impl JoinKey {
  /// The column header carrying this key.
  pub fn column(&self) -> &'static str {
    match self {
      JoinKey::Slug => "slug",
      JoinKey::Chain => "chain",
      JoinKey::Address => "address",
      JoinKey::Month => "month",
      JoinKey::Year => "year",
    }
  }
}

impl fmt::Display for JoinKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.column())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
  /// Keyed by `slug`.
  Protocol,
  /// Keyed by `chain` + `address`.
  Contract,
  /// Keyed by `slug` + `month` or `slug` + `year`.
  PanelIndex,
}

impl fmt::Display for KeyRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      KeyRole::Protocol => f.write_str("protocol"),
      KeyRole::Contract => f.write_str("contract"),
      KeyRole::PanelIndex => f.write_str("panel_index"),
    }
  }
}

/// The keys every accepted row of a dataset must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinKeySchema {
  required_keys: BTreeSet<JoinKey>,
  key_role: KeyRole,
}

impl JoinKeySchema {
  /// Builds a schema, checking the keys fit the role.
  pub fn new(key_role: KeyRole, keys: impl IntoIterator<Item = JoinKey>) -> StrataResult<Self> {
    let required_keys: BTreeSet<JoinKey> = keys.into_iter().collect();
    let has = |k: JoinKey| required_keys.contains(&k);
    let fits = match key_role {
      KeyRole::Protocol => has(JoinKey::Slug),
      KeyRole::Contract => has(JoinKey::Chain) && has(JoinKey::Address),
      KeyRole::PanelIndex => has(JoinKey::Slug) && (has(JoinKey::Month) != has(JoinKey::Year)),
    };
    if !fits {
      let keys: Vec<&str> = required_keys.iter().map(|k| k.column()).collect();
      return Err(StrataError::configuration(
        "join_key_schema",
        format!("keys [{}] do not satisfy the '{}' role", keys.join(", "), key_role),
      ));
    }
    Ok(Self { required_keys, key_role })
  }

  pub fn protocol() -> Self {
    Self {
      required_keys: BTreeSet::from([JoinKey::Slug]),
      key_role: KeyRole::Protocol,
    }
  }

  pub fn contract() -> Self {
    Self {
      required_keys: BTreeSet::from([JoinKey::Chain, JoinKey::Address]),
      key_role: KeyRole::Contract,
    }
  }

  pub fn protocol_year() -> Self {
    Self {
      required_keys: BTreeSet::from([JoinKey::Slug, JoinKey::Year]),
      key_role: KeyRole::PanelIndex,
    }
  }

  pub fn protocol_month() -> Self {
    Self {
      required_keys: BTreeSet::from([JoinKey::Slug, JoinKey::Month]),
      key_role: KeyRole::PanelIndex,
    }
  }

  pub fn required_keys(&self) -> &BTreeSet<JoinKey> {
    &self.required_keys
  }

  pub fn key_role(&self) -> KeyRole {
    self.key_role
  }

  pub fn columns(&self) -> Vec<&'static str> {
    self.required_keys.iter().map(|k| k.column()).collect()
  }

  pub fn contains(&self, key: JoinKey) -> bool {
    self.required_keys.contains(&key)
  }
}
