//! Typed views of the six published partitions.
//!
//! Every field is optional. A field that is missing, `null`, or of an
//! unexpected shape decodes to `None` instead of failing the partition, so
//! an upstream schema change degrades into partially-empty records.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Decode a field, mapping any shape mismatch to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Decode a classification code published either as a string or a number.
fn lenient_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let code = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    Ok(code)
}

/// Statskontoret structural metadata. Its key set defines which agencies exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StktEntry {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub org_nr: Option<String>,
    #[serde(default, deserialize_with = "lenient_code", skip_serializing_if = "Option::is_none")]
    pub cofog: Option<String>,
    #[serde(default, deserialize_with = "lenient_code", skip_serializing_if = "Option::is_none")]
    pub cofog10: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub has_gd: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub latest_updated_by: Option<String>,
    /// Year (as string) to full-time equivalents
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub fte: Option<BTreeMap<String, f64>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub other_names: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub independent: Option<bool>,
}

/// SCB registry data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScbEntry {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub org_nr: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub employees: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub women: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub men: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Statute references from the Swedish Code of Statutes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SfsEntry {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub latest_updated_by: Option<String>,
}

/// Arbetsgivarverket payroll aggregates and contact details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgvEntry {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub postal_address: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub office_address: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub fte: Option<BTreeMap<String, f64>>,
}

/// ESV budget data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EsvEntry {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
}

/// Wikidata identifiers and lifecycle dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WdEntry {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub wiki_url: Option<String>,
}

/// The six unmerged partitions, keyed by agency name. This is the unit
/// that gets cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPartitions {
    #[serde(default)]
    pub scb: BTreeMap<String, ScbEntry>,
    #[serde(default)]
    pub stkt: BTreeMap<String, StktEntry>,
    #[serde(default)]
    pub sfs: BTreeMap<String, SfsEntry>,
    #[serde(default)]
    pub agv: BTreeMap<String, AgvEntry>,
    #[serde(default)]
    pub esv: BTreeMap<String, EsvEntry>,
    #[serde(default)]
    pub wd: BTreeMap<String, WdEntry>,
}

impl RawPartitions {
    /// Number of agencies in the authoritative partition
    pub fn agency_count(&self) -> usize {
        self.stkt.len()
    }
}
