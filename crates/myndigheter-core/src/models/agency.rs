use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::partitions::{AgvEntry, EsvEntry, RawPartitions, ScbEntry, SfsEntry, StktEntry, WdEntry};

/// Department label used when an agency has none
pub const UNKNOWN_DEPARTMENT: &str = "Okänt";

/// One government agency (or historical predecessor), merged from all partitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AgencyRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Comma-separated statute citations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statute_references: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_statute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_time_equivalent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub women_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub men_count: Option<u32>,
    /// Year (as string) to FTE; years may be missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fte_history: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cofog_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cofog10: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_agency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_director_general: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_independent_decision_authority: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikidata_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_url: Option<String>,
}

/// Leading four-digit year of an ISO date string ("1968-07-01" -> 1968)
pub fn year_of(date: &str) -> Option<i32> {
    date.get(..4)?.parse().ok()
}

impl AgencyRecord {
    /// Build one record from the authoritative entry plus whatever the other
    /// partitions hold for the same name.
    pub fn merge(
        name: &str,
        stkt: &StktEntry,
        scb: Option<&ScbEntry>,
        sfs: Option<&SfsEntry>,
        agv: Option<&AgvEntry>,
        esv: Option<&EsvEntry>,
        wd: Option<&WdEntry>,
    ) -> Self {
        let fte_history = stkt
            .fte
            .clone()
            .or_else(|| agv.and_then(|a| a.fte.clone()))
            .filter(|history| !history.is_empty());

        let full_time_equivalent = fte_history
            .as_ref()
            .and_then(|history| history.iter().next_back().map(|(_, v)| *v));

        Self {
            name: name.to_string(),
            short_name: stkt
                .short_name
                .clone()
                .or_else(|| esv.and_then(|e| e.short_name.clone())),
            name_en: wd.and_then(|w| w.name_en.clone()),
            other_names: stkt.other_names.clone().unwrap_or_default(),
            department: stkt.department.clone(),
            start_date: wd
                .and_then(|w| w.start.clone())
                .or_else(|| stkt.start.clone()),
            end_date: wd.and_then(|w| w.end.clone()),
            statute_references: sfs
                .and_then(|s| s.created_by.clone())
                .or_else(|| stkt.created_by.clone()),
            latest_statute: sfs
                .and_then(|s| s.latest_updated_by.clone())
                .or_else(|| stkt.latest_updated_by.clone()),
            employee_count: scb.and_then(|s| s.employees),
            full_time_equivalent,
            women_count: scb.and_then(|s| s.women),
            men_count: scb.and_then(|s| s.men),
            fte_history,
            organization_number: stkt
                .org_nr
                .clone()
                .or_else(|| scb.and_then(|s| s.org_nr.clone())),
            telephone: agv.and_then(|a| a.phone.clone()),
            email: agv.and_then(|a| a.email.clone()),
            website: agv.and_then(|a| a.website.clone()),
            postal_address: agv.and_then(|a| a.postal_address.clone()),
            office_address: agv.and_then(|a| a.office_address.clone()),
            city: scb.and_then(|s| s.city.clone()),
            structure_type: stkt.structure.clone(),
            cofog_code: stkt.cofog.clone(),
            cofog10: stkt.cofog10.clone(),
            host_agency: stkt.host.clone(),
            agency_group: agv.and_then(|a| a.group.clone()),
            has_director_general: stkt.has_gd,
            is_independent_decision_authority: stkt.independent,
            budget: esv.and_then(|e| e.budget),
            wikidata_id: wd.and_then(|w| w.id.clone()),
            wiki_url: wd.and_then(|w| w.wiki_url.clone()),
        }
    }

    /// An agency without an end date is still active
    pub fn is_active(&self) -> bool {
        self.end_date.is_none()
    }

    pub fn start_year(&self) -> Option<i32> {
        self.start_date.as_deref().and_then(year_of)
    }

    pub fn end_year(&self) -> Option<i32> {
        self.end_date.as_deref().and_then(year_of)
    }

    /// Whether the agency existed at some point during `year`
    pub fn active_in(&self, year: i32) -> bool {
        let started = self.start_year().map(|s| s <= year).unwrap_or(false);
        let not_ended = self.end_year().map(|e| e >= year).unwrap_or(true);
        started && not_ended
    }

    pub fn department_or_unknown(&self) -> &str {
        self.department.as_deref().unwrap_or(UNKNOWN_DEPARTMENT)
    }

    /// Short name if known, otherwise the full name
    pub fn display_short_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }

    /// Percentage of women, when both gender counts are known
    pub fn women_share(&self) -> Option<f64> {
        let women = self.women_count?;
        let men = self.men_count?;
        let total = u64::from(women) + u64::from(men);
        if total == 0 {
            return None;
        }
        Some(f64::from(women) / total as f64 * 100.0)
    }

    /// Individual statute citations
    pub fn statutes(&self) -> Vec<&str> {
        self.statute_references
            .as_deref()
            .map(|refs| {
                refs.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// FTE for a given year, if recorded
    pub fn fte_in(&self, year: i32) -> Option<f64> {
        self.fte_history
            .as_ref()
            .and_then(|history| history.get(&year.to_string()).copied())
    }
}

/// Join all partitions by agency name into one record per `stkt` key.
///
/// Records come out ordered by name. Sub-records missing from any
/// non-authoritative partition leave the corresponding fields `None`.
pub fn transform(raw: &RawPartitions) -> Vec<AgencyRecord> {
    raw.stkt
        .iter()
        .map(|(name, stkt)| {
            AgencyRecord::merge(
                name,
                stkt,
                raw.scb.get(name),
                raw.sfs.get(name),
                raw.agv.get(name),
                raw.esv.get(name),
                raw.wd.get(name),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{one_field_per_partition, sample_partitions};

    #[test]
    fn test_transform_unions_fields_from_all_partitions() {
        let raw = one_field_per_partition();
        let records = transform(&raw);

        assert_eq!(records.len(), 1);
        let a = &records[0];
        assert_eq!(a.name, "A");
        assert_eq!(a.employee_count, Some(1));
        assert_eq!(a.department.as_deref(), Some("Dep 2"));
        assert_eq!(a.statute_references.as_deref(), Some("SFS 3"));
        assert_eq!(a.telephone.as_deref(), Some("4"));
        assert_eq!(a.budget, Some(5.0));
        assert_eq!(a.end_date.as_deref(), Some("2006"));
    }

    #[test]
    fn test_transform_tolerates_missing_partition_entry() {
        let mut raw = sample_partitions();
        raw.scb.remove("Statskontoret");
        raw.wd.remove("Statskontoret");

        let records = transform(&raw);
        let record = records
            .iter()
            .find(|r| r.name == "Statskontoret")
            .expect("record should not be dropped");

        assert_eq!(record.employee_count, None);
        assert_eq!(record.city, None);
        assert_eq!(record.name_en, None);
        // Falls back to the structural partition's start date
        assert_eq!(record.start_date.as_deref(), Some("1965-07-01"));
        assert_eq!(record.department.as_deref(), Some("Finansdepartementet"));
    }

    #[test]
    fn test_transform_only_uses_authoritative_keys() {
        let mut raw = sample_partitions();
        raw.scb.insert("Okänd myndighet".to_string(), ScbEntry::default());

        let records = transform(&raw);
        assert_eq!(records.len(), raw.stkt.len());
        assert!(records.iter().all(|r| r.name != "Okänd myndighet"));
    }

    #[test]
    fn test_full_time_equivalent_is_latest_year() {
        let raw = sample_partitions();
        let records = transform(&raw);
        let skv = records
            .iter()
            .find(|r| r.name == "Skatteverket")
            .expect("Skatteverket present");

        assert_eq!(skv.full_time_equivalent, Some(11020.0));
        assert_eq!(skv.fte_in(2020), Some(10850.5));
        assert_eq!(skv.fte_in(2021), None);
    }

    #[test]
    fn test_women_share() {
        let mut record = AgencyRecord {
            name: "X".to_string(),
            women_count: Some(60),
            men_count: Some(40),
            ..Default::default()
        };
        assert_eq!(record.women_share(), Some(60.0));

        record.men_count = None;
        assert_eq!(record.women_share(), None);

        record.women_count = Some(0);
        record.men_count = Some(0);
        assert_eq!(record.women_share(), None);
    }

    #[test]
    fn test_women_share_with_extreme_counts() {
        let record = AgencyRecord {
            name: "X".to_string(),
            women_count: Some(u32::MAX),
            men_count: Some(1),
            ..Default::default()
        };
        let share = record.women_share().expect("share should be computed");
        assert!(share > 99.99 && share < 100.0);
    }

    #[test]
    fn test_statutes_split() {
        let record = AgencyRecord {
            name: "X".to_string(),
            statute_references: Some("SFS 2007:780, SFS 2016:1016,".to_string()),
            ..Default::default()
        };
        assert_eq!(record.statutes(), vec!["SFS 2007:780", "SFS 2016:1016"]);
    }

    #[test]
    fn test_active_in_year() {
        let record = AgencyRecord {
            name: "X".to_string(),
            start_date: Some("1968-07-01".to_string()),
            end_date: Some("2008-12-31".to_string()),
            ..Default::default()
        };
        assert!(!record.is_active());
        assert!(!record.active_in(1967));
        assert!(record.active_in(1968));
        assert!(record.active_in(2008));
        assert!(!record.active_in(2009));
    }

    #[test]
    fn test_record_serializes_camel_case_without_empty_fields() {
        let record = AgencyRecord {
            name: "A".to_string(),
            employee_count: Some(3),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(json, serde_json::json!({"name": "A", "employeeCount": 3}));
    }
}
