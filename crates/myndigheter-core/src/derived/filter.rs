use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::AgencyRecord;
use crate::utils::{cmp_swedish, contains_ignore_case};

/// Minimum query length before suggestions are offered
const SUGGESTION_MIN_QUERY_LEN: usize = 2;

/// Maximum number of search suggestions
const MAX_SUGGESTIONS: usize = 8;

/// Maximum number of related agencies shown for a selection
const MAX_RELATED: usize = 5;

/// Sort key for dissolved/undated agencies when sorting by start date
const UNKNOWN_START: &str = "1800";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    pub fn matches(&self, record: &AgencyRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => record.is_active(),
            StatusFilter::Inactive => !record.is_active(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Alphabetical, Swedish collation
    #[default]
    Name,
    /// Largest headcount first
    Employees,
    /// Most recently founded first
    StartDate,
}

/// Registry filter settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgencyFilter {
    pub search: String,
    pub status: StatusFilter,
    pub department: Option<String>,
    pub sort: SortOrder,
}

impl AgencyFilter {
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = query.into();
        self
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

pub fn active_agencies(records: &[AgencyRecord]) -> Vec<&AgencyRecord> {
    records.iter().filter(|r| r.is_active()).collect()
}

pub fn inactive_agencies(records: &[AgencyRecord]) -> Vec<&AgencyRecord> {
    records.iter().filter(|r| !r.is_active()).collect()
}

/// Check if a record matches the search query.
/// Query should already be lowercased.
fn matches_search(record: &AgencyRecord, query: &str) -> bool {
    contains_ignore_case(&record.name, query)
        || record
            .name_en
            .as_deref()
            .map(|s| contains_ignore_case(s, query))
            .unwrap_or(false)
        || record
            .short_name
            .as_deref()
            .map(|s| contains_ignore_case(s, query))
            .unwrap_or(false)
        || record
            .department
            .as_deref()
            .map(|s| contains_ignore_case(s, query))
            .unwrap_or(false)
}

fn compare(a: &AgencyRecord, b: &AgencyRecord, sort: SortOrder) -> Ordering {
    match sort {
        SortOrder::Name => cmp_swedish(&a.name, &b.name),
        SortOrder::Employees => b
            .employee_count
            .unwrap_or(0)
            .cmp(&a.employee_count.unwrap_or(0))
            .then_with(|| cmp_swedish(&a.name, &b.name)),
        SortOrder::StartDate => {
            let start_a = a.start_date.as_deref().unwrap_or(UNKNOWN_START);
            let start_b = b.start_date.as_deref().unwrap_or(UNKNOWN_START);
            start_b
                .cmp(start_a)
                .then_with(|| cmp_swedish(&a.name, &b.name))
        }
    }
}

/// Apply search, status, and department filters, then sort.
pub fn filter_agencies<'a>(records: &'a [AgencyRecord], filter: &AgencyFilter) -> Vec<&'a AgencyRecord> {
    let mut result: Vec<&AgencyRecord> = records.iter().collect();

    if !filter.search.is_empty() {
        let query = filter.search.to_lowercase();
        result.retain(|r| matches_search(r, &query));
    }

    result.retain(|r| filter.status.matches(r));

    if let Some(ref department) = filter.department {
        result.retain(|r| r.department.as_deref() == Some(department.as_str()));
    }

    result.sort_by(|a, b| compare(a, b, filter.sort));
    result
}

/// Quick-search hits on name, short name, or English name.
pub fn search_suggestions<'a>(records: &'a [AgencyRecord], query: &str) -> Vec<&'a AgencyRecord> {
    if query.chars().count() < SUGGESTION_MIN_QUERY_LEN {
        return Vec::new();
    }

    let query = query.to_lowercase();
    records
        .iter()
        .filter(|r| {
            contains_ignore_case(&r.name, &query)
                || r.short_name
                    .as_deref()
                    .map(|s| contains_ignore_case(s, &query))
                    .unwrap_or(false)
                || r.name_en
                    .as_deref()
                    .map(|s| contains_ignore_case(s, &query))
                    .unwrap_or(false)
        })
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Distinct departments of active agencies, in Swedish order.
pub fn departments(records: &[AgencyRecord]) -> Vec<&str> {
    let unique: BTreeSet<&str> = records
        .iter()
        .filter(|r| r.is_active())
        .filter_map(|r| r.department.as_deref())
        .collect();

    let mut departments: Vec<&str> = unique.into_iter().collect();
    departments.sort_by(|a, b| cmp_swedish(a, b));
    departments
}

/// Active agencies in the same department as `selected`, or hosting /
/// hosted by it.
pub fn related_agencies<'a>(
    selected: &AgencyRecord,
    records: &'a [AgencyRecord],
) -> Vec<&'a AgencyRecord> {
    records
        .iter()
        .filter(|r| r.is_active() && r.name != selected.name)
        .filter(|r| {
            let same_department =
                r.department.is_some() && r.department == selected.department;
            let hosted_by_selected = r.host_agency.as_deref() == Some(selected.name.as_str());
            let hosts_selected = selected.host_agency.as_deref() == Some(r.name.as_str());
            same_department || hosted_by_selected || hosts_selected
        })
        .take(MAX_RELATED)
        .collect()
}
