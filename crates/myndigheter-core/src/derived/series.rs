use std::collections::BTreeMap;

use crate::models::AgencyRecord;

/// Agencies founded and dissolved in one calendar year.
#[derive(Debug, Clone, Default)]
pub struct YearAgencies<'a> {
    pub formed: Vec<&'a AgencyRecord>,
    pub dissolved: Vec<&'a AgencyRecord>,
}

pub fn agencies_in_year(records: &[AgencyRecord], year: i32) -> YearAgencies<'_> {
    YearAgencies {
        formed: records
            .iter()
            .filter(|r| r.start_year() == Some(year))
            .collect(),
        dissolved: records
            .iter()
            .filter(|r| r.end_year() == Some(year))
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearPoint {
    pub year: i32,
    /// Agencies in existence at some point during the year
    pub active: usize,
    pub formed: usize,
    pub dissolved: usize,
}

/// One point per year in `from..=to`.
pub fn agency_count_series(records: &[AgencyRecord], from: i32, to: i32) -> Vec<YearPoint> {
    (from..=to)
        .map(|year| YearPoint {
            year,
            active: records.iter().filter(|r| r.active_in(year)).count(),
            formed: records.iter().filter(|r| r.start_year() == Some(year)).count(),
            dissolved: records.iter().filter(|r| r.end_year() == Some(year)).count(),
        })
        .collect()
}

/// Recorded FTE values of one agency within `from..=to`; unrecorded years
/// are absent rather than zero.
pub fn fte_series(record: &AgencyRecord, from: i32, to: i32) -> BTreeMap<i32, f64> {
    let Some(history) = record.fte_history.as_ref() else {
        return BTreeMap::new();
    };

    history
        .iter()
        .filter_map(|(year, fte)| year.parse::<i32>().ok().map(|y| (y, *fte)))
        .filter(|(year, _)| (from..=to).contains(year))
        .collect()
}

/// Summed FTE across agencies, over the years at least one agency reports.
pub fn total_fte_series(records: &[AgencyRecord], from: i32, to: i32) -> BTreeMap<i32, f64> {
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for record in records {
        for (year, fte) in fte_series(record, from, to) {
            *totals.entry(year).or_insert(0.0) += fte;
        }
    }
    totals
}
