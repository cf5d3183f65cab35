use std::collections::HashMap;
use std::fmt;

use crate::models::AgencyRecord;
use crate::utils::cmp_swedish;

/// COFOG top-level division name, in Swedish
pub fn cofog_name(code: &str) -> Option<&'static str> {
    let name = match code.trim().parse::<u8>().ok()? {
        1 => "Allmän offentlig förvaltning",
        2 => "Försvar",
        3 => "Samhällsskydd & rättsskipning",
        4 => "Näringslivsfrågor",
        5 => "Miljöskydd",
        6 => "Bostäder & samhällsutveckling",
        7 => "Hälso- och sjukvård",
        8 => "Fritid, kultur & religion",
        9 => "Utbildning",
        10 => "Socialt skydd",
        _ => return None,
    };
    Some(name)
}

/// Coarse location of an agency's head office
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    Stockholm,
    Goteborg,
    Malmo,
    Uppsala,
    Other,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::Stockholm,
        Region::Goteborg,
        Region::Malmo,
        Region::Uppsala,
        Region::Other,
    ];

    pub fn from_city(city: Option<&str>) -> Self {
        let city = city.unwrap_or_default().to_uppercase();
        if city.contains("STOCKHOLM") || city.contains("SOLNA") || city.contains("SUNDBYBERG") {
            Region::Stockholm
        } else if city.contains("GÖTEBORG") {
            Region::Goteborg
        } else if city.contains("MALMÖ") || city.contains("LUND") {
            Region::Malmo
        } else if city.contains("UPPSALA") {
            Region::Uppsala
        } else {
            Region::Other
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Region::Stockholm => "Stockholm",
            Region::Goteborg => "Göteborg",
            Region::Malmo => "Malmö",
            Region::Uppsala => "Uppsala",
            Region::Other => "Övrigt",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Department,
    Structure,
    Cofog,
    Region,
}

impl GroupBy {
    fn key(&self, record: &AgencyRecord) -> String {
        match self {
            GroupBy::Department => record
                .department
                .clone()
                .unwrap_or_else(|| "Okänt departement".to_string()),
            GroupBy::Structure => record
                .structure_type
                .clone()
                .unwrap_or_else(|| "Okänd struktur".to_string()),
            GroupBy::Cofog => record
                .cofog_code
                .as_deref()
                .and_then(cofog_name)
                .unwrap_or("Okänd COFOG")
                .to_string(),
            GroupBy::Region => Region::from_city(record.city.as_deref()).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgencyGroup<'a> {
    pub key: String,
    pub agencies: Vec<&'a AgencyRecord>,
}

/// Bucket records by `by`; largest groups first.
pub fn group_agencies<'a, I>(records: I, by: GroupBy) -> Vec<AgencyGroup<'a>>
where
    I: IntoIterator<Item = &'a AgencyRecord>,
{
    let mut groups: HashMap<String, Vec<&'a AgencyRecord>> = HashMap::new();
    for record in records {
        groups.entry(by.key(record)).or_default().push(record);
    }

    let mut groups: Vec<AgencyGroup<'a>> = groups
        .into_iter()
        .map(|(key, agencies)| AgencyGroup { key, agencies })
        .collect();
    groups.sort_by(|a, b| {
        b.agencies
            .len()
            .cmp(&a.agencies.len())
            .then_with(|| cmp_swedish(&a.key, &b.key))
    });
    groups
}

/// Number of active agencies per region, in `Region::ALL` order
pub fn region_stats(records: &[AgencyRecord]) -> Vec<(Region, usize)> {
    let mut counts: HashMap<Region, usize> = HashMap::new();
    for record in records.iter().filter(|r| r.is_active()) {
        *counts.entry(Region::from_city(record.city.as_deref())).or_default() += 1;
    }

    Region::ALL
        .iter()
        .map(|region| (*region, counts.get(region).copied().unwrap_or(0)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepartmentSort {
    #[default]
    Name,
    Count,
    Employees,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentStats {
    pub name: String,
    pub count: usize,
    pub employees: u64,
}

/// Agency count and headcount per department, over active agencies
pub fn department_stats(records: &[AgencyRecord], sort: DepartmentSort) -> Vec<DepartmentStats> {
    let mut stats: HashMap<&str, DepartmentStats> = HashMap::new();
    for record in records.iter().filter(|r| r.is_active()) {
        let Some(department) = record.department.as_deref() else {
            continue;
        };
        let entry = stats.entry(department).or_insert_with(|| DepartmentStats {
            name: department.to_string(),
            count: 0,
            employees: 0,
        });
        entry.count += 1;
        entry.employees += u64::from(record.employee_count.unwrap_or(0));
    }

    let mut stats: Vec<DepartmentStats> = stats.into_values().collect();
    stats.sort_by(|a, b| match sort {
        DepartmentSort::Name => cmp_swedish(&a.name, &b.name),
        DepartmentSort::Count => b.count.cmp(&a.count).then_with(|| cmp_swedish(&a.name, &b.name)),
        DepartmentSort::Employees => b
            .employees
            .cmp(&a.employees)
            .then_with(|| cmp_swedish(&a.name, &b.name)),
    });
    stats
}

/// Headline figures for active agencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub active_count: usize,
    pub total_employees: u64,
    /// Mean over agencies that report a headcount
    pub average_employees: u64,
    /// Share of women among agencies reporting both gender counts
    pub percent_women: u32,
}

pub fn dashboard_stats(records: &[AgencyRecord]) -> DashboardStats {
    let active: Vec<&AgencyRecord> = records.iter().filter(|r| r.is_active()).collect();

    let headcounts: Vec<u64> = active
        .iter()
        .filter_map(|r| r.employee_count)
        .filter(|&n| n > 0)
        .map(u64::from)
        .collect();
    let total_employees: u64 = headcounts.iter().sum();
    let average_employees = if headcounts.is_empty() {
        0
    } else {
        (total_employees as f64 / headcounts.len() as f64).round() as u64
    };

    let (women, men) = active
        .iter()
        .filter_map(|r| match (r.women_count, r.men_count) {
            (Some(w), Some(m)) if w > 0 && m > 0 => Some((u64::from(w), u64::from(m))),
            _ => None,
        })
        .fold((0u64, 0u64), |(tw, tm), (w, m)| (tw + w, tm + m));
    let percent_women = if women + men > 0 {
        (women as f64 / (women + men) as f64 * 100.0).round() as u32
    } else {
        0
    };

    DashboardStats {
        active_count: active.len(),
        total_employees,
        average_employees,
        percent_women,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transform;
    use crate::test_support::sample_partitions;

    fn records() -> Vec<AgencyRecord> {
        transform(&sample_partitions())
    }

    #[test]
    fn test_region_from_city() {
        assert_eq!(Region::from_city(Some("Solna")), Region::Stockholm);
        assert_eq!(Region::from_city(Some("LUND")), Region::Malmo);
        assert_eq!(Region::from_city(Some("Göteborg")), Region::Goteborg);
        assert_eq!(Region::from_city(Some("Kiruna")), Region::Other);
        assert_eq!(Region::from_city(None), Region::Other);
    }

    #[test]
    fn test_region_stats_counts_active_only() {
        let stats = region_stats(&records());
        assert_eq!(
            stats,
            vec![
                (Region::Stockholm, 4),
                (Region::Goteborg, 0),
                (Region::Malmo, 1),
                (Region::Uppsala, 0),
                (Region::Other, 0),
            ]
        );
    }

    #[test]
    fn test_group_by_department_largest_first() {
        let records = records();
        let groups = group_agencies(&records, GroupBy::Department);

        assert_eq!(groups[0].key, "Socialdepartementet");
        assert_eq!(groups[0].agencies.len(), 3);
        assert_eq!(groups[1].key, "Finansdepartementet");
        assert_eq!(groups[2].key, "Utbildningsdepartementet");
    }

    #[test]
    fn test_group_by_cofog_uses_names() {
        let records = records();
        let groups = group_agencies(&records, GroupBy::Cofog);
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Socialt skydd", "Allmän offentlig förvaltning", "Utbildning"]);
    }

    #[test]
    fn test_group_by_numeric_cofog_code() {
        let raw: crate::models::RawPartitions = serde_json::from_value(serde_json::json!({
            "stkt": {"Skatteverket": {"cofog": 1}}
        }))
        .expect("partitions should decode");
        let records = transform(&raw);

        assert_eq!(records[0].cofog_code.as_deref(), Some("1"));
        let groups = group_agencies(&records, GroupBy::Cofog);
        assert_eq!(groups[0].key, "Allmän offentlig förvaltning");
    }

    #[test]
    fn test_group_missing_values_get_placeholder() {
        let record = AgencyRecord {
            name: "X".to_string(),
            ..Default::default()
        };
        let groups = group_agencies([&record], GroupBy::Structure);
        assert_eq!(groups[0].key, "Okänd struktur");
    }

    #[test]
    fn test_department_stats_sorting() {
        let records = records();

        let by_count = department_stats(&records, DepartmentSort::Count);
        assert_eq!(by_count[0].name, "Finansdepartementet");
        assert_eq!(by_count[0].count, 2);

        let by_employees = department_stats(&records, DepartmentSort::Employees);
        assert_eq!(by_employees[0].name, "Socialdepartementet");
        assert_eq!(by_employees[0].employees, 13080);
        assert_eq!(by_employees[0].count, 2);

        let by_name = department_stats(&records, DepartmentSort::Name);
        let names: Vec<&str> = by_name.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Finansdepartementet", "Socialdepartementet", "Utbildningsdepartementet"]
        );
    }

    #[test]
    fn test_dashboard_stats() {
        let stats = dashboard_stats(&records());
        assert_eq!(stats.active_count, 5);
        assert_eq!(stats.total_employees, 10500 + 120 + 13000 + 80 + 7600);
        assert_eq!(stats.average_employees, 6260);
        // 20115 women of 31300
        assert_eq!(stats.percent_women, 64);
    }

    #[test]
    fn test_dashboard_stats_empty() {
        assert_eq!(dashboard_stats(&[]), DashboardStats::default());
    }
}
