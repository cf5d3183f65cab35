//! Sample data and an in-memory partition source for tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::api::{ApiError, Partition, PartitionSource};
use crate::models::{AgvEntry, EsvEntry, RawPartitions, ScbEntry, SfsEntry, StktEntry, WdEntry};

/// One agency "A" where each partition contributes a different field.
pub(crate) fn one_field_per_partition() -> RawPartitions {
    serde_json::from_value(one_field_per_partition_json()).expect("sample partitions decode")
}

pub(crate) fn one_field_per_partition_json() -> Value {
    json!({
        "scb": {"A": {"employees": 1}},
        "stkt": {"A": {"department": "Dep 2"}},
        "sfs": {"A": {"created_by": "SFS 3"}},
        "agv": {"A": {"phone": "4"}},
        "esv": {"A": {"budget": 5.0}},
        "wd": {"A": {"end": "2006"}}
    })
}

fn fte(points: &[(&str, f64)]) -> Option<BTreeMap<String, f64>> {
    Some(points.iter().map(|(y, v)| (y.to_string(), *v)).collect())
}

fn s(value: &str) -> Option<String> {
    Some(value.to_string())
}

/// A small but realistic slice of the dataset.
pub(crate) fn sample_partitions() -> RawPartitions {
    let mut raw = RawPartitions::default();

    raw.stkt.insert(
        "Skatteverket".to_string(),
        StktEntry {
            department: s("Finansdepartementet"),
            org_nr: s("202100-5448"),
            cofog: s("1"),
            structure: s("Enrådighetsmyndighet"),
            has_gd: Some(true),
            fte: fte(&[("2020", 10850.5), ("2022", 11020.0)]),
            start: s("2004-01-01"),
            short_name: s("SKV"),
            created_by: s("SFS 2007:780"),
            ..Default::default()
        },
    );
    raw.stkt.insert(
        "Statskontoret".to_string(),
        StktEntry {
            department: s("Finansdepartementet"),
            cofog: s("1"),
            structure: s("Enrådighetsmyndighet"),
            fte: fte(&[("2021", 125.0), ("2022", 130.0)]),
            start: s("1965-07-01"),
            ..Default::default()
        },
    );
    raw.stkt.insert(
        "Riksförsäkringsverket".to_string(),
        StktEntry {
            department: s("Socialdepartementet"),
            cofog: s("10"),
            structure: s("Styrelsemyndighet"),
            start: s("1961-01-01"),
            short_name: s("RFV"),
            ..Default::default()
        },
    );
    raw.stkt.insert(
        "Försäkringskassan".to_string(),
        StktEntry {
            department: s("Socialdepartementet"),
            cofog: s("10"),
            structure: s("Enrådighetsmyndighet"),
            fte: fte(&[("2020", 12000.0), ("2022", 12400.0)]),
            start: s("2005-01-01"),
            ..Default::default()
        },
    );
    raw.stkt.insert(
        "Inspektionen för socialförsäkringen".to_string(),
        StktEntry {
            department: s("Socialdepartementet"),
            cofog: s("10"),
            structure: s("Enrådighetsmyndighet"),
            start: s("2009-07-01"),
            short_name: s("ISF"),
            host: s("Försäkringskassan"),
            independent: Some(true),
            ..Default::default()
        },
    );
    raw.stkt.insert(
        "Lunds universitet".to_string(),
        StktEntry {
            department: s("Utbildningsdepartementet"),
            cofog: s("9"),
            structure: s("Styrelsemyndighet"),
            start: s("1666-01-01"),
            ..Default::default()
        },
    );

    let scb = [
        ("Skatteverket", 10500, 6600, 3900, "SOLNA"),
        ("Statskontoret", 120, 70, 50, "STOCKHOLM"),
        ("Försäkringskassan", 13000, 9500, 3500, "STOCKHOLM"),
        ("Inspektionen för socialförsäkringen", 80, 45, 35, "STOCKHOLM"),
        ("Lunds universitet", 7600, 3900, 3700, "LUND"),
    ];
    for (name, employees, women, men, city) in scb {
        raw.scb.insert(
            name.to_string(),
            ScbEntry {
                employees: Some(employees),
                women: Some(women),
                men: Some(men),
                city: s(city),
                ..Default::default()
            },
        );
    }

    let wd = [
        ("Skatteverket", "Swedish Tax Agency", "2004-01-01", None),
        ("Statskontoret", "Swedish Agency for Public Management", "1965-07-01", None),
        ("Riksförsäkringsverket", "National Social Insurance Board", "1961-01-01", Some("2004-12-31")),
        ("Försäkringskassan", "Swedish Social Insurance Agency", "2005-01-01", None),
        ("Lunds universitet", "Lund University", "1666-01-01", None),
    ];
    for (name, name_en, start, end) in wd {
        raw.wd.insert(
            name.to_string(),
            WdEntry {
                name_en: s(name_en),
                start: s(start),
                end: end.map(str::to_string),
                ..Default::default()
            },
        );
    }

    raw.sfs.insert(
        "Skatteverket".to_string(),
        SfsEntry {
            created_by: s("SFS 2007:780"),
            latest_updated_by: s("SFS 2017:154"),
        },
    );
    raw.agv.insert(
        "Skatteverket".to_string(),
        AgvEntry {
            phone: s("0771-567 567"),
            website: s("https://www.skatteverket.se"),
            ..Default::default()
        },
    );
    raw.esv.insert(
        "Skatteverket".to_string(),
        EsvEntry {
            budget: Some(8_000_000.0),
            ..Default::default()
        },
    );

    raw
}

/// Partition source that serves fixed payloads, counts requests, and can be
/// told to fail or to hold requests until released.
pub(crate) struct ScriptedSource {
    payloads: HashMap<Partition, Value>,
    failing: Mutex<HashSet<Partition>>,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedSource {
    pub(crate) fn new(raw: &RawPartitions) -> Self {
        let value = serde_json::to_value(raw).expect("sample partitions serialize");
        Self::from_json(&value)
    }

    /// Build from a `{ "scb": {...}, "stkt": {...}, ... }` object
    pub(crate) fn from_json(value: &Value) -> Self {
        let payloads = Partition::ALL
            .iter()
            .map(|p| {
                let key = p.file_name().trim_end_matches(".json");
                (*p, value.get(key).cloned().unwrap_or_else(|| json!({})))
            })
            .collect();

        Self {
            payloads,
            failing: Mutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Requests block until permits are added to the returned semaphore
    pub(crate) fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub(crate) fn fail(&self, partition: Partition) {
        self.failing.lock().unwrap().insert(partition);
    }

    pub(crate) fn fail_all(&self) {
        self.failing.lock().unwrap().extend(Partition::ALL);
    }

    pub(crate) fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PartitionSource for ScriptedSource {
    async fn fetch_partition(&self, partition: Partition) -> Result<Value, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            // Hand the permit back so one release lets every waiter through
            let _permit = gate.acquire().await;
        }

        if self.failing.lock().unwrap().contains(&partition) {
            return Err(ApiError::from_status(
                partition,
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                "simulated failure",
            ));
        }

        Ok(self.payloads.get(&partition).cloned().unwrap_or_else(|| json!({})))
    }
}
