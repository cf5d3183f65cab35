//! Remote dataset access.
//!
//! The agency dataset is published as six static JSON files, each a map
//! from agency name to a partition-specific object. This module provides
//! the `Partition` catalogue, the `PartitionSource` seam used by the
//! fetch layer, and `ApiClient`, the HTTPS implementation of that seam.

pub mod client;
pub mod error;

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;

/// One of the six independently published datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// Tax and business registry data (SCB)
    Scb,
    /// Structural metadata, the authoritative key set (Statskontoret)
    Stkt,
    /// Statute references (SFS)
    Sfs,
    /// Payroll aggregates and contact details (Arbetsgivarverket)
    Agv,
    /// Budget data (ESV)
    Esv,
    /// Linked-data identifiers (Wikidata)
    Wd,
}

impl Partition {
    pub const ALL: [Partition; 6] = [
        Partition::Scb,
        Partition::Stkt,
        Partition::Sfs,
        Partition::Agv,
        Partition::Esv,
        Partition::Wd,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Partition::Scb => "scb.json",
            Partition::Stkt => "stkt.json",
            Partition::Sfs => "sfs.json",
            Partition::Agv => "agv.json",
            Partition::Esv => "esv.json",
            Partition::Wd => "wd.json",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Something that can produce the raw JSON of a partition.
///
/// Implemented by `ApiClient` for the real dataset and by in-memory
/// sources in tests.
pub trait PartitionSource: Send + Sync {
    fn fetch_partition(
        &self,
        partition: Partition,
    ) -> impl Future<Output = Result<serde_json::Value, ApiError>> + Send;
}

impl<T: PartitionSource> PartitionSource for std::sync::Arc<T> {
    fn fetch_partition(
        &self,
        partition: Partition,
    ) -> impl Future<Output = Result<serde_json::Value, ApiError>> + Send {
        (**self).fetch_partition(partition)
    }
}
