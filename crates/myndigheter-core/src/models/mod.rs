//! Data models for the agency dataset.
//!
//! - `RawPartitions` and the per-partition entry types: the six datasets as
//!   published, keyed by agency name
//! - `AgencyRecord`: one merged row per agency, produced by `transform`

pub mod agency;
pub mod partitions;

pub use agency::{transform, year_of, AgencyRecord, UNKNOWN_DEPARTMENT};
pub use partitions::{AgvEntry, EsvEntry, RawPartitions, ScbEntry, SfsEntry, StktEntry, WdEntry};
