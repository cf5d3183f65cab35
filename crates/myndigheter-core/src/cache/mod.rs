//! Local caching of the fetched partitions.
//!
//! `PartitionCache` keeps one JSON entry (`{ data, timestamp }`) under a
//! fixed key and treats it as stale after 24 hours. Storage and time are
//! injected through the `CacheStorage` and `Clock` traits:
//! - `FileStorage` / `MemoryStorage`
//! - `SystemClock` / `ManualClock`
//!
//! Storage failures never reach callers of `get`/`set`: a failed read is a
//! miss and a failed write is skipped, so the app falls back to the network.

pub mod clock;
pub mod manager;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{CacheEntry, CacheError, CacheInfo, PartitionCache, CACHE_KEY, DEFAULT_TTL_HOURS};
pub use storage::{CacheStorage, FileStorage, MemoryStorage};
