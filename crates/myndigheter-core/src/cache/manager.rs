use std::io;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::storage::CacheStorage;
use crate::models::RawPartitions;

/// Storage key holding the single cache entry
pub const CACHE_KEY: &str = "myndigheter_data_cache";

/// Cached partitions expire after 24 hours.
pub const DEFAULT_TTL_HOURS: i64 = 24;

const MILLIS_PER_HOUR: f64 = 60.0 * 60.0 * 1000.0;

/// Why a cache operation did not go through. Never leaves this crate's
/// public `get`/`set` surface; callers see a miss or a silent skip.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache storage error: {0}")]
    Storage(#[from] io::Error),

    #[error("Cache entry is corrupt: {0}")]
    Corrupt(serde_json::Error),

    #[error("Failed to serialize cache entry: {0}")]
    Serialize(serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: RawPartitions,
    /// Epoch milliseconds of the successful fetch
    pub timestamp: i64,
}

impl CacheEntry {
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Read-only diagnostic view of the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_hours: Option<f64>,
}

/// Round to one decimal
fn round_hours(millis: i64) -> f64 {
    (millis as f64 / MILLIS_PER_HOUR * 10.0).round() / 10.0
}

impl CacheInfo {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn age_display(&self) -> String {
        let hours = match (self.exists, self.age_hours) {
            (true, Some(hours)) => hours,
            _ => return "never".to_string(),
        };

        let minutes = (hours * 60.0).round() as i64;
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let whole = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", whole + 1)
            } else {
                format!("{}h ago", whole)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Time-limited cache of the raw partitions, stored as one JSON blob.
///
/// Expiry is evaluated on read; nothing sweeps in the background. The blob
/// is atomic: there is no per-partition expiry.
pub struct PartitionCache<St, C = SystemClock> {
    storage: St,
    clock: C,
    ttl: Duration,
}

impl<St: CacheStorage> PartitionCache<St, SystemClock> {
    pub fn new(storage: St) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<St: CacheStorage, C: Clock> PartitionCache<St, C> {
    pub fn with_clock(storage: St, clock: C) -> Self {
        Self {
            storage,
            clock,
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn storage(&self) -> &St {
        &self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Read the stored entry without applying expiry.
    pub fn load(&self) -> Result<Option<CacheEntry>, CacheError> {
        let Some(contents) = self.storage.read(CACHE_KEY)? else {
            return Ok(None);
        };
        let entry = serde_json::from_str(&contents).map_err(CacheError::Corrupt)?;
        Ok(Some(entry))
    }

    /// Write a fresh entry stamped with the current time.
    pub fn store(&self, data: &RawPartitions) -> Result<(), CacheError> {
        let entry = CacheEntryRef {
            data,
            timestamp: self.clock.now().timestamp_millis(),
        };
        let contents = serde_json::to_string(&entry).map_err(CacheError::Serialize)?;
        self.storage.write(CACHE_KEY, &contents)?;
        Ok(())
    }

    fn age_millis(&self, entry: &CacheEntry) -> i64 {
        self.clock.now().timestamp_millis() - entry.timestamp
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.age_millis(entry) > self.ttl.num_milliseconds()
    }

    /// Cached partitions, or `None` if absent, unreadable, or expired.
    /// An expired entry is removed.
    pub fn get(&self) -> Option<RawPartitions> {
        let entry = match self.load() {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Cache read error, treating as miss");
                return None;
            }
        };

        if self.is_expired(&entry) {
            debug!(age_ms = self.age_millis(&entry), "Cache entry expired");
            self.clear();
            return None;
        }

        Some(entry.data)
    }

    /// Overwrite the entry. Failures are logged and otherwise ignored.
    pub fn set(&self, data: &RawPartitions) {
        if let Err(e) = self.store(data) {
            warn!(error = %e, "Cache write error, continuing without cache");
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(CACHE_KEY) {
            warn!(error = %e, "Failed to remove cache entry");
        } else {
            debug!("Agency data cache cleared");
        }
    }

    /// Age and remaining lifetime of the entry. Does not expire anything.
    pub fn info(&self) -> CacheInfo {
        match self.load() {
            Ok(Some(entry)) => {
                let age = self.age_millis(&entry);
                CacheInfo {
                    exists: true,
                    timestamp: entry.cached_at(),
                    age_hours: Some(round_hours(age)),
                    expires_in_hours: Some(round_hours(self.ttl.num_milliseconds() - age)),
                }
            }
            Ok(None) => CacheInfo::missing(),
            Err(e) => {
                debug!(error = %e, "Failed to load cache for info");
                CacheInfo::missing()
            }
        }
    }
}

/// Borrowing form of `CacheEntry`, used for writes
#[derive(Serialize)]
struct CacheEntryRef<'a> {
    data: &'a RawPartitions,
    timestamp: i64,
}

// ============================================================================
// Tests
// ============================================================================
