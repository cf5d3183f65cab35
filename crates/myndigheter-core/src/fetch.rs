//! Cache-preferring acquisition of the merged agency dataset.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::api::{ApiError, Partition, PartitionSource};
use crate::cache::{CacheInfo, CacheStorage, Clock, PartitionCache, SystemClock};
use crate::models::{
    transform, AgencyRecord, AgvEntry, EsvEntry, RawPartitions, ScbEntry, SfsEntry, StktEntry,
    WdEntry,
};

/// Fetches all six partitions, caches them, and merges them into records.
pub struct AgencyFetcher<S, St, C = SystemClock> {
    source: S,
    cache: PartitionCache<St, C>,
}

impl<S, St, C> AgencyFetcher<S, St, C>
where
    S: PartitionSource,
    St: CacheStorage,
    C: Clock,
{
    pub fn new(source: S, cache: PartitionCache<St, C>) -> Self {
        Self { source, cache }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &PartitionCache<St, C> {
        &self.cache
    }

    pub fn cache_info(&self) -> CacheInfo {
        self.cache.info()
    }

    async fn fetch_decoded<T: DeserializeOwned>(
        &self,
        partition: Partition,
    ) -> Result<BTreeMap<String, T>, ApiError> {
        let value = self.source.fetch_partition(partition).await?;
        let decoded: BTreeMap<String, T> = serde_json::from_value(value)
            .map_err(|e| ApiError::invalid(partition, e.to_string()))?;
        debug!(%partition, count = decoded.len(), "Partition decoded");
        Ok(decoded)
    }

    /// Request all partitions concurrently. The first failure fails the
    /// whole call; nothing is cached here.
    pub async fn fetch_remote(&self) -> Result<RawPartitions, ApiError> {
        let (scb, stkt, sfs, agv, esv, wd) = tokio::try_join!(
            self.fetch_decoded::<ScbEntry>(Partition::Scb),
            self.fetch_decoded::<StktEntry>(Partition::Stkt),
            self.fetch_decoded::<SfsEntry>(Partition::Sfs),
            self.fetch_decoded::<AgvEntry>(Partition::Agv),
            self.fetch_decoded::<EsvEntry>(Partition::Esv),
            self.fetch_decoded::<WdEntry>(Partition::Wd),
        )?;

        Ok(RawPartitions {
            scb,
            stkt,
            sfs,
            agv,
            esv,
            wd,
        })
    }

    /// Cached partitions if still valid, otherwise a full remote fetch that
    /// is written to the cache on success.
    pub async fn fetch_all(&self) -> Result<RawPartitions, ApiError> {
        if let Some(cached) = self.cache.get() {
            info!(agencies = cached.agency_count(), "Using cached agency data");
            return Ok(cached);
        }

        info!("Fetching fresh agency data");
        let raw = self.fetch_remote().await?;
        self.cache.set(&raw);
        Ok(raw)
    }

    /// Fetch (optionally bypassing the cache) and merge into records.
    pub async fn load(&self, force_refresh: bool) -> Result<Vec<AgencyRecord>, ApiError> {
        if force_refresh {
            self.cache.clear();
        }

        let raw = self.fetch_all().await?;
        let records = transform(&raw);
        debug!(count = records.len(), "Agency data transformed");
        Ok(records)
    }
}
