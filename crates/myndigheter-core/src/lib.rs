//! Myndigheter Core - data acquisition and caching for the Swedish
//! government agency dataset.
//!
//! This crate provides shared functionality for front ends of the dataset:
//! - Remote partition client (`api`)
//! - Local partition cache with a 24 hour TTL (`cache`)
//! - Cache-preferring fetch and merge into `AgencyRecord`s (`fetch`, `models`)
//! - Observable load state with refresh (`data`)
//! - Filtering, grouping, and statistics over records (`derived`)

pub mod api;
pub mod cache;
pub mod config;
pub mod data;
pub mod derived;
pub mod fetch;
pub mod models;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

use anyhow::{Context, Result};

// Re-export commonly used types at crate root
pub use api::{ApiClient, ApiError, Partition, PartitionSource};
pub use cache::{CacheInfo, CacheStorage, Clock, FileStorage, MemoryStorage, PartitionCache};
pub use config::Config;
pub use data::{AgencyData, DataError, DataSnapshot};
pub use fetch::AgencyFetcher;
pub use models::{transform, AgencyRecord, RawPartitions};

/// Fetcher wired to the HTTPS source and the on-disk cache.
pub type DefaultFetcher = AgencyFetcher<ApiClient, FileStorage>;

/// Build the production fetcher from configuration.
pub fn default_fetcher(config: &Config) -> Result<DefaultFetcher> {
    let client = ApiClient::with_base_url(config.base_url(), config.request_timeout())
        .context("Failed to build HTTP client")?;
    let cache_dir = config.cache_dir()?;
    let storage = FileStorage::new(cache_dir.clone())
        .with_context(|| format!("Failed to open cache directory {}", cache_dir.display()))?;
    let cache = PartitionCache::new(storage).with_ttl(config.cache_ttl());
    Ok(AgencyFetcher::new(client, cache))
}
