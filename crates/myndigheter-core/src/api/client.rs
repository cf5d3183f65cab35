//! HTTPS client for the published agency dataset.

use std::time::Duration;

use reqwest::{header, Client};
use tracing::debug;

use super::{ApiError, Partition, PartitionSource};

/// Default location of the published dataset.
pub const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/civictechsweden/myndighetsdata/master/data";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for the static JSON partitions.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client against the default dataset location
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn partition_url(&self, partition: Partition) -> String {
        format!("{}/{}", self.base_url, partition.file_name())
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(
        partition: Partition,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(partition, status, &body))
        }
    }
}

impl PartitionSource for ApiClient {
    async fn fetch_partition(&self, partition: Partition) -> Result<serde_json::Value, ApiError> {
        let url = self.partition_url(partition);
        debug!(%partition, url = %url, "Fetching partition");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::check_response(partition, response).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| ApiError::invalid(partition, e.to_string()))
    }
}
