//! HTTP client for the analytics API.
//!
//! Two endpoints are used: one returning every record and one accepting
//! the filter selection as query parameters and returning the pre-filtered
//! records. Transient failures are retried with exponential backoff.

use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::models::{FilterSelection, Record};
use crate::source::{decode_records, RecordSource};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest response body kept in a status error.
const MAX_ERROR_BODY: usize = 200;

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub records_path: String,
    pub filter_path: String,
    pub timeout_seconds: u64,
    /// Extra attempts after the first failure.
    pub retries: usize,
    pub retry_backoff_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            records_path: config.records_path.clone(),
            filter_path: config.filter_path.clone(),
            timeout_seconds: config.timeout_seconds,
            retries: config.retries,
            retry_backoff_ms: config.retry_backoff_ms,
        }
    }
}

/// Client for the analytics API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl ApiClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        info!("Initializing API client for {}", config.base_url);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// URL of the endpoint returning every record.
    pub fn records_url(&self) -> String {
        join_url(&self.config.base_url, &self.config.records_path)
    }

    /// URL of the server-side filter endpoint.
    pub fn filter_url(&self) -> String {
        join_url(&self.config.base_url, &self.config.filter_path)
    }

    /// Ask the server to filter by `selection` and return the matching records.
    pub async fn fetch_filtered(
        &self,
        selection: &FilterSelection,
    ) -> Result<Vec<Record>, FetchError> {
        let query = selection.to_query();
        debug!("Remote filter query: {:?}", query);
        self.get_records(&self.filter_url(), &query).await
    }

    async fn get_records(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<Vec<Record>, FetchError> {
        let mut attempt = 0;

        loop {
            match self.get_once(url, query).await {
                Ok(records) => {
                    info!("Fetched {} records from {}", records.len(), url);
                    return Ok(records);
                }
                Err(e) if e.is_retryable() && attempt < self.config.retries => {
                    let delay = self.backoff(attempt);
                    attempt += 1;
                    warn!(
                        "Fetch attempt {} failed: {}. Retrying in {}ms",
                        attempt,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<Vec<Record>, FetchError> {
        let mut request = self.http_client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let mut body = response.text().await.unwrap_or_default();
            truncate_chars(&mut body, MAX_ERROR_BODY);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

        decode_records(url, &text)
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let factor = 1u64 << attempt.min(6);
        Duration::from_millis(self.config.retry_backoff_ms.saturating_mul(factor))
    }
}

impl RecordSource for ApiClient {
    fn describe(&self) -> String {
        self.records_url()
    }

    async fn fetch_all(&self) -> Result<Vec<Record>, FetchError> {
        self.get_records(&self.records_url(), &[]).await
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn truncate_chars(text: &mut String, max: usize) {
    if let Some((idx, _)) = text.char_indices().nth(max) {
        text.truncate(idx);
        text.push_str("...");
    }
}
