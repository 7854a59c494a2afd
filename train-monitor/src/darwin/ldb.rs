//! Authenticated client for the Darwin Live Departure Board JSON gateway.
//!
//! Requires a Rail Data Marketplace API key, sent as an `x-apikey` header.
//! Unlike the public mirror, this gateway caps results server-side via the
//! `numRows` and `timeWindow` query parameters.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{Crs, StationBoard};

use super::convert;
use super::error::SourceError;
use super::types::{Direction, LdbBoard};

const DEFAULT_BASE_URL: &str = "https://api1.raildata.org.uk/1010-live-departure-board-dep/LDBWS";

/// Configuration for [`LdbClient`].
#[derive(Debug, Clone)]
pub struct LdbConfig {
    /// Rail Data Marketplace API key.
    pub api_key: String,
    /// Base URL of the LDB gateway.
    pub base_url: String,
    /// Maximum concurrent requests.
    pub max_concurrent: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl LdbConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: 4,
            timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// HTTP client for the authenticated LDB gateway.
pub struct LdbClient {
    client: reqwest::Client,
    config: LdbConfig,
    semaphore: Arc<Semaphore>,
}

impl LdbClient {
    pub fn new(config: LdbConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| SourceError::Session("API key is not a valid header value".to_string()))?;
        headers.insert("x-apikey", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            config,
        })
    }

    /// Fetch one station board and normalize it.
    pub async fn fetch_board(
        &self,
        station: Crs,
        direction: Direction,
        num_rows: u32,
        time_window: u32,
    ) -> Result<StationBoard, SourceError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| SourceError::Session("request limiter closed".to_string()))?;

        let endpoint = match direction {
            Direction::Departures => "GetDepartureBoard",
            Direction::Arrivals => "GetArrivalBoard",
        };
        let url = format!(
            "{}/api/20220120/{}/{}",
            self.config.base_url,
            endpoint,
            station.as_str()
        );
        debug!(station = %station, %url, "requesting LDB board");

        let response = self
            .client
            .get(&url)
            .query(&[("numRows", num_rows), ("timeWindow", time_window)])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(SourceError::Unauthorized);
        }
        if status.as_u16() == 429 {
            return Err(SourceError::RateLimited);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        let dto: LdbBoard = serde_json::from_str(&body).map_err(|e| SourceError::Json {
            message: e.to_string(),
            body: Some(truncate_body(&body)),
        })?;

        Ok(convert::board_from_ldb(&dto, station))
    }
}

fn truncate_body(body: &str) -> String {
    body.chars().take(500).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = LdbConfig::new("secret");

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn config_builder_overrides() {
        let config = LdbConfig::new("secret")
            .with_base_url("http://localhost:9000")
            .with_max_concurrent(2)
            .with_timeout(5);

        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn client_rejects_unprintable_api_key() {
        let result = LdbClient::new(LdbConfig::new("bad\nkey"));

        assert!(matches!(result, Err(SourceError::Session(_))));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let body = "é".repeat(600);

        assert_eq!(truncate_body(&body).chars().count(), 500);
        assert_eq!(truncate_body("short"), "short");
    }
}
