//! Keyless client for the departureboard.io public mirror.
//!
//! Used when no Darwin API key is configured. The endpoint returns both
//! arrivals and departures in one response and accepts no result cap, so
//! truncation happens during normalization.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{Crs, StationBoard};

use super::convert;
use super::error::SourceError;
use super::types::{Direction, PublicBoard};

const DEFAULT_BASE_URL: &str = "https://api.departureboard.io/api/v1.0";

/// Configuration for [`PublicClient`].
#[derive(Debug, Clone)]
pub struct PublicConfig {
    /// Base URL of the public mirror.
    pub base_url: String,
    /// Maximum concurrent requests.
    pub max_concurrent: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PublicConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: 4,
            timeout_secs: 30,
        }
    }
}

impl PublicConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// HTTP client for the public mirror.
pub struct PublicClient {
    client: reqwest::Client,
    config: PublicConfig,
    semaphore: Arc<Semaphore>,
}

impl PublicClient {
    pub fn new(config: PublicConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            config,
        })
    }

    /// Fetch one station board and normalize it, keeping at most
    /// `max_services` rows for the requested direction.
    pub async fn fetch_board(
        &self,
        station: Crs,
        direction: Direction,
        max_services: usize,
    ) -> Result<StationBoard, SourceError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| SourceError::Session("request limiter closed".to_string()))?;

        let url = format!(
            "{}/getArrivalsAndDeparturesByCRS/{}/",
            self.config.base_url,
            station.as_str()
        );
        debug!(station = %station, %url, "requesting public board");

        let response = self.client.get(&url).send().await?;

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
                message: body.chars().take(500).collect(),
            });
        }

        let dto: PublicBoard = serde_json::from_str(&body).map_err(|e| SourceError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })?;

        Ok(convert::board_from_public(
            &dto,
            station,
            direction,
            max_services,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = PublicConfig::default();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn config_builder_overrides() {
        let config = PublicConfig::default()
            .with_base_url("http://localhost:9000")
            .with_timeout(5);

        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout_secs, 5);
    }
}
