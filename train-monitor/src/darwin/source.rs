//! Backend selection and the retrying board source.
//!
//! A [`BoardSource`] wraps one of three backends behind a single fetch
//! entry point: the authenticated Darwin gateway, the keyless public
//! mirror, or a scripted source for tests. Selection happens once at
//! construction; every fetch then goes through the same retry loop.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::domain::{MonitoringMode, StationBoard, StationConfig};

use super::error::{SourceError, UpstreamError};
use super::ldb::{LdbClient, LdbConfig};
use super::mock::ScriptedClient;
use super::public::{PublicClient, PublicConfig};
use super::types::Direction;

/// Key value shipped in sample configs that means "no key yet".
pub const PLACEHOLDER_API_KEY: &str = "your_darwin_api_key_here";

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_SECS: u64 = 2;

enum Backend {
    /// Authenticated Darwin gateway. The client is built on first use so
    /// that a bad key surfaces as a fetch error, not a startup crash.
    Ldb {
        config: LdbConfig,
        client: OnceCell<LdbClient>,
    },
    /// Keyless public mirror.
    Public(PublicClient),
    /// Scripted source for tests.
    Scripted(ScriptedClient),
}

/// Snapshot of a source's configuration for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SourceHealth {
    pub backend: &'static str,
    pub credential_configured: bool,
    /// Whether the backing client has been constructed.
    pub ready: bool,
}

/// A station board source with automatic backend selection and retries.
pub struct BoardSource {
    backend: Backend,
}

impl BoardSource {
    /// Pick a backend from the available credential: a real API key selects
    /// the authenticated gateway, anything else falls back to the keyless
    /// mirror. The placeholder value from sample configs counts as no key.
    pub fn auto(api_key: Option<&str>) -> Result<Self, SourceError> {
        match api_key {
            Some(key) if !key.is_empty() && key != PLACEHOLDER_API_KEY => {
                info!("using authenticated Darwin LDB backend");
                Ok(Self::primary(LdbConfig::new(key)))
            }
            _ => {
                info!("no Darwin API key configured, using departureboard.io");
                Self::fallback(PublicConfig::default())
            }
        }
    }

    pub fn primary(config: LdbConfig) -> Self {
        Self {
            backend: Backend::Ldb {
                config,
                client: OnceCell::new(),
            },
        }
    }

    pub fn fallback(config: PublicConfig) -> Result<Self, SourceError> {
        Ok(Self {
            backend: Backend::Public(PublicClient::new(config)?),
        })
    }

    pub fn scripted(client: ScriptedClient) -> Self {
        Self {
            backend: Backend::Scripted(client),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            Backend::Ldb { .. } => "darwin",
            Backend::Public(_) => "departureboard.io",
            Backend::Scripted(_) => "scripted",
        }
    }

    pub fn health(&self) -> SourceHealth {
        let (credential_configured, ready) = match &self.backend {
            Backend::Ldb { client, .. } => (true, client.initialized()),
            Backend::Public(_) => (false, true),
            Backend::Scripted(_) => (false, true),
        };
        SourceHealth {
            backend: self.backend_name(),
            credential_configured,
            ready,
        }
    }

    /// Fetch the board for one station, retrying transient failures with
    /// exponential backoff. Exhausting all attempts yields an
    /// [`UpstreamError`] carrying the final failure.
    pub async fn fetch_board(
        &self,
        config: &StationConfig,
    ) -> Result<StationBoard, UpstreamError> {
        let direction = direction_for(config.monitoring_mode);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetch_once(config, direction).await {
                Ok(board) => {
                    if attempt > 1 {
                        info!(station = %config.crs, attempt, "board fetch recovered");
                    }
                    return Ok(board);
                }
                Err(source) if attempt >= MAX_ATTEMPTS => {
                    return Err(UpstreamError {
                        station: config.crs,
                        backend: self.backend_name(),
                        attempts: attempt,
                        source,
                    });
                }
                Err(error) => {
                    let wait = Duration::from_secs(BACKOFF_BASE_SECS << (attempt - 1));
                    warn!(
                        station = %config.crs,
                        backend = self.backend_name(),
                        attempt,
                        retry_in_secs = wait.as_secs(),
                        %error,
                        "board fetch failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    async fn fetch_once(
        &self,
        config: &StationConfig,
        direction: Direction,
    ) -> Result<StationBoard, SourceError> {
        match &self.backend {
            Backend::Ldb {
                config: ldb_config,
                client,
            } => {
                let client = client
                    .get_or_try_init(|| async { LdbClient::new(ldb_config.clone()) })
                    .await?;
                client
                    .fetch_board(
                        config.crs,
                        direction,
                        config.max_services,
                        config.time_window_minutes,
                    )
                    .await
            }
            Backend::Public(client) => {
                client
                    .fetch_board(config.crs, direction, config.max_services as usize)
                    .await
            }
            Backend::Scripted(client) => client.fetch(),
        }
    }
}

/// Both-directions monitoring polls the departure board; the warning about
/// that narrowing is emitted once at task startup.
fn direction_for(mode: MonitoringMode) -> Direction {
    match mode {
        MonitoringMode::Arrivals => Direction::Arrivals,
        MonitoringMode::Departures | MonitoringMode::Both => Direction::Departures,
    }
}
