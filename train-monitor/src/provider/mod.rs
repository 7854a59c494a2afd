//! Station configuration providers.
//!
//! The orchestrator only depends on the [`StationProvider`] capability; how
//! configurations are sourced is the host's choice. [`EnvProvider`] reads
//! them from environment variables, [`StaticProvider`] serves a fixed list
//! (tests, embedded hosts).

mod env;

pub use env::EnvProvider;

use crate::domain::{Crs, StationConfig};

/// Source of station configurations.
pub trait StationProvider {
    /// All configured stations, enabled or not.
    async fn stations(&self) -> Vec<StationConfig>;

    /// Configuration for one station, if configured.
    async fn station(&self, crs: Crs) -> Option<StationConfig> {
        self.stations().await.into_iter().find(|s| s.crs == crs)
    }
}

/// Provider backed by an in-memory list.
pub struct StaticProvider {
    stations: std::sync::Mutex<Vec<StationConfig>>,
}

impl StaticProvider {
    pub fn new(stations: Vec<StationConfig>) -> Self {
        Self {
            stations: std::sync::Mutex::new(stations),
        }
    }

    /// Swap the served list. Visible to the next `stations()` call, so a
    /// configuration reload picks it up.
    pub fn replace(&self, stations: Vec<StationConfig>) {
        *self
            .stations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = stations;
    }
}

impl StationProvider for StaticProvider {
    async fn stations(&self) -> Vec<StationConfig> {
        self.stations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_serves_fixed_list() {
        let ely = StationConfig::new(Crs::parse("ELY").unwrap(), "Ely");
        let cbg = StationConfig::new(Crs::parse("CBG").unwrap(), "Cambridge");
        let provider = StaticProvider::new(vec![ely, cbg]);

        let stations = provider.stations().await;
        assert_eq!(stations.len(), 2);

        let found = provider.station(Crs::parse("CBG").unwrap()).await;
        assert_eq!(found.unwrap().station_name, "Cambridge");

        let missing = provider.station(Crs::parse("KGX").unwrap()).await;
        assert!(missing.is_none());
    }
}
