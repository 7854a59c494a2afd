//! Train services and station board snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Crs;

/// Reported running status of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    OnTime,
    Delayed,
    Cancelled,
    /// The upstream reported no estimate for this service.
    NoReport,
}

/// One scheduled working of a train at a station.
///
/// Times are kept as the "HH:MM" strings the boards report; `delay_minutes`
/// is computed during normalization and is always ≥ 0. Normalization
/// guarantees that `is_cancelled` implies `status == Cancelled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainService {
    /// Provider-assigned id; only stable while the service is on a board.
    pub service_id: String,
    pub origin: String,
    pub destination: String,
    pub destination_crs: Option<Crs>,
    pub scheduled_departure: Option<String>,
    pub estimated_departure: Option<String>,
    pub actual_departure: Option<String>,
    pub scheduled_arrival: Option<String>,
    pub estimated_arrival: Option<String>,
    pub actual_arrival: Option<String>,
    pub platform: Option<String>,
    pub status: ServiceStatus,
    pub delay_minutes: u32,
    pub operator: Option<String>,
    pub is_cancelled: bool,
    pub cancellation_reason: Option<String>,
}

/// A point-in-time snapshot of the services at one station.
///
/// Service order is display order only; nothing downstream depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationBoard {
    pub station_crs: Crs,
    pub station_name: String,
    pub generated_at: DateTime<Utc>,
    pub services: Vec<TrainService>,
}

impl StationBoard {
    /// Index the board's services by id for O(1) comparison.
    pub fn by_service_id(&self) -> HashMap<&str, &TrainService> {
        self.services
            .iter()
            .map(|s| (s.service_id.as_str(), s))
            .collect()
    }
}
