//! Health reporting for the manager and its station tasks.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::darwin::SourceHealth;
use crate::domain::{Crs, StationConfig};

/// Health of one station's polling task.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationHealth {
    pub crs_code: Crs,
    pub station_name: String,
    pub is_running: bool,
    pub enabled: bool,
    pub last_check: Option<DateTime<Utc>>,
    pub check_count: u64,
    pub error_count: u64,
    pub last_error: Option<String>,
    pub check_interval_minutes: u32,
}

/// Aggregate health of the whole monitor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub manager_running: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub total_stations: usize,
    pub running_stations: usize,
    pub total_checks: u64,
    pub total_errors: u64,
    pub source: SourceHealth,
    pub stations: Vec<StationHealth>,
}

/// Cycle counters shared between a polling task and health queries.
///
/// Locks are held only for field updates, never across an await, so
/// health snapshots cannot stall a polling loop.
#[derive(Debug, Default)]
pub struct TaskStats {
    inner: Mutex<StatsInner>,
}

#[derive(Debug, Default)]
struct StatsInner {
    last_check: Option<DateTime<Utc>>,
    check_count: u64,
    error_count: u64,
    last_error: Option<String>,
}

impl TaskStats {
    pub fn record_check_started(&self) {
        self.lock().check_count += 1;
    }

    /// `last_check` tracks successful checks only; a string of failures
    /// leaves it at the last good one.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        inner.last_check = Some(Utc::now());
        inner.last_error = None;
    }

    /// Returns the new error count for logging.
    pub fn record_error(&self, message: String) -> u64 {
        let mut inner = self.lock();
        inner.error_count += 1;
        inner.last_error = Some(message);
        inner.error_count
    }

    pub fn health(&self, config: &StationConfig, is_running: bool) -> StationHealth {
        let inner = self.lock();
        StationHealth {
            crs_code: config.crs,
            station_name: config.station_name.clone(),
            is_running,
            enabled: config.enabled,
            last_check: inner.last_check,
            check_count: inner.check_count,
            error_count: inner.error_count,
            last_error: inner.last_error.clone(),
            check_interval_minutes: config.check_interval_minutes,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StatsInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StationConfig {
        StationConfig::new(Crs::parse("ELY").unwrap(), "Ely")
    }

    #[test]
    fn stats_track_checks_and_errors() {
        let stats = TaskStats::default();

        stats.record_check_started();
        stats.record_error("upstream down".to_string());
        stats.record_check_started();
        stats.record_success();

        let health = stats.health(&config(), true);
        assert_eq!(health.check_count, 2);
        assert_eq!(health.error_count, 1);
        assert!(health.last_error.is_none());
        assert!(health.last_check.is_some());
    }

    #[test]
    fn last_error_persists_until_next_success() {
        let stats = TaskStats::default();

        stats.record_check_started();
        let count = stats.record_error("timeout".to_string());

        assert_eq!(count, 1);
        let health = stats.health(&config(), true);
        assert_eq!(health.last_error.as_deref(), Some("timeout"));
        assert!(health.last_check.is_none(), "no successful check yet");
    }

    #[test]
    fn station_health_serializes_camel_case() {
        let stats = TaskStats::default();
        let json = serde_json::to_string(&stats.health(&config(), true)).unwrap();

        assert!(json.contains("\"crsCode\":\"ELY\""));
        assert!(json.contains("\"checkCount\""));
        assert!(json.contains("\"lastError\""));
    }
}
