//! Per-station monitoring configuration.

use std::fmt;
use std::time::Duration;

use super::{BoardTime, Crs};

/// Error raised by invalid station configuration.
///
/// Always scoped to one station: the orchestrator skips the offending
/// station and starts the rest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid CRS code: {0}")]
    InvalidCrs(String),

    #[error("check interval must be 1-60 minutes, got {0}")]
    IntervalOutOfRange(u32),

    #[error("time window must be 30-240 minutes, got {0}")]
    WindowOutOfRange(u32),

    #[error("max services must be 1-150, got {0}")]
    MaxServicesOutOfRange(u32),

    #[error("unknown monitoring mode: {0}")]
    UnknownMode(String),

    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}

/// Which board direction(s) a station is monitored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitoringMode {
    #[default]
    Departures,
    Arrivals,
    Both,
}

impl MonitoringMode {
    /// Parse a mode name, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_ascii_lowercase().as_str() {
            "departures" => Ok(MonitoringMode::Departures),
            "arrivals" => Ok(MonitoringMode::Arrivals),
            "both" => Ok(MonitoringMode::Both),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for MonitoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MonitoringMode::Departures => "departures",
            MonitoringMode::Arrivals => "arrivals",
            MonitoringMode::Both => "both",
        };
        f.write_str(s)
    }
}

/// Per-station notification filters.
///
/// Every field defaults to "no restriction" apart from the 5-minute delay
/// floor. The time-of-day window is parsed and carried for configuration
/// compatibility but is not currently applied during filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationFilter {
    /// Smallest delay (minutes) worth notifying about.
    pub min_delay_minutes: u32,
    pub notify_cancellations: bool,
    pub notify_platform_changes: bool,
    pub notify_new_services: bool,
    /// Only notify for services towards these stations. `None` = all.
    pub destination_filter: Option<Vec<Crs>>,
    pub time_range_start: Option<BoardTime>,
    pub time_range_end: Option<BoardTime>,
}

impl Default for NotificationFilter {
    fn default() -> Self {
        Self {
            min_delay_minutes: 5,
            notify_cancellations: true,
            notify_platform_changes: true,
            notify_new_services: false,
            destination_filter: None,
            time_range_start: None,
            time_range_end: None,
        }
    }
}

/// Configuration for monitoring one station.
///
/// Immutable for the lifetime of a polling task: a config change replaces
/// the task rather than mutating it mid-cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct StationConfig {
    pub crs: Crs,
    pub station_name: String,
    pub enabled: bool,
    pub monitoring_mode: MonitoringMode,
    /// Minutes between polling cycles (1-60).
    pub check_interval_minutes: u32,
    /// Lookahead window requested from the upstream, in minutes (30-240).
    pub time_window_minutes: u32,
    /// Cap on services fetched per cycle (1-150).
    pub max_services: u32,
    /// Opaque delivery-target identifiers handed to the notification sink.
    pub notify_targets: Vec<String>,
    pub notification_enabled: bool,
    pub filters: NotificationFilter,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl StationConfig {
    /// Create a config with the standard defaults: enabled, departures,
    /// 5-minute interval, 120-minute window, 50 services.
    pub fn new(crs: Crs, station_name: impl Into<String>) -> Self {
        Self {
            crs,
            station_name: station_name.into(),
            enabled: true,
            monitoring_mode: MonitoringMode::default(),
            check_interval_minutes: 5,
            time_window_minutes: 120,
            max_services: 50,
            notify_targets: Vec::new(),
            notification_enabled: true,
            filters: NotificationFilter::default(),
            description: None,
            tags: Vec::new(),
        }
    }

    /// Check the numeric bounds.
    ///
    /// Called at the task-startup boundary; a failure rejects only this
    /// station.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=60).contains(&self.check_interval_minutes) {
            return Err(ConfigError::IntervalOutOfRange(
                self.check_interval_minutes,
            ));
        }
        if !(30..=240).contains(&self.time_window_minutes) {
            return Err(ConfigError::WindowOutOfRange(self.time_window_minutes));
        }
        if !(1..=150).contains(&self.max_services) {
            return Err(ConfigError::MaxServicesOutOfRange(self.max_services));
        }
        Ok(())
    }

    /// The polling interval as a `Duration`.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.check_interval_minutes) * 60)
    }
}
