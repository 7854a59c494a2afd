//! Environment-variable station configuration.
//!
//! The station list comes from `TRAIN_MONITOR_STATIONS` (comma-separated
//! CRS codes, default `ELY`); each station's settings from
//! `TRAIN_MONITOR_{CRS}_*` variables. A station that fails to parse or
//! validate is skipped with an error so the remaining stations still load.
//!
//! ```text
//! TRAIN_MONITOR_STATIONS=ELY,CBG
//! TRAIN_MONITOR_ELY_NAME=Ely
//! TRAIN_MONITOR_ELY_CHECK_INTERVAL=5
//! TRAIN_MONITOR_ELY_CHAT_IDS=-1001234567890,-1009876543210
//! TRAIN_MONITOR_ELY_DESTINATIONS=CBG,KGX
//! ```

use std::env;

use tracing::{error, info, warn};

use crate::domain::{
    BoardTime, ConfigError, Crs, MonitoringMode, NotificationFilter, StationConfig,
};

use super::StationProvider;

/// Provider reading station configuration from process environment.
#[derive(Debug, Default)]
pub struct EnvProvider;

impl EnvProvider {
    pub fn new() -> Self {
        Self
    }
}

impl StationProvider for EnvProvider {
    async fn stations(&self) -> Vec<StationConfig> {
        let stations = stations_from(|key| env::var(key).ok());
        info!(
            count = stations.len(),
            codes = ?stations.iter().map(|s| s.crs.as_str()).collect::<Vec<_>>(),
            "loaded stations from environment"
        );
        stations
    }
}

/// Build the station list through an arbitrary variable lookup.
fn stations_from(lookup: impl Fn(&str) -> Option<String>) -> Vec<StationConfig> {
    let codes = lookup("TRAIN_MONITOR_STATIONS").unwrap_or_else(|| "ELY".to_string());

    let mut stations = Vec::new();
    for code in codes.split(',') {
        let code = code.trim().to_ascii_uppercase();
        if code.is_empty() {
            continue;
        }
        match parse_station(&lookup, &code) {
            Ok(config) => stations.push(config),
            Err(error) => {
                error!(station = %code, %error, "skipping station with invalid configuration");
            }
        }
    }
    stations
}

fn parse_station(
    lookup: &impl Fn(&str) -> Option<String>,
    code: &str,
) -> Result<StationConfig, ConfigError> {
    let crs = Crs::parse(code).map_err(|_| ConfigError::InvalidCrs(code.to_string()))?;
    let prefix = format!("TRAIN_MONITOR_{code}_");
    let var = |suffix: &str| lookup(&format!("{prefix}{suffix}"));

    let mut config = StationConfig::new(
        crs,
        var("NAME").unwrap_or_else(|| crs.as_str().to_string()),
    );
    config.enabled = parse_bool(var("ENABLED"), true);
    config.monitoring_mode = match var("MODE") {
        Some(raw) => MonitoringMode::parse(&raw).unwrap_or_else(|_| {
            warn!(station = %crs, mode = %raw, "unknown monitoring mode, using departures");
            MonitoringMode::Departures
        }),
        None => MonitoringMode::Departures,
    };
    config.check_interval_minutes = parse_u32(&prefix, "CHECK_INTERVAL", var("CHECK_INTERVAL"), 5)?;
    config.time_window_minutes = parse_u32(&prefix, "TIME_WINDOW", var("TIME_WINDOW"), 120)?;
    config.max_services = parse_u32(&prefix, "MAX_SERVICES", var("MAX_SERVICES"), 50)?;
    // CHAT_ID kept for single-chat configs
    config.notify_targets = var("CHAT_IDS")
        .or_else(|| var("CHAT_ID"))
        .map(|raw| split_list(&raw))
        .unwrap_or_default();
    config.notification_enabled = parse_bool(var("NOTIFICATIONS"), true);

    config.filters = NotificationFilter {
        min_delay_minutes: parse_u32(&prefix, "MIN_DELAY", var("MIN_DELAY"), 5)?,
        notify_cancellations: parse_bool(var("NOTIFY_CANCELLATIONS"), true),
        notify_platform_changes: parse_bool(var("NOTIFY_PLATFORM"), true),
        notify_new_services: parse_bool(var("NOTIFY_NEW"), false),
        destination_filter: var("DESTINATIONS")
            .map(|raw| parse_destinations(&prefix, &raw))
            .transpose()?,
        time_range_start: var("TIME_START")
            .map(|raw| parse_time(&prefix, "TIME_START", &raw))
            .transpose()?,
        time_range_end: var("TIME_END")
            .map(|raw| parse_time(&prefix, "TIME_END", &raw))
            .transpose()?,
    };

    config.description = var("DESCRIPTION");
    config.tags = var("TAGS").map(|raw| split_list(&raw)).unwrap_or_default();

    config.validate()?;
    Ok(config)
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value {
        Some(raw) => raw.trim().eq_ignore_ascii_case("true"),
        None => default,
    }
}

fn parse_u32(
    prefix: &str,
    suffix: &str,
    value: Option<String>,
    default: u32,
) -> Result<u32, ConfigError> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: format!("{prefix}{suffix}"),
            value: raw,
        }),
        None => Ok(default),
    }
}

fn parse_destinations(prefix: &str, raw: &str) -> Result<Vec<Crs>, ConfigError> {
    split_list(raw)
        .iter()
        .map(|code| {
            Crs::parse(code).map_err(|_| ConfigError::InvalidValue {
                var: format!("{prefix}DESTINATIONS"),
                value: code.clone(),
            })
        })
        .collect()
}

fn parse_time(prefix: &str, suffix: &str, raw: &str) -> Result<BoardTime, ConfigError> {
    BoardTime::parse(raw.trim()).map_err(|_| ConfigError::InvalidValue {
        var: format!("{prefix}{suffix}"),
        value: raw.to_string(),
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}
