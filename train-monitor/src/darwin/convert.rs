//! Normalization of upstream DTOs into domain snapshots.
//!
//! Both backends reduce to the same canonical `StationBoard` here: sentinel
//! status strings become `ServiceStatus`, delays are computed from the
//! scheduled/estimated clock pair, and a cancelled flag overrides whatever
//! the estimate field says.

use chrono::Utc;
use tracing::warn;

use crate::domain::{Crs, ServiceStatus, StationBoard, TrainService, delay_between};

use super::types::{Direction, LdbBoard, LdbService, PublicBoard, PublicService};

/// Delay assumed when the upstream reports only "Delayed" with no estimate.
const ASSUMED_DELAY_MINUTES: u32 = 5;

/// Backend-agnostic view of one raw service row.
struct RawService {
    service_id: Option<String>,
    origin: Option<String>,
    destination: Option<String>,
    destination_crs: Option<String>,
    std: Option<String>,
    etd: Option<String>,
    atd: Option<String>,
    sta: Option<String>,
    eta: Option<String>,
    ata: Option<String>,
    platform: Option<String>,
    operator: Option<String>,
    is_cancelled: bool,
    cancellation_reason: Option<String>,
}

/// Convert a Darwin LDB board response.
pub fn board_from_ldb(dto: &LdbBoard, station: Crs) -> StationBoard {
    let services = dto
        .train_services
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .filter_map(|item| keep_or_warn(station, normalize(raw_from_ldb(item))))
        .collect();

    StationBoard {
        station_crs: station,
        station_name: board_name(dto.location_name.as_deref(), station),
        generated_at: Utc::now(),
        services,
    }
}

/// Convert a departureboard.io response for one direction.
///
/// This API has no result cap parameter, so `max_services` is applied here
/// by truncation.
pub fn board_from_public(
    dto: &PublicBoard,
    station: Crs,
    direction: Direction,
    max_services: usize,
) -> StationBoard {
    let services = dto
        .services(direction)
        .iter()
        .take(max_services)
        .filter_map(|item| keep_or_warn(station, normalize(raw_from_public(item))))
        .collect();

    StationBoard {
        station_crs: station,
        station_name: board_name(dto.location_name.as_deref(), station),
        generated_at: Utc::now(),
        services,
    }
}

fn board_name(location_name: Option<&str>, station: Crs) -> String {
    match location_name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => station.as_str().to_string(),
    }
}

fn keep_or_warn(station: Crs, service: Option<TrainService>) -> Option<TrainService> {
    if service.is_none() {
        warn!(station = %station, "skipping unparseable service row");
    }
    service
}

fn raw_from_ldb(item: &LdbService) -> RawService {
    let origin = item
        .origin
        .as_deref()
        .and_then(|locs| locs.first())
        .map(|loc| loc.location_name.clone());
    let destination = item.destination.as_deref().and_then(|locs| locs.first());

    RawService {
        service_id: item.service_id.clone(),
        origin,
        destination: destination.map(|loc| loc.location_name.clone()),
        destination_crs: destination.and_then(|loc| loc.crs.clone()),
        std: item.std.clone(),
        etd: item.etd.clone(),
        atd: item.atd.clone(),
        sta: item.sta.clone(),
        eta: item.eta.clone(),
        ata: item.ata.clone(),
        platform: item.platform.clone(),
        operator: item.operator.clone(),
        is_cancelled: item.is_cancelled.unwrap_or(false),
        cancellation_reason: item.cancel_reason.clone(),
    }
}

fn raw_from_public(item: &PublicService) -> RawService {
    // serviceIdUrlSafe is the stable id on this API; trainid is the fallback
    let service_id = item
        .service_id_url_safe
        .clone()
        .or_else(|| item.trainid.clone());

    RawService {
        service_id,
        origin: item.origin.as_ref().and_then(|loc| loc.location.clone()),
        destination: item
            .destination
            .as_ref()
            .and_then(|loc| loc.location.clone()),
        destination_crs: item.destination.as_ref().and_then(|loc| loc.crs.clone()),
        std: item.std.clone(),
        etd: item.etd.clone(),
        atd: item.atd.clone(),
        sta: item.sta.clone(),
        eta: item.eta.clone(),
        ata: item.ata.clone(),
        platform: item.platform.clone(),
        operator: item.operator.clone(),
        is_cancelled: item.is_cancelled.unwrap_or(false),
        cancellation_reason: item.cancel_reason.clone(),
    }
}

/// Normalize one raw row into a domain service.
///
/// Returns `None` for a row with neither an id nor any scheduled time,
/// since there is nothing to diff against. Every other gap has a fallback.
fn normalize(raw: RawService) -> Option<TrainService> {
    if raw.service_id.is_none() && raw.std.is_none() && raw.sta.is_none() {
        return None;
    }

    let mut is_cancelled = raw.is_cancelled;
    let mut status = ServiceStatus::NoReport;
    let mut delay_minutes = 0;

    // A cancelled flag overrides whatever the estimate says. Otherwise the
    // estimate field drives status: it is either a sentinel word or a
    // concrete HH:MM estimate.
    if is_cancelled {
        status = ServiceStatus::Cancelled;
    } else if let Some(etd) = raw.etd.as_deref().filter(|s| !s.is_empty()) {
        match etd {
            "On time" => status = ServiceStatus::OnTime,
            "Delayed" => {
                status = ServiceStatus::Delayed;
                delay_minutes = ASSUMED_DELAY_MINUTES;
            }
            "Cancelled" => {
                status = ServiceStatus::Cancelled;
                is_cancelled = true;
            }
            estimate => {
                status = ServiceStatus::Delayed;
                if let Some(std) = raw.std.as_deref() {
                    delay_minutes = delay_between(std, estimate);
                }
            }
        }
    }

    let estimated_departure = concrete_or_scheduled(raw.etd, raw.std.as_deref());
    let estimated_arrival = concrete_or_scheduled(raw.eta, raw.sta.as_deref());

    Some(TrainService {
        service_id: raw.service_id.unwrap_or_else(|| "UNKNOWN".to_string()),
        origin: raw.origin.unwrap_or_else(|| "Unknown".to_string()),
        destination: raw.destination.unwrap_or_else(|| "Unknown".to_string()),
        destination_crs: raw
            .destination_crs
            .as_deref()
            .and_then(|c| Crs::parse(c).ok()),
        scheduled_departure: raw.std,
        estimated_departure,
        actual_departure: raw.atd,
        scheduled_arrival: raw.sta,
        estimated_arrival,
        actual_arrival: raw.ata,
        platform: raw.platform,
        status,
        delay_minutes,
        operator: raw.operator,
        is_cancelled,
        cancellation_reason: raw.cancellation_reason,
    })
}

/// Replace sentinel estimate strings with the scheduled time, so the
/// estimated field always holds a clock string when one is known.
fn concrete_or_scheduled(estimate: Option<String>, scheduled: Option<&str>) -> Option<String> {
    match estimate.as_deref() {
        Some("On time") | Some("Delayed") | Some("Cancelled") => {
            scheduled.map(ToString::to_string)
        }
        _ => estimate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(etd: Option<&str>, std: Option<&str>, is_cancelled: bool) -> RawService {
        RawService {
            service_id: Some("svc-1".to_string()),
            origin: Some("Ely".to_string()),
            destination: Some("Cambridge".to_string()),
            destination_crs: Some("CBG".to_string()),
            std: std.map(ToString::to_string),
            etd: etd.map(ToString::to_string),
            atd: None,
            sta: None,
            eta: None,
            ata: None,
            platform: Some("2".to_string()),
            operator: Some("Greater Anglia".to_string()),
            is_cancelled,
            cancellation_reason: None,
        }
    }

    #[test]
    fn on_time_sentinel() {
        let service = normalize(raw(Some("On time"), Some("10:15"), false)).unwrap();

        assert_eq!(service.status, ServiceStatus::OnTime);
        assert_eq!(service.delay_minutes, 0);
        assert_eq!(service.estimated_departure.as_deref(), Some("10:15"));
    }

    #[test]
    fn delayed_sentinel_assumes_five_minutes() {
        let service = normalize(raw(Some("Delayed"), Some("10:15"), false)).unwrap();

        assert_eq!(service.status, ServiceStatus::Delayed);
        assert_eq!(service.delay_minutes, 5);
        assert_eq!(service.estimated_departure.as_deref(), Some("10:15"));
    }

    #[test]
    fn cancelled_sentinel_sets_flag() {
        let service = normalize(raw(Some("Cancelled"), Some("10:15"), false)).unwrap();

        assert_eq!(service.status, ServiceStatus::Cancelled);
        assert!(service.is_cancelled);
        assert_eq!(service.delay_minutes, 0);
    }

    #[test]
    fn cancelled_flag_overrides_concrete_estimate() {
        let service = normalize(raw(Some("10:30"), Some("10:15"), true)).unwrap();

        assert_eq!(service.status, ServiceStatus::Cancelled);
        assert!(service.is_cancelled);
        assert_eq!(service.delay_minutes, 0);
        // Concrete estimates pass through untouched
        assert_eq!(service.estimated_departure.as_deref(), Some("10:30"));
    }

    #[test]
    fn concrete_estimate_computes_delay() {
        let service = normalize(raw(Some("10:22"), Some("10:15"), false)).unwrap();

        assert_eq!(service.status, ServiceStatus::Delayed);
        assert_eq!(service.delay_minutes, 7);
        assert_eq!(service.estimated_departure.as_deref(), Some("10:22"));
    }

    #[test]
    fn estimate_across_midnight() {
        let service = normalize(raw(Some("00:05"), Some("23:55"), false)).unwrap();

        assert_eq!(service.delay_minutes, 10);
    }

    #[test]
    fn missing_estimate_is_no_report() {
        let service = normalize(raw(None, Some("10:15"), false)).unwrap();

        assert_eq!(service.status, ServiceStatus::NoReport);
        assert_eq!(service.delay_minutes, 0);
        assert!(service.estimated_departure.is_none());
    }

    #[test]
    fn empty_estimate_is_no_report() {
        let service = normalize(raw(Some(""), Some("10:15"), false)).unwrap();

        assert_eq!(service.status, ServiceStatus::NoReport);
        assert_eq!(service.delay_minutes, 0);
    }

    #[test]
    fn invalid_destination_crs_dropped() {
        let mut row = raw(Some("On time"), Some("10:15"), false);
        row.destination_crs = Some("not-a-crs".to_string());

        let service = normalize(row).unwrap();
        assert!(service.destination_crs.is_none());
    }

    #[test]
    fn row_with_no_id_and_no_times_is_skipped() {
        let mut row = raw(None, None, false);
        row.service_id = None;

        assert!(normalize(row).is_none());
    }

    #[test]
    fn missing_id_with_times_falls_back_to_unknown() {
        let mut row = raw(Some("On time"), Some("10:15"), false);
        row.service_id = None;

        let service = normalize(row).unwrap();
        assert_eq!(service.service_id, "UNKNOWN");
    }

    #[test]
    fn ldb_board_conversion() {
        let json = r#"{
            "locationName": "Ely",
            "crs": "ELY",
            "trainServices": [
                {
                    "serviceID": "a1",
                    "std": "10:15",
                    "etd": "10:22",
                    "platform": "2",
                    "operator": "Greater Anglia",
                    "destination": [{"locationName": "Cambridge", "crs": "CBG"}]
                },
                {
                    "serviceID": "a2",
                    "std": "10:30",
                    "etd": "On time",
                    "destination": [{"locationName": "Kings Lynn", "crs": "KLN"}]
                }
            ]
        }"#;
        let dto: LdbBoard = serde_json::from_str(json).unwrap();

        let board = board_from_ldb(&dto, Crs::parse("ELY").unwrap());

        assert_eq!(board.station_name, "Ely");
        assert_eq!(board.services.len(), 2);

        let first = &board.services[0];
        assert_eq!(first.service_id, "a1");
        assert_eq!(first.delay_minutes, 7);
        assert_eq!(first.destination_crs, Some(Crs::parse("CBG").unwrap()));

        let second = &board.services[1];
        assert_eq!(second.status, ServiceStatus::OnTime);
        assert_eq!(second.estimated_departure.as_deref(), Some("10:30"));
    }

    #[test]
    fn ldb_board_name_falls_back_to_crs() {
        let dto: LdbBoard = serde_json::from_str(r#"{"crs": "ELY"}"#).unwrap();
        let board = board_from_ldb(&dto, Crs::parse("ELY").unwrap());

        assert_eq!(board.station_name, "ELY");
        assert!(board.services.is_empty());
    }

    #[test]
    fn public_board_conversion_with_truncation() {
        let json = r#"{
            "locationName": "Ely",
            "departures": {
                "all": [
                    {"serviceIdUrlSafe": "s1", "std": "09:00", "etd": "On time"},
                    {"trainid": "1T23", "std": "09:10", "etd": "Delayed"},
                    {"serviceIdUrlSafe": "s3", "std": "09:20", "etd": "On time"}
                ]
            }
        }"#;
        let dto: PublicBoard = serde_json::from_str(json).unwrap();

        let board = board_from_public(&dto, Crs::parse("ELY").unwrap(), Direction::Departures, 2);

        assert_eq!(board.services.len(), 2);
        assert_eq!(board.services[0].service_id, "s1");
        // Fallback id chain: serviceIdUrlSafe, then trainid
        assert_eq!(board.services[1].service_id, "1T23");
        assert_eq!(board.services[1].delay_minutes, 5);
    }

    #[test]
    fn public_board_arrivals_direction() {
        let json = r#"{
            "locationName": "Ely",
            "departures": {"all": [{"serviceIdUrlSafe": "dep", "std": "09:00"}]},
            "arrivals": {"all": [{"serviceIdUrlSafe": "arr", "sta": "09:05"}]}
        }"#;
        let dto: PublicBoard = serde_json::from_str(json).unwrap();

        let board = board_from_public(&dto, Crs::parse("ELY").unwrap(), Direction::Arrivals, 50);

        assert_eq!(board.services.len(), 1);
        assert_eq!(board.services[0].service_id, "arr");
        assert_eq!(board.services[0].status, ServiceStatus::NoReport);
    }
}
