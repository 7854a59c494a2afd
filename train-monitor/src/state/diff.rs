//! Change detection between two board snapshots.
//!
//! Comparison is keyed on service id. Services that appear on the new board
//! are fresh data, not changes; services that disappear usually just
//! departed. Neither is reported.

use chrono::Utc;
use tracing::debug;

use crate::domain::{ChangeType, Severity, StationBoard, TrainChange, TrainService};

/// Detect every change between the previous and current board.
pub fn detect_changes(previous: &StationBoard, current: &StationBoard) -> Vec<TrainChange> {
    let previous_services = previous.by_service_id();
    let current_services = current.by_service_id();

    let mut changes = Vec::new();
    for service in &current.services {
        match previous_services.get(service.service_id.as_str()) {
            Some(previous_service) => {
                changes.extend(service_changes(previous_service, service));
            }
            None => {
                debug!(service_id = %service.service_id, "new service appeared");
            }
        }
    }

    for service_id in previous_services.keys() {
        if !current_services.contains_key(service_id) {
            // Usually the train departed
            debug!(%service_id, "service disappeared from board");
        }
    }

    changes
}

fn service_changes(previous: &TrainService, current: &TrainService) -> Vec<TrainChange> {
    let mut changes = Vec::new();
    let detected_at = Utc::now();

    if !previous.is_cancelled && current.is_cancelled {
        changes.push(TrainChange {
            change_type: ChangeType::Cancellation,
            service_id: current.service_id.clone(),
            service: current.clone(),
            old_value: "Active".to_string(),
            new_value: "Cancelled".to_string(),
            severity: Severity::High,
            detected_at,
            message: current
                .cancellation_reason
                .clone()
                .unwrap_or_else(|| "Train cancelled".to_string()),
        });
    }

    // Delay movement on a cancelled service is noise; an unchanged or
    // shrinking delay is not a change at all.
    if !current.is_cancelled && current.delay_minutes > previous.delay_minutes {
        let (old_value, new_value, message) = if previous.delay_minutes == 0 {
            (
                "On time".to_string(),
                format!("{} minutes", current.delay_minutes),
                format!("Train delayed by {} minutes", current.delay_minutes),
            )
        } else {
            (
                previous.delay_minutes.to_string(),
                current.delay_minutes.to_string(),
                format!(
                    "Delay increased from {} to {} minutes",
                    previous.delay_minutes, current.delay_minutes
                ),
            )
        };
        changes.push(TrainChange {
            change_type: ChangeType::Delay,
            service_id: current.service_id.clone(),
            service: current.clone(),
            old_value,
            new_value,
            severity: Severity::for_delay(current.delay_minutes),
            detected_at,
            message,
        });
    }

    if let (Some(old), Some(new)) = (
        non_empty(previous.platform.as_deref()),
        non_empty(current.platform.as_deref()),
    ) {
        if old != new {
            changes.push(TrainChange {
                change_type: ChangeType::PlatformChange,
                service_id: current.service_id.clone(),
                service: current.clone(),
                old_value: old.to_string(),
                new_value: new.to_string(),
                severity: Severity::Medium,
                detected_at,
                message: format!("Platform changed from {old} to {new}"),
            });
        }
    }

    if let (Some(old), Some(new)) = (
        non_empty(previous.scheduled_departure.as_deref()),
        non_empty(current.scheduled_departure.as_deref()),
    ) {
        if old != new {
            changes.push(TrainChange {
                change_type: ChangeType::TimeChange,
                service_id: current.service_id.clone(),
                service: current.clone(),
                old_value: old.to_string(),
                new_value: new.to_string(),
                severity: Severity::High,
                detected_at,
                message: format!("Scheduled time changed from {old} to {new}"),
            });
        }
    }

    changes
}

/// Platform and time comparisons need a value on both sides; an empty
/// string counts as absent.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::darwin::mock;
    use crate::domain::{Crs, ServiceStatus};

    fn crs() -> Crs {
        Crs::parse("ELY").unwrap()
    }

    fn delayed(id: &str, minutes: u32) -> TrainService {
        let mut service = mock::service(id);
        service.delay_minutes = minutes;
        if minutes > 0 {
            service.status = ServiceStatus::Delayed;
        }
        service
    }

    fn cancelled(id: &str, reason: Option<&str>) -> TrainService {
        let mut service = mock::service(id);
        service.is_cancelled = true;
        service.status = ServiceStatus::Cancelled;
        service.cancellation_reason = reason.map(ToString::to_string);
        service
    }

    #[test]
    fn identical_boards_yield_no_changes() {
        let board = mock::board(crs(), vec![mock::service("a"), delayed("b", 7)]);

        assert!(detect_changes(&board, &board).is_empty());
    }

    #[test]
    fn cancellation_detected_with_default_message() {
        let previous = mock::board(crs(), vec![mock::service("a")]);
        let current = mock::board(crs(), vec![cancelled("a", None)]);

        let changes = detect_changes(&previous, &current);

        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.change_type, ChangeType::Cancellation);
        assert_eq!(change.old_value, "Active");
        assert_eq!(change.new_value, "Cancelled");
        assert_eq!(change.severity, Severity::High);
        assert_eq!(change.message, "Train cancelled");
    }

    #[test]
    fn cancellation_uses_reason_when_present() {
        let previous = mock::board(crs(), vec![mock::service("a")]);
        let current = mock::board(crs(), vec![cancelled("a", Some("Signal failure"))]);

        let changes = detect_changes(&previous, &current);

        assert_eq!(changes[0].message, "Signal failure");
    }

    #[test]
    fn fresh_delay_uses_on_time_wording() {
        let previous = mock::board(crs(), vec![delayed("a", 0)]);
        let current = mock::board(crs(), vec![delayed("a", 12)]);

        let changes = detect_changes(&previous, &current);

        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.change_type, ChangeType::Delay);
        assert_eq!(change.old_value, "On time");
        assert_eq!(change.new_value, "12 minutes");
        assert_eq!(change.message, "Train delayed by 12 minutes");
        assert_eq!(change.severity, Severity::Low);
    }

    #[test]
    fn delay_increase_reports_both_values() {
        let previous = mock::board(crs(), vec![delayed("a", 5)]);
        let current = mock::board(crs(), vec![delayed("a", 20)]);

        let changes = detect_changes(&previous, &current);

        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.old_value, "5");
        assert_eq!(change.new_value, "20");
        assert_eq!(change.message, "Delay increased from 5 to 20 minutes");
        assert_eq!(change.severity, Severity::Medium);
    }

    #[test]
    fn unchanged_delay_is_not_a_change() {
        let previous = mock::board(crs(), vec![delayed("a", 7)]);
        let current = mock::board(crs(), vec![delayed("a", 7)]);

        assert!(detect_changes(&previous, &current).is_empty());
    }

    #[test]
    fn shrinking_delay_is_not_a_change() {
        let previous = mock::board(crs(), vec![delayed("a", 10)]);
        let current = mock::board(crs(), vec![delayed("a", 5)]);

        assert!(detect_changes(&previous, &current).is_empty());
    }

    #[test]
    fn cancelled_service_suppresses_delay_change() {
        let previous = mock::board(crs(), vec![mock::service("a")]);
        let mut now_cancelled = cancelled("a", None);
        now_cancelled.delay_minutes = 30;
        let current = mock::board(crs(), vec![now_cancelled]);

        let changes = detect_changes(&previous, &current);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Cancellation);
    }

    #[test]
    fn platform_change_detected() {
        let previous = mock::board(crs(), vec![mock::service("a")]);
        let mut moved = mock::service("a");
        moved.platform = Some("5".to_string());
        let current = mock::board(crs(), vec![moved]);

        let changes = detect_changes(&previous, &current);

        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.change_type, ChangeType::PlatformChange);
        assert_eq!(change.old_value, "2");
        assert_eq!(change.new_value, "5");
        assert_eq!(change.severity, Severity::Medium);
        assert_eq!(change.message, "Platform changed from 2 to 5");
    }

    #[test]
    fn platform_appearing_is_not_a_change() {
        let mut no_platform = mock::service("a");
        no_platform.platform = None;
        let previous = mock::board(crs(), vec![no_platform]);
        let current = mock::board(crs(), vec![mock::service("a")]);

        assert!(detect_changes(&previous, &current).is_empty());
    }

    #[test]
    fn empty_platform_counts_as_absent() {
        let mut blank_platform = mock::service("a");
        blank_platform.platform = Some(String::new());
        let previous = mock::board(crs(), vec![blank_platform]);
        let current = mock::board(crs(), vec![mock::service("a")]);

        assert!(detect_changes(&previous, &current).is_empty());
    }

    #[test]
    fn scheduled_time_change_detected() {
        let previous = mock::board(crs(), vec![mock::service("a")]);
        let mut retimed = mock::service("a");
        retimed.scheduled_departure = Some("10:45".to_string());
        let current = mock::board(crs(), vec![retimed]);

        let changes = detect_changes(&previous, &current);

        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.change_type, ChangeType::TimeChange);
        assert_eq!(change.old_value, "10:15");
        assert_eq!(change.new_value, "10:45");
        assert_eq!(change.severity, Severity::High);
        assert_eq!(change.message, "Scheduled time changed from 10:15 to 10:45");
    }

    #[test]
    fn delay_and_platform_change_both_reported() {
        let previous = mock::board(crs(), vec![mock::service("a")]);
        let mut service = delayed("a", 12);
        service.platform = Some("5".to_string());
        let current = mock::board(crs(), vec![service]);

        let changes = detect_changes(&previous, &current);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].change_type, ChangeType::Delay);
        assert_eq!(changes[1].change_type, ChangeType::PlatformChange);
    }

    #[test]
    fn new_service_is_not_a_change() {
        let previous = mock::board(crs(), vec![mock::service("a")]);
        let current = mock::board(crs(), vec![mock::service("a"), mock::service("b")]);

        assert!(detect_changes(&previous, &current).is_empty());
    }

    #[test]
    fn disappeared_service_is_not_a_change() {
        let previous = mock::board(crs(), vec![mock::service("a"), mock::service("b")]);
        let current = mock::board(crs(), vec![mock::service("a")]);

        assert!(detect_changes(&previous, &current).is_empty());
    }
}
