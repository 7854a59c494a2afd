//! Rendering of change lists into notification text.
//!
//! Changes are grouped by type, most disruptive first. The output uses
//! Telegram-flavoured Markdown for section headers; the log sink prints
//! the same text verbatim.

use chrono::Utc;

use crate::domain::{ChangeType, Severity, StationConfig, TrainChange};

/// Render one notification message for a batch of changes at a station.
pub fn format_message(changes: &[TrainChange], config: &StationConfig) -> String {
    let cancellations = by_type(changes, ChangeType::Cancellation);
    let delays = by_type(changes, ChangeType::Delay);
    let platform_changes = by_type(changes, ChangeType::PlatformChange);
    let time_changes = by_type(changes, ChangeType::TimeChange);
    let new_services = by_type(changes, ChangeType::NewService);

    let mut lines = vec![format!("*Changes at {}*", config.station_name), String::new()];

    if !cancellations.is_empty() {
        lines.push("*CANCELLED*".to_string());
        for change in cancellations {
            let service = &change.service;
            lines.push(format!("{} → {}", service.origin, service.destination));
            lines.push(format!(
                "Scheduled: {}",
                service.scheduled_departure.as_deref().unwrap_or("N/A")
            ));
            if let Some(reason) = &service.cancellation_reason {
                lines.push(format!("Reason: {reason}"));
            }
            lines.push(String::new());
        }
    }

    if !delays.is_empty() {
        lines.push("*DELAYS*".to_string());
        for change in delays {
            let service = &change.service;
            let marker = if change.severity == Severity::High {
                "[high]"
            } else {
                "[delay]"
            };
            lines.push(format!(
                "{marker} {} → {}",
                service.origin, service.destination
            ));
            lines.push(format!(
                "Scheduled: {}",
                service.scheduled_departure.as_deref().unwrap_or("N/A")
            ));
            lines.push(format!(
                "Expected: {} (+{} min)",
                service.estimated_departure.as_deref().unwrap_or("unknown"),
                service.delay_minutes
            ));
            if let Some(platform) = &service.platform {
                lines.push(format!("Platform: {platform}"));
            }
            lines.push(String::new());
        }
    }

    if !platform_changes.is_empty() {
        lines.push("*PLATFORM CHANGES*".to_string());
        for change in platform_changes {
            let service = &change.service;
            lines.push(format!("{} → {}", service.origin, service.destination));
            lines.push(format!(
                "Departure: {}",
                service.scheduled_departure.as_deref().unwrap_or("N/A")
            ));
            lines.push(format!(
                "Platform: {} → {}",
                change.old_value, change.new_value
            ));
            lines.push(String::new());
        }
    }

    if !time_changes.is_empty() {
        lines.push("*TIME CHANGES*".to_string());
        for change in time_changes {
            let service = &change.service;
            lines.push(format!("{} → {}", service.origin, service.destination));
            lines.push(format!("Time: {} → {}", change.old_value, change.new_value));
            lines.push(String::new());
        }
    }

    if !new_services.is_empty() {
        lines.push("*NEW SERVICES*".to_string());
        for change in new_services {
            let service = &change.service;
            lines.push(format!("{} → {}", service.origin, service.destination));
            lines.push(format!(
                "Departure: {}",
                service.scheduled_departure.as_deref().unwrap_or("N/A")
            ));
            lines.push(format!(
                "Platform: {}",
                service.platform.as_deref().unwrap_or("TBA")
            ));
            lines.push(String::new());
        }
    }

    lines.push(format!("Updated: {}", Utc::now().format("%d.%m.%Y %H:%M")));
    lines.join("\n")
}

fn by_type(changes: &[TrainChange], change_type: ChangeType) -> Vec<&TrainChange> {
    changes
        .iter()
        .filter(|c| c.change_type == change_type)
        .collect()
}
