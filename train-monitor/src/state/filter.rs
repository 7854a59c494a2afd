//! Notification filtering of detected changes.
//!
//! Filtering runs after detection so the unfiltered list stays available
//! for logging. A change survives when its type is enabled, a delay meets
//! the configured threshold, and the service heads somewhere on the
//! destination allow-list (when one is set).

use tracing::debug;

use crate::domain::{ChangeType, NotificationFilter, TrainChange};

/// Keep only the changes that should trigger a notification.
pub fn apply_filters(changes: Vec<TrainChange>, filters: &NotificationFilter) -> Vec<TrainChange> {
    changes
        .into_iter()
        .filter(|change| {
            if !type_enabled(change.change_type, filters) {
                debug!(change_type = %change.change_type, "change filtered by type");
                return false;
            }

            if change.change_type == ChangeType::Delay
                && change.service.delay_minutes < filters.min_delay_minutes
            {
                debug!(
                    delay = change.service.delay_minutes,
                    threshold = filters.min_delay_minutes,
                    "delay filtered by threshold"
                );
                return false;
            }

            if let Some(allowed) = &filters.destination_filter {
                // A service with no destination code cannot match a list
                let matches = change
                    .service
                    .destination_crs
                    .is_some_and(|code| allowed.contains(&code));
                if !allowed.is_empty() && !matches {
                    debug!(
                        destination = ?change.service.destination_crs,
                        "change filtered by destination"
                    );
                    return false;
                }
            }

            true
        })
        .collect()
}

fn type_enabled(change_type: ChangeType, filters: &NotificationFilter) -> bool {
    match change_type {
        ChangeType::Cancellation => filters.notify_cancellations,
        ChangeType::PlatformChange => filters.notify_platform_changes,
        ChangeType::NewService => filters.notify_new_services,
        ChangeType::Delay | ChangeType::TimeChange | ChangeType::StatusChange => true,
    }
}
