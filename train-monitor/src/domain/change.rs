//! Detected changes between two board snapshots.

use std::fmt;

use chrono::{DateTime, Utc};

use super::TrainService;

/// What kind of change was detected for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Delay,
    Cancellation,
    PlatformChange,
    TimeChange,
    NewService,
    StatusChange,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeType::Delay => "delay",
            ChangeType::Cancellation => "cancellation",
            ChangeType::PlatformChange => "platform_change",
            ChangeType::TimeChange => "time_change",
            ChangeType::NewService => "new_service",
            ChangeType::StatusChange => "status_change",
        };
        f.write_str(s)
    }
}

/// How disruptive a change is to someone planning around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Classify a delay by magnitude: more than 30 minutes is High,
    /// 15-30 is Medium, under 15 is Low.
    pub fn for_delay(minutes: u32) -> Self {
        if minutes > 30 {
            Severity::High
        } else if minutes >= 15 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.write_str(s)
    }
}

/// One detected change for one service in one diff cycle.
///
/// Transient: produced by the differ, consumed by the notification path,
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainChange {
    pub change_type: ChangeType,
    pub service_id: String,
    /// The service as currently reported (after the change).
    pub service: TrainService,
    pub old_value: String,
    pub new_value: String,
    pub severity: Severity,
    pub detected_at: DateTime<Utc>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_severity_boundaries() {
        assert_eq!(Severity::for_delay(0), Severity::Low);
        assert_eq!(Severity::for_delay(14), Severity::Low);
        assert_eq!(Severity::for_delay(15), Severity::Medium);
        assert_eq!(Severity::for_delay(30), Severity::Medium);
        assert_eq!(Severity::for_delay(31), Severity::High);
        assert_eq!(Severity::for_delay(120), Severity::High);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn change_type_labels() {
        assert_eq!(ChangeType::Delay.to_string(), "delay");
        assert_eq!(ChangeType::PlatformChange.to_string(), "platform_change");
        assert_eq!(ChangeType::Cancellation.to_string(), "cancellation");
    }
}
