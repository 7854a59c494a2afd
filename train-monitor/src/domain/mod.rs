//! Core domain types for station monitoring.
//!
//! Everything downstream of the upstream APIs speaks these types: validated
//! station codes, board snapshots, detected changes, and the per-station
//! configuration records the orchestrator runs from.

mod change;
mod config;
mod service;
mod station;
mod time;

pub use change::{ChangeType, Severity, TrainChange};
pub use config::{ConfigError, MonitoringMode, NotificationFilter, StationConfig};
pub use service::{ServiceStatus, StationBoard, TrainService};
pub use station::{Crs, InvalidCrs};
pub use time::{BoardTime, TimeError, delay_between};
