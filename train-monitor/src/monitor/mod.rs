//! Orchestration: one polling task per station, plus lifecycle and health.

mod health;
mod manager;
mod task;

pub use health::{HealthSnapshot, StationHealth, TaskStats};
pub use manager::{ReloadSummary, StationManager};
pub use task::StationTask;
