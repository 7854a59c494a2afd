//! Notification sinks.
//!
//! The orchestrator hands every filtered change batch to one [`Sink`],
//! chosen at startup: dry-run logging for development, or real Telegram
//! delivery. Message rendering lives here too; the monitoring core never
//! sees notification text.

mod message;
mod telegram;

pub use message::format_message;
pub use telegram::{PLACEHOLDER_BOT_TOKEN, SinkError, TelegramSink};

use tracing::info;

use crate::domain::{StationConfig, TrainChange};

/// Where filtered changes are delivered.
pub enum Sink {
    /// Dry-run mode: render and log the message instead of delivering it.
    Log,
    /// Real delivery via the Telegram Bot API.
    Telegram(TelegramSink),
}

impl Sink {
    /// Dispatch a change batch. True means every target accepted it; the
    /// log sink always succeeds.
    pub async fn send(&self, changes: &[TrainChange], config: &StationConfig) -> bool {
        if changes.is_empty() {
            return true;
        }
        match self {
            Sink::Log => {
                info!(
                    station = %config.crs,
                    targets = ?config.notify_targets,
                    changes = changes.len(),
                    "dry-run notification (not sent)"
                );
                for line in message::format_message(changes, config).lines() {
                    info!("  {line}");
                }
                true
            }
            Sink::Telegram(sink) => sink.send(changes, config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::darwin::mock;
    use crate::domain::{ChangeType, Crs, Severity};
    use chrono::Utc;

    #[tokio::test]
    async fn log_sink_always_succeeds() {
        let service = mock::service("a");
        let change = TrainChange {
            change_type: ChangeType::Delay,
            service_id: service.service_id.clone(),
            service,
            old_value: "On time".to_string(),
            new_value: "12 minutes".to_string(),
            severity: Severity::Low,
            detected_at: Utc::now(),
            message: "Train delayed by 12 minutes".to_string(),
        };
        let config = StationConfig::new(Crs::parse("ELY").unwrap(), "Ely");

        assert!(Sink::Log.send(&[change], &config).await);
        assert!(Sink::Log.send(&[], &config).await);
    }
}
