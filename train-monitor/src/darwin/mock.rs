//! Scripted board source and fixture builders for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::Utc;
use tokio::time::Instant;

use crate::domain::{Crs, ServiceStatus, StationBoard, TrainService};

use super::error::SourceError;

/// A board source that replays a scripted sequence of outcomes.
///
/// Each `fetch` pops the next scripted result and records when it was
/// called, so tests can assert on retry counts and backoff gaps. An empty
/// script yields [`SourceError::ScriptExhausted`].
#[derive(Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<StationBoard, SourceError>>>,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_board(&self, board: StationBoard) {
        self.script.lock().unwrap().push_back(Ok(board));
    }

    pub fn push_failure(&self, error: SourceError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    pub fn fetch(&self) -> Result<StationBoard, SourceError> {
        self.calls.lock().unwrap().push(Instant::now());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(SourceError::ScriptExhausted))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

/// Build a minimal on-time service row for tests.
pub fn service(id: &str) -> TrainService {
    TrainService {
        service_id: id.to_string(),
        origin: "Ely".to_string(),
        destination: "Cambridge".to_string(),
        destination_crs: Crs::parse("CBG").ok(),
        scheduled_departure: Some("10:15".to_string()),
        estimated_departure: Some("10:15".to_string()),
        actual_departure: None,
        scheduled_arrival: None,
        estimated_arrival: None,
        actual_arrival: None,
        platform: Some("2".to_string()),
        status: ServiceStatus::OnTime,
        delay_minutes: 0,
        operator: Some("Greater Anglia".to_string()),
        is_cancelled: false,
        cancellation_reason: None,
    }
}

/// Build a board snapshot for tests.
pub fn board(station: Crs, services: Vec<TrainService>) -> StationBoard {
    StationBoard {
        station_crs: station,
        station_name: "Test Station".to_string(),
        generated_at: Utc::now(),
        services,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_client_replays_in_order() {
        let client = ScriptedClient::new();
        let crs = Crs::parse("ELY").unwrap();
        client.push_board(board(crs, vec![service("a")]));
        client.push_failure(SourceError::RateLimited);

        let first = client.fetch().unwrap();
        assert_eq!(first.services[0].service_id, "a");

        assert!(matches!(client.fetch(), Err(SourceError::RateLimited)));
        assert!(matches!(client.fetch(), Err(SourceError::ScriptExhausted)));
        assert_eq!(client.call_count(), 3);
    }
}
