//! Upstream API response DTOs.
//!
//! Two wire formats land here: the authenticated Darwin LDB JSON gateway
//! and the keyless departureboard.io proxy. Both use `Option` liberally
//! because the upstreams omit fields rather than sending nulls.

use serde::Deserialize;

/// Which board list a fetch reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Departures,
    Arrivals,
}

/// Response from the Darwin LDB `GetDepartureBoard`/`GetArrivalBoard`
/// endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LdbBoard {
    /// When this response was generated (ISO 8601 datetime).
    pub generated_at: Option<String>,

    /// Human-readable name of the station.
    pub location_name: Option<String>,

    /// CRS code of the station.
    pub crs: Option<String>,

    /// Train services at this station.
    pub train_services: Option<Vec<LdbService>>,
}

/// A service row on a Darwin LDB board.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LdbService {
    /// Ephemeral Darwin service ID. Only valid while on the board.
    #[serde(rename = "serviceID")]
    pub service_id: Option<String>,

    /// Scheduled time of arrival at this station.
    pub sta: Option<String>,

    /// Estimated time of arrival at this station.
    pub eta: Option<String>,

    /// Actual time of arrival, once the train has called.
    pub ata: Option<String>,

    /// Scheduled time of departure from this station.
    pub std: Option<String>,

    /// Estimated time of departure from this station.
    /// May be "On time", "Delayed", "Cancelled", or a time like "10:15".
    pub etd: Option<String>,

    /// Actual time of departure.
    pub atd: Option<String>,

    /// Platform number/letter.
    pub platform: Option<String>,

    /// Train operating company name.
    pub operator: Option<String>,

    /// Whether this service is cancelled.
    pub is_cancelled: Option<bool>,

    /// Reason for cancellation (if cancelled).
    pub cancel_reason: Option<String>,

    /// Reason for delay (if delayed).
    pub delay_reason: Option<String>,

    /// Origin station(s).
    pub origin: Option<Vec<LdbLocation>>,

    /// Destination station(s).
    pub destination: Option<Vec<LdbLocation>>,
}

/// Origin or destination location on an LDB board.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LdbLocation {
    /// Human-readable station name.
    pub location_name: String,

    /// CRS code.
    pub crs: Option<String>,

    /// "via" text (e.g., "via Cambridge").
    pub via: Option<String>,
}

/// Response from departureboard.io `getArrivalsAndDeparturesByCRS`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicBoard {
    /// Human-readable name of the station.
    pub location_name: Option<String>,

    pub departures: Option<PublicServiceList>,

    pub arrivals: Option<PublicServiceList>,
}

impl PublicBoard {
    /// The raw service rows for one board direction.
    pub fn services(&self, direction: Direction) -> &[PublicService] {
        let list = match direction {
            Direction::Departures => self.departures.as_ref(),
            Direction::Arrivals => self.arrivals.as_ref(),
        };
        list.and_then(|l| l.all.as_deref()).unwrap_or(&[])
    }
}

/// departureboard.io wraps each board list under an "all" key.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicServiceList {
    pub all: Option<Vec<PublicService>>,
}

/// A service row from departureboard.io.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicService {
    /// URL-safe service id, the stable identifier on this API.
    pub service_id_url_safe: Option<String>,

    /// Train id (headcode), the fallback identifier.
    pub trainid: Option<String>,

    pub origin: Option<PublicLocation>,

    pub destination: Option<PublicLocation>,

    pub std: Option<String>,
    pub etd: Option<String>,
    pub atd: Option<String>,

    pub sta: Option<String>,
    pub eta: Option<String>,
    pub ata: Option<String>,

    pub platform: Option<String>,

    pub operator: Option<String>,

    pub is_cancelled: Option<bool>,

    pub cancel_reason: Option<String>,
}

/// Origin or destination on departureboard.io.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicLocation {
    pub location: Option<String>,
    pub crs: Option<String>,
}
