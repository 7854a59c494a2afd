//! Durable board snapshots, one JSON file per station.
//!
//! Snapshots let a restarted process diff against what it saw before
//! instead of re-alerting from a cold board. Files older than the expiry
//! window are stale enough to mislead and are discarded on load, as are
//! files that no longer parse.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{Crs, StationBoard};

const STATE_EXPIRY_HOURS: i64 = 12;

/// Why a state file operation failed.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to create state directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write state file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to read state file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to encode state for {station}: {source}")]
    Encode {
        station: Crs,
        source: serde_json::Error,
    },
    #[error("failed to delete state file {path}: {source}")]
    Delete { path: PathBuf, source: io::Error },
}

/// A saved board snapshot plus the metadata needed to judge its age.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEnvelope {
    pub station_code: String,
    pub saved_at: DateTime<Utc>,
    pub board: StationBoard,
}

/// Directory of per-station state files.
#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// Open (creating if needed) a state directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| PersistenceError::CreateDir {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    fn state_file(&self, station: Crs) -> PathBuf {
        self.root.join(format!("{}_state.json", station.as_str()))
    }

    /// Persist a board snapshot atomically (temp file, then rename).
    pub fn save(&self, station: Crs, board: &StationBoard) -> Result<(), PersistenceError> {
        let envelope = StateEnvelope {
            station_code: station.as_str().to_string(),
            saved_at: Utc::now(),
            board: board.clone(),
        };
        let json = serde_json::to_string_pretty(&envelope)
            .map_err(|source| PersistenceError::Encode { station, source })?;

        let path = self.state_file(station);
        let temp = path.with_extension("tmp");
        fs::write(&temp, json).map_err(|source| PersistenceError::Write {
            path: temp.clone(),
            source,
        })?;
        fs::rename(&temp, &path)
            .map_err(|source| PersistenceError::Write { path, source })?;
        Ok(())
    }

    /// Load the saved snapshot for a station, if a usable one exists.
    ///
    /// Expired and unparseable files are deleted and treated as absent, so
    /// a cold start follows.
    pub fn load(&self, station: Crs) -> Result<Option<StateEnvelope>, PersistenceError> {
        let path = self.state_file(station);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(PersistenceError::Read { path, source }),
        };

        let envelope: StateEnvelope = match serde_json::from_str(&json) {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(station = %station, %error, "deleting unparseable state file");
                remove_if_present(&path)?;
                return Ok(None);
            }
        };

        let age = Utc::now() - envelope.saved_at;
        if age > Duration::hours(STATE_EXPIRY_HOURS) {
            info!(
                station = %station,
                age_hours = format_args!("{:.1}", age.num_minutes() as f64 / 60.0),
                max_hours = STATE_EXPIRY_HOURS,
                "saved state too old, discarding"
            );
            remove_if_present(&path)?;
            return Ok(None);
        }

        info!(
            station = %station,
            age_hours = format_args!("{:.1}", age.num_minutes() as f64 / 60.0),
            services = envelope.board.services.len(),
            "loaded saved state"
        );
        Ok(Some(envelope))
    }

    /// Remove the saved snapshot for a station, if any.
    pub fn delete(&self, station: Crs) -> Result<(), PersistenceError> {
        remove_if_present(&self.state_file(station))
    }
}

fn remove_if_present(path: &Path) -> Result<(), PersistenceError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PersistenceError::Delete {
            path: path.to_path_buf(),
            source,
        }),
    }
}
