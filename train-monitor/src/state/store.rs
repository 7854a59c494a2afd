//! Station state store: previous boards, change detection, filtering.
//!
//! One store is shared by every polling task. Each update replaces the
//! remembered board for that station unconditionally, so the next cycle
//! diffs against what was actually last seen.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info};

use crate::domain::{Crs, StationBoard, StationConfig, TrainChange};

use super::diff::detect_changes;
use super::disk::StateDir;
use super::filter::apply_filters;

/// In-memory board state with optional durable backing.
pub struct StateStore {
    boards: Mutex<HashMap<Crs, StationBoard>>,
    disk: Option<StateDir>,
}

impl StateStore {
    /// A store that persists every update to the given state directory.
    pub fn persistent(disk: StateDir) -> Self {
        Self {
            boards: Mutex::new(HashMap::new()),
            disk: Some(disk),
        }
    }

    /// A store that keeps state in memory only.
    pub fn in_memory() -> Self {
        Self {
            boards: Mutex::new(HashMap::new()),
            disk: None,
        }
    }

    /// Ingest a fresh board: diff it against the previous snapshot, replace
    /// the snapshot, persist it, and return the changes that pass the
    /// station's notification filters.
    ///
    /// The previous snapshot is found in memory first, then on disk. With
    /// neither available this is a cold start: the board is stored and no
    /// changes are reported.
    pub fn update_and_detect(
        &self,
        config: &StationConfig,
        current: StationBoard,
    ) -> Vec<TrainChange> {
        let station = config.crs;
        let mut previous = self.boards().get(&station).cloned();
        if previous.is_none() && self.load_from_disk(station) {
            previous = self.boards().get(&station).cloned();
        }

        let Some(previous) = previous else {
            info!(station = %station, "first update, storing initial state");
            self.boards().insert(station, current);
            self.save_to_disk(station);
            return Vec::new();
        };

        let all_changes = detect_changes(&previous, &current);
        self.boards().insert(station, current);
        self.save_to_disk(station);

        let detected = all_changes.len();
        let filtered = apply_filters(all_changes, &config.filters);
        if detected > 0 {
            info!(
                station = %station,
                detected,
                passed = filtered.len(),
                "board changes detected"
            );
        } else {
            debug!(station = %station, "no changes detected");
        }
        filtered
    }

    /// Hydrate the in-memory snapshot for a station from durable storage.
    ///
    /// Returns false when persistence is disabled, no usable file exists,
    /// or the read fails. Failures are logged, never propagated.
    pub fn load_from_disk(&self, station: Crs) -> bool {
        let Some(disk) = &self.disk else {
            return false;
        };
        match disk.load(station) {
            Ok(Some(envelope)) => {
                self.boards().insert(station, envelope.board);
                true
            }
            Ok(None) => false,
            Err(error) => {
                error!(station = %station, %error, "failed to load saved state");
                false
            }
        }
    }

    /// Persist the in-memory snapshot for a station to durable storage.
    ///
    /// Returns false when persistence is disabled, there is nothing to
    /// save, or the write fails. Failures are logged, never propagated.
    pub fn save_to_disk(&self, station: Crs) -> bool {
        let Some(disk) = &self.disk else {
            return false;
        };
        let Some(board) = self.boards().get(&station).cloned() else {
            debug!(station = %station, "no state to save");
            return false;
        };
        match disk.save(station, &board) {
            Ok(()) => true,
            Err(error) => {
                error!(station = %station, %error, "failed to persist state");
                false
            }
        }
    }

    /// Drop all state for a station, in memory and on disk.
    pub fn clear_station(&self, station: Crs) {
        self.boards().remove(&station);
        if let Some(disk) = &self.disk {
            if let Err(error) = disk.delete(station) {
                error!(station = %station, %error, "failed to delete state file");
            }
        }
        info!(station = %station, "cleared station state");
    }

    /// Drop all state for every tracked station.
    pub fn clear_all(&self) {
        let stations: Vec<Crs> = self.boards().keys().copied().collect();
        for station in &stations {
            self.clear_station(*station);
        }
        info!(stations = stations.len(), "cleared all state");
    }

    pub fn tracked_stations(&self) -> Vec<Crs> {
        self.boards().keys().copied().collect()
    }

    pub fn station_count(&self) -> usize {
        self.boards().len()
    }

    fn boards(&self) -> MutexGuard<'_, HashMap<Crs, StationBoard>> {
        self.boards.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
