//! Lifecycle management for the per-station polling tasks.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future;
use tracing::{error, info, warn};

use super::health::{HealthSnapshot, StationHealth};
use super::task::StationTask;
use crate::darwin::BoardSource;
use crate::domain::{Crs, StationConfig};
use crate::notify::Sink;
use crate::provider::StationProvider;
use crate::state::StateStore;

/// How often `run_until_shutdown` logs an aggregate health line.
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Counts of what a configuration reload did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadSummary {
    pub stopped: usize,
    pub started: usize,
    pub restarted: usize,
}

/// Owns one [`StationTask`] per enabled station and the shared plumbing
/// they poll through.
///
/// The source, store and sink are constructed once by the host and handed
/// in; every task gets a clone of the same handles.
pub struct StationManager<P> {
    provider: P,
    source: Arc<BoardSource>,
    store: Arc<StateStore>,
    sink: Arc<Sink>,
    tasks: Mutex<HashMap<Crs, StationTask>>,
    running: AtomicBool,
    start_time: Mutex<Option<DateTime<Utc>>>,
}

impl<P: StationProvider> StationManager<P> {
    pub fn new(provider: P, source: Arc<BoardSource>, store: Arc<StateStore>, sink: Arc<Sink>) -> Self {
        Self {
            provider,
            source,
            store,
            sink,
            tasks: Mutex::new(HashMap::new()),
            running: AtomicBool::new(false),
            start_time: Mutex::new(None),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Load configurations and spawn a polling task per enabled station.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("station manager already running");
            return;
        }
        *self.start_time_slot() = Some(Utc::now());

        let stations = self.provider.stations().await;
        let total = stations.len();
        let enabled: Vec<StationConfig> =
            stations.into_iter().filter(|s| s.enabled).collect();
        info!(
            configured = total,
            enabled = enabled.len(),
            "loaded station configurations"
        );
        if enabled.is_empty() {
            warn!("no enabled stations configured, nothing to monitor");
            return;
        }

        for config in enabled {
            self.start_station(config);
        }
        info!(stations = self.tasks().len(), "station monitoring started");
    }

    /// Park until `shutdown` resolves, logging a periodic health summary,
    /// then stop every task.
    pub async fn run_until_shutdown(&self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(HEALTH_LOG_INTERVAL);
        ticker.tick().await; // First tick is immediate, skip it
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let health = self.health();
                    info!(
                        running_stations = health.running_stations,
                        total_stations = health.total_stations,
                        total_checks = health.total_checks,
                        total_errors = health.total_errors,
                        "health summary"
                    );
                }
            }
        }

        info!("shutdown requested");
        self.stop().await;
    }

    /// Stop every polling task and wait for them to finish.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        let tasks: Vec<StationTask> = {
            let mut map = self.tasks();
            map.drain().map(|(_, task)| task).collect()
        };
        info!(stations = tasks.len(), "stopping station monitoring");
        future::join_all(tasks.into_iter().map(StationTask::stop)).await;
        info!("station monitoring stopped");
    }

    /// Re-read the provider and reconcile the running tasks against it.
    ///
    /// Removed or newly disabled stations are stopped and their stored
    /// state cleared; new stations are started; stations whose material
    /// settings changed are restarted with the new configuration.
    pub async fn reload_config(&self) -> ReloadSummary {
        info!("reloading station configurations");
        let incoming: HashMap<Crs, StationConfig> = self
            .provider
            .stations()
            .await
            .into_iter()
            .filter(|s| s.enabled)
            .map(|s| (s.crs, s))
            .collect();

        let current: HashSet<Crs> = self.tasks().keys().copied().collect();
        let mut summary = ReloadSummary::default();

        for station in current.iter().filter(|crs| !incoming.contains_key(crs)) {
            info!(station = %station, "station removed or disabled, stopping");
            self.stop_station(*station).await;
            summary.stopped += 1;
        }

        for (station, config) in &incoming {
            if !current.contains(station) {
                info!(station = %station, "new station configured, starting");
                self.start_station(config.clone());
                summary.started += 1;
                continue;
            }

            let changed = self
                .tasks()
                .get(station)
                .is_some_and(|task| config_changed(task.config(), config));
            if changed {
                info!(station = %station, "station configuration changed, restarting");
                self.stop_station(*station).await;
                self.start_station(config.clone());
                summary.restarted += 1;
            }
        }

        info!(
            stopped = summary.stopped,
            started = summary.started,
            restarted = summary.restarted,
            "configuration reload complete"
        );
        summary
    }

    /// Aggregate health across the manager and every station task.
    ///
    /// Non-blocking with respect to the polling loops; safe to call from a
    /// status endpoint or periodic log line.
    pub fn health(&self) -> HealthSnapshot {
        let stations: Vec<StationHealth> = {
            let tasks = self.tasks();
            tasks.values().map(StationTask::health).collect()
        };

        HealthSnapshot {
            manager_running: self.is_running(),
            start_time: *self.start_time_slot(),
            total_stations: stations.len(),
            running_stations: stations.iter().filter(|s| s.is_running).count(),
            total_checks: stations.iter().map(|s| s.check_count).sum(),
            total_errors: stations.iter().map(|s| s.error_count).sum(),
            source: self.source.health(),
            stations,
        }
    }

    pub fn station_health(&self, station: Crs) -> Option<StationHealth> {
        self.tasks().get(&station).map(StationTask::health)
    }

    /// Invalid bounds reject only this station; the rest keep running.
    fn start_station(&self, config: StationConfig) {
        if let Err(config_error) = config.validate() {
            error!(
                station = %config.crs,
                error = %config_error,
                "invalid station configuration, not starting"
            );
            return;
        }
        let task = StationTask::spawn(
            config,
            Arc::clone(&self.source),
            Arc::clone(&self.store),
            Arc::clone(&self.sink),
        );
        self.tasks().insert(task.config().crs, task);
    }

    /// Stop one task and drop its stored snapshot, so a later restart
    /// begins from a cold baseline instead of a stale one.
    async fn stop_station(&self, station: Crs) {
        let task = self.tasks().remove(&station);
        if let Some(task) = task {
            task.stop().await;
            self.store.clear_station(station);
        }
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<Crs, StationTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_time_slot(&self) -> MutexGuard<'_, Option<DateTime<Utc>>> {
        self.start_time
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Whether a configuration difference warrants restarting the task.
///
/// Name, description and tags are cosmetic; everything that alters polling
/// or notification behaviour is material.
fn config_changed(old: &StationConfig, new: &StationConfig) -> bool {
    old.check_interval_minutes != new.check_interval_minutes
        || old.monitoring_mode != new.monitoring_mode
        || old.time_window_minutes != new.time_window_minutes
        || old.max_services != new.max_services
        || old.notification_enabled != new.notification_enabled
        || old.notify_targets != new.notify_targets
        || old.filters != new.filters
}
