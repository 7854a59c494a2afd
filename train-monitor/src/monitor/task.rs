//! The per-station polling task.
//!
//! Each monitored station runs as its own tokio task: fetch the board,
//! diff it against the stored snapshot, send a notification if anything
//! filtered through. A failing cycle is recorded and the loop carries on;
//! one broken station never takes down the others.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::health::{StationHealth, TaskStats};
use crate::darwin::{BoardSource, UpstreamError};
use crate::domain::{MonitoringMode, StationConfig};
use crate::notify::Sink;
use crate::state::StateStore;

/// Handle to one running station monitor.
///
/// Owns the loop's config and stats; dropping the handle does not stop
/// the loop, call [`StationTask::stop`] for an orderly shutdown.
pub struct StationTask {
    config: StationConfig,
    stats: Arc<TaskStats>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl StationTask {
    /// Spawn the polling loop for `config`.
    ///
    /// The first check runs immediately; later checks follow every
    /// `check_interval_minutes`.
    pub fn spawn(
        config: StationConfig,
        source: Arc<BoardSource>,
        store: Arc<StateStore>,
        sink: Arc<Sink>,
    ) -> Self {
        if config.monitoring_mode == MonitoringMode::Both {
            warn!(
                station = %config.crs,
                "both-directions monitoring is not implemented, polling departures only"
            );
        }
        info!(
            station = %config.crs,
            name = %config.station_name,
            interval_minutes = config.check_interval_minutes,
            "starting station monitoring"
        );

        let stats = Arc::new(TaskStats::default());
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(monitoring_loop(
            config.clone(),
            source,
            store,
            sink,
            Arc::clone(&stats),
            shutdown_rx,
        ));

        Self {
            config,
            stats,
            shutdown,
            handle,
        }
    }

    /// Signal the loop to exit and wait for it to finish.
    ///
    /// An in-flight check is allowed to complete first, so this can block
    /// for up to one fetch (including its retries).
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(join_error) = self.handle.await {
            warn!(
                station = %self.config.crs,
                error = %join_error,
                "monitoring task ended abnormally"
            );
        }
        info!(station = %self.config.crs, "stopped station monitoring");
    }

    pub fn health(&self) -> StationHealth {
        self.stats.health(&self.config, !self.handle.is_finished())
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }
}

async fn monitoring_loop(
    config: StationConfig,
    source: Arc<BoardSource>,
    store: Arc<StateStore>,
    sink: Arc<Sink>,
    stats: Arc<TaskStats>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        stats.record_check_started();
        match run_check(&config, &source, &store, &sink).await {
            Ok(()) => stats.record_success(),
            Err(upstream) => {
                let error_count = stats.record_error(upstream.to_string());
                error!(
                    station = %config.crs,
                    error_count,
                    error = %upstream,
                    "monitoring check failed"
                );
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(config.check_interval()) => {}
            _ = shutdown.changed() => break,
        }
    }
    debug!(station = %config.crs, "monitoring loop exited");
}

/// One polling cycle: fetch, diff, notify.
///
/// A notification delivery failure is logged but does not fail the cycle;
/// only an upstream fetch failure counts as a check error.
async fn run_check(
    config: &StationConfig,
    source: &BoardSource,
    store: &StateStore,
    sink: &Sink,
) -> Result<(), UpstreamError> {
    let board = source.fetch_board(config).await?;
    debug!(
        station = %config.crs,
        services = board.services.len(),
        "fetched current board"
    );

    let changes = store.update_and_detect(config, board);
    if changes.is_empty() {
        return Ok(());
    }
    if !config.notification_enabled {
        debug!(
            station = %config.crs,
            changes = changes.len(),
            "notifications disabled, discarding changes"
        );
        return Ok(());
    }

    if !sink.send(&changes, config).await {
        warn!(station = %config.crs, "notification delivery incomplete");
    }
    Ok(())
}
