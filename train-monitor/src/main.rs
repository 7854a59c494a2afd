use std::sync::Arc;

use tracing::{info, warn};

use train_monitor::darwin::BoardSource;
use train_monitor::monitor::StationManager;
use train_monitor::notify::{PLACEHOLDER_BOT_TOKEN, Sink, TelegramSink};
use train_monitor::provider::EnvProvider;
use train_monitor::state::{StateDir, StateStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if !monitor_enabled() {
        info!("train monitor disabled via TRAIN_MONITOR_ENABLED, exiting");
        return;
    }

    // Schedule source: Darwin with a key, public fallback without one.
    let api_key = std::env::var("DARWIN_API_KEY").ok();
    let source =
        BoardSource::auto(api_key.as_deref()).expect("failed to initialise schedule source");
    let source_health = source.health();
    info!(
        backend = source_health.backend,
        credential_configured = source_health.credential_configured,
        ready = source_health.ready,
        "schedule source selected"
    );

    let state_root =
        std::env::var("TRAIN_MONITOR_STATE_DIR").unwrap_or_else(|_| "state".to_string());
    let state_dir = StateDir::new(&state_root).expect("failed to create state directory");
    info!(path = %state_root, "durable state directory ready");

    let manager = StationManager::new(
        EnvProvider::new(),
        Arc::new(source),
        Arc::new(StateStore::persistent(state_dir)),
        Arc::new(build_sink()),
    );

    manager.start().await;
    manager.run_until_shutdown(shutdown_signal()).await;
    info!("shutdown complete");
}

/// Gate on TRAIN_MONITOR_ENABLED: only an explicit "false" disables.
fn monitor_enabled() -> bool {
    std::env::var("TRAIN_MONITOR_ENABLED")
        .map(|v| !v.eq_ignore_ascii_case("false"))
        .unwrap_or(true)
}

/// Choose a notification sink from the environment.
///
/// Dry-run mode and a missing bot token both fall back to logging the
/// would-be messages, so the monitor stays useful without credentials.
fn build_sink() -> Sink {
    let dry_run =
        std::env::var("TRAIN_MONITOR_DRY_RUN").is_ok_and(|v| v.eq_ignore_ascii_case("true"));
    if dry_run {
        info!("dry-run mode, notifications will be logged instead of sent");
        return Sink::Log;
    }

    match std::env::var("TELEGRAM_BOT_TOKEN") {
        Ok(token) if !token.is_empty() && token != PLACEHOLDER_BOT_TOKEN => {
            match TelegramSink::new(&token) {
                Ok(sink) => Sink::Telegram(sink),
                Err(error) => {
                    warn!(%error, "failed to build Telegram sink, logging instead");
                    Sink::Log
                }
            }
        }
        _ => {
            warn!("TELEGRAM_BOT_TOKEN not configured, notifications will be logged");
            Sink::Log
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("received SIGINT"),
            _ = sigterm.recv() => info!("received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("received interrupt");
    }
}
