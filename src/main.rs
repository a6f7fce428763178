//! Game Telemetry Service - Binary Entry Point
//!
//! This is the main entry point for the telemetry-server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use game_telemetry::alerts::{DiscordWebhook, Notifier};
use game_telemetry::api::{create_router, AppState};
use game_telemetry::config::TelemetryConfig;
use game_telemetry::error::TelemetryResult;
use game_telemetry::event_store::LocalEventStore;
use game_telemetry::logging::init_logging;
use game_telemetry::utils::SystemClock;

#[tokio::main]
async fn main() -> TelemetryResult<()> {
    let config = TelemetryConfig::from_env()?;
    init_logging(&config.log);

    let store = Arc::new(LocalEventStore::open(config.store.clone())?);
    info!(
        events = store.len(),
        data_dir = ?config.store.data_dir,
        "Event store ready"
    );

    let notifier: Option<Arc<dyn Notifier>> = match &config.webhook_url {
        Some(url) => {
            let webhook = DiscordWebhook::new(url.clone(), config.alerts.delivery_timeout)?;
            Some(Arc::new(webhook) as Arc<dyn Notifier>)
        }
        None => {
            warn!("DISCORD_WEBHOOK_URL not set, crash alerts are disabled");
            None
        }
    };

    let state = Arc::new(AppState::new(
        store,
        notifier,
        Arc::new(SystemClock),
        config.alerts.clone(),
    )
    .with_rate_limit(config.rate_limit.clone()));
    let router = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, version = game_telemetry::VERSION, "Telemetry API listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
