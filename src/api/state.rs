//! Shared application state for HTTP handlers

use std::sync::Arc;

use super::rate_limit::{RateLimitConfig, RateLimiter};
use crate::alerts::{AlertConfig, AlertDispatcher, Notifier};
use crate::event_store::EventStore;
use crate::ingest::IngestionService;
use crate::metrics::MetricsService;
use crate::utils::Clock;

/// Services reachable from every handler
pub struct AppState {
    pub ingestion: Arc<IngestionService>,
    pub metrics: Arc<MetricsService>,
    pub alerts: Arc<AlertDispatcher>,
    pub rate_limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire ingestion, aggregation and alerting around one store and clock
    pub fn new(
        store: Arc<dyn EventStore>,
        notifier: Option<Arc<dyn Notifier>>,
        clock: Arc<dyn Clock>,
        alert_config: AlertConfig,
    ) -> Self {
        let alerts = Arc::new(AlertDispatcher::new(
            store.clone(),
            notifier,
            clock.clone(),
            alert_config,
        ));
        let ingestion = Arc::new(IngestionService::new(store.clone(), alerts.clone(), clock.clone()));
        let metrics = Arc::new(MetricsService::new(store, clock.clone()));
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::default(), clock.clone()));

        Self {
            ingestion,
            metrics,
            alerts,
            rate_limiter,
            clock,
        }
    }

    /// Replace the default per-client request budget
    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limiter = Arc::new(RateLimiter::new(config, self.clock.clone()));
        self
    }
}
