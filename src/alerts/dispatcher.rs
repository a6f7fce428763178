//! Crash threshold evaluation and alert delivery

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, error, info, warn};

use super::cooldown::{CooldownDecision, CooldownTracker};
use super::message::AlertMessage;
use super::notifier::{AlertError, Notifier};
use crate::event_store::{EventFilter, EventStore};
use crate::types::{EventType, Severity};
use crate::utils::Clock;

/// Default crash count per window that triggers an alert
pub const DEFAULT_CRASH_THRESHOLD: u64 = 10;

/// Alerting parameters
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Crash count at or above which an alert is sent
    pub threshold: u64,
    /// Minimum spacing between crash alerts for one game
    pub cooldown: Duration,
    /// Rolling window crashes are counted over
    pub window: Duration,
    /// Upper bound on a single delivery attempt
    pub delivery_timeout: std::time::Duration,
    /// Evaluate on a spawned task instead of before the ingestion call returns
    pub background: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CRASH_THRESHOLD,
            cooldown: Duration::minutes(5),
            window: Duration::hours(1),
            delivery_timeout: std::time::Duration::from_secs(5),
            background: false,
        }
    }
}

impl AlertConfig {
    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }
}

/// What a threshold evaluation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    BelowThreshold { crash_count: u64 },
    /// Threshold crossed but no notification channel is configured
    Disabled { crash_count: u64 },
    /// Threshold crossed while the game is cooling down
    Suppressed { crash_count: u64 },
    Delivered { crash_count: u64 },
    /// Delivery failed; the next qualifying crash may retry
    DeliveryFailed { crash_count: u64 },
    /// The crash count could not be read
    EvaluationFailed,
}

/// Evaluates per-game crash rates and sends rate-limited notifications
pub struct AlertDispatcher {
    store: Arc<dyn EventStore>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Arc<dyn Clock>,
    cooldown: CooldownTracker,
    config: AlertConfig,
}

impl AlertDispatcher {
    pub fn new(
        store: Arc<dyn EventStore>,
        notifier: Option<Arc<dyn Notifier>>,
        clock: Arc<dyn Clock>,
        config: AlertConfig,
    ) -> Self {
        let cooldown = CooldownTracker::new(config.cooldown, clock.clone());
        Self {
            store,
            notifier,
            clock,
            cooldown,
            config,
        }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    pub fn cooldown(&self) -> &CooldownTracker {
        &self.cooldown
    }

    /// Count recent crashes for `game_id` and alert if the threshold is reached
    ///
    /// Never fails: every problem is logged and reported as an outcome.
    pub async fn evaluate_crash_threshold(&self, game_id: &str) -> AlertOutcome {
        let since = self.clock.now() - self.config.window;
        let filter = EventFilter::for_game(game_id)
            .with_event_type(EventType::Crash)
            .since(since);

        let crash_count = match self.store.count(&filter).await {
            Ok(count) => count,
            Err(e) => {
                error!(game_id, error = %e, "Failed to count crashes for threshold check");
                return AlertOutcome::EvaluationFailed;
            }
        };

        if crash_count < self.config.threshold {
            return AlertOutcome::BelowThreshold { crash_count };
        }

        let Some(notifier) = self.notifier.as_ref() else {
            debug!(game_id, crash_count, "Alert webhook not configured, skipping alert");
            return AlertOutcome::Disabled { crash_count };
        };

        let threshold = self.config.threshold;
        let decision = self
            .cooldown
            .run_if_ready(game_id, move || async move {
                let message = AlertMessage::crash(game_id, crash_count, threshold, self.clock.now());
                self.deliver(notifier.as_ref(), &message).await
            })
            .await;

        match decision {
            CooldownDecision::Fired => {
                info!(game_id, crash_count, threshold, "Crash alert sent");
                AlertOutcome::Delivered { crash_count }
            }
            CooldownDecision::Suppressed { remaining } => {
                debug!(
                    game_id,
                    remaining_secs = remaining.num_seconds(),
                    "Alert cooldown active, skipping"
                );
                AlertOutcome::Suppressed { crash_count }
            }
            CooldownDecision::Failed(e) => {
                error!(game_id, error = %e, "Failed to send crash alert");
                AlertOutcome::DeliveryFailed { crash_count }
            }
        }
    }

    /// Send an arbitrary titled message; no threshold, no cooldown
    ///
    /// Returns whether the message was delivered.
    pub async fn send_custom_alert(&self, title: &str, message: &str, severity: Severity) -> bool {
        let Some(notifier) = self.notifier.as_ref() else {
            return false;
        };

        let alert = AlertMessage::custom(title, message, severity, self.clock.now());
        match self.deliver(notifier.as_ref(), &alert).await {
            Ok(()) => true,
            Err(e) => {
                warn!(title, error = %e, "Failed to send custom alert");
                false
            }
        }
    }

    async fn deliver(&self, notifier: &dyn Notifier, message: &AlertMessage) -> Result<(), AlertError> {
        let limit = self.config.delivery_timeout;
        match tokio::time::timeout(limit, notifier.deliver(message)).await {
            Ok(result) => result,
            Err(_) => Err(AlertError::Timeout(limit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_store::LocalEventStore;
    use crate::types::NewEvent;
    use crate::utils::ManualClock;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<AlertMessage>>,
    }

    #[async_trait]
    impl Notifier for Recorder {
        async fn deliver(&self, message: &AlertMessage) -> Result<(), AlertError> {
            self.sent.lock().push(message.clone());
            Ok(())
        }
    }

    struct Hanging;

    #[async_trait]
    impl Notifier for Hanging {
        async fn deliver(&self, _message: &AlertMessage) -> Result<(), AlertError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    async fn seed_crashes(store: &LocalEventStore, clock: &ManualClock, game_id: &str, n: usize) {
        for _ in 0..n {
            let now = clock.now();
            store
                .insert_one(NewEvent {
                    game_id: game_id.to_string(),
                    event_type: EventType::Crash,
                    severity: Severity::Critical,
                    payload: Default::default(),
                    timestamp: now,
                    processed_at: now,
                })
                .await
                .unwrap();
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn test_threshold_boundary() {
        let clock = clock();
        let store = Arc::new(LocalEventStore::in_memory());
        let recorder = Arc::new(Recorder::default());
        let dispatcher = AlertDispatcher::new(
            store.clone(),
            Some(recorder.clone()),
            clock.clone(),
            AlertConfig::default(),
        );

        seed_crashes(&store, &clock, "g1", 9).await;
        assert_eq!(
            dispatcher.evaluate_crash_threshold("g1").await,
            AlertOutcome::BelowThreshold { crash_count: 9 }
        );

        seed_crashes(&store, &clock, "g1", 1).await;
        assert_eq!(
            dispatcher.evaluate_crash_threshold("g1").await,
            AlertOutcome::Delivered { crash_count: 10 }
        );
        assert_eq!(recorder.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_crashes_outside_window_do_not_count() {
        let clock = clock();
        let store = Arc::new(LocalEventStore::in_memory());
        let dispatcher = AlertDispatcher::new(
            store.clone(),
            Some(Arc::new(Recorder::default())),
            clock.clone(),
            AlertConfig::default(),
        );

        seed_crashes(&store, &clock, "g1", 10).await;
        clock.advance(Duration::minutes(61));

        assert_eq!(
            dispatcher.evaluate_crash_threshold("g1").await,
            AlertOutcome::BelowThreshold { crash_count: 0 }
        );
    }

    #[tokio::test]
    async fn test_without_notifier_reports_disabled() {
        let clock = clock();
        let store = Arc::new(LocalEventStore::in_memory());
        let dispatcher =
            AlertDispatcher::new(store.clone(), None, clock.clone(), AlertConfig::default());

        seed_crashes(&store, &clock, "g1", 10).await;
        assert_eq!(
            dispatcher.evaluate_crash_threshold("g1").await,
            AlertOutcome::Disabled { crash_count: 10 }
        );
        assert!(!dispatcher.send_custom_alert("t", "m", Severity::Info).await);
    }

    #[tokio::test]
    async fn test_slow_channel_times_out_without_starting_cooldown() {
        let clock = clock();
        let store = Arc::new(LocalEventStore::in_memory());
        let config = AlertConfig {
            delivery_timeout: std::time::Duration::from_millis(20),
            ..AlertConfig::default()
        };
        let dispatcher = AlertDispatcher::new(store.clone(), Some(Arc::new(Hanging)), clock.clone(), config);

        seed_crashes(&store, &clock, "g1", 10).await;
        assert_eq!(
            dispatcher.evaluate_crash_threshold("g1").await,
            AlertOutcome::DeliveryFailed { crash_count: 10 }
        );
        assert!(dispatcher.cooldown().last_fired("g1").await.is_none());
    }
}
