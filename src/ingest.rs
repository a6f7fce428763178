//! Event ingestion
//!
//! Normalizes raw submissions, persists them, and runs crash threshold
//! evaluation once the write has committed. Evaluation outcomes are logged
//! and never change the result of the write.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::alerts::{AlertDispatcher, AlertOutcome};
use crate::error::TelemetryResult;
use crate::event_store::{EventFilter, EventPage, EventStore};
use crate::types::{Event, EventType, NewEvent, NewEventInput, Severity};
use crate::utils::Clock;

/// Page size used when the caller does not give one
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Largest page a caller can request
pub const MAX_PAGE_SIZE: usize = 1000;

/// Raw event listing parameters
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub game_id: Option<String>,
    pub event_type: Option<EventType>,
    pub severity: Option<Severity>,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl EventQuery {
    /// Requested page size, defaulted and clamped to `MAX_PAGE_SIZE`
    pub fn normalized_limit(&self) -> usize {
        match self.limit {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(limit) => limit.min(MAX_PAGE_SIZE),
        }
    }

    pub fn filter(&self) -> EventFilter {
        EventFilter {
            game_id: self.game_id.clone(),
            event_type: self.event_type,
            severity: self.severity,
            from: self.from,
            to: self.to,
        }
    }
}

/// Write side of the telemetry pipeline
pub struct IngestionService {
    store: Arc<dyn EventStore>,
    alerts: Arc<AlertDispatcher>,
    clock: Arc<dyn Clock>,
}

impl IngestionService {
    pub fn new(store: Arc<dyn EventStore>, alerts: Arc<AlertDispatcher>, clock: Arc<dyn Clock>) -> Self {
        Self { store, alerts, clock }
    }

    /// Apply defaults to a raw submission
    pub fn normalize(&self, input: NewEventInput) -> NewEvent {
        let now = self.clock.now();
        NewEvent {
            game_id: input.game_id,
            event_type: input.event_type,
            severity: input.severity.unwrap_or_default(),
            payload: input.payload.unwrap_or_default(),
            timestamp: input.timestamp.unwrap_or(now),
            processed_at: now,
        }
    }

    /// Store one event; crash events trigger threshold evaluation
    pub async fn create_event(&self, input: NewEventInput) -> TelemetryResult<Event> {
        let event = self.store.insert_one(self.normalize(input)).await?;
        debug!(id = %event.id, game_id = %event.game_id, event_type = %event.event_type, "Event created");

        if event.event_type == EventType::Crash {
            self.after_commit(vec![event.game_id.clone()]).await;
        }

        Ok(event)
    }

    /// Store a batch with a single insert
    ///
    /// Threshold evaluation runs once per distinct game that had a crash in
    /// the batch, in order of first appearance.
    pub async fn create_events(&self, inputs: Vec<NewEventInput>) -> TelemetryResult<Vec<Event>> {
        let mut seen = HashSet::new();
        let crashed_games: Vec<String> = inputs
            .iter()
            .filter(|input| input.event_type == EventType::Crash)
            .filter(|input| seen.insert(input.game_id.clone()))
            .map(|input| input.game_id.clone())
            .collect();

        let docs = inputs.into_iter().map(|input| self.normalize(input)).collect();
        let inserted = self.store.insert_many(docs).await?;
        debug!(count = inserted.len(), "Batch inserted events");

        if !crashed_games.is_empty() {
            self.after_commit(crashed_games).await;
        }

        Ok(inserted)
    }

    /// Paginated listing, newest first
    pub async fn list_events(&self, query: &EventQuery) -> TelemetryResult<EventPage> {
        let page = self
            .store
            .find_page(&query.filter(), query.offset.unwrap_or(0), query.normalized_limit())
            .await?;
        Ok(page)
    }

    /// Lookup by id; unknown ids yield `None`
    pub async fn get_event(&self, id: Uuid) -> TelemetryResult<Option<Event>> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Threshold evaluation for games that just received crashes
    ///
    /// Runs inline or on a detached task depending on `AlertConfig::background`.
    async fn after_commit(&self, game_ids: Vec<String>) {
        if self.alerts.config().background {
            let alerts = self.alerts.clone();
            tokio::spawn(async move { evaluate_all(&alerts, &game_ids).await });
        } else {
            evaluate_all(&self.alerts, &game_ids).await;
        }
    }
}

async fn evaluate_all(alerts: &AlertDispatcher, game_ids: &[String]) {
    for game_id in game_ids {
        let outcome: AlertOutcome = alerts.evaluate_crash_threshold(game_id).await;
        debug!(game_id = %game_id, ?outcome, "Crash threshold evaluated");
    }
}
