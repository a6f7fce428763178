//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use game_telemetry::alerts::{AlertConfig, AlertError, AlertMessage, Notifier};
use game_telemetry::api::AppState;
use game_telemetry::event_store::{
    AggregateQuery, EventField, EventFilter, EventPage, EventStore, GroupRow, LocalEventStore,
    StoreError, StoreResult,
};
use game_telemetry::types::{Event, NewEvent};
use game_telemetry::utils::ManualClock;
use uuid::Uuid;

/// Notifier that records every message it is handed
#[derive(Default)]
pub struct Recorder {
    sent: Mutex<Vec<AlertMessage>>,
}

impl Recorder {
    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn messages(&self) -> Vec<AlertMessage> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for Recorder {
    async fn deliver(&self, message: &AlertMessage) -> Result<(), AlertError> {
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

/// Notifier that rejects the first `failures` deliveries
pub struct Flaky {
    failures: usize,
    attempts: AtomicUsize,
    pub delivered: Recorder,
}

impl Flaky {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            attempts: AtomicUsize::new(0),
            delivered: Recorder::default(),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for Flaky {
    async fn deliver(&self, message: &AlertMessage) -> Result<(), AlertError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(AlertError::Status(500));
        }
        self.delivered.deliver(message).await
    }
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ))
}

/// In-memory app wired to a manual clock and the given notifier
pub fn app_with(notifier: Option<Arc<dyn Notifier>>, clock: Arc<ManualClock>) -> Arc<AppState> {
    app_with_config(notifier, clock, AlertConfig::default())
}

pub fn app_with_config(
    notifier: Option<Arc<dyn Notifier>>,
    clock: Arc<ManualClock>,
    config: AlertConfig,
) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(LocalEventStore::in_memory()),
        notifier,
        clock,
        config,
    ))
}

/// Event store whose writes or counts can be switched to fail
pub struct BrokenStore {
    inner: LocalEventStore,
    pub fail_writes: AtomicBool,
    pub fail_counts: AtomicBool,
}

impl Default for BrokenStore {
    fn default() -> Self {
        Self {
            inner: LocalEventStore::in_memory(),
            fail_writes: AtomicBool::new(false),
            fail_counts: AtomicBool::new(false),
        }
    }
}

impl BrokenStore {
    fn check(flag: &AtomicBool) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Io(std::io::Error::other("disk unavailable")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EventStore for BrokenStore {
    async fn insert_one(&self, event: NewEvent) -> StoreResult<Event> {
        Self::check(&self.fail_writes)?;
        self.inner.insert_one(event).await
    }

    async fn insert_many(&self, events: Vec<NewEvent>) -> StoreResult<Vec<Event>> {
        Self::check(&self.fail_writes)?;
        self.inner.insert_many(events).await
    }

    async fn find_page(&self, filter: &EventFilter, offset: usize, limit: usize) -> StoreResult<EventPage> {
        self.inner.find_page(filter, offset, limit).await
    }

    async fn count(&self, filter: &EventFilter) -> StoreResult<u64> {
        Self::check(&self.fail_counts)?;
        self.inner.count(filter).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Event>> {
        self.inner.find_by_id(id).await
    }

    async fn distinct_values(&self, field: EventField) -> StoreResult<Vec<String>> {
        self.inner.distinct_values(field).await
    }

    async fn aggregate(&self, query: &AggregateQuery) -> StoreResult<Vec<GroupRow>> {
        self.inner.aggregate(query).await
    }
}

/// App over a `BrokenStore`, returned alongside it
pub fn app_with_broken_store(
    notifier: Option<Arc<dyn Notifier>>,
    clock: Arc<ManualClock>,
) -> (Arc<AppState>, Arc<BrokenStore>) {
    let store = Arc::new(BrokenStore::default());
    let state = Arc::new(AppState::new(
        store.clone(),
        notifier,
        clock,
        AlertConfig::default(),
    ));
    (state, store)
}
