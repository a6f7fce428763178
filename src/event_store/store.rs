//! Event Store contract
//!
//! The core only talks to storage through the [`EventStore`] trait, so the
//! backing engine can be swapped without touching ingestion or aggregation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::aggregate::{AggregateQuery, GroupRow};
use super::filter::{EventField, EventFilter, EventPage};
use crate::types::{Event, NewEvent};

/// Configuration for the local event store
#[derive(Debug, Clone, Default)]
pub struct EventStoreConfig {
    /// Data directory holding `events.jsonl`; `None` keeps events in memory only
    pub data_dir: Option<PathBuf>,
}

impl EventStoreConfig {
    /// Create config with a custom data directory
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: Some(data_dir.as_ref().to_path_buf()),
        }
    }

    /// Config for a store that never touches disk
    pub fn in_memory() -> Self {
        Self { data_dir: None }
    }

    /// Get path to events.jsonl
    pub fn events_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("events.jsonl"))
    }
}

/// Result type for EventStore operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in EventStore operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The blocking write task panicked or was cancelled
    #[error("write task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Append-mostly, time-indexed event collection
///
/// There is no update or delete: stored events are immutable.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Assign an id and persist one event
    async fn insert_one(&self, event: NewEvent) -> StoreResult<Event>;

    /// Assign ids and persist a batch; the whole batch fails or none of it is stored
    async fn insert_many(&self, events: Vec<NewEvent>) -> StoreResult<Vec<Event>>;

    /// Matching events sorted by `timestamp` descending, with the total from the same snapshot
    async fn find_page(&self, filter: &EventFilter, offset: usize, limit: usize) -> StoreResult<EventPage>;

    /// Number of matching events
    async fn count(&self, filter: &EventFilter) -> StoreResult<u64>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Event>>;

    /// Sorted distinct values of a field across the whole store
    async fn distinct_values(&self, field: EventField) -> StoreResult<Vec<String>>;

    /// Filter, group, reduce, sort and cap
    async fn aggregate(&self, query: &AggregateQuery) -> StoreResult<Vec<GroupRow>>;
}
