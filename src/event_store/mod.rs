//! Event Store Module
//!
//! This module provides the storage side of the telemetry pipeline:
//! - `EventStore`: async contract consumed by ingestion, aggregation and alerting
//! - `LocalEventStore`: in-memory log with optional append-only JSONL persistence
//! - `EventFilter` / `AggregateQuery`: query and grouped-aggregation primitives
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//! ┌───────────┐    ┌──────────────┐    ┌───────────────┐    ┌──────────────┐
//! │ Ingestion │───►│ assign ids   │───►│ append + fsync│───►│ publish to   │
//! │           │    │ (uuid v4)    │    │ events.jsonl  │    │ memory log   │
//! └───────────┘    └──────────────┘    └───────────────┘    └──────────────┘
//!
//! Read Path:
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────────────┐
//! │ EventFilter  │───►│ scan log     │───►│ page / count / group │
//! └──────────────┘    └──────────────┘    └──────────────────────┘
//! ```

mod aggregate;
mod filter;
mod local;
mod store;

pub use aggregate::{group_events, AggregateQuery, GroupKey, GroupRow, GroupSort};
pub use filter::{EventField, EventFilter, EventPage};
pub use local::LocalEventStore;
pub use store::{EventStore, EventStoreConfig, StoreError, StoreResult};
