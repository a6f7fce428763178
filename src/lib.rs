//! Game Telemetry Service
//!
//! Ingests telemetry events from game clients (crashes, performance
//! samples, sessions, custom events), serves aggregated views over them,
//! and posts a Discord alert when a game's crash rate crosses a threshold.
//!
//! # Features
//!
//! - **Append-only event log**: JSONL persistence, replayed on startup
//! - **Batch ingestion**: one all-or-nothing write per batch
//! - **Aggregations**: rolling summaries, hourly/daily series, top errors
//! - **Crash alerting**: threshold over a sliding hour with a per-game cooldown
//!
//! # Modules
//!
//! - `types`: Event and metrics data structures
//! - `event_store`: Storage trait, filters, grouping and the JSONL store
//! - `ingest`: Write path with post-commit threshold evaluation
//! - `metrics`: Read-only aggregation queries
//! - `alerts`: Alert messages, webhook delivery and cooldown tracking
//! - `api`: Axum router and REST handlers
//! - `config`: Environment configuration
//! - `logging`: tracing subscriber setup
//! - `utils`: Injectable clock
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use game_telemetry::{create_router, AlertConfig, AppState, LocalEventStore, SystemClock};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(LocalEventStore::in_memory());
//!     let state = Arc::new(AppState::new(store, None, Arc::new(SystemClock), AlertConfig::default()));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, create_router(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod alerts;
pub mod api;
pub mod config;
pub mod error;
pub mod event_store;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use alerts::{AlertConfig, AlertDispatcher, AlertMessage, AlertOutcome, DiscordWebhook, Notifier};
pub use api::{create_router, AppState};
pub use config::TelemetryConfig;
pub use error::{TelemetryError, TelemetryResult};
pub use event_store::{EventFilter, EventStore, EventStoreConfig, LocalEventStore};
pub use ingest::{EventQuery, IngestionService};
pub use metrics::MetricsService;
pub use types::{
    Event, EventType, Interval, Metric, NewEventInput, Payload, Severity, Summary, TimeSeriesPoint,
    TopError,
};
pub use utils::{Clock, ManualClock, SystemClock};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
