//! Error types for the telemetry service.

use thiserror::Error;

use crate::alerts::AlertError;
use crate::event_store::StoreError;

/// Errors surfaced by ingestion and aggregation.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The event store could not complete an insert or query
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Client input rejected at the boundary
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Invalid process configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The alert transport could not be set up
    #[error("alert transport error: {0}")]
    Alert(#[from] AlertError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for telemetry operations.
pub type TelemetryResult<T> = std::result::Result<T, TelemetryError>;
