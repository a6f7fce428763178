//! Data types for the Game Telemetry service
//!
//! This module contains the event model and the shapes returned by aggregation.

mod event;
mod metrics;

pub use event::{Event, EventType, NewEvent, NewEventInput, Payload, Severity};
pub use metrics::{Interval, Metric, Summary, TimeSeriesPoint, TopError};
