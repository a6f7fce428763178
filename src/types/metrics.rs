//! Aggregation result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::{EventType, Payload};

/// Rolling counts for one game over the last `hours`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub game_id: String,
    /// Window label, e.g. "24h"
    pub period: String,
    pub crash_count: u64,
    pub session_count: u64,
    pub event_count: u64,
    pub critical_count: u64,
}

/// What a time series counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Crashes,
    Sessions,
    #[default]
    Events,
}

impl Metric {
    /// Event type the metric is restricted to, `None` for all events
    pub fn event_type(&self) -> Option<EventType> {
        match self {
            Metric::Crashes => Some(EventType::Crash),
            Metric::Sessions => Some(EventType::Session),
            Metric::Events => None,
        }
    }
}

/// Time-series bucket width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    #[default]
    Hour,
    Day,
}

impl Interval {
    /// Truncate a timestamp to its bucket start and format it as ISO-8601
    pub fn bucket_key(&self, ts: &DateTime<Utc>) -> String {
        match self {
            Interval::Hour => ts.format("%Y-%m-%dT%H:00:00Z").to_string(),
            Interval::Day => ts.format("%Y-%m-%dT00:00:00Z").to_string(),
        }
    }
}

/// One non-empty bucket of a time series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// Bucket start
    pub timestamp: String,
    pub value: u64,
}

/// One row of the ranked crash error list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopError {
    /// `payload.errorType`; `None` is the group of crashes that carry none
    pub error_type: Option<serde_json::Value>,
    pub count: u64,
    pub last_seen: DateTime<Utc>,
    /// Payload of an arbitrary event in the group
    pub sample: Payload,
}

impl TopError {
    /// Human-readable label, "unknown" for the untyped group
    pub fn label(&self) -> String {
        match &self.error_type {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "unknown".to_string(),
        }
    }
}
