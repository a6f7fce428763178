//! Telemetry event types
//!
//! This module defines the records stored in the append-only event log.
//! Events are written once by ingestion and never updated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Open, schema-less event payload
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Kind of telemetry reported by a game client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The client crashed
    Crash,
    /// A performance sample (frame times, memory, ...)
    Performance,
    /// Session start/end marker
    Session,
    /// Anything game-specific
    Custom,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Crash => "crash",
            EventType::Performance => "performance",
            EventType::Session => "session",
            EventType::Custom => "custom",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw event submission, as handed to ingestion after boundary validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEventInput {
    pub game_id: String,
    pub event_type: EventType,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub payload: Option<Payload>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewEventInput {
    /// Create an input with every optional field absent
    pub fn new(game_id: impl Into<String>, event_type: EventType) -> Self {
        Self {
            game_id: game_id.into(),
            event_type,
            severity: None,
            payload: None,
            timestamp: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// A normalized event that has not been assigned an id yet
///
/// Every field is already defaulted; the store only adds the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub game_id: String,
    pub event_type: EventType,
    pub severity: Severity,
    pub payload: Payload,
    pub timestamp: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
}

impl NewEvent {
    /// Attach a store-assigned id
    pub fn into_event(self, id: Uuid) -> Event {
        Event {
            id,
            game_id: self.game_id,
            event_type: self.event_type,
            severity: self.severity,
            payload: self.payload,
            timestamp: self.timestamp,
            processed_at: self.processed_at,
        }
    }
}

/// An immutable, stored telemetry event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Store-assigned unique id
    pub id: Uuid,

    /// Tenant/product identifier chosen by the client
    pub game_id: String,

    pub event_type: EventType,

    #[serde(default)]
    pub severity: Severity,

    #[serde(default)]
    pub payload: Payload,

    /// Logical occurrence time reported by the client
    pub timestamp: DateTime<Utc>,

    /// Server time at which the event was accepted
    pub processed_at: DateTime<Utc>,
}

impl Event {
    /// Read a top-level payload field, treating JSON null as absent
    pub fn payload_field(&self, name: &str) -> Option<&serde_json::Value> {
        self.payload.get(name).filter(|v| !v.is_null())
    }

    /// Serialize event to JSON string (for JSONL)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize event from JSON string
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_event() -> Event {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut payload = Payload::new();
        payload.insert("errorType".to_string(), json!("NullReference"));
        Event {
            id: Uuid::new_v4(),
            game_id: "g1".to_string(),
            event_type: EventType::Crash,
            severity: Severity::Critical,
            payload,
            timestamp: ts,
            processed_at: ts,
        }
    }

    #[test]
    fn test_event_type_serialization() {
        let json = serde_json::to_string(&EventType::Performance).unwrap();
        assert_eq!(json, "\"performance\"");

        let parsed: EventType = serde_json::from_str("\"crash\"").unwrap();
        assert_eq!(parsed, EventType::Crash);
        assert!(serde_json::from_str::<EventType>("\"explosion\"").is_err());
    }

    #[test]
    fn test_event_uses_camel_case_fields() {
        let event = sample_event();
        let json = event.to_json_line().unwrap();
        assert!(json.contains("\"gameId\":\"g1\""));
        assert!(json.contains("\"eventType\":\"crash\""));
        assert!(json.contains("\"processedAt\""));

        let parsed = Event::from_json_line(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_input_defaults_when_fields_missing() {
        let input: NewEventInput =
            serde_json::from_value(json!({"gameId": "g1", "eventType": "session"})).unwrap();
        assert!(input.severity.is_none());
        assert!(input.payload.is_none());
        assert!(input.timestamp.is_none());
    }

    #[test]
    fn test_payload_field_treats_null_as_absent() {
        let mut event = sample_event();
        assert_eq!(event.payload_field("errorType"), Some(&json!("NullReference")));

        event.payload.insert("errorType".to_string(), serde_json::Value::Null);
        assert!(event.payload_field("errorType").is_none());
        assert!(event.payload_field("missing").is_none());
    }
}
