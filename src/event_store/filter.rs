//! Query predicates over stored events

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Event, EventType, Severity};

/// Conjunctive filter; `None` fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub game_id: Option<String>,
    pub event_type: Option<EventType>,
    pub severity: Option<Severity>,
    /// Inclusive lower bound on `timestamp`
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`
    pub to: Option<DateTime<Utc>>,
}

impl EventFilter {
    /// Filter matching every event of one game
    pub fn for_game(game_id: impl Into<String>) -> Self {
        Self {
            game_id: Some(game_id.into()),
            ..Default::default()
        }
    }

    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn until(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Check whether an event satisfies every set predicate
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref game_id) = self.game_id {
            if &event.game_id != game_id {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        if let Some(severity) = self.severity {
            if event.severity != severity {
                return false;
            }
        }
        if let Some(from) = self.from {
            if event.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if event.timestamp > to {
                return false;
            }
        }
        true
    }
}

/// Event fields that support distinct-value enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    GameId,
    EventType,
    Severity,
}

impl EventField {
    pub fn value_of(&self, event: &Event) -> String {
        match self {
            EventField::GameId => event.game_id.clone(),
            EventField::EventType => event.event_type.to_string(),
            EventField::Severity => event.severity.to_string(),
        }
    }
}

/// One page of events plus the unpaginated total for the same filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub total: u64,
}
