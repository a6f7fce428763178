//! Structural checks on client event submissions
//!
//! Every problem found is reported, not just the first one.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::{EventType, NewEventInput, Severity};

/// Maximum length of a game id, in characters
pub const MAX_GAME_ID_LEN: usize = 50;

/// Maximum number of events accepted by one batch call
pub const MAX_BATCH_SIZE: usize = 100;

const EVENT_TYPES: &[&str] = &["crash", "performance", "session", "custom"];
const SEVERITIES: &[&str] = &["info", "warning", "critical"];

/// Validate a single event object; `path` prefixes every error message
pub fn validate_event(value: &Value, path: &str) -> Result<NewEventInput, Vec<String>> {
    let mut errors = Vec::new();

    let Some(obj) = value.as_object() else {
        return Err(vec![format!("{}: expected an object", display_path(path))]);
    };

    let game_id = match obj.get("gameId") {
        Some(Value::String(s)) => {
            let len = s.chars().count();
            if len == 0 || len > MAX_GAME_ID_LEN {
                errors.push(format!(
                    "{}gameId: must be between 1 and {} characters",
                    path, MAX_GAME_ID_LEN
                ));
            }
            Some(s.clone())
        }
        Some(_) => {
            errors.push(format!("{}gameId: expected a string", path));
            None
        }
        None => {
            errors.push(format!("{}gameId: required", path));
            None
        }
    };

    let event_type = match obj.get("eventType") {
        Some(v) => match parse_enum::<EventType>(v) {
            Some(t) => Some(t),
            None => {
                errors.push(format!("{}eventType: expected one of {:?}", path, EVENT_TYPES));
                None
            }
        },
        None => {
            errors.push(format!("{}eventType: required", path));
            None
        }
    };

    let severity = match obj.get("severity") {
        None => None,
        Some(v) => {
            let parsed = parse_enum::<Severity>(v);
            if parsed.is_none() {
                errors.push(format!("{}severity: expected one of {:?}", path, SEVERITIES));
            }
            parsed
        }
    };

    let payload = match obj.get("payload") {
        None => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => {
            errors.push(format!("{}payload: expected an object", path));
            None
        }
    };

    let timestamp = match obj.get("timestamp") {
        None => None,
        Some(Value::String(s)) => match DateTime::parse_from_rfc3339(s) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(_) => {
                errors.push(format!("{}timestamp: expected an ISO-8601 datetime", path));
                None
            }
        },
        Some(_) => {
            errors.push(format!("{}timestamp: expected an ISO-8601 datetime", path));
            None
        }
    };

    match (game_id, event_type) {
        (Some(game_id), Some(event_type)) if errors.is_empty() => Ok(NewEventInput {
            game_id,
            event_type,
            severity,
            payload,
            timestamp,
        }),
        _ => Err(errors),
    }
}

/// Validate a `{ "events": [...] }` batch body
pub fn validate_batch(value: &Value) -> Result<Vec<NewEventInput>, Vec<String>> {
    let Some(items) = value.get("events").and_then(Value::as_array) else {
        return Err(vec!["events: expected an array".to_string()]);
    };

    if items.is_empty() || items.len() > MAX_BATCH_SIZE {
        return Err(vec![format!(
            "events: must contain between 1 and {} items",
            MAX_BATCH_SIZE
        )]);
    }

    let mut inputs = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (i, item) in items.iter().enumerate() {
        match validate_event(item, &format!("events[{}].", i)) {
            Ok(input) => inputs.push(input),
            Err(mut errs) => errors.append(&mut errs),
        }
    }

    if errors.is_empty() {
        Ok(inputs)
    } else {
        Err(errors)
    }
}

fn parse_enum<T: serde::de::DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "body"
    } else {
        path.trim_end_matches('.')
    }
}
