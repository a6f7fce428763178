//! Grouped aggregation over events
//!
//! Groups are built in scan order. The `sample` reducer keeps the payload of
//! the first event seen for a group, so it reflects insertion order rather
//! than timestamp order, and is not deterministic under concurrent writes.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::filter::EventFilter;
use crate::types::{Event, Interval, Payload};

/// Derived grouping key
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    /// Timestamp truncated to the interval start, as an ISO-8601 string
    TimeBucket(Interval),
    /// Top-level payload field; absent and null values share the `Null` group
    PayloadField(String),
}

impl GroupKey {
    pub fn key_for(&self, event: &Event) -> Value {
        match self {
            GroupKey::TimeBucket(interval) => Value::String(interval.bucket_key(&event.timestamp)),
            GroupKey::PayloadField(name) => event.payload_field(name).cloned().unwrap_or(Value::Null),
        }
    }
}

/// Ordering of aggregated rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSort {
    KeyAsc,
    /// Ties keep first-seen group order
    CountDesc,
}

/// Match, group, reduce, sort, cap
#[derive(Debug, Clone)]
pub struct AggregateQuery {
    pub filter: EventFilter,
    pub group_by: GroupKey,
    pub sort: GroupSort,
    pub limit: Option<usize>,
}

/// Reduced values for one group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub key: Value,
    pub count: u64,
    /// Maximum timestamp in the group
    pub last_seen: DateTime<Utc>,
    /// Payload of the first event scanned for the group
    pub sample: Payload,
}

/// Group already-filtered events according to `query`
///
/// The caller applies `query.filter`; only grouping, reducers, sort and
/// limit happen here.
pub fn group_events<'a, I>(events: I, query: &AggregateQuery) -> Vec<GroupRow>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut rows: Vec<GroupRow> = Vec::new();
    // Value is not Hash; its canonical JSON text is
    let mut index: HashMap<String, usize> = HashMap::new();

    for event in events {
        let key = query.group_by.key_for(event);
        let slot = key.to_string();
        match index.get(&slot) {
            Some(&i) => {
                let row = &mut rows[i];
                row.count += 1;
                if event.timestamp > row.last_seen {
                    row.last_seen = event.timestamp;
                }
            }
            None => {
                index.insert(slot, rows.len());
                rows.push(GroupRow {
                    key,
                    count: 1,
                    last_seen: event.timestamp,
                    sample: event.payload.clone(),
                });
            }
        }
    }

    match query.sort {
        GroupSort::KeyAsc => rows.sort_by(|a, b| compare_keys(&a.key, &b.key)),
        GroupSort::CountDesc => rows.sort_by(|a, b| b.count.cmp(&a.count)),
    }

    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }

    rows
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over group keys: by JSON type first, then by value
fn compare_keys(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ => type_rank(a)
            .cmp(&type_rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}
