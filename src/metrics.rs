//! Aggregation queries over the event store
//!
//! All queries are read-only and independent of ingestion and alerting.
//! Windows are measured back from the injected clock.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::{TelemetryError, TelemetryResult};
use crate::event_store::{AggregateQuery, EventField, EventFilter, EventStore, GroupKey, GroupSort};
use crate::types::{EventType, Interval, Metric, Severity, Summary, TimeSeriesPoint, TopError};
use crate::utils::{hours_ago, Clock};

/// Default look-back for summaries and series
pub const DEFAULT_HOURS: i64 = 24;

/// Longest look-back the HTTP layer accepts (ten years)
pub const MAX_HOURS: i64 = 24 * 366 * 10;

/// Default number of ranked error groups
pub const DEFAULT_ERROR_LIMIT: usize = 10;

/// Payload field crash events are grouped by
pub const ERROR_TYPE_FIELD: &str = "errorType";

/// Read side of the telemetry pipeline
pub struct MetricsService {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
}

impl MetricsService {
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Rolling counts for a game over the last `hours`
    ///
    /// The four counts run concurrently and are not a single snapshot.
    pub async fn get_summary(&self, game_id: &str, hours: i64) -> TelemetryResult<Summary> {
        let since = self.window_start(hours)?;
        let window = EventFilter::for_game(game_id).since(since);

        let crashes = window.clone().with_event_type(EventType::Crash);
        let sessions = window.clone().with_event_type(EventType::Session);
        let critical = window.clone().with_severity(Severity::Critical);

        let (crash_count, session_count, event_count, critical_count) = tokio::join!(
            self.store.count(&crashes),
            self.store.count(&sessions),
            self.store.count(&window),
            self.store.count(&critical),
        );

        Ok(Summary {
            game_id: game_id.to_string(),
            period: format!("{}h", hours),
            crash_count: crash_count?,
            session_count: session_count?,
            event_count: event_count?,
            critical_count: critical_count?,
        })
    }

    /// Event counts per time bucket, ascending; empty buckets are omitted
    pub async fn get_time_series(
        &self,
        game_id: &str,
        metric: Metric,
        interval: Interval,
        hours: i64,
    ) -> TelemetryResult<Vec<TimeSeriesPoint>> {
        let mut filter = EventFilter::for_game(game_id).since(self.window_start(hours)?);
        filter.event_type = metric.event_type();

        let rows = self
            .store
            .aggregate(&AggregateQuery {
                filter,
                group_by: GroupKey::TimeBucket(interval),
                sort: GroupSort::KeyAsc,
                limit: None,
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| TimeSeriesPoint {
                timestamp: row.key.as_str().map(str::to_string).unwrap_or_default(),
                value: row.count,
            })
            .collect())
    }

    /// Most frequent crash error types over the last 24 hours
    ///
    /// Grouping by `payload.errorType` is best-effort: crashes without it
    /// fall into one untyped group. `sample` is an arbitrary member payload.
    pub async fn get_top_errors(&self, game_id: &str, limit: usize) -> TelemetryResult<Vec<TopError>> {
        let since = self.clock.now() - Duration::hours(DEFAULT_HOURS);
        let filter = EventFilter::for_game(game_id)
            .with_event_type(EventType::Crash)
            .since(since);

        let rows = self
            .store
            .aggregate(&AggregateQuery {
                filter,
                group_by: GroupKey::PayloadField(ERROR_TYPE_FIELD.to_string()),
                sort: GroupSort::CountDesc,
                limit: Some(limit),
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| TopError {
                error_type: Some(row.key).filter(|key| !key.is_null()),
                count: row.count,
                last_seen: row.last_seen,
                sample: row.sample,
            })
            .collect())
    }

    fn window_start(&self, hours: i64) -> TelemetryResult<DateTime<Utc>> {
        hours_ago(self.clock.now(), hours)
            .ok_or_else(|| TelemetryError::Validation(vec![format!("hours: {} is out of range", hours)]))
    }

    /// Every game id present in the store
    pub async fn get_games_list(&self) -> TelemetryResult<Vec<String>> {
        Ok(self.store.distinct_values(EventField::GameId).await?)
    }
}
