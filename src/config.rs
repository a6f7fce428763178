//! Process configuration from environment variables
//!
//! ## Usage
//! ```bash
//! PORT=3000
//! TELEMETRY_DATA_DIR=data            # empty = keep events in memory only
//! DISCORD_WEBHOOK_URL=https://discord.com/api/webhooks/...
//! DISCORD_ALERT_THRESHOLD=10
//! ALERT_DELIVERY_TIMEOUT_MS=5000
//! ALERT_EVALUATION=background        # or inline
//! RATE_LIMIT_MAX=1000                # requests per client per window, 0 = off
//! RATE_LIMIT_WINDOW_MINUTES=15
//! TELEMETRY_LOG_FORMAT=human         # or json
//! RUST_LOG=game_telemetry=debug
//! ```

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::alerts::{AlertConfig, DEFAULT_CRASH_THRESHOLD};
use crate::api::rate_limit::{RateLimitConfig, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_MINUTES};
use crate::error::{TelemetryError, TelemetryResult};
use crate::event_store::EventStoreConfig;
use crate::logging::{LogConfig, LogFormat};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_DELIVERY_TIMEOUT_MS: u64 = 5000;

/// Everything the server binary needs to start
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub port: u16,
    pub store: EventStoreConfig,
    pub webhook_url: Option<String>,
    pub alerts: AlertConfig,
    pub rate_limit: RateLimitConfig,
    pub log: LogConfig,
}

impl TelemetryConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> TelemetryResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> TelemetryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;

        let data_dir = lookup("TELEMETRY_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let store = if data_dir.trim().is_empty() {
            EventStoreConfig::in_memory()
        } else {
            EventStoreConfig::new(PathBuf::from(data_dir))
        };

        let webhook_url = lookup("DISCORD_WEBHOOK_URL").filter(|url| !url.trim().is_empty());

        let threshold = parse_or(&lookup, "DISCORD_ALERT_THRESHOLD", DEFAULT_CRASH_THRESHOLD)?;
        let timeout_ms = parse_or(&lookup, "ALERT_DELIVERY_TIMEOUT_MS", DEFAULT_DELIVERY_TIMEOUT_MS)?;
        let alerts = AlertConfig {
            threshold,
            delivery_timeout: std::time::Duration::from_millis(timeout_ms),
            background: !matches!(lookup("ALERT_EVALUATION").as_deref(), Some("inline")),
            ..AlertConfig::default()
        };

        let window_minutes: i64 =
            parse_or(&lookup, "RATE_LIMIT_WINDOW_MINUTES", DEFAULT_WINDOW_MINUTES)?;
        let window = chrono::Duration::try_minutes(window_minutes)
            .filter(|window| *window > chrono::Duration::zero())
            .ok_or_else(|| {
                TelemetryError::Config(format!(
                    "RATE_LIMIT_WINDOW_MINUTES must be positive, got {}",
                    window_minutes
                ))
            })?;
        let rate_limit = RateLimitConfig {
            max_requests: parse_or(&lookup, "RATE_LIMIT_MAX", DEFAULT_MAX_REQUESTS)?,
            window,
        };

        let log = LogConfig {
            format: match lookup("TELEMETRY_LOG_FORMAT").as_deref() {
                Some("json") | Some("jsonl") => LogFormat::Json,
                _ => LogFormat::Human,
            },
            ..LogConfig::default()
        };

        Ok(Self {
            port,
            store,
            webhook_url,
            alerts,
            rate_limit,
            log,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> TelemetryResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| TelemetryError::Config(format!("{} must be a number, got '{}'", key, raw))),
    }
}
