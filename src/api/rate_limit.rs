//! Per-client request limiting
//!
//! Fixed windows keyed by client IP. Requests without connection info
//! (in-process callers, tests) share one bucket.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::debug;

use super::rest::ApiError;
use crate::utils::Clock;

/// Requests allowed per client per window
pub const DEFAULT_MAX_REQUESTS: u32 = 1000;

/// Window length in minutes
pub const DEFAULT_WINDOW_MINUTES: i64 = 15;

/// Windows kept before expired ones are swept
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// 0 disables limiting
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: Duration::minutes(DEFAULT_WINDOW_MINUTES),
        }
    }
}

struct Window {
    started: DateTime<Utc>,
    hits: u32,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one request for `client`; `false` once its window is used up
    pub fn check(&self, client: &str) -> bool {
        if self.config.max_requests == 0 {
            return true;
        }

        let now = self.clock.now();
        let mut windows = self.windows.lock();

        if windows.len() > SWEEP_THRESHOLD {
            let span = self.config.window;
            windows.retain(|_, w| now - w.started < span);
        }

        let window = windows.entry(client.to_string()).or_insert(Window {
            started: now,
            hits: 0,
        });
        if now - window.started >= self.config.window {
            window.started = now;
            window.hits = 0;
        }

        if window.hits >= self.config.max_requests {
            return false;
        }
        window.hits += 1;
        true
    }
}

/// Middleware rejecting clients over their budget with 429
pub async fn limit_requests(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !limiter.check(&client) {
        debug!(client = %client, "Rate limit exceeded");
        return ApiError::too_many_requests().into_response();
    }

    next.run(request).await
}
