//! API module for HTTP endpoints
//!
//! Thin transport layer: request validation, pagination parameters and
//! status-code mapping in front of the ingestion and metrics services.

pub mod http;
pub mod rate_limit;
pub mod rest;
pub mod state;

pub use http::create_router;
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use state::AppState;
