//! Utility functions and helpers
//!
//! This module contains the injectable clock and window helpers.

pub mod time;

pub use time::{hours_ago, Clock, ManualClock, SystemClock};
