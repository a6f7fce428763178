//! Per-key cooldown tracking
//!
//! Each key owns its own async lock. The outer map lock is only held long
//! enough to fetch the key's slot, so different games never wait on each
//! other, while check, action and update for one key run as one critical
//! section.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::utils::Clock;

type Slot = Arc<tokio::sync::Mutex<Option<DateTime<Utc>>>>;

/// Result of a guarded action
#[derive(Debug)]
pub enum CooldownDecision<E> {
    /// The action ran and succeeded; the cooldown restarted
    Fired,
    /// Still cooling down; the action did not run
    Suppressed { remaining: Duration },
    /// The action ran and failed; the cooldown is unchanged
    Failed(E),
}

/// Rate limiter allowing one successful action per key per cooldown
pub struct CooldownTracker {
    cooldown: Duration,
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl CooldownTracker {
    pub fn new(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cooldown,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock();
        slots.entry(key.to_string()).or_default().clone()
    }

    /// Time of the last successful action for `key`
    pub async fn last_fired(&self, key: &str) -> Option<DateTime<Utc>> {
        *self.slot(key).lock().await
    }

    /// Run `action` unless `key` is cooling down
    ///
    /// The cooldown only restarts when the action succeeds.
    pub async fn run_if_ready<F, Fut, E>(&self, key: &str, action: F) -> CooldownDecision<E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let slot = self.slot(key);
        let mut last = slot.lock().await;

        if let Some(sent_at) = *last {
            let elapsed = self.clock.now() - sent_at;
            if elapsed < self.cooldown {
                return CooldownDecision::Suppressed {
                    remaining: self.cooldown - elapsed,
                };
            }
        }

        match action().await {
            Ok(()) => {
                *last = Some(self.clock.now());
                CooldownDecision::Fired
            }
            Err(e) => CooldownDecision::Failed(e),
        }
    }
}
