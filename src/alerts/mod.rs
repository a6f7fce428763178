//! Crash alerting
//!
//! - `AlertDispatcher`: threshold evaluation and custom alerts
//! - `CooldownTracker`: per-game rate limiting of successful alerts
//! - `Notifier` / `DiscordWebhook`: outbound delivery
//!
//! Cooldown state is process-local; a restart resets every game to quiet.

mod cooldown;
mod dispatcher;
mod message;
mod notifier;

pub use cooldown::{CooldownDecision, CooldownTracker};
pub use dispatcher::{AlertConfig, AlertDispatcher, AlertOutcome, DEFAULT_CRASH_THRESHOLD};
pub use message::{severity_color, severity_icon, AlertField, AlertFooter, AlertMessage, ALERT_FOOTER};
pub use notifier::{AlertError, DiscordWebhook, Notifier};
