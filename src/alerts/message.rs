//! Outbound notification payloads
//!
//! Messages are shaped as Discord embeds: a title, a color marker, a
//! description, optional inline fields and an emission timestamp.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::types::Severity;

/// Footer text attached to crash alerts
pub const ALERT_FOOTER: &str = "Game Telemetry API";

const COLOR_INFO: u32 = 0x3498db;
const COLOR_WARNING: u32 = 0xf39c12;
const COLOR_CRITICAL: u32 = 0xff0000;

/// Embed color for a severity
pub fn severity_color(severity: Severity) -> u32 {
    match severity {
        Severity::Info => COLOR_INFO,
        Severity::Warning => COLOR_WARNING,
        Severity::Critical => COLOR_CRITICAL,
    }
}

/// Title prefix for a severity
pub fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "ℹ️",
        Severity::Warning => "⚠️",
        Severity::Critical => "🚨",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertFooter {
    pub text: String,
}

/// A titled notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertMessage {
    pub title: String,
    pub description: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<AlertField>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<AlertFooter>,
}

impl AlertMessage {
    /// Crash-rate alert for one game
    pub fn crash(game_id: &str, crash_count: u64, threshold: u64, at: DateTime<Utc>) -> Self {
        Self {
            title: format!("{} Crash Alert: {}", severity_icon(Severity::Critical), game_id),
            description: "Crash rate has exceeded threshold!".to_string(),
            color: COLOR_CRITICAL,
            fields: vec![
                AlertField {
                    name: "Crashes in last hour".to_string(),
                    value: crash_count.to_string(),
                    inline: true,
                },
                AlertField {
                    name: "Threshold".to_string(),
                    value: threshold.to_string(),
                    inline: true,
                },
            ],
            timestamp: at,
            footer: Some(AlertFooter {
                text: ALERT_FOOTER.to_string(),
            }),
        }
    }

    /// Free-form message at a given severity
    pub fn custom(title: &str, message: &str, severity: Severity, at: DateTime<Utc>) -> Self {
        Self {
            title: format!("{} {}", severity_icon(severity), title),
            description: message.to_string(),
            color: severity_color(severity),
            fields: Vec::new(),
            timestamp: at,
            footer: None,
        }
    }

    /// Webhook request body
    pub fn to_webhook_body(&self) -> Value {
        json!({ "embeds": [self] })
    }
}
