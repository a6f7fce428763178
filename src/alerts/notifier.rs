//! Delivery channels for alert messages

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::message::AlertMessage;

/// Errors that can occur while delivering a notification.
///
/// These never leave the alerting path.
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel answered with a non-success status
    #[error("webhook returned status {0}")]
    Status(u16),

    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// External notification channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, message: &AlertMessage) -> Result<(), AlertError>;
}

/// Discord-compatible webhook
pub struct DiscordWebhook {
    client: reqwest::Client,
    url: String,
}

impl DiscordWebhook {
    /// Build a webhook client whose requests are bounded by `timeout`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AlertError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn deliver(&self, message: &AlertMessage) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.url)
            .json(&message.to_webhook_body())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Status(status.as_u16()));
        }

        debug!(title = %message.title, "Webhook accepted alert");
        Ok(())
    }
}
