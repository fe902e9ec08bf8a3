//! Notification sinks

use async_trait::async_trait;
use shared::OrderTransitionEvent;
use thiserror::Error;

/// Sink delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook returned status {0}")]
    BadStatus(u16),
}

/// Where transition events go
///
/// Implementations must be safe to call repeatedly with the same event.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, event: &OrderTransitionEvent) -> Result<(), NotifyError>;
}

/// POSTs the event JSON to a configured URL
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, event: &OrderTransitionEvent) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(event).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::BadStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Logs every event; the default sink when no webhook URL is configured
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, event: &OrderTransitionEvent) -> Result<(), NotifyError> {
        tracing::info!(
            target: "notify",
            order_id = %event.order_id,
            restaurant_id = %event.restaurant_id,
            previous = ?event.previous_status,
            new = %event.new_status,
            "Order transition"
        );
        Ok(())
    }
}
