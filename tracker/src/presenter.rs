//! User-visible notification delivery.

use anyhow::{Context, Result};
use async_trait::async_trait;
use fitmap::proximity::ProximityAlert;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// What the user sees for one proximity alert
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub object_id: String,
    pub title: String,
    pub body: String,
}

impl Notification {
    /// Renders an alert. Distance is rounded down to whole meters.
    pub fn from_alert(alert: &ProximityAlert) -> Self {
        let meters = alert.distance_meters.max(0.0).floor() as u64;
        Self {
            object_id: alert.object_id.clone(),
            title: format!("{} Facility nearby!", alert.facility_type.emoji()),
            body: format!(
                "{} is {} m away from you. Tap to see details.",
                alert.title, meters
            ),
        }
    }
}

/// Best-effort notification sink.
///
/// Errors are reported to the caller, which logs and drops them.
#[async_trait]
pub trait NotificationPresenter: Send + Sync {
    async fn present(&self, notification: &Notification) -> Result<()>;
}

/// Writes notifications to the log
pub struct LogPresenter;

#[async_trait]
impl NotificationPresenter for LogPresenter {
    async fn present(&self, notification: &Notification) -> Result<()> {
        info!(
            object_id = %notification.object_id,
            title = %notification.title,
            body = %notification.body,
            "Notification"
        );
        Ok(())
    }
}

/// POSTs each notification as JSON to a webhook
pub struct WebhookPresenter {
    url: String,
    http_client: reqwest::Client,
}

impl WebhookPresenter {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build webhook HTTP client")?;
        Ok(Self {
            url: url.into(),
            http_client,
        })
    }
}

#[async_trait]
impl NotificationPresenter for WebhookPresenter {
    async fn present(&self, notification: &Notification) -> Result<()> {
        let response = self
            .http_client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .context("Failed to send notification webhook")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            anyhow::bail!("Webhook returned error status {}: {}", status, body);
        }

        Ok(())
    }
}
