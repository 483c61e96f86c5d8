//! Outbound threshold notification
//!
//! Fire-and-forget: the polling cycle hands the call to a spawned task and
//! never waits for it. Failures are logged and otherwise ignored.

use std::sync::Arc;

use tagsense_common::{EventBus, TagEvent};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::NotificationConfig;
use crate::error::{Error, Result};

pub struct NotificationDispatcher {
    http_client: reqwest::Client,
    url: Option<String>,
    message: String,
    events: Arc<EventBus>,
}

impl NotificationDispatcher {
    pub fn new(config: &NotificationConfig, events: Arc<EventBus>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(Error::Notification)?;

        Ok(Self {
            http_client,
            url: config.url().map(str::to_string),
            message: config.message.clone(),
            events,
        })
    }

    /// Dispatcher that never calls out
    pub fn disabled(events: Arc<EventBus>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            url: None,
            message: String::new(),
            events,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Send the threshold notification in the background
    ///
    /// Returns the spawned task, or `None` when notifications are disabled.
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, count: usize) -> Option<JoinHandle<()>> {
        let url = self.url.clone()?;
        let client = self.http_client.clone();
        let message = self.message.clone();
        let events = Arc::clone(&self.events);

        Some(tokio::spawn(async move {
            match send(&client, &url).await {
                Ok(()) => {
                    info!(count, "Threshold notification sent successfully");
                    events.emit_lossy(TagEvent::notification_sent(message));
                }
                Err(e) => error!(count, "Error sending threshold notification: {}", e),
            }
        }))
    }
}

async fn send(client: &reqwest::Client, url: &str) -> Result<()> {
    let response = client.get(url).send().await?;
    let status = response.status();

    if status.is_success() {
        Ok(())
    } else {
        warn!("Threshold notification rejected with status {}", status);
        Err(Error::Http(format!("Notification endpoint returned {}", status)))
    }
}
