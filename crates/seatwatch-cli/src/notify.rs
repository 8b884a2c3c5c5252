//! Webhook notifier.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use seatwatch_core::{Notifier, Result};

use crate::config::WebhookConfig;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    title: &'a str,
    body: &'a str,
}

/// Posts `{title, body}` JSON to a configured endpoint.
///
/// Delivery failures bubble up as errors; the scheduler logs and swallows
/// them, so a broken webhook never stops the loop.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("seatwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");
        Self {
            url: config.url.clone(),
            client,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<()> {
        debug!(title, "posting webhook notification");
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { title, body })
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }
}
