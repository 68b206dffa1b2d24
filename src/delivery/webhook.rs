use crate::delivery::{DeliveryError, Notifier};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    recipient: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Delivers by POSTing a JSON document to an HTTP endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    recipient: String,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(
        url: String,
        recipient: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            recipient: recipient.into(),
            timeout,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let payload = WebhookPayload {
            recipient: &self.recipient,
            subject,
            body,
        };

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout(self.timeout)
                } else {
                    DeliveryError::Http(e)
                }
            })?
            .error_for_status()?;

        Ok(())
    }
}
