pub mod command;
pub mod dispatcher;
pub mod webhook;

use crate::config::types::DeliveryConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use command::CommandNotifier;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use webhook::WebhookNotifier;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to write alert body file: {0}")]
    BodyFile(#[source] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// The capability to get a rendered alert in front of a human.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

/// Build the transport described by the config.
pub fn build_notifier(
    config: &DeliveryConfig,
    recipient: &str,
) -> Result<Arc<dyn Notifier>, DeliveryError> {
    match config {
        DeliveryConfig::Command {
            program,
            args,
            timeout,
        } => Ok(Arc::new(CommandNotifier::new(
            program.clone(),
            args.clone(),
            recipient,
            *timeout,
        ))),
        DeliveryConfig::Webhook { url, timeout } => Ok(Arc::new(WebhookNotifier::new(
            url.clone(),
            recipient,
            *timeout,
        )?)),
    }
}
