use crate::delivery::Notifier;
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    Failed(String),
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered)
    }
}

/// Hands rendered alerts to the transport and classifies the result.
/// Never retries; failures are reported and the caller moves on.
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn dispatch(&self, subject: &str, body: &str) -> DispatchOutcome {
        match self.notifier.send(subject, body).await {
            Ok(()) => {
                debug!(subject, "Alert delivered");
                DispatchOutcome::Delivered
            }
            Err(e) => {
                error!(subject, error = %e, "Alert delivery failed");
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }
}
