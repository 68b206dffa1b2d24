use crate::config::{load_config, ConfigError};
use crate::delivery::{build_notifier, DeliveryError, Dispatcher};
use crate::pipeline::{Pipeline, StopReason};
use crate::source::{open_source, SourceError};
use std::path::PathBuf;
use thiserror::Error;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config not found (searched ~/.config/journalmon/config.yml and /etc/journalmon/config.yml); use --config <path> or run 'journalmon config init'")]
    ConfigNotFound,

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("delivery setup error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("cannot open log source: {0}")]
    Source(#[from] SourceError),

    #[error("log source failed: {0}")]
    SourceFailed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), RunError> {
    let config_path = config_path.ok_or(RunError::ConfigNotFound)?;

    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(&config_path)?;

    let host = match &config.hostname {
        Some(name) => name.clone(),
        None => local_hostname(),
    };

    let notifier = build_notifier(&config.delivery, &config.recipient)?;
    let dispatcher = Dispatcher::new(notifier);

    let mut source = open_source(
        &config.source,
        config.min_priority,
        config.pipeline.max_line_bytes,
    )
    .await?;

    info!(
        host = %host,
        recipient = %config.recipient,
        min_priority = config.min_priority,
        batch_window = ?config.batch_window,
        filters = ?config.filters.patterns(),
        delivery = %config.delivery.describe(),
        "Pipeline started, press Ctrl+C to shutdown"
    );

    let cancel = CancellationToken::new();
    let signal_handle = spawn_signal_listener(cancel.clone());

    let pipeline = Pipeline::new(&config, host, dispatcher);
    let report = pipeline.run(source.as_mut(), cancel.clone()).await;

    cancel.cancel();
    if let Err(e) = signal_handle.await {
        warn!(error = %e, "Signal listener join error");
    }

    info!(
        alerts = report.stats.alerts,
        dispatched = report.stats.dispatched,
        dispatch_failures = report.stats.dispatch_failures,
        "Shutdown complete"
    );

    match report.reason {
        StopReason::SourceFailed(reason) => Err(RunError::SourceFailed(reason)),
        StopReason::EndOfStream | StopReason::Cancelled => Ok(()),
    }
}

fn local_hostname() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            warn!(error = %e, "Could not determine hostname");
            "unknown".to_string()
        }
    }
}

/// Cancel `cancel` on Ctrl+C or SIGTERM. Exits quietly once the token is
/// cancelled by someone else.
fn spawn_signal_listener(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_signal() => {
                info!("Shutdown signal received");
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
