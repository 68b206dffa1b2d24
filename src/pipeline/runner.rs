use crate::alert::AlertRenderer;
use crate::batch::{AlertEvent, Batcher};
use crate::config::types::Config;
use crate::delivery::{DispatchOutcome, Dispatcher};
use crate::filter::{severity_admits, FilterSet};
use crate::pipeline::stats::{PipelineReport, PipelineStats, StopReason};
use crate::source::{LogSource, RecordParser};
use chrono::Utc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Starting,
    Running,
    Draining,
    Stopped,
}

/// Drives records from a [`LogSource`] through parse, gate, filter, batch,
/// render and dispatch. Owns the batch table; nothing else touches it.
pub struct Pipeline {
    parser: RecordParser,
    min_priority: u8,
    filters: FilterSet,
    batcher: Batcher,
    renderer: AlertRenderer,
    dispatcher: Dispatcher,
    tick_interval: Duration,
    state: PipelineState,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(config: &Config, host: impl Into<String>, dispatcher: Dispatcher) -> Self {
        Self {
            parser: RecordParser::new(config.default_priority),
            min_priority: config.min_priority,
            filters: config.filters.clone(),
            batcher: Batcher::new(config.batch_window),
            renderer: AlertRenderer::new(host, config.batch_window),
            dispatcher,
            tick_interval: config.pipeline.tick_interval,
            state: PipelineState::Starting,
            stats: PipelineStats::default(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Run until the source ends, fails, or `cancel` fires; then flush every
    /// open batch and close the source.
    pub async fn run(
        mut self,
        source: &mut dyn LogSource,
        cancel: CancellationToken,
    ) -> PipelineReport {
        self.transition(PipelineState::Running);

        let mut tick = tokio::time::interval(self.tick_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Shutdown requested");
                    break StopReason::Cancelled;
                }

                line = source.next_line() => match line {
                    Ok(Some(line)) => self.handle_line(&line).await,
                    Ok(None) => {
                        info!("Log source reached end of stream");
                        break StopReason::EndOfStream;
                    }
                    Err(e) if e.is_recoverable() => {
                        self.stats.observed += 1;
                        self.stats.parse_failures += 1;
                        warn!(error = %e, "Skipping unreadable line");
                    }
                    Err(e) => {
                        error!(error = %e, "Log source failed");
                        break StopReason::SourceFailed(e.to_string());
                    }
                },

                _ = tick.tick() => {}
            }

            for event in self.batcher.tick(Utc::now()) {
                self.deliver(event).await;
            }
        };

        self.drain(source).await;

        info!(
            reason = %reason,
            observed = self.stats.observed,
            admitted = self.stats.admitted,
            dispatched = self.stats.dispatched,
            parse_failures = self.stats.parse_failures,
            dispatch_failures = self.stats.dispatch_failures,
            "Pipeline stopped"
        );

        PipelineReport {
            stats: self.stats,
            reason,
        }
    }

    async fn handle_line(&mut self, line: &str) {
        self.stats.observed += 1;
        let now = Utc::now();

        let record = match self.parser.parse(line.as_bytes(), now) {
            Ok(record) => record,
            Err(e) => {
                self.stats.parse_failures += 1;
                debug!(error = %e, "Dropping unparsable record");
                return;
            }
        };

        if !severity_admits(&record, self.min_priority) {
            self.stats.below_threshold += 1;
            return;
        }

        if !self.filters.admits(&record) {
            self.stats.filtered_out += 1;
            return;
        }

        self.stats.admitted += 1;
        debug!(
            service = %record.service_id,
            unit = %record.unit,
            priority = record.priority,
            "Record admitted"
        );

        if let Some(event) = self.batcher.ingest(record, now) {
            self.deliver(event).await;
        }
    }

    async fn deliver(&mut self, event: AlertEvent) {
        self.stats.alerts += 1;
        let alert = self.renderer.render(&event);

        info!(
            service = %event.representative.service_id,
            unit = %event.representative.unit,
            priority = event.priority,
            count = event.count,
            "Dispatching alert"
        );

        match self.dispatcher.dispatch(&alert.subject, &alert.body).await {
            DispatchOutcome::Delivered => self.stats.dispatched += 1,
            DispatchOutcome::Failed(_) => self.stats.dispatch_failures += 1,
        }
    }

    async fn drain(&mut self, source: &mut dyn LogSource) {
        self.transition(PipelineState::Draining);

        let pending = self.batcher.drain();
        if !pending.is_empty() {
            info!(batches = pending.len(), "Flushing open batches");
        }
        for event in pending {
            self.deliver(event).await;
        }

        if let Err(e) = source.close().await {
            warn!(error = %e, "Failed to close log source");
        }

        self.transition(PipelineState::Stopped);
    }

    fn transition(&mut self, next: PipelineState) {
        info!(from = ?self.state, to = ?next, "Pipeline state change");
        self.state = next;
    }
}
