use std::fmt;

/// Counters reported when the pipeline stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Lines read from the source, parsable or not.
    pub observed: u64,
    pub parse_failures: u64,
    /// Parsed but less severe than the threshold.
    pub below_threshold: u64,
    /// Parsed but matching no service filter.
    pub filtered_out: u64,
    /// Passed both gates and handed to the batcher.
    pub admitted: u64,
    /// Events rendered, one per single record or flushed batch.
    pub alerts: u64,
    pub dispatched: u64,
    pub dispatch_failures: u64,
}

/// Why the read loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    Cancelled,
    SourceFailed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndOfStream => write!(f, "end of stream"),
            StopReason::Cancelled => write!(f, "shutdown requested"),
            StopReason::SourceFailed(reason) => write!(f, "source failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub stats: PipelineStats,
    pub reason: StopReason,
}

impl PipelineReport {
    pub fn is_clean(&self) -> bool {
        !matches!(self.reason, StopReason::SourceFailed(_))
    }
}
