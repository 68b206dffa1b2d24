use crate::batch::event::{AlertEvent, BatchKey};
use crate::source::record::LogRecord;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// An open burst for one key.
#[derive(Debug)]
struct Batch {
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    count: u64,
    representative: LogRecord,
    worst_priority: u8,
}

impl Batch {
    fn open(record: LogRecord, now: DateTime<Utc>) -> Self {
        Self {
            first_seen: now,
            last_seen: now,
            count: 1,
            worst_priority: record.priority,
            representative: record,
        }
    }

    fn absorb(&mut self, record: &LogRecord, now: DateTime<Utc>) {
        self.count += 1;
        self.last_seen = now;
        self.worst_priority = self.worst_priority.min(record.priority);
    }

    fn is_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        elapsed(self.first_seen, now) >= window
    }

    fn into_event(self) -> AlertEvent {
        AlertEvent {
            representative: self.representative,
            count: self.count,
            priority: self.worst_priority,
            first_seen: self.first_seen,
            last_seen: self.last_seen,
        }
    }
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    // A clock stepping backwards counts as no time passed.
    (now - since).to_std().unwrap_or(Duration::ZERO)
}

/// Coalesces admitted records per [`BatchKey`] so a failing unit produces at
/// most one alert per window.
///
/// The first record of a burst opens a batch and is held back until the
/// window closes; every event therefore carries the full occurrence count.
/// A zero window disables coalescing entirely.
pub struct Batcher {
    window: Duration,
    open: HashMap<BatchKey, Batch>,
}

impl Batcher {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            open: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of batches still accumulating.
    pub fn open_batches(&self) -> usize {
        self.open.len()
    }

    /// Add a record. Returns an event when coalescing is disabled, or when the
    /// key's previous batch had already expired without being ticked out.
    pub fn ingest(&mut self, record: LogRecord, now: DateTime<Utc>) -> Option<AlertEvent> {
        if self.window.is_zero() {
            return Some(AlertEvent::single(record, now));
        }

        let key = BatchKey::for_record(&record);
        if let Some(batch) = self.open.get_mut(&key) {
            if !batch.is_expired(now, self.window) {
                batch.absorb(&record, now);
                return None;
            }
        }

        // Either a fresh key or a stale batch the tick has not reached yet.
        self.open
            .insert(key, Batch::open(record, now))
            .map(Batch::into_event)
    }

    /// Flush every batch whose window has elapsed, oldest first.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<AlertEvent> {
        let window = self.window;
        let expired: Vec<BatchKey> = self
            .open
            .iter()
            .filter(|(_, batch)| batch.is_expired(now, window))
            .map(|(key, _)| key.clone())
            .collect();

        let mut events: Vec<AlertEvent> = expired
            .into_iter()
            .filter_map(|key| self.open.remove(&key))
            .map(Batch::into_event)
            .collect();
        events.sort_by_key(|event| event.first_seen);
        events
    }

    /// Flush everything regardless of window. Used when shutting down.
    pub fn drain(&mut self) -> Vec<AlertEvent> {
        let mut events: Vec<AlertEvent> = self.open.drain().map(|(_, b)| b.into_event()).collect();
        events.sort_by_key(|event| event.first_seen);
        events
    }
}
