//! Change notifications for display consumers.
//!
//! Sent on a bounded broadcast channel after the store lock is released.
//! Sending never waits; a receiver that falls behind loses the oldest events
//! and sees `RecvError::Lagged`.

use crate::storage::payload::TelemetryKind;
use crate::storage::query::Counts;
use crate::storage::TelemetryStore;
use std::fmt;
use tokio::sync::broadcast;

/// Why an event was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    Ingested(TelemetryKind),
    Reset,
    Heartbeat,
}

/// Counts after a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub counts: Counts,
    pub cause: ChangeCause,
}

/// Which counters differ between two events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountChanges {
    pub payloads: bool,
    pub logs: bool,
    pub spans: bool,
    pub metrics: bool,
}

impl CountChanges {
    pub fn any(&self) -> bool {
        self.payloads || self.logs || self.spans || self.metrics
    }
}

impl ChangeEvent {
    /// Compare with the counts the consumer last rendered
    pub fn changed_since(&self, previous: &Counts) -> CountChanges {
        CountChanges {
            payloads: self.counts.payloads != previous.payloads,
            logs: self.counts.logs != previous.logs,
            spans: self.counts.spans != previous.spans,
            metrics: self.counts.metrics != previous.metrics,
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.counts, f)
    }
}

impl TelemetryStore {
    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    pub(crate) fn notify(&self, cause: ChangeCause, counts: Counts) {
        send_event(&self.events, cause, counts);
    }
}

pub(crate) fn send_event(events: &broadcast::Sender<ChangeEvent>, cause: ChangeCause, counts: Counts) {
    // Err only means nobody is subscribed
    let _ = events.send(ChangeEvent { counts, cause });
}
