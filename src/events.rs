//! Event sinks for ledger notifications.
//!
//! Emission never fails and never waits on subscribers.

use tokio::sync::broadcast;

use crate::domain::{DistributionEvent, DISTRIBUTION_EVENT};

const DEFAULT_CAPACITY: usize = 64;

/// Accepts named events with an opaque payload.
pub trait EventSink {
    fn emit(&self, name: &str, payload: &[u8]);
}

/// An event as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEvent {
    pub name: String,
    pub payload: Vec<u8>,
}

impl LedgerEvent {
    /// Decodes the payload if this is a `Distribution` event.
    pub fn as_distribution(&self) -> Option<DistributionEvent> {
        if self.name != DISTRIBUTION_EVENT {
            return None;
        }
        serde_json::from_slice(&self.payload).ok()
    }
}

/// Fans events out over a tokio broadcast channel. Subscribers that fall
/// behind lose the oldest events instead of holding up the sender.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<LedgerEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, name: &str, payload: &[u8]) {
        let event = LedgerEvent {
            name: name.to_string(),
            payload: payload.to_vec(),
        };
        match self.tx.send(event) {
            Ok(receivers) => tracing::debug!(event = name, receivers, "event emitted"),
            Err(_) => tracing::debug!(event = name, "event emitted with no subscribers"),
        }
    }
}

/// Writes events to the log and nowhere else.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, name: &str, payload: &[u8]) {
        tracing::info!(
            event = name,
            payload = %String::from_utf8_lossy(payload),
            "ledger event"
        );
    }
}
