//! Live reading feed abstraction.
//!
//! The alert monitor consumes per-device snapshot streams through the
//! `ReadingFeed` trait. A subscription is an explicit object with an
//! unsubscribe signal rather than a closure over shared mutable state, so
//! producers stop promptly and tests can drive the stream deterministically.
//!
//! Submodules:
//! - `http` — polling client for the plant telemetry HTTP endpoint.

pub mod http;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::model::{FeedError, ParameterSnapshot};

// ---------------------------------------------------------------------------
// Feed events and subscriptions
// ---------------------------------------------------------------------------

/// One delivery from a device feed: a snapshot, or a feed-side error.
///
/// Errors are delivered in-stream so the consumer sees them in order with
/// the readings; they do not terminate the subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Reading(ParameterSnapshot),
    Error(FeedError),
}

/// A live subscription to one device's readings.
///
/// Dropping the subscription (or calling `unsubscribe`) clears the active
/// flag; feed producers check it and stop delivering, which closes the
/// channel from their end.
pub struct FeedSubscription {
    events: Receiver<FeedEvent>,
    active: Arc<AtomicBool>,
}

impl FeedSubscription {
    pub fn new(events: Receiver<FeedEvent>, active: Arc<AtomicBool>) -> Self {
        FeedSubscription { events, active }
    }

    /// Receives the next event, waiting at most `timeout`.
    ///
    /// `Ok(None)` means the timeout elapsed with the stream still open;
    /// `Err(())` means the producer has shut down and no more events will
    /// arrive.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<FeedEvent>, ()> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(()),
        }
    }

    /// Whether the producer should keep delivering.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stops delivery. Idempotent.
    pub fn unsubscribe(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Source of live per-device readings.
pub trait ReadingFeed: Send + Sync {
    /// Starts delivery of readings for one device.
    fn subscribe(&self, device_id: &str) -> Result<FeedSubscription, FeedError>;
}

// ---------------------------------------------------------------------------
// Scripted feed (tests, demos, dev replay)
// ---------------------------------------------------------------------------

/// An in-memory feed that delivers a pre-loaded event sequence per device.
///
/// Events are queued with `push_reading`/`push_error` before subscribing;
/// `subscribe` delivers the whole script and then closes the stream. Used by
/// unit and integration tests and by dev-mode replay.
#[derive(Default)]
pub struct ScriptedFeed {
    scripts: Mutex<std::collections::HashMap<String, Vec<FeedEvent>>>,
    live_senders: Mutex<std::collections::HashMap<String, Sender<FeedEvent>>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        ScriptedFeed::default()
    }

    pub fn push_reading(&self, snapshot: ParameterSnapshot) {
        let device_id = snapshot.device_id.clone();
        self.scripts
            .lock()
            .unwrap()
            .entry(device_id)
            .or_default()
            .push(FeedEvent::Reading(snapshot));
    }

    pub fn push_error(&self, device_id: &str, error: FeedError) {
        self.scripts
            .lock()
            .unwrap()
            .entry(device_id.to_string())
            .or_default()
            .push(FeedEvent::Error(error));
    }

    /// Delivers an event to a device's already-open subscription.
    ///
    /// Lets tests interleave deliveries with assertions after the monitor
    /// has subscribed. Returns false if the device has no open stream.
    pub fn deliver(&self, device_id: &str, event: FeedEvent) -> bool {
        let senders = self.live_senders.lock().unwrap();
        match senders.get(device_id) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Closes a device's open stream, as a feed outage would.
    pub fn close(&self, device_id: &str) {
        self.live_senders.lock().unwrap().remove(device_id);
    }
}

impl ReadingFeed for ScriptedFeed {
    fn subscribe(&self, device_id: &str) -> Result<FeedSubscription, FeedError> {
        let (tx, rx) = std::sync::mpsc::channel();
        let active = Arc::new(AtomicBool::new(true));

        // Replay any pre-loaded script immediately; the channel is
        // unbounded so this never blocks.
        let script = self
            .scripts
            .lock()
            .unwrap()
            .remove(device_id)
            .unwrap_or_default();
        for event in script {
            // Receiver is alive at this point; send cannot fail.
            let _ = tx.send(event);
        }

        // Keep the sender open for interleaved delivery until `close`.
        self.live_senders
            .lock()
            .unwrap()
            .insert(device_id.to_string(), tx);

        Ok(FeedSubscription::new(rx, active))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
