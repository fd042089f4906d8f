//! Client events and their fan-out.
//!
//! Instead of marshaling callbacks onto a captured synchronization context,
//! the client hands every subscriber its own unbounded channel. Each
//! subscriber observes events in the exact order they were published, which
//! for inbound messages is wire order.

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

use weart_protocol::Message;

use crate::error::ClientError;

/// Direction of a message relative to this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Middleware → client.
    Received,
    /// Client → middleware.
    Sent,
}

/// Events delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The connection came up (`true`) or went down (`false`).
    ConnectionChanged(bool),

    /// A typed message crossed the wire. For each inbound frame this is
    /// published before the matching [`ClientEvent::Text`] event.
    Message {
        /// Which way the message traveled.
        direction: Direction,
        /// The decoded message.
        message: Message,
    },

    /// The raw record text of a message that crossed the wire (diagnostic).
    Text {
        /// Which way the text traveled.
        direction: Direction,
        /// Record text without the frame separator.
        text: String,
    },

    /// A connection, send, or receive fault.
    Error(ClientError),

    /// Hand-tracking consumers should zero their cached closure values.
    /// Carries the calibration-valid flag after the reset (`false`).
    /// Local event, no wire message involved.
    ResetHandClosure(bool),
}

/// Fan-out of [`ClientEvent`]s to any number of subscriber channels.
///
/// Publishing iterates subscribers in subscription order; subscribers whose
/// receiver was dropped are pruned on the next publish.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<ClientEvent>>>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&self) -> Receiver<ClientEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver an event to every live subscriber.
    pub fn publish(&self, event: ClientEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers (stale ones are counted until pruned).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
