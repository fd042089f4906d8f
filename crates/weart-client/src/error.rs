//! Client error taxonomy.
//!
//! Errors never propagate out of the background worker; they are delivered
//! as [`ClientEvent::Error`](crate::ClientEvent::Error) values, so they are
//! cheap to clone and compare.

use thiserror::Error;

/// Errors reported through the event channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The transport could not be opened or dropped unexpectedly.
    #[error("connection error: {0}")]
    Connection(String),

    /// An outbound message could not be serialized or written.
    #[error("send failed: {0}")]
    SendMessage(String),

    /// An inbound read or decode failed.
    #[error("receive failed: {0}")]
    ReceiveMessage(String),
}
