//! WEART Middleware Client
//!
//! This crate connects to the WEART middleware process over TCP (port 13031
//! on the local host by default), frames and decodes its `~`-separated
//! record protocol, and dispatches typed [`Message`](weart_protocol::Message)
//! events to subscribers.
//!
//! The client owns one background worker per session: the worker loops
//! between connect attempts (with exponential backoff) and a blocking
//! receive loop, and all its observations are delivered through
//! [`ClientEvent`] channels obtained from [`WeartClient::subscribe`].
//! Subscribers drain their receiver on whatever thread suits them; events
//! arrive in wire order.
//!
//! # Example
//!
//! ```rust,ignore
//! use weart_client::{ClientConfig, ClientEvent, WeartClient};
//!
//! let client = WeartClient::new(ClientConfig::default());
//! let events = client.subscribe();
//! client.start();
//!
//! while let Ok(event) = events.recv() {
//!     match event {
//!         ClientEvent::ConnectionChanged(true) => {
//!             client.start_calibration();
//!         }
//!         ClientEvent::Message { message, .. } => println!("{message:?}"),
//!         _ => {}
//!     }
//! }
//! ```

mod client;
mod config;
mod connection;
mod error;
mod events;
mod transport;

pub use client::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use transport::*;
