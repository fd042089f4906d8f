//! WEART Middleware Wire Protocol
//!
//! This crate provides types and utilities for communicating with the WEART
//! middleware process that bridges TouchDIVER haptic glove hardware. The
//! protocol is a stream of UTF-8 text records, each terminated by a `~`
//! separator character.
//!
//! # Protocol Overview
//!
//! Each record is a flat key/value encoding of one message:
//!
//! - **Commands** (client → middleware): session control, calibration,
//!   raw-data toggles, and per-actuation-point haptic effects
//! - **Status/events** (middleware → client): middleware and device status,
//!   finger tracking, calibration progress, and raw sensor samples
//!
//! Multiple records may arrive concatenated in one read and a record may be
//! split across reads; [`WireFramer`] reassembles them.
//!
//! # Example
//!
//! ```rust,ignore
//! use weart_protocol::{Message, WireFramer};
//!
//! // Build a command
//! let cmd = Message::StartCalibration;
//! let bytes = WireFramer::encode_frame(&cmd);
//!
//! // Parse an inbound record
//! let msg = Message::decode("MW_STATUS;status=RUNNING;code=0")?;
//! ```

mod codec;
mod constants;
mod error;
mod frame;
mod message;
mod types;

pub use constants::*;
pub use error::*;
pub use frame::*;
pub use message::*;
pub use types::*;
