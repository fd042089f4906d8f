//! The public protocol client facade.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use weart_protocol::{ActuationPoint, HandSide, Message, TrackingType};

use crate::config::ClientConfig;
use crate::connection::{self, ConnectionHandle};
use crate::events::{ClientEvent, EventBus};
use crate::transport::{TcpTransport, Transport};

/// Client for the WEART middleware.
///
/// Construct one explicitly and hand references to whatever needs it; there
/// is no global instance. `start()` spawns the background session worker;
/// every observation (connection changes, messages, errors) arrives through
/// channels obtained from [`subscribe`](WeartClient::subscribe).
///
/// All methods may be called from any thread. Outbound commands are silent
/// no-ops while disconnected: treat them as fire-and-forget unless a
/// `ConnectionChanged(true)` event has confirmed the link.
pub struct WeartClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    bus: EventBus,
    connection: Mutex<Option<ConnectionHandle>>,
    calibration_valid: AtomicBool,
}

impl WeartClient {
    /// Create a client using the standard TCP transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(TcpTransport))
    }

    /// Create a client over a custom transport (BLE tunnel, test pipe, ...).
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        WeartClient {
            config,
            transport,
            bus: EventBus::new(),
            connection: Mutex::new(None),
            calibration_valid: AtomicBool::new(false),
        }
    }

    /// Register an event subscriber. Events arrive in publish order;
    /// subscribe before `start()` to observe the first connection.
    pub fn subscribe(&self) -> Receiver<ClientEvent> {
        self.bus.subscribe()
    }

    /// Start the session: spawns the connect/receive worker. Does nothing
    /// if already started.
    pub fn start(&self) {
        let mut connection = self.connection.lock();
        if connection.is_some() {
            log::debug!("start() ignored, session already running");
            return;
        }
        *connection = Some(ConnectionHandle::spawn(
            self.config.clone(),
            Arc::clone(&self.transport),
            self.bus.clone(),
        ));
    }

    /// Stop the session: sends a polite stop notice when connected, then
    /// tears the transport down and joins the worker. Idempotent.
    pub fn stop(&self) {
        let handle = self.connection.lock().take();
        let Some(handle) = handle else {
            return;
        };
        if handle.shared().is_connected() {
            connection::send_message(handle.shared(), &self.bus, &Message::StopFromClient);
        }
        handle.stop();
    }

    /// Whether the transport currently reports an open link.
    pub fn is_connected(&self) -> bool {
        self.connection
            .lock()
            .as_ref()
            .map(|handle| handle.shared().is_connected())
            .unwrap_or(false)
    }

    /// Send one message. The single funnel for all outbound traffic:
    /// returns `true` if the frame was written; while disconnected it is a
    /// silent no-op, and write failures surface as error events.
    pub fn send_message(&self, message: &Message) -> bool {
        let guard = self.connection.lock();
        match guard.as_ref() {
            Some(handle) => connection::send_message(handle.shared(), &self.bus, message),
            None => {
                log::debug!("dropping {} while stopped", message.wire_tag());
                false
            }
        }
    }

    // ========== Named command wrappers ==========

    /// Re-issue the session-open command with an explicit tracking type.
    /// The worker already sends this automatically on every (re)connect;
    /// call it to renegotiate the tracking algorithm mid-session.
    pub fn send_start_device(&self, tracking_type: TrackingType) -> bool {
        self.send_message(&Message::StartFromClient { tracking_type })
    }

    /// Begin the hand-tracking calibration procedure.
    pub fn start_calibration(&self) -> bool {
        self.send_message(&Message::StartCalibration)
    }

    /// Abort the calibration procedure.
    pub fn stop_calibration(&self) -> bool {
        self.send_message(&Message::StopCalibration)
    }

    /// Discard the stored calibration profile.
    pub fn reset_calibration(&self) -> bool {
        self.send_message(&Message::ResetCalibration)
    }

    /// Enable raw sensor data streaming.
    pub fn start_raw_data(&self) -> bool {
        self.send_message(&Message::RawDataOn)
    }

    /// Disable raw sensor data streaming.
    pub fn stop_raw_data(&self) -> bool {
        self.send_message(&Message::RawDataOff)
    }

    /// Request a middleware status record.
    pub fn get_middleware_status(&self) -> bool {
        self.send_message(&Message::GetMiddlewareStatus)
    }

    /// Request a devices status record.
    pub fn get_devices_status(&self) -> bool {
        self.send_message(&Message::GetDevicesStatus)
    }

    /// Drive the thermal actuator at one point.
    pub fn set_temperature(&self, hand: HandSide, point: ActuationPoint, value: f32) -> bool {
        self.send_message(&Message::SetTemperature { hand, point, value })
    }

    /// Stop the thermal actuator at one point.
    pub fn stop_temperature(&self, hand: HandSide, point: ActuationPoint) -> bool {
        self.send_message(&Message::StopTemperature { hand, point })
    }

    /// Drive the force actuator at one point.
    pub fn set_force(&self, hand: HandSide, point: ActuationPoint, value: f32) -> bool {
        self.send_message(&Message::SetForce { hand, point, value })
    }

    /// Stop the force actuator at one point.
    pub fn stop_force(&self, hand: HandSide, point: ActuationPoint) -> bool {
        self.send_message(&Message::StopForce { hand, point })
    }

    /// Play a vibrotactile texture at one point.
    pub fn set_texture(
        &self,
        hand: HandSide,
        point: ActuationPoint,
        texture_index: u16,
        velocity: f32,
        volume: f32,
    ) -> bool {
        self.send_message(&Message::SetTexture { hand, point, texture_index, velocity, volume })
    }

    /// Stop texture playback at one point.
    pub fn stop_texture(&self, hand: HandSide, point: ActuationPoint) -> bool {
        self.send_message(&Message::StopTexture { hand, point })
    }

    // ========== Local calibration state ==========

    /// Invalidate the calibration state and ask hand-tracking consumers to
    /// zero their cached closure values. Local only, no wire message; the
    /// event carries the calibration-valid flag after the reset.
    pub fn reset_hand_closure(&self) {
        self.calibration_valid.store(false, Ordering::SeqCst);
        self.bus.publish(ClientEvent::ResetHandClosure(self.calibration_valid()));
    }

    /// Record that calibration completed successfully (typically called on
    /// a successful `TrackingCalibrationResult`).
    pub fn mark_calibration_valid(&self) {
        self.calibration_valid.store(true, Ordering::SeqCst);
    }

    /// Whether a valid calibration profile is in effect.
    pub fn calibration_valid(&self) -> bool {
        self.calibration_valid.load(Ordering::SeqCst)
    }
}

impl Drop for WeartClient {
    fn drop(&mut self) {
        self.stop();
    }
}
