//! Typed protocol messages and their wire encoding.
//!
//! [`Message`] is the closed set of records exchanged with the middleware.
//! Encoding is deterministic (fixed field order); decoding is lenient about
//! absent optional fields so that older middleware builds still parse, and
//! returns `Ok(None)` for unknown tags so that newer ones do not break the
//! client.

use crate::codec::{unescape_value, FieldMap, RecordBuilder};
use crate::constants::*;
use crate::error::ProtocolError;
use crate::types::{
    ActuationPoint, CalibrationStatus, DeviceStatus, HandSide, MiddlewareStatusKind, TdProStatus,
    TrackingSample, TrackingType, Vector3,
};

/// One protocol message, client command or middleware status/event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Message {
    // ========== Commands (client → middleware) ==========
    /// Open a session with the given tracking algorithm.
    StartFromClient {
        /// Requested tracking algorithm.
        tracking_type: TrackingType,
    },

    /// Close the session politely before disconnecting.
    StopFromClient,

    /// Begin the hand-tracking calibration procedure.
    StartCalibration,

    /// Abort the calibration procedure.
    StopCalibration,

    /// Discard the stored calibration profile.
    ResetCalibration,

    /// Enable raw sensor data streaming.
    RawDataOn,

    /// Disable raw sensor data streaming.
    RawDataOff,

    /// Request a middleware status record.
    GetMiddlewareStatus,

    /// Request a devices status record.
    GetDevicesStatus,

    /// Drive the thermal actuator at one point.
    SetTemperature {
        /// Target hand.
        hand: HandSide,
        /// Target actuation point.
        point: ActuationPoint,
        /// Normalized temperature (0.0 cold - 1.0 hot).
        value: f32,
    },

    /// Stop the thermal actuator at one point.
    StopTemperature {
        /// Target hand.
        hand: HandSide,
        /// Target actuation point.
        point: ActuationPoint,
    },

    /// Drive the force actuator at one point.
    SetForce {
        /// Target hand.
        hand: HandSide,
        /// Target actuation point.
        point: ActuationPoint,
        /// Normalized pressing force (0.0-1.0).
        value: f32,
    },

    /// Stop the force actuator at one point.
    StopForce {
        /// Target hand.
        hand: HandSide,
        /// Target actuation point.
        point: ActuationPoint,
    },

    /// Play a vibrotactile texture at one point.
    SetTexture {
        /// Target hand.
        hand: HandSide,
        /// Target actuation point.
        point: ActuationPoint,
        /// Index into the middleware's texture library.
        texture_index: u16,
        /// Sliding velocity driving the texture playback.
        velocity: f32,
        /// Playback volume in percent.
        volume: f32,
    },

    /// Stop texture playback at one point.
    StopTexture {
        /// Target hand.
        hand: HandSide,
        /// Target actuation point.
        point: ActuationPoint,
    },

    // ========== Status / events (middleware → client) ==========
    /// Middleware status snapshot.
    MiddlewareStatus {
        /// Overall middleware state.
        status: MiddlewareStatusKind,
        /// Middleware version string.
        version: String,
        /// Status/error code (0 means no error).
        status_code: i32,
        /// Human-readable error description, empty when none.
        error_desc: String,
        /// Whether haptic actuations are currently enabled.
        actuations_enabled: bool,
    },

    /// Status of every connected TouchDIVER device.
    DevicesStatus {
        /// Per-device status records.
        devices: Vec<DeviceStatus>,
    },

    /// Status of the standalone WEART app.
    WeartAppStatus {
        /// Overall app state.
        status: MiddlewareStatusKind,
    },

    /// Status of connected TouchDIVER Pro devices.
    TouchDiverProStatus {
        /// Per-device status records.
        devices: Vec<TdProStatus>,
    },

    /// Per-hand finger tracking sample.
    Tracking {
        /// Which hand the sample is for.
        hand: HandSide,
        /// Closure and abduction values.
        sample: TrackingSample,
    },

    /// Calibration progress for one hand.
    TrackingCalibrationStatus {
        /// Which hand is being calibrated.
        hand: HandSide,
        /// Current calibration phase.
        status: CalibrationStatus,
    },

    /// Calibration outcome for one hand.
    TrackingCalibrationResult {
        /// Which hand was calibrated.
        hand: HandSide,
        /// Whether calibration succeeded.
        success: bool,
    },

    /// Raw sensor sample from one actuation point.
    RawSensorData {
        /// Which hand the sample is from.
        hand: HandSide,
        /// Which actuation point the sample is from.
        point: ActuationPoint,
        /// Accelerometer sample.
        accelerometer: Vector3,
        /// Gyroscope sample.
        gyroscope: Vector3,
        /// Time-of-flight distance reading.
        time_of_flight: f32,
    },

    /// The middleware is exiting.
    Exit,

    /// The middleware dropped this client.
    Disconnect,
}

impl Message {
    /// Get the leading wire tag for this message.
    pub fn wire_tag(&self) -> &'static str {
        match self {
            Message::StartFromClient { .. } => TAG_START_FROM_CLIENT,
            Message::StopFromClient => TAG_STOP_FROM_CLIENT,
            Message::StartCalibration => TAG_START_CALIBRATION,
            Message::StopCalibration => TAG_STOP_CALIBRATION,
            Message::ResetCalibration => TAG_RESET_CALIBRATION,
            Message::RawDataOn => TAG_RAW_DATA_ON,
            Message::RawDataOff => TAG_RAW_DATA_OFF,
            Message::GetMiddlewareStatus => TAG_GET_MW_STATUS,
            Message::GetDevicesStatus => TAG_GET_DEVICES_STATUS,
            Message::SetTemperature { .. } => TAG_TEMPERATURE,
            Message::StopTemperature { .. } => TAG_STOP_TEMPERATURE,
            Message::SetForce { .. } => TAG_FORCE,
            Message::StopForce { .. } => TAG_STOP_FORCE,
            Message::SetTexture { .. } => TAG_TEXTURE,
            Message::StopTexture { .. } => TAG_STOP_TEXTURE,
            Message::MiddlewareStatus { .. } => TAG_MW_STATUS,
            Message::DevicesStatus { .. } => TAG_DEVICES_STATUS,
            Message::WeartAppStatus { .. } => TAG_WA_STATUS,
            Message::TouchDiverProStatus { .. } => TAG_TDPRO_STATUS,
            Message::Tracking { .. } => TAG_TRACKING,
            Message::TrackingCalibrationStatus { .. } => TAG_CALIBRATION_STATUS,
            Message::TrackingCalibrationResult { .. } => TAG_CALIBRATION_RESULT,
            Message::RawSensorData { .. } => TAG_RAW_SENSOR_DATA,
            Message::Exit => TAG_EXIT,
            Message::Disconnect => TAG_DISCONNECT,
        }
    }

    /// Encode the message as record text (without the frame separator).
    pub fn encode(&self) -> String {
        let tag = self.wire_tag();
        match self {
            Message::StartFromClient { tracking_type } => RecordBuilder::new(tag)
                .field("tracking", tracking_type.as_wire_str())
                .finish(),

            Message::StopFromClient
            | Message::StartCalibration
            | Message::StopCalibration
            | Message::ResetCalibration
            | Message::RawDataOn
            | Message::RawDataOff
            | Message::GetMiddlewareStatus
            | Message::GetDevicesStatus
            | Message::Exit
            | Message::Disconnect => tag.to_string(),

            Message::SetTemperature { hand, point, value }
            | Message::SetForce { hand, point, value } => RecordBuilder::new(tag)
                .field("hand", hand.as_wire_str())
                .field("point", point.as_wire_str())
                .field("value", value)
                .finish(),

            Message::StopTemperature { hand, point }
            | Message::StopForce { hand, point }
            | Message::StopTexture { hand, point } => RecordBuilder::new(tag)
                .field("hand", hand.as_wire_str())
                .field("point", point.as_wire_str())
                .finish(),

            Message::SetTexture { hand, point, texture_index, velocity, volume } => {
                RecordBuilder::new(tag)
                    .field("hand", hand.as_wire_str())
                    .field("point", point.as_wire_str())
                    .field("index", texture_index)
                    .field("velocity", velocity)
                    .field("volume", volume)
                    .finish()
            }

            Message::MiddlewareStatus {
                status,
                version,
                status_code,
                error_desc,
                actuations_enabled,
            } => RecordBuilder::new(tag)
                .field("status", status.as_wire_str())
                .field("version", version)
                .field("code", status_code)
                .field("error", error_desc)
                .field("actuations", actuations_enabled)
                .finish(),

            Message::DevicesStatus { devices } => {
                let mut builder = RecordBuilder::new(tag).field("n", devices.len());
                for (i, dev) in devices.iter().enumerate() {
                    builder = builder
                        .field(&format!("{i}.mac"), &dev.mac_address)
                        .field(&format!("{i}.hand"), dev.hand_side.as_wire_str())
                        .field(&format!("{i}.battery"), dev.battery_level)
                        .field(&format!("{i}.charging"), dev.charging);
                }
                builder.finish()
            }

            Message::WeartAppStatus { status } => RecordBuilder::new(tag)
                .field("status", status.as_wire_str())
                .finish(),

            Message::TouchDiverProStatus { devices } => {
                let mut builder = RecordBuilder::new(tag).field("n", devices.len());
                for (i, dev) in devices.iter().enumerate() {
                    builder = builder
                        .field(&format!("{i}.mac"), &dev.mac_address)
                        .field(&format!("{i}.connected"), dev.connected)
                        .field(&format!("{i}.battery"), dev.battery_level);
                }
                builder.finish()
            }

            Message::Tracking { hand, sample } => RecordBuilder::new(tag)
                .field("hand", hand.as_wire_str())
                .field("thumb.closure", sample.thumb_closure)
                .field("thumb.abduction", sample.thumb_abduction)
                .field("index.closure", sample.index_closure)
                .field("middle.closure", sample.middle_closure)
                .field("annular.closure", sample.annular_closure)
                .field("pinky.closure", sample.pinky_closure)
                .finish(),

            Message::TrackingCalibrationStatus { hand, status } => RecordBuilder::new(tag)
                .field("hand", hand.as_wire_str())
                .field("status", status.as_wire_str())
                .finish(),

            Message::TrackingCalibrationResult { hand, success } => RecordBuilder::new(tag)
                .field("hand", hand.as_wire_str())
                .field("success", success)
                .finish(),

            Message::RawSensorData { hand, point, accelerometer, gyroscope, time_of_flight } => {
                RecordBuilder::new(tag)
                    .field("hand", hand.as_wire_str())
                    .field("point", point.as_wire_str())
                    .field("acc.x", accelerometer.x)
                    .field("acc.y", accelerometer.y)
                    .field("acc.z", accelerometer.z)
                    .field("gyro.x", gyroscope.x)
                    .field("gyro.y", gyroscope.y)
                    .field("gyro.z", gyroscope.z)
                    .field("tof", time_of_flight)
                    .finish()
            }
        }
    }

    /// Decode record text into a typed message.
    ///
    /// Returns `Ok(None)` when the tag is not a known message type (unknown
    /// records are skipped, never an error), or `Err` when a recognized
    /// record carries malformed fields.
    pub fn decode(text: &str) -> Result<Option<Message>, ProtocolError> {
        let map = FieldMap::parse(text)?;

        let message = match map.tag() {
            TAG_START_FROM_CLIENT => {
                let raw = map.str_or("tracking", TrackingType::default().as_wire_str());
                let tracking_type = TrackingType::from_wire_str(&raw).ok_or_else(|| {
                    ProtocolError::InvalidField { field: "tracking".to_string(), value: raw }
                })?;
                Message::StartFromClient { tracking_type }
            }
            TAG_STOP_FROM_CLIENT => Message::StopFromClient,
            TAG_START_CALIBRATION => Message::StartCalibration,
            TAG_STOP_CALIBRATION => Message::StopCalibration,
            TAG_RESET_CALIBRATION => Message::ResetCalibration,
            TAG_RAW_DATA_ON => Message::RawDataOn,
            TAG_RAW_DATA_OFF => Message::RawDataOff,
            TAG_GET_MW_STATUS => Message::GetMiddlewareStatus,
            TAG_GET_DEVICES_STATUS => Message::GetDevicesStatus,
            TAG_EXIT => Message::Exit,
            TAG_DISCONNECT => Message::Disconnect,

            TAG_TEMPERATURE => Message::SetTemperature {
                hand: map.hand(TAG_TEMPERATURE, "hand")?,
                point: map.point(TAG_TEMPERATURE, "point")?,
                value: map.f32(TAG_TEMPERATURE, "value")?,
            },
            TAG_STOP_TEMPERATURE => Message::StopTemperature {
                hand: map.hand(TAG_STOP_TEMPERATURE, "hand")?,
                point: map.point(TAG_STOP_TEMPERATURE, "point")?,
            },
            TAG_FORCE => Message::SetForce {
                hand: map.hand(TAG_FORCE, "hand")?,
                point: map.point(TAG_FORCE, "point")?,
                value: map.f32(TAG_FORCE, "value")?,
            },
            TAG_STOP_FORCE => Message::StopForce {
                hand: map.hand(TAG_STOP_FORCE, "hand")?,
                point: map.point(TAG_STOP_FORCE, "point")?,
            },
            TAG_TEXTURE => Message::SetTexture {
                hand: map.hand(TAG_TEXTURE, "hand")?,
                point: map.point(TAG_TEXTURE, "point")?,
                texture_index: map.u16(TAG_TEXTURE, "index")?,
                velocity: map.f32(TAG_TEXTURE, "velocity")?,
                volume: map.f32(TAG_TEXTURE, "volume")?,
            },
            TAG_STOP_TEXTURE => Message::StopTexture {
                hand: map.hand(TAG_STOP_TEXTURE, "hand")?,
                point: map.point(TAG_STOP_TEXTURE, "point")?,
            },

            TAG_MW_STATUS => {
                let raw = map.str_or("status", MiddlewareStatusKind::default().as_wire_str());
                let status = MiddlewareStatusKind::from_wire_str(&raw).ok_or_else(|| {
                    ProtocolError::InvalidField { field: "status".to_string(), value: raw }
                })?;
                Message::MiddlewareStatus {
                    status,
                    version: map.str_or("version", ""),
                    status_code: map.i32_or("code", 0)?,
                    error_desc: map.str_or("error", ""),
                    actuations_enabled: map.bool_or("actuations", false)?,
                }
            }

            TAG_DEVICES_STATUS => {
                let n = map.usize_or("n", 0)?;
                let mut devices = Vec::with_capacity(n);
                for i in 0..n {
                    devices.push(decode_device(&map, i)?);
                }
                Message::DevicesStatus { devices }
            }

            TAG_WA_STATUS => {
                let raw = map.str_or("status", MiddlewareStatusKind::default().as_wire_str());
                let status = MiddlewareStatusKind::from_wire_str(&raw).ok_or_else(|| {
                    ProtocolError::InvalidField { field: "status".to_string(), value: raw }
                })?;
                Message::WeartAppStatus { status }
            }

            TAG_TDPRO_STATUS => {
                let n = map.usize_or("n", 0)?;
                let mut devices = Vec::with_capacity(n);
                for i in 0..n {
                    devices.push(decode_tdpro_device(&map, i)?);
                }
                Message::TouchDiverProStatus { devices }
            }

            TAG_TRACKING => Message::Tracking {
                hand: map.hand(TAG_TRACKING, "hand")?,
                sample: TrackingSample {
                    thumb_closure: map.f32_or("thumb.closure", 0.0)?,
                    thumb_abduction: map.f32_or("thumb.abduction", 0.0)?,
                    index_closure: map.f32_or("index.closure", 0.0)?,
                    middle_closure: map.f32_or("middle.closure", 0.0)?,
                    annular_closure: map.f32_or("annular.closure", 0.0)?,
                    pinky_closure: map.f32_or("pinky.closure", 0.0)?,
                },
            },

            TAG_CALIBRATION_STATUS => {
                let raw = map.require(TAG_CALIBRATION_STATUS, "status")?;
                let status = CalibrationStatus::from_wire_str(raw).ok_or_else(|| {
                    ProtocolError::InvalidField {
                        field: "status".to_string(),
                        value: raw.to_string(),
                    }
                })?;
                Message::TrackingCalibrationStatus {
                    hand: map.hand(TAG_CALIBRATION_STATUS, "hand")?,
                    status,
                }
            }

            TAG_CALIBRATION_RESULT => Message::TrackingCalibrationResult {
                hand: map.hand(TAG_CALIBRATION_RESULT, "hand")?,
                success: map.bool_or("success", false)?,
            },

            TAG_RAW_SENSOR_DATA => Message::RawSensorData {
                hand: map.hand(TAG_RAW_SENSOR_DATA, "hand")?,
                point: map.point(TAG_RAW_SENSOR_DATA, "point")?,
                accelerometer: Vector3::new(
                    map.f32_or("acc.x", 0.0)?,
                    map.f32_or("acc.y", 0.0)?,
                    map.f32_or("acc.z", 0.0)?,
                ),
                gyroscope: Vector3::new(
                    map.f32_or("gyro.x", 0.0)?,
                    map.f32_or("gyro.y", 0.0)?,
                    map.f32_or("gyro.z", 0.0)?,
                ),
                time_of_flight: map.f32_or("tof", 0.0)?,
            },

            _ => return Ok(None),
        };

        Ok(Some(message))
    }
}

fn decode_device(map: &FieldMap<'_>, i: usize) -> Result<DeviceStatus, ProtocolError> {
    let mac_key = format!("{i}.mac");
    let hand_key = format!("{i}.hand");
    let mac = map
        .get(&mac_key)
        .ok_or_else(|| ProtocolError::MalformedRecord(format!("DEVICES_STATUS missing {mac_key}")))?;
    let hand_raw = map
        .get(&hand_key)
        .ok_or_else(|| ProtocolError::MalformedRecord(format!("DEVICES_STATUS missing {hand_key}")))?;
    let hand_side = HandSide::from_wire_str(hand_raw).ok_or_else(|| ProtocolError::InvalidField {
        field: hand_key,
        value: hand_raw.to_string(),
    })?;
    Ok(DeviceStatus {
        mac_address: unescape_value(mac),
        hand_side,
        battery_level: map.u8_or(&format!("{i}.battery"), 0)?,
        charging: map.bool_or(&format!("{i}.charging"), false)?,
    })
}

fn decode_tdpro_device(map: &FieldMap<'_>, i: usize) -> Result<TdProStatus, ProtocolError> {
    let mac_key = format!("{i}.mac");
    let mac = map
        .get(&mac_key)
        .ok_or_else(|| ProtocolError::MalformedRecord(format!("TDPRO_STATUS missing {mac_key}")))?;
    Ok(TdProStatus {
        mac_address: unescape_value(mac),
        connected: map.bool_or(&format!("{i}.connected"), false)?,
        battery_level: map.u8_or(&format!("{i}.battery"), 0)?,
    })
}
