//! Common types carried by protocol messages.

/// Which hand a device or tracking sample refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HandSide {
    /// Left hand.
    Left,
    /// Right hand.
    Right,
}

impl HandSide {
    /// Get the wire token for this hand side.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            HandSide::Left => "LEFT",
            HandSide::Right => "RIGHT",
        }
    }

    /// Parse a hand side from its wire token.
    pub fn from_wire_str(s: &str) -> Option<HandSide> {
        match s {
            "LEFT" => Some(HandSide::Left),
            "RIGHT" => Some(HandSide::Right),
            _ => None,
        }
    }
}

/// A named haptic output location on the glove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActuationPoint {
    /// Thumb thimble.
    Thumb,
    /// Index thimble.
    Index,
    /// Middle thimble.
    Middle,
    /// Annular (ring) thimble.
    Annular,
    /// Pinky thimble.
    Pinky,
    /// Palm actuator.
    Palm,
}

impl ActuationPoint {
    /// Get the wire token for this actuation point.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            ActuationPoint::Thumb => "THUMB",
            ActuationPoint::Index => "INDEX",
            ActuationPoint::Middle => "MIDDLE",
            ActuationPoint::Annular => "ANNULAR",
            ActuationPoint::Pinky => "PINKY",
            ActuationPoint::Palm => "PALM",
        }
    }

    /// Parse an actuation point from its wire token.
    pub fn from_wire_str(s: &str) -> Option<ActuationPoint> {
        match s {
            "THUMB" => Some(ActuationPoint::Thumb),
            "INDEX" => Some(ActuationPoint::Index),
            "MIDDLE" => Some(ActuationPoint::Middle),
            "ANNULAR" => Some(ActuationPoint::Annular),
            "PINKY" => Some(ActuationPoint::Pinky),
            "PALM" => Some(ActuationPoint::Palm),
            _ => None,
        }
    }
}

/// Hand-tracking algorithm requested when opening a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrackingType {
    /// Legacy closure-only tracking.
    Default,
    /// Per-thimble closure plus thumb abduction (`TrackType1`).
    WeartHand,
}

impl TrackingType {
    /// Get the wire token for this tracking type.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            TrackingType::Default => "DEFAULT",
            TrackingType::WeartHand => "TrackType1",
        }
    }

    /// Parse a tracking type from its wire token.
    pub fn from_wire_str(s: &str) -> Option<TrackingType> {
        match s {
            "DEFAULT" => Some(TrackingType::Default),
            "TrackType1" => Some(TrackingType::WeartHand),
            _ => None,
        }
    }
}

impl Default for TrackingType {
    fn default() -> Self {
        TrackingType::WeartHand
    }
}

/// Overall state reported by the middleware (and the standalone WEART app).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MiddlewareStatusKind {
    /// No middleware session.
    Disconnected,
    /// Connected, no session running.
    Idle,
    /// Session starting up.
    Starting,
    /// Session running, haptics and tracking active.
    Running,
    /// Session shutting down.
    Stopping,
    /// Calibration procedure in progress.
    Calibration,
    /// Texture library upload in progress.
    UploadingTextures,
    /// Connecting to glove hardware.
    ConnectingDevice,
}

impl MiddlewareStatusKind {
    /// Get the wire token for this status.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            MiddlewareStatusKind::Disconnected => "DISCONNECTED",
            MiddlewareStatusKind::Idle => "IDLE",
            MiddlewareStatusKind::Starting => "STARTING",
            MiddlewareStatusKind::Running => "RUNNING",
            MiddlewareStatusKind::Stopping => "STOPPING",
            MiddlewareStatusKind::Calibration => "CALIBRATION",
            MiddlewareStatusKind::UploadingTextures => "UPLOADING_TEXTURES",
            MiddlewareStatusKind::ConnectingDevice => "CONNECTING_DEVICE",
        }
    }

    /// Parse a status from its wire token.
    pub fn from_wire_str(s: &str) -> Option<MiddlewareStatusKind> {
        match s {
            "DISCONNECTED" => Some(MiddlewareStatusKind::Disconnected),
            "IDLE" => Some(MiddlewareStatusKind::Idle),
            "STARTING" => Some(MiddlewareStatusKind::Starting),
            "RUNNING" => Some(MiddlewareStatusKind::Running),
            "STOPPING" => Some(MiddlewareStatusKind::Stopping),
            "CALIBRATION" => Some(MiddlewareStatusKind::Calibration),
            "UPLOADING_TEXTURES" => Some(MiddlewareStatusKind::UploadingTextures),
            "CONNECTING_DEVICE" => Some(MiddlewareStatusKind::ConnectingDevice),
            _ => None,
        }
    }
}

impl Default for MiddlewareStatusKind {
    fn default() -> Self {
        MiddlewareStatusKind::Disconnected
    }
}

/// Progress of the hand-tracking calibration procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CalibrationStatus {
    /// Not calibrating.
    Idle,
    /// Calibration in progress.
    Calibrating,
    /// Calibration finished, tracking running with the new profile.
    Running,
}

impl CalibrationStatus {
    /// Get the wire token for this calibration status.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            CalibrationStatus::Idle => "IDLE",
            CalibrationStatus::Calibrating => "CALIBRATING",
            CalibrationStatus::Running => "RUNNING",
        }
    }

    /// Parse a calibration status from its wire token.
    pub fn from_wire_str(s: &str) -> Option<CalibrationStatus> {
        match s {
            "IDLE" => Some(CalibrationStatus::Idle),
            "CALIBRATING" => Some(CalibrationStatus::Calibrating),
            "RUNNING" => Some(CalibrationStatus::Running),
            _ => None,
        }
    }
}

/// Per-device status carried in a devices-status record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceStatus {
    /// Device MAC address.
    pub mac_address: String,
    /// Which hand the device is worn on.
    pub hand_side: HandSide,
    /// Battery level in percent (0-100).
    pub battery_level: u8,
    /// Whether the device is charging.
    pub charging: bool,
}

/// Per-device status for TouchDIVER Pro hardware.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TdProStatus {
    /// Device MAC address.
    pub mac_address: String,
    /// Whether the device link is up.
    pub connected: bool,
    /// Battery level in percent (0-100).
    pub battery_level: u8,
}

/// A 3-axis sensor sample (accelerometer or gyroscope).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3 {
    /// X axis component.
    pub x: f32,
    /// Y axis component.
    pub y: f32,
    /// Z axis component.
    pub z: f32,
}

impl Vector3 {
    /// Create a new sample.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vector3 { x, y, z }
    }
}

/// Per-hand finger tracking sample: normalized closures plus thumb abduction.
///
/// All values are normalized to the 0.0-1.0 range by the middleware.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackingSample {
    /// Thumb closure.
    pub thumb_closure: f32,
    /// Thumb abduction (spread away from the palm).
    pub thumb_abduction: f32,
    /// Index finger closure.
    pub index_closure: f32,
    /// Middle finger closure.
    pub middle_closure: f32,
    /// Annular finger closure.
    pub annular_closure: f32,
    /// Pinky finger closure.
    pub pinky_closure: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_side_round_trip() {
        for side in [HandSide::Left, HandSide::Right] {
            assert_eq!(HandSide::from_wire_str(side.as_wire_str()), Some(side));
        }
        assert_eq!(HandSide::from_wire_str("UP"), None);
    }

    #[test]
    fn test_actuation_point_round_trip() {
        for point in [
            ActuationPoint::Thumb,
            ActuationPoint::Index,
            ActuationPoint::Middle,
            ActuationPoint::Annular,
            ActuationPoint::Pinky,
            ActuationPoint::Palm,
        ] {
            assert_eq!(ActuationPoint::from_wire_str(point.as_wire_str()), Some(point));
        }
    }

    #[test]
    fn test_status_tokens() {
        assert_eq!(
            MiddlewareStatusKind::from_wire_str("RUNNING"),
            Some(MiddlewareStatusKind::Running)
        );
        assert_eq!(MiddlewareStatusKind::from_wire_str("running"), None);
    }

    #[test]
    fn test_tracking_type_default() {
        assert_eq!(TrackingType::default().as_wire_str(), "TrackType1");
    }
}
