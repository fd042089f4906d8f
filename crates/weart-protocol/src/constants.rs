//! Protocol constants: record tags, separators, and defaults.

/// Separator character terminating every wire record. Not permitted inside
/// payload fields.
pub const FRAME_SEPARATOR: char = '~';

/// Separator between the record tag and its fields, and between fields.
pub const FIELD_SEPARATOR: char = ';';

/// Separator between a field key and its value.
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Default TCP port the middleware listens on (loopback interface).
pub const DEFAULT_MIDDLEWARE_PORT: u16 = 13031;

/// Default cap on the length of a single wire record, in bytes.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

// ============================================================================
// Record tags (client → middleware)
// ============================================================================

pub const TAG_START_FROM_CLIENT: &str = "START_FROM_CLIENT";
pub const TAG_STOP_FROM_CLIENT: &str = "STOP_FROM_CLIENT";
pub const TAG_START_CALIBRATION: &str = "START_CALIBRATION";
pub const TAG_STOP_CALIBRATION: &str = "STOP_CALIBRATION";
pub const TAG_RESET_CALIBRATION: &str = "RESET_CALIBRATION";
pub const TAG_RAW_DATA_ON: &str = "RAW_DATA_ON";
pub const TAG_RAW_DATA_OFF: &str = "RAW_DATA_OFF";
pub const TAG_GET_MW_STATUS: &str = "GET_MW_STATUS";
pub const TAG_GET_DEVICES_STATUS: &str = "GET_DEVICES_STATUS";
pub const TAG_TEMPERATURE: &str = "TEMPERATURE";
pub const TAG_STOP_TEMPERATURE: &str = "STOP_TEMPERATURE";
pub const TAG_FORCE: &str = "FORCE";
pub const TAG_STOP_FORCE: &str = "STOP_FORCE";
pub const TAG_TEXTURE: &str = "TEXTURE";
pub const TAG_STOP_TEXTURE: &str = "STOP_TEXTURE";

// ============================================================================
// Record tags (middleware → client)
// ============================================================================

pub const TAG_MW_STATUS: &str = "MW_STATUS";
pub const TAG_DEVICES_STATUS: &str = "DEVICES_STATUS";
pub const TAG_WA_STATUS: &str = "WA_STATUS";
pub const TAG_TDPRO_STATUS: &str = "TDPRO_STATUS";
pub const TAG_TRACKING: &str = "TRACKING";
pub const TAG_CALIBRATION_STATUS: &str = "CALIBRATION_STATUS";
pub const TAG_CALIBRATION_RESULT: &str = "CALIBRATION_RESULT";
pub const TAG_RAW_SENSOR_DATA: &str = "RAW_SENSOR_DATA";
pub const TAG_EXIT: &str = "EXIT";
pub const TAG_DISCONNECT: &str = "DISCONNECT";
