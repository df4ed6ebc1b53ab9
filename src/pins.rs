//! GPIO / peripheral pin assignments for the SynkLinx wearable board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Sensor bus (I2C0): MAX30102 + MCP9808
// ---------------------------------------------------------------------------

/// I2C data line (ESP32-S3 default SDA).
pub const I2C_SDA_GPIO: i32 = 8;
/// I2C clock line (ESP32-S3 default SCL).
pub const I2C_SCL_GPIO: i32 = 9;
/// Fast mode; both parts support 400 kHz.
pub const I2C_BAUDRATE_HZ: u32 = 400_000;
