//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements            | Connects to                 |
//! |------------|-----------------------|-----------------------------|
//! | `ble`      | TelemetryLink         | Bluedroid GATT server       |
//! | `hardware` | PpgSensorPort         | MAX30102 over I2C           |
//! |            | TemperatureSensorPort | MCP9808 over I2C            |
//! | `log_sink` | EventSink             | Serial log output           |
//! | `time`     | -                     | ESP32 high-resolution timer |

pub mod ble;
pub mod hardware;
pub mod log_sink;
pub mod time;
