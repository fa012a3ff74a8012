//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements | Connects to                      |
//! |--------------|------------|----------------------------------|
//! | `ina260`     | SensorPort | INA260 power monitors over I2C   |
//! | `cloud_mqtt` | CloudPort  | MQTT broker (LightDB-style tree) |
//! | `log_sink`   | EventSink  | Serial log output                |
//! | `time`       | —          | ESP32 system timer               |

pub mod cloud_mqtt;
pub mod ina260;
pub mod log_sink;
pub mod time;
