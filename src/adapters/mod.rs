//! Adapters: concrete implementations of the port traits and the
//! command surfaces around the gate.
//!
//! | Adapter         | Implements / provides | Connects to               |
//! |-----------------|-----------------------|---------------------------|
//! | `command_inbox` | command queue         | any thread → control loop |
//! | `console`       | command source        | stdin / UART0             |
//! | `device_id`     | device identity       | eFuse MAC                 |
//! | `log_sink`      | EventSink             | Serial log output         |
//! | `mqtt`          | EventSink, commands   | MQTT broker               |
//! | `sim`           | Clock, digital pins   | In-memory (host)          |
//! | `time`          | Clock                 | ESP32 system timer        |
//! | `wifi`          | ConnectivityPort      | ESP32 WiFi STA            |

pub mod command_inbox;
pub mod console;
pub mod device_id;
pub mod log_sink;
pub mod mqtt;
pub mod sim;
pub mod time;
pub mod wifi;
