//! System configuration parameters
//!
//! All tunables for the gate controller and its network link.  Passed
//! explicitly into the controller and application service so tests can run
//! with compressed time constants.
//!
//! Firmware builds start from [`GateConfig::default`]; a JSON document in
//! the `SWINGGATE_CONFIG` build environment overrides individual fields
//! (see [`GateConfig::from_json`]).

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Core gate configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    // --- Motion ---
    /// Assumed maximum time for a full open or close motion (milliseconds).
    /// Governs every "did the motion finish" decision.
    pub travel_duration_ms: u32,

    // --- Relays ---
    /// Width of an open/close relay pulse (milliseconds).
    pub relay_pulse_ms: u32,

    // --- Inputs ---
    /// Settle window for the position sensor (milliseconds).
    pub sensor_debounce_ms: u32,
    /// Settle window for the manual button (milliseconds).
    pub button_debounce_ms: u32,
    /// `true` when a high level on the sensor pin means "fully closed".
    pub sensor_closed_high: bool,

    // --- Timing ---
    /// Host loop cadence (milliseconds).
    pub poll_interval_ms: u32,
    /// LED blink half-period (milliseconds).
    pub led_blink_interval_ms: u32,
    /// Periodic status report interval (milliseconds).
    pub status_interval_ms: u32,
    /// A single loop iteration longer than this is logged as an overrun.
    pub loop_overrun_warn_ms: u32,

    // --- Network ---
    /// Station SSID.  Empty disables Wi-Fi and with it the MQTT link.
    pub wifi_ssid: String,
    /// WPA2 passphrase, empty for an open network.
    pub wifi_password: String,
    pub mqtt_broker: String,
    pub mqtt_port: u16,
    /// Topic the status JSON is published to.
    pub mqtt_status_topic: String,
    /// Topic carrying `OPEN` / `CLOSE` / `TOGGLE` payloads.
    pub mqtt_command_topic: String,
    /// Delay between broker connection attempts (milliseconds).
    pub mqtt_reconnect_interval_ms: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            // Motion
            travel_duration_ms: 20_000,

            // Relays
            relay_pulse_ms: 500,

            // Inputs
            sensor_debounce_ms: 50,
            button_debounce_ms: 50,
            sensor_closed_high: true,

            // Timing
            poll_interval_ms: 10,
            led_blink_interval_ms: 500,
            status_interval_ms: 10_000,
            loop_overrun_warn_ms: 1_000,

            // Network
            wifi_ssid: String::new(),
            wifi_password: String::new(),
            mqtt_broker: "broker.hivemq.com".into(),
            mqtt_port: 1883,
            mqtt_status_topic: "gateguardian/status3".into(),
            mqtt_command_topic: "gateguardian/command3".into(),
            mqtt_reconnect_interval_ms: 10_000,
        }
    }
}

impl GateConfig {
    /// Parse a (possibly partial) JSON document over the defaults and
    /// validate the result.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// `mqtt://host:port` for the configured broker.
    pub fn mqtt_url(&self) -> String {
        format!("mqtt://{}:{}", self.mqtt_broker, self.mqtt_port)
    }

    /// Reject values that would break the controller's timing guarantees.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self.travel_duration_ms == 0 {
            return Err(ConfigError::Invalid("travel_duration_ms must be > 0"));
        }
        if self.relay_pulse_ms == 0 {
            return Err(ConfigError::Invalid("relay_pulse_ms must be > 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be > 0"));
        }
        if self.relay_pulse_ms >= self.travel_duration_ms {
            return Err(ConfigError::Invalid(
                "relay_pulse_ms must be shorter than travel_duration_ms",
            ));
        }
        // The relay backstop runs once per poll; its slack must stay below one pulse.
        if self.poll_interval_ms >= self.relay_pulse_ms {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be shorter than relay_pulse_ms",
            ));
        }
        if self.sensor_debounce_ms >= self.travel_duration_ms {
            return Err(ConfigError::Invalid(
                "sensor_debounce_ms must be shorter than travel_duration_ms",
            ));
        }
        if self.led_blink_interval_ms == 0 {
            return Err(ConfigError::Invalid("led_blink_interval_ms must be > 0"));
        }
        if self.status_interval_ms == 0 {
            return Err(ConfigError::Invalid("status_interval_ms must be > 0"));
        }
        if self.mqtt_broker.is_empty() || self.mqtt_port == 0 {
            return Err(ConfigError::Invalid("mqtt_broker and mqtt_port must be set"));
        }
        if self.mqtt_status_topic.is_empty() || self.mqtt_command_topic.is_empty() {
            return Err(ConfigError::Invalid("MQTT topics must not be empty"));
        }
        if self.mqtt_status_topic == self.mqtt_command_topic {
            return Err(ConfigError::Invalid(
                "status and command topics must differ",
            ));
        }
        if self.mqtt_reconnect_interval_ms == 0 {
            return Err(ConfigError::Invalid("mqtt_reconnect_interval_ms must be > 0"));
        }
        Ok(())
    }
}
