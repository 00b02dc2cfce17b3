//! SwingGate firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  PinDriver (GPIO)   MonotonicClock   LogEventSink   Console    │
//! │  (embedded-hal)     (Clock)          (EventSink)    (Inbox)    │
//! │                                                                │
//! │  WifiAdapter        MqttLink (EventSink + Inbox)               │
//! │  (ConnectivityPort)                                            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │      AppService  ·  GateController  ·  RelayActuator    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, ensure};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{IOPin, OutputPin, Pin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{info, warn};

use swinggate::adapters::command_inbox::CommandInbox;
use swinggate::adapters::console::spawn_console_reader;
use swinggate::adapters::device_id;
use swinggate::adapters::log_sink::LogEventSink;
use swinggate::adapters::mqtt::MqttLink;
use swinggate::adapters::time::MonotonicClock;
use swinggate::adapters::wifi::{self, ConnectivityPort, WifiAdapter};
use swinggate::app::ports::Clock;
use swinggate::app::service::AppService;
use swinggate::config::GateConfig;
use swinggate::drivers::button::ButtonDriver;
use swinggate::drivers::status_led::StatusLed;
use swinggate::gate::GateController;
use swinggate::gate::relay::RelayActuator;
use swinggate::gate::sensor::DebouncedSensor;
use swinggate::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SwingGate v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = match option_env!("SWINGGATE_CONFIG") {
        Some(json) => GateConfig::from_json(json)?,
        None => GateConfig::default(),
    };
    config.validate()?;
    info!(
        "Config: travel={}ms pulse={}ms debounce={}ms poll={}ms",
        config.travel_duration_ms,
        config.relay_pulse_ms,
        config.sensor_debounce_ms,
        config.poll_interval_ms
    );

    // ── 3. GPIO ───────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let gpio = peripherals.pins;

    let mut sensor_pin = PinDriver::input(wired(gpio.gpio22, pins::GATE_SENSOR_GPIO)?.downgrade())?;
    // Idle (switch disengaged) must read as "not closed".
    sensor_pin.set_pull(if config.sensor_closed_high { Pull::Down } else { Pull::Up })?;

    let mut button_pin = PinDriver::input(wired(gpio.gpio13, pins::BUTTON_GPIO)?.downgrade())?;
    button_pin.set_pull(Pull::Up)?;

    let relay_open = PinDriver::output(wired(gpio.gpio2, pins::RELAY_OPEN_GPIO)?.downgrade_output())?;
    let relay_close = PinDriver::output(wired(gpio.gpio0, pins::RELAY_CLOSE_GPIO)?.downgrade_output())?;
    let led_red = PinDriver::output(wired(gpio.gpio12, pins::LED_RED_GPIO)?.downgrade_output())?;
    let led_green = PinDriver::output(wired(gpio.gpio14, pins::LED_GREEN_GPIO)?.downgrade_output())?;

    // ── 4. Gate core + application service ────────────────────
    let gate = GateController::new(
        config.clone(),
        DebouncedSensor::new(sensor_pin, config.sensor_closed_high, config.sensor_debounce_ms),
        RelayActuator::new(relay_open, relay_close, config.relay_pulse_ms),
        MonotonicClock::new(),
    );
    let button = ButtonDriver::new(button_pin, config.button_debounce_ms);
    let led = StatusLed::new(led_red, led_green, config.led_blink_interval_ms);

    let id = device_id::device_id(&device_id::read_mac());
    info!("Device ID: {}", id);

    let mut service = AppService::new(gate, button, led, &id);
    let log_sink = LogEventSink::new();

    // ── 5. Command intake ─────────────────────────────────────
    let inbox = CommandInbox::new();
    let _console = spawn_console_reader(inbox.clone())?;

    // ── 6. Network ────────────────────────────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let mut station = WifiAdapter::new(BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?);
    let _wifi = match station.set_credentials(&config.wifi_ssid, &config.wifi_password) {
        Ok(()) => Some(wifi::spawn_supervisor(station, MonotonicClock::new())?),
        Err(e) => {
            warn!("WiFi: {}; MQTT link stays offline", e);
            None
        }
    };

    let clock = MonotonicClock::new();
    let mqtt = MqttLink::new(&config, &id, inbox.clone());
    let mut sink = (log_sink, mqtt);

    // ── 7. Control loop ───────────────────────────────────────
    service.start(&mut sink);
    info!("Entering control loop ({} ms cadence)", config.poll_interval_ms);

    loop {
        sink.1.poll(clock.now_ms());
        for command in inbox.drain() {
            // Rejections are reported through the sink.
            let _ = service.handle_command(command, &mut sink);
        }
        service.tick(&mut sink);
        FreeRtos::delay_ms(config.poll_interval_ms);
    }
}

/// Cross-check a claimed pin against the board map in `pins.rs`.
fn wired<P: Pin>(pin: P, expected: i32) -> Result<P> {
    ensure!(
        pin.pin() == expected,
        "GPIO{} claimed where pins.rs expects GPIO{}",
        pin.pin(),
        expected
    );
    Ok(pin)
}
