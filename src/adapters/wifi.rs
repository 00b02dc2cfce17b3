//! Wi-Fi station-mode adapter.
//!
//! Implements [`ConnectivityPort`] for the link the MQTT adapter rides on.
//! A dedicated supervisor thread owns the adapter so association and
//! backoff never stall the control loop.
//!
//! ## cfg gating
//!
//! - **`espidf`**: `esp_idf_svc::wifi::BlockingWifi` over `EspWifi`.
//! - **host**: a simulated link with failure injection for tests.
//!
//! ## Reconnection policy
//!
//! After a failed attempt or a lost link the adapter waits an exponential
//! backoff (2 s, 4 s, 8 s ... capped at 60 s) before the next attempt.

use core::fmt;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{error, info, warn};

use crate::app::ports::Clock;

#[cfg(feature = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

pub trait ConnectivityPort {
    fn connect(&mut self, now_ms: u32) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    /// Drive reconnection.  Call periodically.
    fn poll(&mut self, now_ms: u32);
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
    Reconnecting { attempt: u32 },
}

const INITIAL_BACKOFF_MS: u32 = 2_000;
const MAX_BACKOFF_MS: u32 = 60_000;

const SUPERVISOR_STACK_SIZE: usize = 8192;
const SUPERVISOR_PERIOD: Duration = Duration::from_secs(1);

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff_ms: u32,
    next_attempt_ms: u32,
    #[cfg(feature = "espidf")]
    driver: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(feature = "espidf"))]
    sim: SimLink,
}

/// Simulated access point.
#[cfg(not(feature = "espidf"))]
#[derive(Debug, Default)]
struct SimLink {
    up: bool,
    failures_left: u32,
    attempts: u32,
}

#[cfg(not(feature = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiAdapter {
    #[cfg(feature = "espidf")]
    pub fn new(driver: BlockingWifi<EspWifi<'static>>) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_ms: INITIAL_BACKOFF_MS,
            next_attempt_ms: 0,
            driver,
        }
    }

    #[cfg(not(feature = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_ms: INITIAL_BACKOFF_MS,
            next_attempt_ms: 0,
            sim: SimLink::default(),
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    fn on_link_up(&mut self) {
        self.state = WifiState::Connected;
        self.backoff_ms = INITIAL_BACKOFF_MS;
    }

    fn schedule_retry(&mut self, now_ms: u32, attempt: u32) {
        self.state = WifiState::Reconnecting { attempt };
        self.next_attempt_ms = now_ms.wrapping_add(self.backoff_ms);
        self.backoff_ms = self.backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(feature = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        let config = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method: if self.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });
        bring_up(&mut self.driver, &config).map_err(|e| {
            warn!("WiFi: {}", e);
            ConnectivityError::ConnectionFailed
        })
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.sim.attempts += 1;
        if self.sim.failures_left > 0 {
            self.sim.failures_left -= 1;
            warn!("WiFi(sim): association failed (attempt {})", self.sim.attempts);
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.sim.up = true;
        info!("WiFi(sim): associated with '{}' (attempt {})", self.ssid, self.sim.attempts);
        Ok(())
    }

    #[cfg(feature = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.driver.disconnect() {
            warn!("WiFi: disconnect failed: {}", e);
        }
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim.up = false;
    }

    #[cfg(feature = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver.is_connected().unwrap_or(false)
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim.up
    }

    // ── Simulation controls ───────────────────────────────────

    /// Make the next `n` association attempts fail.
    #[cfg(not(feature = "espidf"))]
    pub fn sim_fail_next(&mut self, n: u32) {
        self.sim.failures_left = n;
    }

    /// Drop the link as if the access point went away.
    #[cfg(not(feature = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        self.sim.up = false;
    }

    #[cfg(not(feature = "espidf"))]
    pub fn sim_attempts(&self) -> u32 {
        self.sim.attempts
    }
}

#[cfg(feature = "espidf")]
fn bring_up(
    driver: &mut BlockingWifi<EspWifi<'static>>,
    config: &Configuration,
) -> Result<(), esp_idf_svc::sys::EspError> {
    driver.set_configuration(config)?;
    if !driver.is_started()? {
        driver.start()?;
    }
    driver.connect()?;
    driver.wait_netif_up()
}

fn is_due(now_ms: u32, deadline_ms: u32) -> bool {
    (now_ms.wrapping_sub(deadline_ms) as i32) >= 0
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self, now_ms: u32) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        match self.platform_connect() {
            Ok(()) => {
                self.on_link_up();
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.schedule_retry(now_ms, 0);
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        self.backoff_ms = INITIAL_BACKOFF_MS;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }

    fn poll(&mut self, now_ms: u32) {
        match self.state {
            WifiState::Reconnecting { attempt } => {
                if !is_due(now_ms, self.next_attempt_ms) {
                    return;
                }
                info!("WiFi: reconnect attempt {} (backoff {} ms)", attempt + 1, self.backoff_ms);
                match self.platform_connect() {
                    Ok(()) => {
                        self.on_link_up();
                        info!("WiFi: reconnected");
                    }
                    Err(_) => self.schedule_retry(now_ms, attempt + 1),
                }
            }
            WifiState::Connected => {
                if !self.platform_is_connected() {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.schedule_retry(now_ms, 0);
                }
            }
            WifiState::Disconnected => {}
        }
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Supervisor thread
// ───────────────────────────────────────────────────────────────

/// Connect, then keep the link up from a dedicated thread.
pub fn spawn_supervisor<C>(mut wifi: WifiAdapter, clock: C) -> io::Result<JoinHandle<()>>
where
    C: Clock + Send + 'static,
{
    thread::Builder::new()
        .name("wifi".into())
        .stack_size(SUPERVISOR_STACK_SIZE)
        .spawn(move || {
            if let Err(e) = wifi.connect(clock.now_ms()) {
                warn!("WiFi: {}, retrying in background", e);
            }
            loop {
                wifi.poll(clock.now_ms());
                thread::sleep(SUPERVISOR_PERIOD);
            }
        })
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
