//! Facade over the serial link and the fallback simulator.
//!
//! [`ArduinoBridge`] decides centrally whether commands go to the device or
//! to the simulator. Every I/O failure on the link moves the bridge to
//! [`ConnectionState::Fallback`], after which the simulator keeps the game
//! playable. The only way back to the device is an explicit
//! [`reconnect`](ArduinoBridge::reconnect).
//!
//! ```
//! use bingo_hardware::ArduinoBridge;
//! use bingo_protocol::{Command, DeviceEvent};
//!
//! let mut bridge = ArduinoBridge::simulated();
//! assert!(bridge.fallback_active());
//!
//! assert_eq!(bridge.send_command(Command::NewGame), vec![DeviceEvent::GameStarted]);
//! assert_eq!(bridge.send_command(Command::DrawBall).len(), 1);
//! ```

use std::fmt;
use std::time::Duration;

use bingo_core::{SerialSettings, SettingsStore};
use bingo_protocol::{Command, DeviceEvent, decode_batch, decode_line};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::discovery::PortDiscovery;
use crate::link::HardwareLink;
use crate::serial::SystemPorts;
use crate::simulator::FallbackSimulator;
use crate::traits::PortOpener;

/// Where commands currently go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection attempt has been made yet.
    Disconnected,
    /// Commands go to the device on `port`.
    Connected { port: String },
    /// Commands go to the in-process simulator.
    Fallback,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connected { port } => write!(f, "connected ({port})"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Snapshot of the bridge for display collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeStatus {
    pub state: ConnectionState,
    pub port: Option<String>,
    pub simulated: bool,
}

#[derive(Debug)]
pub struct ArduinoBridge {
    opener: Box<dyn PortOpener>,
    discovery: PortDiscovery,
    link: HardwareLink,
    simulator: FallbackSimulator,
    state: ConnectionState,
    /// Trailing fragment from the last read that is not a message yet.
    pending: String,
}

impl ArduinoBridge {
    /// Bridge that opens ports through `opener`. Call
    /// [`connect`](Self::connect) before sending commands.
    pub fn new(opener: Box<dyn PortOpener>) -> Self {
        Self {
            opener,
            discovery: PortDiscovery::new(),
            link: HardwareLink::new(),
            simulator: FallbackSimulator::new(),
            state: ConnectionState::Disconnected,
            pending: String::new(),
        }
    }

    /// Bridge on the system serial ports.
    pub fn system() -> Self {
        Self::new(Box::new(SystemPorts))
    }

    /// Bridge that never touches a port and starts in fallback.
    pub fn simulated() -> Self {
        let mut bridge = Self::system();
        bridge.state = ConnectionState::Fallback;
        bridge
    }

    pub fn with_discovery(mut self, discovery: PortDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_simulator(mut self, simulator: FallbackSimulator) -> Self {
        self.simulator = simulator;
        self
    }

    /// Connect according to `serial`.
    ///
    /// With auto-detect on, every discovered port is tried in order and the
    /// first one that opens wins; the winner is written back to `store` when
    /// it differs from the configured port. Otherwise only the configured
    /// port is tried. If nothing opens, the bridge enters fallback.
    pub fn connect(&mut self, serial: &SerialSettings, store: &mut dyn SettingsStore) {
        self.link.close();
        self.pending.clear();

        let timeout = serial.read_timeout();
        if serial.auto_detect {
            let candidates = self.discovery.list_candidate_ports(self.opener.as_ref());
            for port in candidates {
                if self.try_connect(&port, serial.baudrate, timeout) {
                    if port != serial.port {
                        persist_port(store, &port);
                    }
                    return;
                }
            }
            self.enter_fallback("no serial port could be opened");
        } else if !self.try_connect(&serial.port, serial.baudrate, timeout) {
            self.enter_fallback("configured serial port could not be opened");
        }
    }

    /// Drop any link and connect again. This is the only path from
    /// fallback back to the device.
    pub fn reconnect(&mut self, serial: &SerialSettings, store: &mut dyn SettingsStore) {
        info!("Reconnecting to ball machine");
        self.connect(serial, store);
    }

    /// Send `command` to whatever currently serves the game.
    ///
    /// In fallback the simulator's events are returned directly. When
    /// connected the device answers through [`read_message`](Self::read_message)
    /// and the result is empty. A failed write switches to fallback and the
    /// command is not retried.
    pub fn send_command(&mut self, command: Command) -> Vec<DeviceEvent> {
        match self.state {
            ConnectionState::Connected { .. } => {
                self.simulator.sync_command(command);
                if let Err(e) = self.link.send(&[command.as_byte()]) {
                    warn!(command = %command, "Command lost on failed link");
                    self.enter_fallback(&e.to_string());
                }
                Vec::new()
            }
            ConnectionState::Fallback => self.simulator.handle_command(command),
            ConnectionState::Disconnected => {
                warn!(command = %command, "Dropping command while disconnected");
                Vec::new()
            }
        }
    }

    /// Text the device has sent since the last call.
    ///
    /// A trailing line without a newline is released when it already decodes
    /// as a message and held for the next read otherwise.
    ///
    /// Empty when nothing arrived, when not connected, and after a read or
    /// UTF-8 failure (which also switches to fallback).
    pub fn read_message(&mut self) -> String {
        if !self.is_connected() {
            return String::new();
        }

        let bytes = match self.link.receive() {
            Ok(bytes) => bytes,
            Err(e) => {
                self.enter_fallback(&e.to_string());
                return String::new();
            }
        };
        if bytes.is_empty() {
            return String::new();
        }

        match String::from_utf8(bytes) {
            Ok(text) => {
                self.pending.push_str(&text);
                let start = self.pending.rfind('\n').map_or(0, |end| end + 1);
                if decode_line(&self.pending[start..]).is_ok() {
                    return std::mem::take(&mut self.pending);
                }
                let tail = self.pending.split_off(start);
                std::mem::replace(&mut self.pending, tail)
            }
            Err(e) => {
                self.enter_fallback(&format!("device sent invalid UTF-8: {e}"));
                String::new()
            }
        }
    }

    /// Read and decode device output. Every event is also recorded by the
    /// simulator so it can continue the game after a failover.
    pub fn poll_events(&mut self) -> Vec<DeviceEvent> {
        let text = self.read_message();
        if text.is_empty() {
            return Vec::new();
        }
        let events = decode_batch(&text);
        for event in &events {
            debug!(event = %event, "Device event");
            self.simulator.observe(event);
        }
        events
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn port(&self) -> Option<&str> {
        match &self.state {
            ConnectionState::Connected { port } => Some(port),
            _ => None,
        }
    }

    pub fn status(&self) -> BridgeStatus {
        BridgeStatus {
            state: self.state.clone(),
            port: self.port().map(str::to_string),
            simulated: self.fallback_active(),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected { .. })
    }

    pub fn fallback_active(&self) -> bool {
        self.state == ConnectionState::Fallback
    }

    pub fn simulator(&self) -> &FallbackSimulator {
        &self.simulator
    }

    /// Release the serial port. The bridge returns to
    /// [`ConnectionState::Disconnected`].
    pub fn close(&mut self) {
        self.link.close();
        self.pending.clear();
        self.state = ConnectionState::Disconnected;
    }

    fn try_connect(&mut self, port: &str, baud_rate: u32, timeout: Duration) -> bool {
        match self.link.connect(self.opener.as_ref(), port, baud_rate, timeout) {
            Ok(()) => {
                info!(port = %port, "Connected to ball machine");
                self.state = ConnectionState::Connected {
                    port: port.to_string(),
                };
                true
            }
            Err(e) => {
                debug!(port = %port, error = %e, "Cannot open port");
                false
            }
        }
    }

    fn enter_fallback(&mut self, reason: &str) {
        self.link.close();
        self.pending.clear();
        if self.state != ConnectionState::Fallback {
            warn!(reason = %reason, "Ball machine unavailable, using simulator");
        }
        self.state = ConnectionState::Fallback;
    }
}

fn persist_port(store: &mut dyn SettingsStore, port: &str) {
    match store.persist_port(port) {
        Ok(()) => info!(port = %port, "Saved detected serial port"),
        Err(e) => error!(port = %port, error = %e, "Failed to save detected serial port"),
    }
}

impl Drop for ArduinoBridge {
    fn drop(&mut self) {
        self.link.close();
    }
}
