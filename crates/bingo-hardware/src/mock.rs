//! Mock serial devices for testing and development.
//!
//! [`MockPortOpener`] stands in for the operating system's serial ports.
//! Tests keep the matching [`MockDeviceHandle`] to decide which ports exist,
//! feed device output, inspect the bytes the host wrote and simulate an
//! unplugged cable.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use bingo_hardware::mock::MockPortOpener;
//! use bingo_hardware::traits::PortOpener;
//!
//! let (opener, handle) = MockPortOpener::new();
//! handle.add_port("/dev/ttyACM0");
//! handle.push_line("/dev/ttyACM0", "GAME_STARTED");
//!
//! let mut channel = opener.open("/dev/ttyACM0", 9600, Duration::from_millis(100)).unwrap();
//! channel.write_all(b"N").unwrap();
//!
//! assert_eq!(channel.bytes_available().unwrap(), 13);
//! assert_eq!(handle.written("/dev/ttyACM0"), b"N");
//! ```

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bingo_protocol::{Command, DeviceEvent, ball_code};

use crate::error::{HardwareError, Result};
use crate::traits::{PortOpener, SerialChannel};

#[derive(Debug, Default)]
struct MockPort {
    openable: bool,
    unplugged: bool,
    fail_reads: bool,
    emulate_device: bool,
    incoming: VecDeque<u8>,
    written: Vec<u8>,
    open_count: usize,
    drawn_codes: BTreeSet<char>,
}

impl MockPort {
    fn push_line(&mut self, line: &str) {
        self.incoming.extend(line.as_bytes());
        self.incoming.push_back(b'\n');
    }

    /// Reply to `byte` the way the bridge board firmware does.
    fn respond(&mut self, byte: u8) {
        match Command::from_byte(byte) {
            Some(Command::NewGame) => {
                self.drawn_codes.clear();
                self.push_line("GAME_STARTED");
            }
            Some(Command::EndGame) => self.push_line("GAME_ENDED"),
            Some(Command::DrawBall) => {
                let next = (1..=25u8)
                    .filter_map(ball_code)
                    .find(|code| !self.drawn_codes.contains(code));
                if let Some(code) = next {
                    self.drawn_codes.insert(code);
                    self.push_line("BALL_RELEASED");
                    self.push_line(&format!("BALL:{code}"));
                }
            }
            None => {}
        }
    }
}

type Bus = Arc<Mutex<HashMap<String, MockPort>>>;

fn lock(bus: &Bus) -> MutexGuard<'_, HashMap<String, MockPort>> {
    bus.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock replacement for the operating system's serial ports.
#[derive(Debug, Clone)]
pub struct MockPortOpener {
    bus: Bus,
}

impl MockPortOpener {
    /// Create an opener with no ports, plus the handle that controls it.
    pub fn new() -> (Self, MockDeviceHandle) {
        let bus = Bus::default();
        (Self { bus: bus.clone() }, MockDeviceHandle { bus })
    }
}

impl PortOpener for MockPortOpener {
    fn open(
        &self,
        port: &str,
        _baud_rate: u32,
        _timeout: Duration,
    ) -> Result<Box<dyn SerialChannel>> {
        let mut ports = lock(&self.bus);
        match ports.get_mut(port) {
            Some(state) if state.openable && !state.unplugged => {
                state.open_count += 1;
                Ok(Box::new(MockChannel {
                    name: port.to_string(),
                    bus: self.bus.clone(),
                }))
            }
            Some(_) => Err(HardwareError::port_unavailable(port, "Permission denied")),
            None => Err(HardwareError::port_unavailable(port, "No such file or directory")),
        }
    }
}

/// Channel opened by [`MockPortOpener`].
#[derive(Debug)]
pub struct MockChannel {
    name: String,
    bus: Bus,
}

impl MockChannel {
    fn with_port<T>(&self, f: impl FnOnce(&mut MockPort) -> Result<T>) -> Result<T> {
        let mut ports = lock(&self.bus);
        let port = ports
            .get_mut(&self.name)
            .ok_or_else(|| HardwareError::link_failure(&self.name, "device removed"))?;
        if port.unplugged {
            return Err(HardwareError::link_failure(&self.name, "device unplugged"));
        }
        f(port)
    }
}

impl SerialChannel for MockChannel {
    fn port_name(&self) -> &str {
        &self.name
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.with_port(|port| {
            port.written.extend_from_slice(bytes);
            if port.emulate_device {
                for &byte in bytes {
                    port.respond(byte);
                }
            }
            Ok(())
        })
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let name = self.name.clone();
        self.with_port(|port| {
            if port.fail_reads {
                return Err(HardwareError::link_failure(name, "read failed"));
            }
            Ok(port.incoming.len())
        })
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        let name = self.name.clone();
        self.with_port(|port| {
            if port.fail_reads {
                return Err(HardwareError::link_failure(name, "read failed"));
            }
            let count = buf.len().min(port.incoming.len());
            for (slot, byte) in buf.iter_mut().zip(port.incoming.drain(..count)) {
                *slot = byte;
            }
            Ok(count)
        })
    }
}

/// Handle for controlling the ports of a [`MockPortOpener`].
#[derive(Debug, Clone)]
pub struct MockDeviceHandle {
    bus: Bus,
}

impl MockDeviceHandle {
    /// Register a port that opens successfully.
    pub fn add_port(&self, port: &str) {
        lock(&self.bus).insert(
            port.to_string(),
            MockPort {
                openable: true,
                ..MockPort::default()
            },
        );
    }

    /// Register a port that exists but refuses to open.
    pub fn add_locked_port(&self, port: &str) {
        lock(&self.bus).insert(port.to_string(), MockPort::default());
    }

    /// Register an openable port that answers commands like the bridge
    /// board: `N` → `GAME_STARTED`, `E` → `GAME_ENDED`, `D` →
    /// `BALL_RELEASED` then `BALL:<code>` (codes in order `A`, `B`, ...).
    pub fn add_emulated_device(&self, port: &str) {
        lock(&self.bus).insert(
            port.to_string(),
            MockPort {
                openable: true,
                emulate_device: true,
                ..MockPort::default()
            },
        );
    }

    /// Queue raw bytes for the host to read.
    pub fn push_raw(&self, port: &str, bytes: &[u8]) {
        if let Some(state) = lock(&self.bus).get_mut(port) {
            state.incoming.extend(bytes);
        }
    }

    /// Queue one newline-terminated line for the host to read.
    pub fn push_line(&self, port: &str, line: &str) {
        if let Some(state) = lock(&self.bus).get_mut(port) {
            state.push_line(line);
        }
    }

    /// Queue the wire form of `event`. Events without one are skipped.
    pub fn push_event(&self, port: &str, event: &DeviceEvent) {
        if let Some(line) = event.to_line() {
            self.push_line(port, &line);
        }
    }

    /// Every byte the host has written to `port`.
    pub fn written(&self, port: &str) -> Vec<u8> {
        lock(&self.bus)
            .get(port)
            .map(|state| state.written.clone())
            .unwrap_or_default()
    }

    /// Written bytes decoded as commands; unknown bytes are skipped.
    pub fn written_commands(&self, port: &str) -> Vec<Command> {
        self.written(port)
            .into_iter()
            .filter_map(Command::from_byte)
            .collect()
    }

    /// Number of times `port` has been opened.
    pub fn open_count(&self, port: &str) -> usize {
        lock(&self.bus)
            .get(port)
            .map_or(0, |state| state.open_count)
    }

    /// Make every later write and read on `port` fail, and refuse new opens.
    pub fn unplug(&self, port: &str) {
        if let Some(state) = lock(&self.bus).get_mut(port) {
            state.unplugged = true;
        }
    }

    /// Undo [`unplug`](Self::unplug).
    pub fn replug(&self, port: &str) {
        if let Some(state) = lock(&self.bus).get_mut(port) {
            state.unplugged = false;
        }
    }

    /// Make reads on `port` fail while writes keep working.
    pub fn fail_reads(&self, port: &str) {
        if let Some(state) = lock(&self.bus).get_mut(port) {
            state.fail_reads = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORT: &str = "/dev/ttyACM0";
    const TIMEOUT: Duration = Duration::from_millis(100);

    #[test]
    fn test_unknown_port_is_unavailable() {
        let (opener, _handle) = MockPortOpener::new();
        assert!(matches!(
            opener.open(PORT, 9600, TIMEOUT),
            Err(HardwareError::PortUnavailable { .. })
        ));
    }

    #[test]
    fn test_locked_port_is_unavailable() {
        let (opener, handle) = MockPortOpener::new();
        handle.add_locked_port(PORT);
        assert!(!opener.probe(PORT));
        assert_eq!(handle.open_count(PORT), 0);
    }

    #[test]
    fn test_read_drains_incoming() {
        let (opener, handle) = MockPortOpener::new();
        handle.add_port(PORT);
        handle.push_event(PORT, &DeviceEvent::ball(3));

        let mut channel = opener.open(PORT, 9600, TIMEOUT).unwrap();
        let mut buf = [0u8; 64];
        let n = channel.read_available(&mut buf).unwrap();

        assert_eq!(&buf[..n], b"BALL:C\n");
        assert_eq!(channel.bytes_available().unwrap(), 0);
    }

    #[test]
    fn test_unplug_fails_io() {
        let (opener, handle) = MockPortOpener::new();
        handle.add_port(PORT);
        let mut channel = opener.open(PORT, 9600, TIMEOUT).unwrap();

        handle.unplug(PORT);
        assert!(channel.write_all(b"D").unwrap_err().is_link_failure());
        assert!(channel.bytes_available().is_err());
        assert!(!opener.probe(PORT));
    }

    #[test]
    fn test_emulated_device_answers_commands() {
        let (opener, handle) = MockPortOpener::new();
        handle.add_emulated_device(PORT);
        let mut channel = opener.open(PORT, 9600, TIMEOUT).unwrap();

        channel.write_all(b"ND").unwrap();
        let mut buf = [0u8; 128];
        let n = channel.read_available(&mut buf).unwrap();

        assert_eq!(
            std::str::from_utf8(&buf[..n]).unwrap(),
            "GAME_STARTED\nBALL_RELEASED\nBALL:A\n"
        );
        assert_eq!(
            handle.written_commands(PORT),
            vec![Command::NewGame, Command::DrawBall]
        );
    }
}
