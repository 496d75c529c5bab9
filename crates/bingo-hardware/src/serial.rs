//! `serialport`-backed channels for real hardware.

use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{HardwareError, Result};
use crate::traits::{PortOpener, SerialChannel};

/// Opens operating-system serial ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

impl PortOpener for SystemPorts {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Box<dyn SerialChannel>> {
        debug!("Opening {} at {} baud", port, baud_rate);
        let serial = serialport::new(port, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| HardwareError::port_unavailable(port, e))?;

        Ok(Box::new(SystemChannel {
            name: port.to_string(),
            port: serial,
        }))
    }
}

/// An open operating-system serial port.
pub struct SystemChannel {
    name: String,
    port: Box<dyn serialport::SerialPort>,
}

impl fmt::Debug for SystemChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemChannel")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl SerialChannel for SystemChannel {
    fn port_name(&self) -> &str {
        &self.name
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.port
            .write_all(bytes)
            .and_then(|()| self.port.flush())
            .map_err(|e| HardwareError::link_failure(&self.name, e))?;
        trace!("Wrote {} byte(s) to {}", bytes.len(), self.name);
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(|e| HardwareError::link_failure(&self.name, e))
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Ok(0)
            }
            Err(e) => Err(HardwareError::link_failure(&self.name, e)),
        }
    }
}
