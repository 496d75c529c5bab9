//! Serial transport abstraction.
//!
//! [`PortOpener`] creates [`SerialChannel`]s. The production implementation
//! wraps the `serialport` crate ([`SystemPorts`](crate::serial::SystemPorts));
//! tests swap in [`MockPortOpener`](crate::mock::MockPortOpener) to script a
//! device without hardware.
//!
//! Channels are synchronous and must never block for longer than their
//! configured read timeout.

use std::fmt;
use std::time::Duration;

use bingo_core::constants::DEFAULT_BAUD_RATE;

use crate::error::Result;

/// Read timeout used when probing whether a port can be opened.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(10);

/// An open serial connection.
pub trait SerialChannel: Send + fmt::Debug {
    /// Name the channel was opened with.
    fn port_name(&self) -> &str;

    /// Write every byte of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::LinkFailure`](crate::HardwareError::LinkFailure)
    /// if the device rejects the write.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Number of bytes waiting in the receive buffer.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read up to `buf.len()` bytes that are already buffered.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Factory for serial channels.
pub trait PortOpener: Send + Sync + fmt::Debug {
    /// Open `port` at `baud_rate` with the given read timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::PortUnavailable`](crate::HardwareError::PortUnavailable)
    /// if the device cannot be opened.
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Box<dyn SerialChannel>>;

    /// Whether `port` can be opened right now. The channel is closed again
    /// immediately.
    fn probe(&self, port: &str) -> bool {
        self.open(port, DEFAULT_BAUD_RATE, PROBE_TIMEOUT).is_ok()
    }
}
