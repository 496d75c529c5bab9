//! Physical serial link to the ball machine.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{HardwareError, Result};
use crate::traits::{PortOpener, SerialChannel};

/// Upper bound on bytes drained by one [`HardwareLink::receive`].
const MAX_READ: usize = 4096;

#[derive(Debug)]
enum LinkState {
    Closed,
    Open(Box<dyn SerialChannel>),
    Failed { port: String },
}

/// Owns at most one open serial channel.
///
/// A failed write or read closes the channel and leaves the link in a failed
/// state; the owner decides what happens next. The link never retries.
#[derive(Debug)]
pub struct HardwareLink {
    state: LinkState,
}

impl Default for HardwareLink {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareLink {
    pub fn new() -> Self {
        Self {
            state: LinkState::Closed,
        }
    }

    /// Open `port`, closing whatever was open before.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::PortUnavailable`] with the OS error when the
    /// port cannot be opened.
    pub fn connect(
        &mut self,
        opener: &dyn PortOpener,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<()> {
        self.close();
        let channel = opener.open(port, baud_rate, timeout)?;
        info!(port = %port, baud_rate, "Serial link open");
        self.state = LinkState::Open(channel);
        Ok(())
    }

    /// Write `bytes` to the device.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::NotConnected`] when nothing is open, or
    /// [`HardwareError::LinkFailure`] when the write fails. A failed write
    /// leaves the link failed.
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let LinkState::Open(channel) = &mut self.state else {
            return Err(HardwareError::NotConnected);
        };
        match channel.write_all(bytes) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Bytes the device has sent since the last call, possibly none.
    ///
    /// Never waits for data to arrive.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send), for reads.
    pub fn receive(&mut self) -> Result<Vec<u8>> {
        let LinkState::Open(channel) = &mut self.state else {
            return Err(HardwareError::NotConnected);
        };
        match drain(channel.as_mut()) {
            Ok(bytes) => Ok(bytes),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Release the OS handle. Safe to call at any time.
    pub fn close(&mut self) {
        if let LinkState::Open(channel) = &self.state {
            debug!(port = %channel.port_name(), "Closing serial link");
        }
        self.state = LinkState::Closed;
    }

    /// Name of the open or last failed port.
    pub fn port(&self) -> Option<&str> {
        match &self.state {
            LinkState::Closed => None,
            LinkState::Open(channel) => Some(channel.port_name()),
            LinkState::Failed { port } => Some(port),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, LinkState::Open(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, LinkState::Failed { .. })
    }

    fn fail(&mut self, error: HardwareError) -> HardwareError {
        let port = self.port().unwrap_or_default().to_string();
        warn!(port = %port, error = %error, "Serial link failed");
        let error = match error {
            HardwareError::LinkFailure { .. } => error,
            other => HardwareError::link_failure(&port, other),
        };
        self.state = LinkState::Failed { port };
        error
    }
}

fn drain(channel: &mut dyn SerialChannel) -> Result<Vec<u8>> {
    let available = channel.bytes_available()?.min(MAX_READ);
    if available == 0 {
        return Ok(Vec::new());
    }
    let mut buf = vec![0u8; available];
    let read = channel.read_available(&mut buf)?;
    buf.truncate(read);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPortOpener;

    const PORT: &str = "/dev/ttyACM0";
    const TIMEOUT: Duration = Duration::from_millis(100);

    #[test]
    fn test_connect_failure_reports_port_error() {
        let (opener, _handle) = MockPortOpener::new();
        let mut link = HardwareLink::new();

        let result = link.connect(&opener, PORT, 9600, TIMEOUT);
        assert!(matches!(result, Err(HardwareError::PortUnavailable { .. })));
        assert!(!link.is_open());
    }

    #[test]
    fn test_send_and_receive() {
        let (opener, handle) = MockPortOpener::new();
        handle.add_port(PORT);
        let mut link = HardwareLink::new();
        link.connect(&opener, PORT, 9600, TIMEOUT).unwrap();

        link.send(b"N").unwrap();
        assert_eq!(handle.written(PORT), b"N");

        assert!(link.receive().unwrap().is_empty());
        handle.push_line(PORT, "GAME_STARTED");
        assert_eq!(link.receive().unwrap(), b"GAME_STARTED\n");
    }

    #[test]
    fn test_write_failure_marks_link_failed() {
        let (opener, handle) = MockPortOpener::new();
        handle.add_port(PORT);
        let mut link = HardwareLink::new();
        link.connect(&opener, PORT, 9600, TIMEOUT).unwrap();

        handle.unplug(PORT);
        let error = link.send(b"D").unwrap_err();

        assert!(error.is_link_failure());
        assert!(link.is_failed());
        assert_eq!(link.port(), Some(PORT));
        assert!(matches!(link.send(b"D"), Err(HardwareError::NotConnected)));
    }

    #[test]
    fn test_read_failure_marks_link_failed() {
        let (opener, handle) = MockPortOpener::new();
        handle.add_port(PORT);
        let mut link = HardwareLink::new();
        link.connect(&opener, PORT, 9600, TIMEOUT).unwrap();

        handle.fail_reads(PORT);
        assert!(link.receive().unwrap_err().is_link_failure());
        assert!(link.is_failed());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut link = HardwareLink::new();
        link.close();
        link.close();
        assert!(!link.is_open());
        assert_eq!(link.port(), None);
    }
}
