//! Serial port discovery.
//!
//! Candidate names are enumerated per platform and then verified by opening
//! each one briefly through a [`PortOpener`]. Only ports that open are
//! returned, in enumeration order.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::traits::PortOpener;

/// Highest `COMn` index scanned on Windows.
const MAX_COM_PORT: u16 = 256;

/// macOS device names that can belong to a USB ball machine.
const MACOS_PATTERNS: [&str; 2] = ["tty.usbmodem*", "tty.usbserial*"];

/// Substrings of macOS device names that are never a ball machine.
const MACOS_EXCLUDED: [&str; 4] = ["debug-console", "Bluetooth", "iPhone", "iPad"];

/// Operating system family, which decides how ports are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl HostPlatform {
    /// Platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(unix) {
            Self::Linux
        } else {
            Self::Other
        }
    }
}

/// Enumerates serial ports that may host the ball machine.
#[derive(Debug, Clone)]
pub struct PortDiscovery {
    platform: HostPlatform,
    device_dir: PathBuf,
}

impl Default for PortDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl PortDiscovery {
    pub fn new() -> Self {
        Self {
            platform: HostPlatform::current(),
            device_dir: PathBuf::from("/dev"),
        }
    }

    /// Enumerate ports as `platform` names them.
    pub fn with_platform(mut self, platform: HostPlatform) -> Self {
        self.platform = platform;
        self
    }

    /// Scan `dir` instead of `/dev` on Unix platforms.
    pub fn with_device_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.device_dir = dir.into();
        self
    }

    pub fn platform(&self) -> HostPlatform {
        self.platform
    }

    /// Port names worth probing, before verification.
    pub fn candidate_names(&self) -> Vec<String> {
        match self.platform {
            HostPlatform::Windows => (1..=MAX_COM_PORT).map(|i| format!("COM{i}")).collect(),
            HostPlatform::Linux | HostPlatform::MacOs => self.scan_device_dir(),
            HostPlatform::Other => Vec::new(),
        }
    }

    /// Candidate ports that `opener` can open right now.
    ///
    /// Each candidate is opened and closed again immediately.
    pub fn list_candidate_ports(&self, opener: &dyn PortOpener) -> Vec<String> {
        let ports: Vec<String> = self
            .candidate_names()
            .into_iter()
            .filter(|port| {
                let ok = opener.probe(port);
                trace!(port = %port, ok, "Probed serial port");
                ok
            })
            .collect();

        debug!(count = ports.len(), ports = ?ports, "Discovered serial ports");
        ports
    }

    /// Glob patterns for the platform's serial devices under the device
    /// directory.
    fn device_patterns(&self) -> Vec<String> {
        let dir = glob::Pattern::escape(&self.device_dir.to_string_lossy());
        match self.platform {
            HostPlatform::Linux => vec![format!("{dir}/tty[A-Za-z]*")],
            HostPlatform::MacOs => MACOS_PATTERNS
                .iter()
                .map(|pattern| format!("{dir}/{pattern}"))
                .collect(),
            HostPlatform::Windows | HostPlatform::Other => Vec::new(),
        }
    }

    fn scan_device_dir(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .device_patterns()
            .iter()
            .flat_map(|pattern| glob_paths(pattern))
            .filter(|path| !is_excluded(path))
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

fn glob_paths(pattern: &str) -> Vec<PathBuf> {
    match glob::glob(pattern) {
        Ok(paths) => paths.filter_map(std::result::Result::ok).collect(),
        Err(e) => {
            debug!(pattern, error = %e, "Invalid device pattern");
            Vec::new()
        }
    }
}

/// Devices that match a serial pattern but are never a ball machine.
fn is_excluded(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    MACOS_EXCLUDED.iter().any(|excluded| name.contains(excluded))
}
