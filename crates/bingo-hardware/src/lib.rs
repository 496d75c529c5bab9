//! Serial hardware layer for the bingo ball machine.
//!
//! The ball machine is an Arduino bridge board on a serial port. This crate
//! finds it, talks to it, and replaces it with an in-process simulator when
//! it is missing or fails mid-game.
//!
//! # Layers
//!
//! - [`traits`]: [`PortOpener`] and [`SerialChannel`], the seam between this
//!   crate and the operating system
//! - [`serial`]: the `serialport`-backed implementation
//! - [`mock`]: a scriptable device for tests
//! - [`discovery`]: per-platform port enumeration
//! - [`link`]: one open channel with failure tracking
//! - [`simulator`]: the fallback ball drum
//! - [`bridge`]: the facade the game session talks to
//!
//! ```text
//!                      ┌────────────────┐
//!                   ┌─►│ HardwareLink   │──► serial port
//! GameSession ──► ArduinoBridge          │
//!                   └─►│ FallbackSimulator
//!                      └────────────────┘
//! ```
//!
//! No error in this crate is fatal: any hardware failure moves the bridge to
//! fallback and the game continues on the simulator.

pub mod bridge;
pub mod discovery;
pub mod error;
pub mod link;
pub mod mock;
pub mod serial;
pub mod simulator;
pub mod traits;

pub use bridge::{ArduinoBridge, BridgeStatus, ConnectionState};
pub use discovery::{HostPlatform, PortDiscovery};
pub use error::{HardwareError, Result};
pub use link::HardwareLink;
pub use serial::SystemPorts;
pub use simulator::FallbackSimulator;
pub use traits::{PortOpener, SerialChannel};
