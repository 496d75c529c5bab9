//! Core types for the Belgian bingo ball machine.
//!
//! This crate holds everything that does not touch a serial port:
//!
//! - [`ball`]: ball numbers, letter bands and display styling
//! - [`card`]: card generation, marking and win patterns
//! - [`settings`]: typed settings and the store they come from
//! - [`constants`]: number bands and protocol tokens
//! - [`error`]: the shared error type

pub mod ball;
pub mod card;
pub mod constants;
pub mod error;
pub mod settings;

pub use ball::{Ball, BallFactory, BallPalette, BallStyle, Letter, Rgb};
pub use card::{BingoCard, Cell, PatternKind};
pub use error::{Error, Result};
pub use settings::{
    GameSettings, JsonSettingsStore, MemorySettingsStore, SerialSettings, Settings, SettingsStore,
};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
