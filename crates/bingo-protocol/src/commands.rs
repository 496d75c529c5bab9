//! Commands the host sends to the device.

use std::fmt;

use bingo_core::constants::{CMD_DRAW_BALL, CMD_END_GAME, CMD_NEW_GAME};
use serde::{Deserialize, Serialize};

/// One-byte command understood by both the bridge board and the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// `N`: start a new game.
    NewGame,
    /// `E`: end the current game.
    EndGame,
    /// `D`: release one ball.
    DrawBall,
}

impl Command {
    /// Wire byte for this command.
    pub fn as_byte(self) -> u8 {
        match self {
            Command::NewGame => CMD_NEW_GAME,
            Command::EndGame => CMD_END_GAME,
            Command::DrawBall => CMD_DRAW_BALL,
        }
    }

    /// Parse a wire byte. Anything outside the vocabulary yields `None`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CMD_NEW_GAME => Some(Command::NewGame),
            CMD_END_GAME => Some(Command::EndGame),
            CMD_DRAW_BALL => Some(Command::DrawBall),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}
