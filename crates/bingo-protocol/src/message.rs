//! Messages the device sends to the host.
//!
//! | Line            | Event                       |
//! |-----------------|-----------------------------|
//! | `BALL:<A-Y>`    | [`DeviceEvent::BallDrawn`]  |
//! | `BALL_RELEASED` | [`DeviceEvent::BallReleased`] |
//! | `BALL_RETURNED` | [`DeviceEvent::BallReturned`] |
//! | `GAME_STARTED`  | [`DeviceEvent::GameStarted`] |
//! | `GAME_ENDED`    | [`DeviceEvent::GameEnded`]  |
//!
//! Ball codes map to numbers as `code - 'A' + 1`, so the machine's 25 balls
//! are numbers 1-25.

use std::fmt;

use bingo_core::constants::{
    FIRST_BALL_CODE, LAST_BALL_CODE, MSG_BALL_PREFIX, MSG_BALL_RELEASED, MSG_BALL_RETURNED,
    MSG_GAME_ENDED, MSG_GAME_STARTED,
};
use bingo_core::{Error, Letter, Result};
use serde::{Deserialize, Serialize};

/// Event reported by the ball machine, or synthesized by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceEvent {
    /// A ball was drawn.
    BallDrawn { number: u8 },

    /// A ball passed the release gate.
    BallReleased,

    /// A ball went back to the tray.
    BallReturned,

    /// The device started a game.
    GameStarted,

    /// The device ended a game.
    GameEnded,
}

impl DeviceEvent {
    pub fn ball(number: u8) -> Self {
        Self::BallDrawn { number }
    }

    /// Letter band of a ball event.
    pub fn letter(&self) -> Option<Letter> {
        match self {
            Self::BallDrawn { number } => Letter::from_number(*number),
            _ => None,
        }
    }

    /// Wire form of this event, without the trailing newline.
    ///
    /// Returns `None` for balls the device has no code for (above 25).
    pub fn to_line(&self) -> Option<String> {
        match self {
            Self::BallDrawn { number } => {
                ball_code(*number).map(|code| format!("{MSG_BALL_PREFIX}{code}"))
            }
            Self::BallReleased => Some(MSG_BALL_RELEASED.to_string()),
            Self::BallReturned => Some(MSG_BALL_RETURNED.to_string()),
            Self::GameStarted => Some(MSG_GAME_STARTED.to_string()),
            Self::GameEnded => Some(MSG_GAME_ENDED.to_string()),
        }
    }
}

impl fmt::Display for DeviceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BallDrawn { number } => match Letter::from_number(*number) {
                Some(letter) => write!(f, "ball {letter}{number}"),
                None => write!(f, "ball {number}"),
            },
            Self::BallReleased => f.write_str("ball released"),
            Self::BallReturned => f.write_str("ball returned"),
            Self::GameStarted => f.write_str("game started"),
            Self::GameEnded => f.write_str("game ended"),
        }
    }
}

/// Device code for ball `number`, if the device carries it.
pub fn ball_code(number: u8) -> Option<char> {
    let span = LAST_BALL_CODE as u8 - FIRST_BALL_CODE as u8 + 1;
    (1..=span)
        .contains(&number)
        .then(|| (FIRST_BALL_CODE as u8 + number - 1) as char)
}

/// Decode one line of device output.
///
/// Surrounding whitespace (including `\r`) is ignored.
///
/// # Errors
///
/// Returns [`Error::ProtocolDecode`] for unrecognized lines and for ball
/// codes outside `A`..`Y`.
pub fn decode_line(line: &str) -> Result<DeviceEvent> {
    let trimmed = line.trim();

    if let Some(code) = trimmed.strip_prefix(MSG_BALL_PREFIX) {
        return decode_ball_code(trimmed, code.trim());
    }

    match trimmed {
        MSG_BALL_RELEASED => Ok(DeviceEvent::BallReleased),
        MSG_BALL_RETURNED => Ok(DeviceEvent::BallReturned),
        MSG_GAME_STARTED => Ok(DeviceEvent::GameStarted),
        MSG_GAME_ENDED => Ok(DeviceEvent::GameEnded),
        _ => Err(Error::protocol_decode(trimmed, "unrecognized line")),
    }
}

fn decode_ball_code(line: &str, code: &str) -> Result<DeviceEvent> {
    let mut chars = code.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if (FIRST_BALL_CODE..=LAST_BALL_CODE).contains(&c) => {
            Ok(DeviceEvent::ball(c as u8 - FIRST_BALL_CODE as u8 + 1))
        }
        (None, _) => Err(Error::protocol_decode(line, "missing ball code")),
        _ => Err(Error::protocol_decode(
            line,
            format!("ball code must be one letter {FIRST_BALL_CODE}-{LAST_BALL_CODE}"),
        )),
    }
}
