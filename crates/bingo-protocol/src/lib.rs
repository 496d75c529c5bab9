//! Wire protocol between the host and the ball machine bridge board.
//!
//! Host to device traffic is a single ASCII byte per command
//! ([`Command`]). Device to host traffic is newline-delimited UTF-8 text,
//! decoded into [`DeviceEvent`]s by [`decode_line`] and [`decode_batch`].
//!
//! ```
//! use bingo_protocol::{Command, DeviceEvent, decode_batch};
//!
//! assert_eq!(Command::DrawBall.as_byte(), b'D');
//!
//! let events = decode_batch("BALL:C\nGAME_ENDED\n");
//! assert_eq!(events.len(), 2);
//! assert_eq!(events[1], DeviceEvent::GameEnded);
//! ```

pub mod commands;
pub mod message;
pub mod parser;

pub use commands::Command;
pub use message::{DeviceEvent, ball_code, decode_line};
pub use parser::{decode_batch, lines};
