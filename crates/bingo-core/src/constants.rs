//! Core constants for Belgian bingo and the ball-machine wire protocol.
//!
//! Numbers, bands and protocol tokens used throughout the workspace are
//! centralized here so the card generator, the simulator and the line decoder
//! all agree on them.
//!
//! # Number Bands
//!
//! Belgian bingo uses 75 balls split into five 15-wide bands, one per card
//! column:
//!
//! | Letter | Column | Range  |
//! |--------|--------|--------|
//! | `B`    | 0      | 1-15   |
//! | `I`    | 1      | 16-30  |
//! | `N`    | 2      | 31-45  |
//! | `G`    | 3      | 46-60  |
//! | `O`    | 4      | 61-75  |
//!
//! ```
//! use bingo_core::constants::*;
//!
//! let column = 2;
//! let low = column * BAND_WIDTH + MIN_BALL;
//! assert_eq!((low, low + BAND_WIDTH - 1), (31, 45));
//! ```

// ============================================================================
// Balls
// ============================================================================

/// Lowest ball number.
pub const MIN_BALL: u8 = 1;

/// Highest ball number.
pub const MAX_BALL: u8 = 75;

/// Width of one letter band.
pub const BAND_WIDTH: u8 = 15;

// ============================================================================
// Card Geometry
// ============================================================================

/// Rows and columns on a card.
pub const CARD_SIZE: usize = 5;

/// Total cells on a card, FREE cell included.
pub const CARD_CELLS: usize = CARD_SIZE * CARD_SIZE;

/// Index of the centre row and column.
pub const CENTER: usize = 2;

/// Number stored in the FREE cell.
pub const FREE_CELL: u8 = 0;

// ============================================================================
// Scoring
// ============================================================================

/// Points awarded for a winning game.
pub const WIN_SCORE: u32 = 100;

// ============================================================================
// Device Commands (host -> device)
// ============================================================================

/// Start a new game.
pub const CMD_NEW_GAME: u8 = b'N';

/// End the current game.
pub const CMD_END_GAME: u8 = b'E';

/// Draw one ball.
pub const CMD_DRAW_BALL: u8 = b'D';

// ============================================================================
// Device Messages (device -> host)
// ============================================================================

/// Prefix of a ball notification, followed by a code `A`..`Y`.
pub const MSG_BALL_PREFIX: &str = "BALL:";

/// A ball passed the release gate.
pub const MSG_BALL_RELEASED: &str = "BALL_RELEASED";

/// A ball went back to the tray.
pub const MSG_BALL_RETURNED: &str = "BALL_RETURNED";

/// The device acknowledged a new game.
pub const MSG_GAME_STARTED: &str = "GAME_STARTED";

/// The device acknowledged the end of a game.
pub const MSG_GAME_ENDED: &str = "GAME_ENDED";

/// First ball code the device sends.
pub const FIRST_BALL_CODE: char = 'A';

/// Last ball code the device sends (the machine carries 25 balls).
pub const LAST_BALL_CODE: char = 'Y';

// ============================================================================
// Serial Defaults
// ============================================================================

/// Port used when settings carry none.
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Default line speed for the bridge board.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default read timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: f64 = 0.1;

/// Default interval between automatic draws in milliseconds.
pub const DEFAULT_DRAW_DELAY_MS: u64 = 3000;
