//! Balls, letter bands and display styling.
//!
//! A ball is identified by its number alone. The letter band is always
//! recomputed from the number and never stored next to it, so the two can
//! not drift apart.
//!
//! ```
//! use bingo_core::ball::{Ball, BallFactory, Letter};
//!
//! let ball = Ball::new(42, 1).unwrap();
//! assert_eq!(ball.letter(), Letter::N);
//!
//! let style = BallFactory::default().style(42).unwrap();
//! assert_eq!(style.label, "N42");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{BAND_WIDTH, CARD_SIZE, MAX_BALL, MIN_BALL};
use crate::error::{Error, Result};

/// Column letter of a Belgian bingo card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    B,
    I,
    N,
    G,
    O,
}

impl Letter {
    /// All letters in column order.
    pub const ALL: [Letter; CARD_SIZE] = [Letter::B, Letter::I, Letter::N, Letter::G, Letter::O];

    /// Letter band that contains `number`, if the number is a valid ball.
    pub fn from_number(number: u8) -> Option<Self> {
        if !(MIN_BALL..=MAX_BALL).contains(&number) {
            return None;
        }
        Self::from_column(usize::from((number - MIN_BALL) / BAND_WIDTH))
    }

    /// Letter heading card column `column` (0-4).
    pub fn from_column(column: usize) -> Option<Self> {
        Self::ALL.get(column).copied()
    }

    /// Card column headed by this letter.
    pub fn column(self) -> usize {
        self as usize
    }

    /// Inclusive range of ball numbers in this band.
    pub fn range(self) -> std::ops::RangeInclusive<u8> {
        let low = self.column() as u8 * BAND_WIDTH + MIN_BALL;
        low..=low + BAND_WIDTH - 1
    }

    pub fn as_char(self) -> char {
        match self {
            Letter::B => 'B',
            Letter::I => 'I',
            Letter::N => 'N',
            Letter::G => 'G',
            Letter::O => 'O',
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One drawn ball.
///
/// `drawn_at` is the 1-based position of the ball in the draw order of its
/// game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ball {
    number: u8,
    drawn_at: u32,
}

impl Ball {
    /// Create a ball, validating its number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBallNumber`] if `number` is outside 1-75.
    pub fn new(number: u8, drawn_at: u32) -> Result<Self> {
        if !(MIN_BALL..=MAX_BALL).contains(&number) {
            return Err(Error::InvalidBallNumber(number));
        }
        Ok(Self { number, drawn_at })
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn drawn_at(&self) -> u32 {
        self.drawn_at
    }

    pub fn letter(&self) -> Letter {
        // The constructor guarantees the number is inside a band.
        Letter::from_number(self.number).unwrap_or(Letter::B)
    }
}

impl fmt::Display for Ball {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter(), self.number)
    }
}

/// RGB colour triple, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
}

/// Canonical colour per letter band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallPalette {
    #[serde(rename = "B")]
    pub b: Rgb,
    #[serde(rename = "I")]
    pub i: Rgb,
    #[serde(rename = "N")]
    pub n: Rgb,
    #[serde(rename = "G")]
    pub g: Rgb,
    #[serde(rename = "O")]
    pub o: Rgb,
}

impl BallPalette {
    pub fn color(&self, letter: Letter) -> Rgb {
        match letter {
            Letter::B => self.b,
            Letter::I => self.i,
            Letter::N => self.n,
            Letter::G => self.g,
            Letter::O => self.o,
        }
    }
}

impl Default for BallPalette {
    fn default() -> Self {
        Self {
            b: Rgb(65, 105, 225),
            i: Rgb(34, 139, 34),
            n: Rgb(255, 0, 0),
            g: Rgb(255, 215, 0),
            o: Rgb(138, 43, 226),
        }
    }
}

/// Everything a display needs to show one ball.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallStyle {
    pub letter: Letter,
    pub color: Rgb,
    /// Bare numeral, e.g. `"7"`.
    pub numeral: String,
    /// Letter and numeral, e.g. `"B7"`.
    pub label: String,
}

/// Maps ball numbers to their letter, colour and label.
///
/// Holds only the configured palette; every lookup is a pure function of the
/// number.
#[derive(Debug, Clone, Default)]
pub struct BallFactory {
    palette: BallPalette,
}

impl BallFactory {
    pub fn new(palette: BallPalette) -> Self {
        Self { palette }
    }

    /// Style for ball `number`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBallNumber`] if `number` is outside 1-75.
    pub fn style(&self, number: u8) -> Result<BallStyle> {
        let letter = Letter::from_number(number).ok_or(Error::InvalidBallNumber(number))?;
        Ok(BallStyle {
            letter,
            color: self.palette.color(letter),
            numeral: number.to_string(),
            label: format!("{letter}{number}"),
        })
    }

    /// Colour for ball `number`, white when the number has no band.
    pub fn color(&self, number: u8) -> Rgb {
        Letter::from_number(number)
            .map(|letter| self.palette.color(letter))
            .unwrap_or(Rgb::WHITE)
    }
}
