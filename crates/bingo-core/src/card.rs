//! Bingo cards and win patterns.
//!
//! A card is a 5×5 grid stored column-major (`grid[column][row]`). Column `c`
//! holds five distinct numbers from the band `15c+1 ..= 15c+15`; the centre
//! cell carries the FREE sentinel `0` and starts marked.
//!
//! # Examples
//!
//! ```
//! use bingo_core::card::{BingoCard, PatternKind};
//!
//! let mut card = BingoCard::generate();
//! assert!(card.cell(2, 2).is_free());
//! assert!(!card.check_for_win(PatternKind::FullCard));
//! ```

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ball::Letter;
use crate::constants::{BAND_WIDTH, CARD_SIZE, CENTER, FREE_CELL};
use crate::error::{Error, Result};

/// Arrangement of marked cells that wins a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Any complete row.
    Horizontal,
    /// Any complete column.
    Vertical,
    /// Either full diagonal.
    Diagonal,
    /// The four corner cells.
    FourCorners,
    /// Every cell on the card.
    FullCard,
    /// Horizontal, vertical, diagonal or four corners.
    ///
    /// `FullCard` is not part of this set. Any full card already completes a
    /// row, so the exclusion only shows in which pattern gets reported.
    Any,
}

impl PatternKind {
    /// Patterns tried, in order, when evaluating [`PatternKind::Any`].
    pub const ANY_MEMBERS: [PatternKind; 4] = [
        PatternKind::Horizontal,
        PatternKind::Vertical,
        PatternKind::Diagonal,
        PatternKind::FourCorners,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Horizontal => "horizontal",
            PatternKind::Vertical => "vertical",
            PatternKind::Diagonal => "diagonal",
            PatternKind::FourCorners => "four_corners",
            PatternKind::FullCard => "full_card",
            PatternKind::Any => "any",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "horizontal" => Ok(PatternKind::Horizontal),
            "vertical" => Ok(PatternKind::Vertical),
            "diagonal" => Ok(PatternKind::Diagonal),
            "four_corners" => Ok(PatternKind::FourCorners),
            "full_card" => Ok(PatternKind::FullCard),
            "any" => Ok(PatternKind::Any),
            other => Err(Error::UnknownPattern(other.to_string())),
        }
    }
}

/// A single square on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    number: u8,
    column: usize,
    marked: bool,
}

impl Cell {
    fn new(number: u8, column: usize) -> Self {
        Self {
            number,
            column,
            marked: false,
        }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn letter(&self) -> Letter {
        Letter::from_column(self.column).unwrap_or(Letter::N)
    }

    pub fn is_marked(&self) -> bool {
        self.marked
    }

    pub fn is_free(&self) -> bool {
        self.number == FREE_CELL
    }
}

/// A 5×5 Belgian bingo card with its marks and win state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BingoCard {
    grid: [[Cell; CARD_SIZE]; CARD_SIZE],
    winner: bool,
    winning_pattern: Option<PatternKind>,
}

impl BingoCard {
    /// Generate a random card using the thread-local RNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Generate a random card from `rng`.
    ///
    /// Each column samples five distinct values from its band without
    /// replacement. Columns are sampled independently; bands never overlap,
    /// so numbers are unique across the whole card.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let grid = std::array::from_fn(|column| {
            let low = column as u8 * BAND_WIDTH + 1;
            let picks = rand::seq::index::sample(rng, usize::from(BAND_WIDTH), CARD_SIZE);
            let mut numbers = [0u8; CARD_SIZE];
            for (slot, offset) in numbers.iter_mut().zip(picks.iter()) {
                *slot = low + offset as u8;
            }
            numbers.map(|number| Cell::new(number, column))
        });

        Self::with_free_center(grid)
    }

    /// Build a card from explicit columns (`columns[c][row]`).
    ///
    /// The centre value is replaced by the FREE sentinel regardless of what
    /// is passed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCard`] if a number sits outside its column
    /// band or repeats within a column.
    pub fn from_columns(columns: [[u8; CARD_SIZE]; CARD_SIZE]) -> Result<Self> {
        for (column, numbers) in columns.iter().enumerate() {
            let band = Letter::from_column(column)
                .map(Letter::range)
                .ok_or_else(|| Error::InvalidCard(format!("no column {column}")))?;

            for (row, &number) in numbers.iter().enumerate() {
                if column == CENTER && row == CENTER {
                    continue;
                }
                if !band.contains(&number) {
                    return Err(Error::InvalidCard(format!(
                        "{number} is outside column {column} band {}-{}",
                        band.start(),
                        band.end()
                    )));
                }
                if numbers[..row].contains(&number) {
                    return Err(Error::InvalidCard(format!(
                        "{number} repeats in column {column}"
                    )));
                }
            }
        }

        let grid = std::array::from_fn(|column| columns[column].map(|n| Cell::new(n, column)));
        Ok(Self::with_free_center(grid))
    }

    fn with_free_center(mut grid: [[Cell; CARD_SIZE]; CARD_SIZE]) -> Self {
        let center = &mut grid[CENTER][CENTER];
        center.number = FREE_CELL;
        center.marked = true;

        Self {
            grid,
            winner: false,
            winning_pattern: None,
        }
    }

    /// Cell at `row`, `column`.
    ///
    /// # Panics
    ///
    /// Panics if either index is 5 or more.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        &self.grid[column][row]
    }

    /// The five cells of `column`, top to bottom.
    pub fn column(&self, column: usize) -> &[Cell; CARD_SIZE] {
        &self.grid[column]
    }

    /// All cells, column by column.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.grid.iter().flatten()
    }

    pub fn contains(&self, number: u8) -> bool {
        number != FREE_CELL && self.cells().any(|cell| cell.number == number)
    }

    pub fn marked_count(&self) -> usize {
        self.cells().filter(|cell| cell.marked).count()
    }

    /// Mark `number` if it is on the card and not yet marked.
    ///
    /// Returns `true` only when a cell changed. Absent or already marked
    /// numbers leave the card untouched.
    pub fn mark_number(&mut self, number: u8) -> bool {
        match self
            .grid
            .iter_mut()
            .flatten()
            .find(|cell| cell.number == number && !cell.marked)
        {
            Some(cell) => {
                cell.marked = true;
                true
            }
            None => false,
        }
    }

    /// Check `pattern` against the current marks.
    ///
    /// On success the card becomes a winner and records the concrete pattern
    /// that fired (for [`PatternKind::Any`], the first matching member).
    pub fn check_for_win(&mut self, pattern: PatternKind) -> bool {
        match self.evaluate(pattern) {
            Some(fired) => {
                self.winner = true;
                self.winning_pattern = Some(fired);
                true
            }
            None => false,
        }
    }

    /// Pattern satisfied by the current marks, without touching win state.
    pub fn evaluate(&self, pattern: PatternKind) -> Option<PatternKind> {
        let satisfied = match pattern {
            PatternKind::Horizontal => (0..CARD_SIZE).any(|row| self.row_complete(row)),
            PatternKind::Vertical => (0..CARD_SIZE).any(|column| self.column_complete(column)),
            PatternKind::Diagonal => {
                (0..CARD_SIZE).all(|i| self.marked(i, i))
                    || (0..CARD_SIZE).all(|i| self.marked(i, CARD_SIZE - 1 - i))
            }
            PatternKind::FourCorners => {
                let last = CARD_SIZE - 1;
                self.marked(0, 0)
                    && self.marked(0, last)
                    && self.marked(last, 0)
                    && self.marked(last, last)
            }
            PatternKind::FullCard => self.cells().all(Cell::is_marked),
            PatternKind::Any => {
                return PatternKind::ANY_MEMBERS
                    .into_iter()
                    .find(|&member| self.evaluate(member).is_some());
            }
        };

        satisfied.then_some(pattern)
    }

    pub fn is_winner(&self) -> bool {
        self.winner
    }

    pub fn winning_pattern(&self) -> Option<PatternKind> {
        self.winning_pattern
    }

    fn marked(&self, row: usize, column: usize) -> bool {
        self.grid[column][row].marked
    }

    fn row_complete(&self, row: usize) -> bool {
        (0..CARD_SIZE).all(|column| self.marked(row, column))
    }

    fn column_complete(&self, column: usize) -> bool {
        self.grid[column].iter().all(Cell::is_marked)
    }
}

impl fmt::Display for BingoCard {
    /// Text grid with a letter header; marked cells are wrapped in brackets.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for letter in Letter::ALL {
            write!(f, "{:^6}", letter.as_char())?;
        }
        writeln!(f)?;

        for row in 0..CARD_SIZE {
            for column in 0..CARD_SIZE {
                let cell = self.cell(row, column);
                let text = if cell.is_free() {
                    "FREE".to_string()
                } else {
                    cell.number.to_string()
                };
                let text = if cell.marked && !cell.is_free() {
                    format!("[{text}]")
                } else {
                    text
                };
                write!(f, "{text:^6}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
