//! Scores and per-game records.

use bingo_core::PatternKind;
use bingo_core::constants::WIN_SCORE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counters for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u32,
    pub wins: u32,
    pub games_played: u32,
}

impl Scoreboard {
    pub(crate) fn record_game(&mut self) {
        self.games_played += 1;
    }

    pub(crate) fn record_win(&mut self) {
        self.wins += 1;
        self.score += WIN_SCORE;
    }
}

/// How a game finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameOutcome {
    /// A card completed `pattern`.
    Win { pattern: PatternKind },
    /// Ended from the host side without a winner.
    Aborted,
    /// The device reported the game over without a winner.
    EndedByDevice,
    /// The ball limit was reached without a winner.
    Exhausted,
}

impl GameOutcome {
    pub fn is_win(&self) -> bool {
        matches!(self, GameOutcome::Win { .. })
    }
}

/// Record of one finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: Uuid,
    pub outcome: GameOutcome,
    /// Pattern the game was played for.
    pub pattern: PatternKind,
    /// Ball numbers in draw order.
    pub balls: Vec<u8>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl GameSummary {
    pub fn balls_drawn(&self) -> usize {
        self.balls.len()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }
}
