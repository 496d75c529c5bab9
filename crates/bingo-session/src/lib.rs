//! Game session for the bingo ball machine.
//!
//! This crate ties the cards from `bingo-core` to the ball source in
//! `bingo-hardware`: it runs the Menu → Active → Ended cycle, times the
//! automatic draws, and keeps score.

pub mod phase;
pub mod session;
pub mod summary;

pub use phase::{PhaseMachine, PhaseTransition, SessionPhase};
pub use session::{GameSession, SessionEvent};
pub use summary::{GameOutcome, GameSummary, Scoreboard};
