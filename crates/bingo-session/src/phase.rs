//! Session phase state machine.
//!
//! # Phases
//!
//! - `Menu`: idle, no card in play and no draw timer
//! - `Active`: a game is running and balls are being drawn
//! - `Ended`: the game has just finished; the session moves on to `Menu`
//!   straight away
//!
//! # Valid Transitions
//!
//! - Menu → Active
//! - Active → Ended
//! - Ended → Menu
//!
//! ```
//! use bingo_session::{PhaseMachine, SessionPhase};
//!
//! let mut machine = PhaseMachine::new();
//! machine.transition_to(SessionPhase::Active).unwrap();
//! assert!(machine.transition_to(SessionPhase::Menu).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use bingo_core::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of phase transitions kept in history.
///
/// A game produces three transitions, so this covers the last ~30 games.
const MAX_HISTORY_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Menu,
    Active,
    Ended,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Menu => "Menu",
            SessionPhase::Active => "Active",
            SessionPhase::Ended => "Ended",
        };
        write!(f, "{}", name)
    }
}

impl SessionPhase {
    /// Check if a transition to `target` is allowed from this phase.
    ///
    /// ```
    /// use bingo_session::SessionPhase;
    ///
    /// assert!(SessionPhase::Menu.can_transition_to(&SessionPhase::Active));
    /// assert!(!SessionPhase::Menu.can_transition_to(&SessionPhase::Ended));
    /// ```
    pub fn can_transition_to(&self, target: &SessionPhase) -> bool {
        matches!(
            (self, target),
            (SessionPhase::Menu, SessionPhase::Active)
                | (SessionPhase::Active, SessionPhase::Ended)
                | (SessionPhase::Ended, SessionPhase::Menu)
        )
    }
}

/// One recorded phase change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: SessionPhase,
    pub to: SessionPhase,
    pub at: DateTime<Utc>,
}

impl PhaseTransition {
    pub fn new(from: SessionPhase, to: SessionPhase) -> Self {
        Self {
            from,
            to,
            at: Utc::now(),
        }
    }
}

/// Tracks the current phase and a bounded history of transitions.
#[derive(Debug)]
pub struct PhaseMachine {
    current: SessionPhase,
    entered_at: Instant,
    history: VecDeque<PhaseTransition>,
}

impl PhaseMachine {
    /// Machine in the `Menu` phase.
    pub fn new() -> Self {
        Self {
            current: SessionPhase::Menu,
            entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current(&self) -> SessionPhase {
        self.current
    }

    pub fn time_in_phase(&self) -> Duration {
        self.entered_at.elapsed()
    }

    /// Transitions from oldest to newest.
    pub fn history(&self) -> &VecDeque<PhaseTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<PhaseTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Move to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] if the move is not allowed
    /// from the current phase. The phase is left unchanged.
    pub fn transition_to(&mut self, target: SessionPhase) -> Result<PhaseTransition> {
        if !self.current.can_transition_to(&target) {
            return Err(Error::InvalidStateTransition {
                from: self.current.to_string(),
                to: target.to_string(),
            });
        }

        let transition = PhaseTransition::new(self.current, target);
        self.current = target;
        self.entered_at = Instant::now();

        self.history.push_back(transition.clone());
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }

        Ok(transition)
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}
