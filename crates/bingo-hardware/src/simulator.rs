//! In-process stand-in for the ball machine.
//!
//! The simulator accepts the same command bytes as the device and answers
//! with the same [`DeviceEvent`]s. It draws from the full 1-75 range, never
//! repeating a number within one game.

use bingo_core::constants::{MAX_BALL, MIN_BALL};
use bingo_protocol::{Command, DeviceEvent};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

#[derive(Debug)]
pub struct FallbackSimulator {
    active: bool,
    drawn: Vec<u8>,
    rng: StdRng,
}

impl Default for FallbackSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackSimulator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Simulator with a reproducible draw order.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            active: false,
            drawn: Vec::new(),
            rng,
        }
    }

    /// Handle one command and return the events it produces.
    pub fn handle_command(&mut self, command: Command) -> Vec<DeviceEvent> {
        let events = match command {
            Command::NewGame => {
                self.start();
                vec![DeviceEvent::GameStarted]
            }
            Command::EndGame => {
                self.active = false;
                vec![DeviceEvent::GameEnded]
            }
            Command::DrawBall => self.draw().map(DeviceEvent::ball).into_iter().collect(),
        };
        debug!(command = %command, events = ?events, "Simulated command");
        events
    }

    /// Handle a raw command byte. Bytes outside the vocabulary are ignored.
    pub fn handle_byte(&mut self, byte: u8) -> Vec<DeviceEvent> {
        match Command::from_byte(byte) {
            Some(command) => self.handle_command(command),
            None => {
                debug!(byte, "Ignoring unknown command byte");
                Vec::new()
            }
        }
    }

    /// Apply the state change of `command` without producing events.
    ///
    /// Used while a real device answers the command, so the simulator can
    /// take over mid-game.
    pub fn sync_command(&mut self, command: Command) {
        match command {
            Command::NewGame => self.start(),
            Command::EndGame => self.active = false,
            Command::DrawBall => {}
        }
    }

    /// Record an event that came from the real device.
    pub fn observe(&mut self, event: &DeviceEvent) {
        match *event {
            DeviceEvent::BallDrawn { number } => {
                if !self.drawn.contains(&number) {
                    self.drawn.push(number);
                }
            }
            DeviceEvent::GameEnded => self.active = false,
            DeviceEvent::GameStarted | DeviceEvent::BallReleased | DeviceEvent::BallReturned => {}
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Numbers drawn in the current game, in draw order.
    pub fn drawn(&self) -> &[u8] {
        &self.drawn
    }

    /// Numbers still in the drum.
    pub fn remaining(&self) -> usize {
        usize::from(MAX_BALL - MIN_BALL + 1).saturating_sub(self.drawn.len())
    }

    fn start(&mut self) {
        self.active = true;
        self.drawn.clear();
    }

    fn draw(&mut self) -> Option<u8> {
        if !self.active {
            return None;
        }
        let pool: Vec<u8> = (MIN_BALL..=MAX_BALL)
            .filter(|n| !self.drawn.contains(n))
            .collect();
        let number = *pool.choose(&mut self.rng)?;
        self.drawn.push(number);
        Some(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_requires_active_game() {
        let mut simulator = FallbackSimulator::with_seed(1);
        assert!(simulator.handle_command(Command::DrawBall).is_empty());

        simulator.handle_command(Command::NewGame);
        assert_eq!(simulator.handle_command(Command::DrawBall).len(), 1);

        simulator.handle_command(Command::EndGame);
        assert!(!simulator.is_active());
        assert!(simulator.handle_command(Command::DrawBall).is_empty());
    }

    #[test]
    fn test_new_game_clears_history() {
        let mut simulator = FallbackSimulator::with_seed(2);
        assert_eq!(
            simulator.handle_command(Command::NewGame),
            vec![DeviceEvent::GameStarted]
        );
        simulator.handle_command(Command::DrawBall);
        simulator.handle_command(Command::DrawBall);
        assert_eq!(simulator.remaining(), 73);

        simulator.handle_command(Command::NewGame);
        assert!(simulator.drawn().is_empty());
    }

    #[test]
    fn test_unknown_byte_is_ignored() {
        let mut simulator = FallbackSimulator::with_seed(3);
        assert!(simulator.handle_byte(b'X').is_empty());
        assert!(!simulator.is_active());
        assert_eq!(simulator.handle_byte(b'N'), vec![DeviceEvent::GameStarted]);
    }

    #[test]
    fn test_observed_balls_are_not_drawn_again() {
        let mut simulator = FallbackSimulator::with_seed(4);
        simulator.sync_command(Command::NewGame);
        for number in MIN_BALL..MAX_BALL {
            simulator.observe(&DeviceEvent::ball(number));
        }

        assert_eq!(
            simulator.handle_command(Command::DrawBall),
            vec![DeviceEvent::ball(MAX_BALL)]
        );
        assert!(simulator.handle_command(Command::DrawBall).is_empty());
    }

    #[test]
    fn test_sync_command_produces_no_events() {
        let mut simulator = FallbackSimulator::with_seed(5);
        simulator.sync_command(Command::NewGame);
        assert!(simulator.is_active());
        simulator.observe(&DeviceEvent::GameEnded);
        assert!(!simulator.is_active());
    }
}
