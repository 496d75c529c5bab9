//! The game session: cards, drawn balls, draw timer and scoring.
//!
//! [`GameSession`] owns the [`ArduinoBridge`] and is driven by a
//! single-threaded polling loop. Each [`tick`](GameSession::tick) reads
//! whatever the device sent, applies it, and issues a draw when the draw
//! interval has elapsed. Nothing in here blocks.
//!
//! Ball events are handled the same way whether they come from the device
//! or the simulator: the ball is recorded, marked on every card, and the
//! configured pattern is checked on every card.
//!
//! ```
//! use bingo_core::GameSettings;
//! use bingo_hardware::ArduinoBridge;
//! use bingo_session::{GameSession, SessionPhase};
//!
//! let mut session = GameSession::new(ArduinoBridge::simulated(), &GameSettings::default());
//! session.new_game().unwrap();
//! session.draw_ball();
//!
//! assert_eq!(session.phase(), SessionPhase::Active);
//! assert_eq!(session.drawn_balls().len(), 1);
//! ```

use std::time::{Duration, Instant};

use bingo_core::{Ball, BingoCard, GameSettings, PatternKind, Result};
use bingo_hardware::ArduinoBridge;
use bingo_protocol::{Command, DeviceEvent, decode_batch};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::phase::{PhaseMachine, PhaseTransition, SessionPhase};
use crate::summary::{GameOutcome, GameSummary, Scoreboard};

/// Something the session did in response to input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A ball was recorded and marked on the cards.
    BallDrawn(Ball),
    /// The ball source acknowledged the start of the game.
    StartConfirmed,
    /// The game finished.
    GameOver(GameSummary),
}

#[derive(Debug)]
struct CurrentGame {
    id: Uuid,
    started_at: DateTime<Utc>,
    confirmed: bool,
}

#[derive(Debug)]
pub struct GameSession {
    bridge: ArduinoBridge,
    phases: PhaseMachine,
    pattern: PatternKind,
    draw_interval: Duration,
    max_balls: usize,
    cards: Vec<BingoCard>,
    drawn_balls: Vec<Ball>,
    current_ball: Option<Ball>,
    last_draw: Option<Instant>,
    game: Option<CurrentGame>,
    last_summary: Option<GameSummary>,
    scoreboard: Scoreboard,
}

impl GameSession {
    /// Session in the `Menu` phase, configured from `settings`.
    pub fn new(bridge: ArduinoBridge, settings: &GameSettings) -> Self {
        Self {
            bridge,
            phases: PhaseMachine::new(),
            pattern: settings.default_pattern,
            draw_interval: settings.draw_interval(),
            max_balls: usize::from(settings.max_balls),
            cards: Vec::new(),
            drawn_balls: Vec::new(),
            current_ball: None,
            last_draw: None,
            game: None,
            last_summary: None,
            scoreboard: Scoreboard::default(),
        }
    }

    /// Start a game with one freshly generated card.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`](bingo_core::Error::InvalidStateTransition)
    /// if a game is already running.
    pub fn new_game(&mut self) -> Result<Vec<SessionEvent>> {
        self.new_game_with_cards(vec![BingoCard::generate()])
    }

    /// Start a game played on `cards`.
    ///
    /// # Errors
    ///
    /// As [`new_game`](Self::new_game).
    pub fn new_game_with_cards(&mut self, cards: Vec<BingoCard>) -> Result<Vec<SessionEvent>> {
        self.transition(SessionPhase::Active)?;

        let id = Uuid::new_v4();
        self.cards = cards;
        self.drawn_balls.clear();
        self.current_ball = None;
        self.last_draw = None;
        self.game = Some(CurrentGame {
            id,
            started_at: Utc::now(),
            confirmed: false,
        });
        self.scoreboard.record_game();
        info!(game = %id, pattern = %self.pattern, cards = self.cards.len(), "New game");

        let replies = self.bridge.send_command(Command::NewGame);
        Ok(self.apply_events(replies))
    }

    /// Ask for one ball now. Does nothing unless a game is running.
    ///
    /// A game that reaches the configured ball limit without a winner ends
    /// as [`GameOutcome::Exhausted`].
    pub fn draw_ball(&mut self) -> Vec<SessionEvent> {
        if !self.is_active() {
            debug!(phase = %self.phase(), "Ignoring draw outside a game");
            return Vec::new();
        }
        let replies = self.bridge.send_command(Command::DrawBall);
        self.apply_events(replies)
    }

    /// One iteration of the polling loop.
    ///
    /// Reads device output, then draws a ball if the draw interval has
    /// elapsed since the last draw. The first tick of a game only starts the
    /// timer.
    pub fn tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        let replies = self.bridge.poll_events();
        let mut events = self.apply_events(replies);

        if !self.is_active() {
            return events;
        }
        match self.last_draw {
            None => self.last_draw = Some(now),
            Some(last) if now.saturating_duration_since(last) >= self.draw_interval => {
                self.last_draw = Some(now);
                events.extend(self.draw_ball());
            }
            Some(_) => {}
        }
        events
    }

    /// Decode and apply a block of device text, line by line in order.
    /// Unrecognized lines are dropped.
    pub fn handle_message(&mut self, text: &str) -> Vec<SessionEvent> {
        let replies = decode_batch(text);
        self.apply_events(replies)
    }

    /// Apply device events in order.
    pub fn apply_events(&mut self, replies: Vec<DeviceEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for reply in replies {
            self.apply_event(reply, &mut events);
        }
        events
    }

    /// End the running game without a winner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`](bingo_core::Error::InvalidStateTransition)
    /// if no game is running.
    pub fn abort(&mut self) -> Result<GameSummary> {
        self.end_game(GameOutcome::Aborted)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phases.current()
    }

    pub fn is_active(&self) -> bool {
        self.phase() == SessionPhase::Active
    }

    pub fn drawn_balls(&self) -> &[Ball] {
        &self.drawn_balls
    }

    pub fn current_ball(&self) -> Option<Ball> {
        self.current_ball
    }

    /// The last `count` drawn balls, newest last.
    pub fn recent_balls(&self, count: usize) -> &[Ball] {
        let start = self.drawn_balls.len().saturating_sub(count);
        &self.drawn_balls[start..]
    }

    pub fn cards(&self) -> &[BingoCard] {
        &self.cards
    }

    pub fn pattern(&self) -> PatternKind {
        self.pattern
    }

    /// Pattern used from the next ball on.
    pub fn set_pattern(&mut self, pattern: PatternKind) {
        self.pattern = pattern;
    }

    pub fn scoreboard(&self) -> Scoreboard {
        self.scoreboard
    }

    pub fn game_id(&self) -> Option<Uuid> {
        self.game.as_ref().map(|game| game.id)
    }

    /// Whether the ball source acknowledged the running game.
    pub fn start_confirmed(&self) -> bool {
        self.game.as_ref().is_some_and(|game| game.confirmed)
    }

    pub fn last_summary(&self) -> Option<&GameSummary> {
        self.last_summary.as_ref()
    }

    pub fn history(&self) -> Vec<PhaseTransition> {
        self.phases.last_transitions(usize::MAX)
    }

    pub fn bridge(&self) -> &ArduinoBridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut ArduinoBridge {
        &mut self.bridge
    }

    fn apply_event(&mut self, reply: DeviceEvent, events: &mut Vec<SessionEvent>) {
        match reply {
            DeviceEvent::BallDrawn { number } => self.record_ball(number, events),
            DeviceEvent::GameStarted => match self.game.as_mut() {
                Some(game) if self.phases.current() == SessionPhase::Active => {
                    game.confirmed = true;
                    events.push(SessionEvent::StartConfirmed);
                }
                _ => debug!("Ignoring game start outside a game"),
            },
            DeviceEvent::GameEnded => {
                if self.is_active() {
                    info!("Device ended the game");
                    if let Ok(summary) = self.end_game(GameOutcome::EndedByDevice) {
                        events.push(SessionEvent::GameOver(summary));
                    }
                } else {
                    debug!("Ignoring game end outside a game");
                }
            }
            DeviceEvent::BallReleased | DeviceEvent::BallReturned => {
                debug!(event = %reply, "Device status");
            }
        }
    }

    fn record_ball(&mut self, number: u8, events: &mut Vec<SessionEvent>) {
        if !self.is_active() {
            debug!(number, "Ignoring ball outside a game");
            return;
        }
        if self.drawn_balls.iter().any(|ball| ball.number() == number) {
            warn!(number, "Ignoring repeated ball");
            return;
        }
        let position = u32::try_from(self.drawn_balls.len() + 1).unwrap_or(u32::MAX);
        let ball = match Ball::new(number, position) {
            Ok(ball) => ball,
            Err(e) => {
                warn!(error = %e, "Ignoring ball");
                return;
            }
        };

        self.drawn_balls.push(ball);
        self.current_ball = Some(ball);
        info!(ball = %ball, drawn = self.drawn_balls.len(), "Ball drawn");
        events.push(SessionEvent::BallDrawn(ball));

        let pattern = self.pattern;
        let mut fired = None;
        for card in &mut self.cards {
            card.mark_number(number);
            if card.check_for_win(pattern) {
                fired = fired.or(card.winning_pattern());
            }
        }

        let outcome = match fired {
            Some(pattern) => GameOutcome::Win { pattern },
            None if self.drawn_balls.len() >= self.max_balls => GameOutcome::Exhausted,
            None => return,
        };
        if let Ok(summary) = self.end_game(outcome) {
            events.push(SessionEvent::GameOver(summary));
        }
    }

    /// Finish the running game and return to `Menu`. Drawn balls stay
    /// visible until the next game starts.
    fn end_game(&mut self, outcome: GameOutcome) -> Result<GameSummary> {
        self.transition(SessionPhase::Ended)?;
        if outcome.is_win() {
            self.scoreboard.record_win();
        }

        // Replies from the simulator are a bare GAME_ENDED, which is ignored
        // now that the game is over.
        let replies = self.bridge.send_command(Command::EndGame);
        self.apply_events(replies);

        let summary = GameSummary {
            id: self.game.as_ref().map_or_else(Uuid::nil, |game| game.id),
            outcome,
            pattern: self.pattern,
            balls: self.drawn_balls.iter().map(Ball::number).collect(),
            started_at: self
                .game
                .as_ref()
                .map_or_else(Utc::now, |game| game.started_at),
            ended_at: Utc::now(),
        };
        info!(
            game = %summary.id,
            outcome = ?summary.outcome,
            balls = summary.balls_drawn(),
            score = self.scoreboard.score,
            "Game over"
        );
        self.last_summary = Some(summary.clone());

        self.transition(SessionPhase::Menu)?;
        self.last_draw = None;
        Ok(summary)
    }

    fn transition(&mut self, target: SessionPhase) -> Result<()> {
        let transition = self.phases.transition_to(target)?;
        info!(from = %transition.from, to = %transition.to, "Session phase changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bingo_core::Error;
    use bingo_hardware::FallbackSimulator;

    /// Columns of a fixed card; row 0 is 1, 16, 31, 46, 61.
    const COLUMNS: [[u8; 5]; 5] = [
        [1, 2, 3, 4, 5],
        [16, 17, 18, 19, 20],
        [31, 32, 0, 34, 35],
        [46, 47, 48, 49, 50],
        [61, 62, 63, 64, 65],
    ];

    fn settings(pattern: PatternKind) -> GameSettings {
        GameSettings {
            default_pattern: pattern,
            ball_draw_delay: 100,
            ..GameSettings::default()
        }
    }

    fn session(pattern: PatternKind) -> GameSession {
        let bridge = ArduinoBridge::simulated().with_simulator(FallbackSimulator::with_seed(11));
        GameSession::new(bridge, &settings(pattern))
    }

    fn fixed_card() -> BingoCard {
        BingoCard::from_columns(COLUMNS).unwrap()
    }

    #[test]
    fn test_new_game_starts_active() {
        let mut session = session(PatternKind::Horizontal);
        let events = session.new_game().unwrap();

        assert_eq!(events, vec![SessionEvent::StartConfirmed]);
        assert!(session.is_active());
        assert!(session.start_confirmed());
        assert_eq!(session.cards().len(), 1);
        assert_eq!(session.scoreboard().games_played, 1);
        assert!(session.game_id().is_some());
    }

    #[test]
    fn test_new_game_while_active_fails() {
        let mut session = session(PatternKind::Horizontal);
        session.new_game().unwrap();

        assert!(matches!(
            session.new_game(),
            Err(Error::InvalidStateTransition { .. })
        ));
        assert_eq!(session.scoreboard().games_played, 1);
    }

    #[test]
    fn test_draw_outside_game_is_ignored() {
        let mut session = session(PatternKind::Horizontal);
        assert!(session.draw_ball().is_empty());
        assert!(session.drawn_balls().is_empty());
    }

    #[test]
    fn test_ball_limit_ends_game() {
        let bridge = ArduinoBridge::simulated();
        let mut session = GameSession::new(
            bridge,
            &GameSettings {
                max_balls: 3,
                ..settings(PatternKind::FullCard)
            },
        );
        session.new_game().unwrap();
        for _ in 0..10 {
            session.draw_ball();
        }
        assert_eq!(session.drawn_balls().len(), 3);
        assert_eq!(session.phase(), SessionPhase::Menu);
        assert_eq!(
            session.last_summary().map(|s| s.outcome),
            Some(GameOutcome::Exhausted)
        );
    }

    #[test]
    fn test_row_win_ends_game_and_scores() {
        let mut session = session(PatternKind::Horizontal);
        session.new_game_with_cards(vec![fixed_card()]).unwrap();

        let mut last = Vec::new();
        for number in [1, 16, 31, 46, 61] {
            last = session.apply_events(vec![DeviceEvent::ball(number)]);
        }

        let Some(SessionEvent::GameOver(summary)) = last.last() else {
            panic!("expected game over, got {last:?}");
        };
        assert_eq!(
            summary.outcome,
            GameOutcome::Win {
                pattern: PatternKind::Horizontal
            }
        );
        assert_eq!(summary.balls, vec![1, 16, 31, 46, 61]);
        assert_eq!(session.phase(), SessionPhase::Menu);
        assert_eq!(session.drawn_balls().len(), 5);
        assert_eq!(
            session.scoreboard(),
            Scoreboard {
                score: 100,
                wins: 1,
                games_played: 1
            }
        );
        assert!(session.cards()[0].is_winner());
        assert!(!session.bridge().simulator().is_active());
    }

    #[test]
    fn test_any_reports_concrete_pattern() {
        let mut session = session(PatternKind::Any);
        session.new_game_with_cards(vec![fixed_card()]).unwrap();
        session.apply_events([1, 5, 61, 65].map(DeviceEvent::ball).to_vec());

        let summary = session.last_summary().unwrap();
        assert_eq!(
            summary.outcome,
            GameOutcome::Win {
                pattern: PatternKind::FourCorners
            }
        );
    }

    #[test]
    fn test_abort_does_not_score() {
        let mut session = session(PatternKind::Horizontal);
        session.new_game().unwrap();
        session.draw_ball();

        let summary = session.abort().unwrap();

        assert_eq!(summary.outcome, GameOutcome::Aborted);
        assert_eq!(summary.balls_drawn(), 1);
        assert_eq!(session.scoreboard().wins, 0);
        assert_eq!(session.scoreboard().score, 0);
        assert!(session.abort().is_err());
    }

    #[test]
    fn test_ended_keeps_balls_until_next_game() {
        let mut session = session(PatternKind::Horizontal);
        session.new_game().unwrap();
        session.draw_ball();
        session.draw_ball();
        session.abort().unwrap();

        assert_eq!(session.phase(), SessionPhase::Menu);
        assert_eq!(session.drawn_balls().len(), 2);

        session.new_game().unwrap();
        assert!(session.drawn_balls().is_empty());
        assert_eq!(session.current_ball(), None);
    }

    #[test]
    fn test_game_over_returns_to_menu() {
        let mut session = session(PatternKind::Horizontal);
        session.new_game().unwrap();
        session.abort().unwrap();
        session.new_game().unwrap();

        let phases: Vec<SessionPhase> = session.history().iter().map(|t| t.to).collect();
        assert_eq!(
            phases,
            vec![
                SessionPhase::Active,
                SessionPhase::Ended,
                SessionPhase::Menu,
                SessionPhase::Active
            ]
        );
        assert_eq!(session.scoreboard().games_played, 2);
    }

    #[test]
    fn test_repeated_and_late_balls_are_ignored() {
        let mut session = session(PatternKind::FullCard);
        session.new_game_with_cards(vec![fixed_card()]).unwrap();

        session.apply_events(vec![DeviceEvent::ball(7), DeviceEvent::ball(7)]);
        assert_eq!(session.drawn_balls().len(), 1);

        session.abort().unwrap();
        assert!(session.apply_events(vec![DeviceEvent::ball(8)]).is_empty());
        assert_eq!(session.drawn_balls().len(), 1);
    }

    #[test]
    fn test_tick_draws_on_interval() {
        let mut session = session(PatternKind::FullCard);
        session.new_game().unwrap();
        let start = Instant::now();

        assert!(session.tick(start).is_empty());
        assert!(session.tick(start + Duration::from_millis(50)).is_empty());

        let events = session.tick(start + Duration::from_millis(100));
        assert!(matches!(events.as_slice(), [SessionEvent::BallDrawn(_)]));

        assert!(session.tick(start + Duration::from_millis(150)).is_empty());
        assert_eq!(session.tick(start + Duration::from_millis(200)).len(), 1);
        assert_eq!(session.drawn_balls().len(), 2);
    }

    #[test]
    fn test_recent_balls_newest_last() {
        let mut session = session(PatternKind::FullCard);
        session.new_game_with_cards(vec![fixed_card()]).unwrap();
        session.apply_events([9, 24, 70].map(DeviceEvent::ball).to_vec());

        let recent: Vec<u8> = session.recent_balls(2).iter().map(Ball::number).collect();
        assert_eq!(recent, vec![24, 70]);
        assert_eq!(session.recent_balls(10).len(), 3);
        assert_eq!(session.current_ball().map(|b| b.number()), Some(70));
        assert_eq!(session.drawn_balls()[2].drawn_at(), 3);
    }

    #[test]
    fn test_every_winning_card_is_flagged() {
        let mut session = session(PatternKind::Horizontal);
        session
            .new_game_with_cards(vec![fixed_card(), fixed_card()])
            .unwrap();
        let events = session.apply_events([1, 16, 31, 46, 61].map(DeviceEvent::ball).to_vec());

        assert!(matches!(events.last(), Some(SessionEvent::GameOver(_))));
        assert!(session.cards().iter().all(BingoCard::is_winner));
        assert_eq!(session.scoreboard().wins, 1);
    }
}
