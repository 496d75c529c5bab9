//! bingo: headless runner for the Belgian bingo ball machine.
//!
//! Loads settings, connects to the ball machine (or the simulator), and
//! plays the requested number of games on a fixed polling tick.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bingo_core::settings::load_or_default;
use bingo_core::{BallFactory, JsonSettingsStore, PatternKind, Settings};
use bingo_hardware::ArduinoBridge;
use bingo_session::{GameOutcome, GameSession, GameSummary, SessionEvent};
use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Belgian bingo ball machine runner
///
/// Plays bingo games against an Arduino ball machine on a serial port, or
/// against a built-in simulator when no machine is available.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file shared with the display front-end
    #[arg(short, long, value_name = "FILE", default_value = "settings.json")]
    settings: PathBuf,

    /// Serial port of the ball machine (overrides the settings file)
    #[arg(short, long, value_name = "PORT")]
    port: Option<String>,

    /// Scan serial ports for the ball machine
    #[arg(long, default_value_t = false)]
    auto_detect: bool,

    /// Never open a serial port; draw balls with the simulator
    #[arg(long, default_value_t = false)]
    simulate: bool,

    /// Winning pattern (overrides the settings file)
    #[arg(long, value_name = "PATTERN")]
    pattern: Option<PatternKind>,

    /// Number of games to play before exiting
    #[arg(short = 'n', long, default_value_t = 1, value_name = "N")]
    games: u32,

    /// Polling period in milliseconds
    #[arg(long, default_value_t = 16, value_name = "MS")]
    tick_ms: u64,

    /// Enable verbose logging (use -vv for trace output)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .init();
}

fn apply_overrides(settings: &mut Settings, args: &Args) {
    if let Some(port) = &args.port {
        settings.serial.port = port.clone();
    }
    if args.auto_detect {
        settings.serial.auto_detect = true;
    }
    if let Some(pattern) = args.pattern {
        settings.game.default_pattern = pattern;
    }
}

fn report_game(session: &GameSession, summary: &GameSummary) {
    match summary.outcome {
        GameOutcome::Win { pattern } => info!(pattern = %pattern, "BINGO!"),
        GameOutcome::Aborted => info!("Game aborted"),
        GameOutcome::EndedByDevice => info!("Game ended by the ball machine"),
        GameOutcome::Exhausted => info!("No winner, ball limit reached"),
    }
    for card in session.cards() {
        println!("{card}");
    }
    let board = session.scoreboard();
    println!(
        "Game {} | balls drawn: {} | score: {} | wins: {}/{}",
        summary.id,
        summary.balls_drawn(),
        board.score,
        board.wins,
        board.games_played
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    info!("bingo v{}", env!("CARGO_PKG_VERSION"));
    debug!(?args, "Arguments");

    let mut store = JsonSettingsStore::new(&args.settings);
    let mut settings = load_or_default(&mut store);
    apply_overrides(&mut settings, &args);

    let bridge = if args.simulate {
        ArduinoBridge::simulated()
    } else {
        let mut bridge = ArduinoBridge::system();
        bridge.connect(&settings.serial, &mut store);
        bridge
    };
    info!(state = %bridge.state(), "Ball source ready");

    let factory = BallFactory::new(settings.colors.ball_colors.clone());
    let mut session = GameSession::new(bridge, &settings.game);
    let mut ticker = tokio::time::interval(Duration::from_millis(args.tick_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut completed = 0;
    if args.games > 0 {
        session.new_game().context("Failed to start game")?;
    }

    while completed < args.games {
        tokio::select! {
            _ = ticker.tick() => {
                for event in session.tick(Instant::now()) {
                    match event {
                        SessionEvent::BallDrawn(ball) => {
                            let style = factory.style(ball.number())?;
                            info!(
                                ball = %style.label,
                                color = ?style.color,
                                drawn = ball.drawn_at(),
                                "Ball"
                            );
                        }
                        SessionEvent::StartConfirmed => debug!("Ball machine confirmed the game"),
                        SessionEvent::GameOver(summary) => {
                            report_game(&session, &summary);
                            completed += 1;
                        }
                    }
                }
                if !session.is_active() && completed < args.games {
                    session.new_game().context("Failed to start game")?;
                }
            }
            result = &mut ctrl_c => {
                result.context("Failed to listen for ctrl-c")?;
                warn!("Interrupted");
                if session.is_active() {
                    let summary = session.abort()?;
                    report_game(&session, &summary);
                }
                break;
            }
        }
    }

    session.bridge_mut().close();
    let board = session.scoreboard();
    info!(
        score = board.score,
        wins = board.wins,
        games = board.games_played,
        "Session finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["bingo"]);
        assert_eq!(args.settings, PathBuf::from("settings.json"));
        assert_eq!(args.games, 1);
        assert_eq!(args.tick_ms, 16);
        assert!(!args.simulate);
        assert!(args.pattern.is_none());
    }

    #[test]
    fn test_overrides_apply_to_settings() {
        let args = Args::parse_from([
            "bingo",
            "--port",
            "COM4",
            "--auto-detect",
            "--pattern",
            "four_corners",
        ]);
        let mut settings = Settings::default();
        apply_overrides(&mut settings, &args);

        assert_eq!(settings.serial.port, "COM4");
        assert!(settings.serial.auto_detect);
        assert_eq!(settings.game.default_pattern, PatternKind::FourCorners);
    }

    #[test]
    fn test_unknown_pattern_is_rejected() {
        assert!(Args::try_parse_from(["bingo", "--pattern", "zigzag"]).is_err());
    }
}
