//! Property tests for the fallback simulator's ball drum.

use std::collections::BTreeSet;

use bingo_hardware::FallbackSimulator;
use bingo_protocol::{Command, DeviceEvent};
use proptest::prelude::*;

fn drawn_number(events: &[DeviceEvent]) -> Option<u8> {
    match events {
        [DeviceEvent::BallDrawn { number }] => Some(*number),
        _ => None,
    }
}

proptest! {
    #[test]
    fn full_game_draws_every_ball_once(seed in any::<u64>()) {
        let mut simulator = FallbackSimulator::with_seed(seed);
        simulator.handle_command(Command::NewGame);

        let mut seen = BTreeSet::new();
        for _ in 0..75 {
            let number = drawn_number(&simulator.handle_command(Command::DrawBall));
            prop_assert!(number.is_some());
            prop_assert!(seen.insert(number.unwrap_or_default()));
        }

        prop_assert_eq!(seen, (1..=75).collect::<BTreeSet<u8>>());
        prop_assert!(simulator.handle_command(Command::DrawBall).is_empty());
        prop_assert_eq!(simulator.remaining(), 0);
        prop_assert!(simulator.is_active());
    }

    #[test]
    fn unknown_bytes_never_change_state(
        seed in any::<u64>(),
        bytes in prop::collection::vec(
            any::<u8>().prop_filter("not a command", |b| !b"NED".contains(b)),
            0..32,
        ),
    ) {
        let mut simulator = FallbackSimulator::with_seed(seed);
        simulator.handle_command(Command::NewGame);
        simulator.handle_command(Command::DrawBall);

        for byte in bytes {
            prop_assert!(simulator.handle_byte(byte).is_empty());
        }

        prop_assert!(simulator.is_active());
        prop_assert_eq!(simulator.drawn().len(), 1);
    }

    #[test]
    fn new_game_restarts_the_drum(seed in any::<u64>(), first in 0usize..75) {
        let mut simulator = FallbackSimulator::with_seed(seed);
        simulator.handle_command(Command::NewGame);
        for _ in 0..first {
            simulator.handle_command(Command::DrawBall);
        }

        prop_assert_eq!(
            simulator.handle_command(Command::NewGame),
            vec![DeviceEvent::GameStarted]
        );
        prop_assert_eq!(simulator.remaining(), 75);
    }
}
