//! Property tests for the timer state machine.

use eyebreak_core::{Event, Phase, Settings, TimerEngine};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Command {
    Start,
    Pause,
    Resume,
    Tick,
    SkipRest,
}

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        1 => Just(Command::Start),
        1 => Just(Command::Pause),
        1 => Just(Command::Resume),
        6 => Just(Command::Tick),
        1 => Just(Command::SkipRest),
    ]
}

fn apply(engine: &mut TimerEngine, settings: &Settings, command: Command) -> Vec<Event> {
    match command {
        Command::Start => engine.start(settings).into_iter().collect(),
        Command::Pause => engine.pause().into_iter().collect(),
        Command::Resume => engine.resume().into_iter().collect(),
        Command::Tick => engine.tick(settings),
        Command::SkipRest => engine.skip_rest(settings),
    }
}

proptest! {
    /// For every reachable state, the countdown stays within
    /// `[0, active_duration]`.
    #[test]
    fn remaining_stays_within_active_duration(
        work_minutes in 1u32..3,
        rest_seconds in 1u32..10,
        auto_start in any::<bool>(),
        commands in prop::collection::vec(command_strategy(), 1..500),
    ) {
        let settings = Settings {
            work_minutes,
            rest_seconds,
            auto_start,
            theme: "light".to_string(),
        };
        let mut engine = TimerEngine::new(&settings);

        for command in commands {
            apply(&mut engine, &settings, command);
            let info = engine.snapshot();
            let active = match info.phase {
                Phase::Resting => info.rest_duration_seconds,
                _ => info.work_duration_seconds,
            };
            prop_assert!(info.remaining_seconds <= active);
        }
    }

    /// A rest completion event is only ever produced by leaving `Resting`,
    /// and no single command produces more than one.
    #[test]
    fn rest_complete_fires_once_per_rest(
        auto_start in any::<bool>(),
        commands in prop::collection::vec(command_strategy(), 1..500),
    ) {
        let settings = Settings {
            work_minutes: 1,
            rest_seconds: 3,
            auto_start,
            theme: "light".to_string(),
        };
        let mut engine = TimerEngine::new(&settings);

        for command in commands {
            let phase_before = engine.phase();
            let events = apply(&mut engine, &settings, command);
            let completions = events
                .iter()
                .filter(|e| matches!(e, Event::RestComplete { .. }))
                .count();
            prop_assert!(completions <= 1);
            if completions == 1 {
                prop_assert_eq!(phase_before, Phase::Resting);
                prop_assert!(engine.phase() != Phase::Resting);
            }
        }
    }

    /// Ticks while `Stopped` or `Paused` never change state or emit events.
    #[test]
    fn inert_phases_ignore_ticks(tick_count in 1usize..50) {
        let settings = Settings::default();
        let mut engine = TimerEngine::new(&settings);

        let before = engine.clone();
        for _ in 0..tick_count {
            prop_assert!(engine.tick(&settings).is_empty());
        }
        prop_assert_eq!(&engine, &before);

        engine.start(&settings);
        engine.tick(&settings);
        engine.pause();
        let frozen = engine.clone();
        for _ in 0..tick_count {
            prop_assert!(engine.tick(&settings).is_empty());
        }
        prop_assert_eq!(&engine, &frozen);
    }
}
