use std::time::Duration;

use tikmings_core::{Command, Event, TICKS_PER_SECOND};
use tikmings_system_clock::{Clock, ClockConfig};

const FRAME: Duration = Duration::from_micros(16_667);

fn count(commands: &[Command], wanted: Command) -> usize {
    commands.iter().filter(|command| **command == wanted).count()
}

#[test]
fn emits_one_tick_every_two_frames() {
    let mut clock = Clock::default();
    let mut commands = Vec::new();

    clock.advance(FRAME, &mut commands);
    assert!(commands.is_empty(), "no tick after a single frame");

    clock.advance(FRAME, &mut commands);
    assert_eq!(commands, vec![Command::Tick]);
}

#[test]
fn sixty_frames_make_one_second_of_simulation() {
    let mut clock = Clock::default();
    let mut commands = Vec::new();
    for _ in 0..60 {
        clock.advance(FRAME, &mut commands);
    }

    assert_eq!(count(&commands, Command::Tick), TICKS_PER_SECOND as usize);
    assert_eq!(count(&commands, Command::ElapseSecond), 1);
}

#[test]
fn slow_frames_do_not_speed_up_ticks() {
    let mut clock = Clock::default();
    let mut commands = Vec::new();

    clock.advance(Duration::from_millis(2_500), &mut commands);
    clock.advance(Duration::from_millis(10), &mut commands);

    assert_eq!(count(&commands, Command::Tick), 1);
    assert_eq!(count(&commands, Command::ElapseSecond), 2);
    assert_eq!(clock.pending(), Duration::from_millis(510));
}

#[test]
fn tick_precedes_heartbeat_within_a_frame() {
    let mut clock = Clock::new(ClockConfig::new(1, Duration::from_millis(100)));
    let mut commands = Vec::new();

    clock.advance(Duration::from_millis(100), &mut commands);

    assert_eq!(commands, vec![Command::Tick, Command::ElapseSecond]);
}

#[test]
fn level_start_restarts_the_heartbeat() {
    let mut clock = Clock::default();
    let mut commands = Vec::new();
    clock.advance(Duration::from_millis(900), &mut commands);

    clock.handle(&[Event::LevelStarted { level_index: 1 }]);
    clock.advance(Duration::from_millis(200), &mut commands);

    assert_eq!(count(&commands, Command::ElapseSecond), 0);
    assert_eq!(clock.pending(), Duration::from_millis(200));

    clock.handle(&[Event::TimeAdvanced { tick: 9 }]);
    assert_eq!(clock.pending(), Duration::from_millis(200));
}
