use tikmings_core::{Command, Event, LevelOutcome};
use tikmings_system_progression::Progression;

fn resolved(outcome: LevelOutcome) -> Event {
    Event::LevelResolved {
        outcome,
        saved: 0,
        required: 1,
    }
}

fn ticks(count: u64) -> Vec<Event> {
    (1..=count).map(|tick| Event::TimeAdvanced { tick }).collect()
}

#[test]
fn success_advances_after_the_overlay() {
    let mut progression = Progression::new(3);
    let mut commands = Vec::new();

    progression.handle(&[resolved(LevelOutcome::Success)], &mut commands);
    assert_eq!(progression.overlay(), Some(LevelOutcome::Success));
    progression.handle(&ticks(2), &mut commands);
    assert!(commands.is_empty(), "overlay still visible");

    progression.handle(&ticks(1), &mut commands);
    assert_eq!(commands, vec![Command::AdvanceLevel]);
    assert_eq!(progression.overlay(), None);

    progression.handle(&ticks(10), &mut commands);
    assert_eq!(commands.len(), 1, "a command is issued once per resolution");
}

#[test]
fn failure_retries_the_level() {
    let mut progression = Progression::new(1);
    let mut commands = Vec::new();

    let mut events = ticks(1);
    events.push(resolved(LevelOutcome::Failure));
    progression.handle(&events, &mut commands);
    assert!(commands.is_empty(), "ticks before the resolution do not count");

    progression.handle(&ticks(1), &mut commands);
    assert_eq!(commands, vec![Command::RetryLevel]);
}

#[test]
fn campaign_end_waits_unless_auto_restart() {
    let mut progression = Progression::new(2);
    let mut commands = Vec::new();
    progression.handle(&[resolved(LevelOutcome::GameOver)], &mut commands);
    progression.handle(&ticks(20), &mut commands);
    assert!(commands.is_empty());
    assert_eq!(progression.overlay(), Some(LevelOutcome::GameOver));

    let mut progression = Progression::new(2).with_auto_restart(true);
    progression.handle(&[resolved(LevelOutcome::Won)], &mut commands);
    progression.handle(&ticks(2), &mut commands);
    assert_eq!(commands, vec![Command::RestartCampaign]);
}

#[test]
fn level_start_disarms_the_countdown() {
    let mut progression = Progression::new(2);
    let mut commands = Vec::new();

    progression.handle(&[resolved(LevelOutcome::Failure)], &mut commands);
    progression.handle(&[Event::LevelStarted { level_index: 0 }], &mut commands);
    progression.handle(&ticks(5), &mut commands);

    assert!(commands.is_empty());
    assert_eq!(progression.overlay(), None);
}

#[test]
fn zero_overlay_fires_immediately() {
    let mut progression = Progression::new(0);
    let mut commands = Vec::new();
    progression.handle(&[resolved(LevelOutcome::Success)], &mut commands);
    assert_eq!(commands, vec![Command::AdvanceLevel]);
}
