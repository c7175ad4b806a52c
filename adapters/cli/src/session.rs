//! Frame loop wiring the clock, world and progression together.

use std::{collections::VecDeque, fmt, time::Duration};

use serde::Serialize;
use tikmings_core::{Command, DeathCause, Event, LevelOutcome};
use tikmings_rendering::{
    Color, HazardPresentation, HudPresentation, OutcomeOverlay, Presentation, Scene, SceneAgent,
    TerrainRaster,
};
use tikmings_system_clock::Clock;
use tikmings_system_progression::Progression;
use tikmings_world::{self as world, query, Campaign, World};
use tracing::{debug, info};

use crate::script::AssignmentScript;

const CLEAR_COLOR: Color = Color::from_rgb_u8(0x10, 0x12, 0x1a);

/// Agents lost per cause.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct DeathTally {
    pub(crate) splat: u32,
    pub(crate) hazard: u32,
    pub(crate) explosion: u32,
    pub(crate) time_up: u32,
    pub(crate) out_of_bounds: u32,
}

impl DeathTally {
    fn record(&mut self, cause: DeathCause) {
        let slot = match cause {
            DeathCause::Splat => &mut self.splat,
            DeathCause::Hazard => &mut self.hazard,
            DeathCause::Explosion => &mut self.explosion,
            DeathCause::TimeUp => &mut self.time_up,
            DeathCause::OutOfBounds => &mut self.out_of_bounds,
        };
        *slot += 1;
    }

    fn total(&self) -> u32 {
        self.splat + self.hazard + self.explosion + self.time_up + self.out_of_bounds
    }
}

/// Result of one attempt at a level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct LevelAttempt {
    pub(crate) level: usize,
    pub(crate) name: String,
    pub(crate) outcome: LevelOutcome,
    pub(crate) saved: u32,
    pub(crate) required: u32,
    pub(crate) ticks: u64,
}

/// Everything printed once the run ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct RunSummary {
    pub(crate) frames: u64,
    pub(crate) ticks: u64,
    pub(crate) level_index: usize,
    pub(crate) outcome: LevelOutcome,
    pub(crate) lives: u32,
    pub(crate) assignments: u32,
    pub(crate) deaths: DeathTally,
    pub(crate) attempts: Vec<LevelAttempt>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ran {} frames ({} ticks); level {} is {:?} with {} lives left",
            self.frames,
            self.ticks,
            self.level_index + 1,
            self.outcome,
            self.lives
        )?;
        writeln!(
            f,
            "skills assigned: {}; agents lost: {}",
            self.assignments,
            self.deaths.total()
        )?;
        for attempt in &self.attempts {
            writeln!(
                f,
                "  level {} ({}): {:?}, saved {}/{} in {} ticks",
                attempt.level + 1,
                attempt.name,
                attempt.outcome,
                attempt.saved,
                attempt.required,
                attempt.ticks
            )?;
        }
        Ok(())
    }
}

/// Owns the simulation and the pure systems driving it.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    clock: Clock,
    progression: Progression,
    script: AssignmentScript,
    frames: u64,
    level_ticks: u64,
    assignments: u32,
    deaths: DeathTally,
    attempts: Vec<LevelAttempt>,
}

impl Session {
    pub(crate) fn new(
        campaign: Campaign,
        lives: u32,
        clock: Clock,
        progression: Progression,
        script: AssignmentScript,
    ) -> Self {
        let world = World::new(campaign, lives);
        info!(level = 0, name = %query::level_name(&world), "campaign started");
        Self {
            world,
            clock,
            progression,
            script,
            frames: 0,
            level_ticks: 0,
            assignments: 0,
            deaths: DeathTally::default(),
            attempts: Vec::new(),
        }
    }

    /// Advances the session by one rendered frame.
    pub(crate) fn frame(&mut self, frame_dt: Duration) {
        self.frames += 1;
        let mut commands = Vec::new();
        self.clock.advance(frame_dt, &mut commands);
        self.dispatch(commands);
    }

    /// Reports whether the campaign ended and no restart is pending.
    pub(crate) fn finished(&self) -> bool {
        matches!(
            query::outcome(&self.world),
            LevelOutcome::GameOver | LevelOutcome::Won
        ) && !self.progression.auto_restart()
    }

    fn dispatch(&mut self, commands: Vec<Command>) {
        let mut pending: VecDeque<Command> = commands.into();
        while let Some(command) = pending.pop_front() {
            let mut events = Vec::new();
            world::apply(&mut self.world, command, &mut events);
            self.observe(&events, &mut pending);
            self.clock.handle(&events);

            let mut follow_up = Vec::new();
            self.progression.handle(&events, &mut follow_up);
            pending.extend(follow_up);
        }
    }

    fn observe(&mut self, events: &[Event], pending: &mut VecDeque<Command>) {
        for event in events {
            match event {
                Event::TimeAdvanced { .. } => {
                    self.level_ticks += 1;
                    let level = query::counters(&self.world).level_index;
                    pending.extend(self.script.due(level, self.level_ticks));
                }
                Event::LevelStarted { level_index } => {
                    debug!(level = level_index, "level loaded");
                    self.level_ticks = 0;
                }
                Event::SkillAssigned { .. } => self.assignments += 1,
                Event::AgentKilled { cause, .. } => self.deaths.record(*cause),
                Event::LevelResolved {
                    outcome,
                    saved,
                    required,
                } => {
                    let counters = query::counters(&self.world);
                    self.attempts.push(LevelAttempt {
                        level: counters.level_index,
                        name: query::level_name(&self.world).to_owned(),
                        outcome: *outcome,
                        saved: *saved,
                        required: *required,
                        ticks: self.level_ticks,
                    });
                }
                _ => {}
            }
        }
    }

    /// Captures the current frame for a rendering backend.
    pub(crate) fn presentation(&self) -> Presentation {
        let snapshot = query::snapshot(&self.world);
        let counters = snapshot.counters;
        let inventory = query::inventory(&self.world).iter().collect();
        let hud = HudPresentation::new(query::level_name(&self.world), &counters, inventory);
        let agents = snapshot
            .agents
            .iter()
            .map(SceneAgent::from_snapshot)
            .collect();
        let hazards = query::hazards(&self.world)
            .iter()
            .map(HazardPresentation::from_rect)
            .collect();
        let entrance = query::entrance(&self.world);
        let exit = query::exit(&self.world);
        let scene = Scene::new(
            TerrainRaster::from_view(snapshot.terrain),
            hazards,
            glam::Vec2::new(entrance.x, entrance.y),
            glam::Vec2::new(exit.x, exit.y),
            agents,
            hud,
            OutcomeOverlay::for_outcome(counters.outcome, counters.saved, counters.required),
        );
        Presentation::new(
            format!("Tikmings: tick {}", counters.tick),
            CLEAR_COLOR,
            scene,
        )
    }

    pub(crate) fn summary(&self) -> RunSummary {
        let counters = query::counters(&self.world);
        RunSummary {
            frames: self.frames,
            ticks: counters.tick,
            level_index: counters.level_index,
            outcome: counters.outcome,
            lives: counters.lives,
            assignments: self.assignments,
            deaths: self.deaths,
            attempts: self.attempts.clone(),
        }
    }
}
