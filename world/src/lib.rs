#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Tikmings.
//!
//! The world owns the campaign, the active level and every agent. It only
//! changes in response to [`Command`]s passed through [`apply`] and reports
//! everything that happened as [`Event`]s. Adapters read state through the
//! [`query`] module.

mod agent;
mod campaign;
mod inventory;
mod spawning;
mod terrain;

use tikmings_core::{
    AgentId, AgentState, Command, DeathCause, Event, LevelOutcome, Point, Skill, TerrainRect,
    TerrainView,
};
use tracing::{debug, info};

use crate::{
    agent::{Agent, Neighbours, StepContext},
    campaign::LevelPlan,
    spawning::{SpawnSchedule, SPAWN_INTERVAL_TICKS},
};

pub use campaign::{Campaign, LevelError, MAX_FIELD_WORDS};
pub use inventory::SkillInventory;
pub use terrain::TerrainField;

/// Distance from the exit point at which an agent counts as saved.
const EXIT_RADIUS: f32 = 20.0;

/// Lives granted to a campaign when none are configured.
pub const DEFAULT_LIVES: u32 = 3;

/// Mutable state of the level currently being played.
#[derive(Debug)]
struct Level {
    index: usize,
    name: String,
    terrain: TerrainField,
    hazards: Vec<TerrainRect>,
    entrance: Point,
    exit: Point,
    agents: Vec<Agent>,
    inventory: SkillInventory,
    spawner: SpawnSchedule,
    saved: u32,
    required: u32,
    time_remaining: u32,
    outcome: LevelOutcome,
}

impl Level {
    fn load(index: usize, plan: &LevelPlan) -> Self {
        let spec = &plan.spec;
        let (terrain, hazards) = TerrainField::load_geometry(spec.width, spec.height, &spec.geometry);
        Self {
            index,
            name: spec.name.clone(),
            terrain,
            hazards,
            entrance: plan.entrance,
            exit: plan.exit,
            agents: Vec::new(),
            inventory: SkillInventory::from_counts(&spec.skills),
            spawner: SpawnSchedule::new(SPAWN_INTERVAL_TICKS, spec.total_agents),
            saved: 0,
            required: spec.required_to_save,
            time_remaining: spec.time_limit_seconds,
            outcome: LevelOutcome::Playing,
        }
    }

    fn step_agents(&mut self, out_events: &mut Vec<Event>) {
        for index in 0..self.agents.len() {
            let (before, rest) = self.agents.split_at_mut(index);
            let Some((agent, after)) = rest.split_first_mut() else {
                break;
            };
            let mut context = StepContext {
                terrain: &mut self.terrain,
                neighbours: Neighbours::new(before, after),
            };
            agent.step(&mut context, out_events);
        }
    }

    fn apply_hazards(&mut self, out_events: &mut Vec<Event>) {
        for agent in &mut self.agents {
            if !agent.is_active() {
                continue;
            }
            let feet = agent.position();
            if self.hazards.iter().any(|hazard| hazard.contains(feet)) {
                agent.kill(DeathCause::Hazard, out_events);
            }
        }
    }

    fn collect_exits(&mut self, out_events: &mut Vec<Event>) {
        for agent in &mut self.agents {
            if !agent.is_live() || agent.position().distance(self.exit) >= EXIT_RADIUS {
                continue;
            }
            agent.mark_exited();
            self.saved += 1;
            debug!(agent = agent.id().get(), saved = self.saved, "agent reached the exit");
            out_events.push(Event::AgentSaved { agent: agent.id() });
        }
    }

    fn remove_departed(&mut self, out_events: &mut Vec<Event>) {
        self.agents.retain(|agent| {
            if agent.is_active() {
                return true;
            }
            out_events.push(Event::AgentRemoved { agent: agent.id() });
            false
        });
    }

    /// Picks the live agent whose hit box contains the point, preferring the
    /// one closest to it.
    fn agent_at(&self, point: Point) -> Option<usize> {
        self.agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| agent.is_live())
            .filter_map(|(index, agent)| agent.hit_distance(point).map(|distance| (index, distance)))
            .min_by(|(_, left), (_, right)| left.total_cmp(right))
            .map(|(index, _)| index)
    }

    fn ready_to_resolve(&self) -> bool {
        self.outcome == LevelOutcome::Playing
            && self.spawner.remaining() == 0
            && self
                .agents
                .iter()
                .all(|agent| agent.state() == AgentState::Blocker)
    }
}

/// Represents the authoritative Tikmings world state.
#[derive(Debug)]
pub struct World {
    campaign: Campaign,
    level: Level,
    starting_lives: u32,
    lives: u32,
    next_agent_id: u32,
    tick_index: u64,
}

impl World {
    /// Creates a world playing the first level of the campaign.
    #[must_use]
    pub fn new(campaign: Campaign, lives: u32) -> Self {
        let level = Level::load(0, campaign.first());
        Self {
            campaign,
            level,
            starting_lives: lives,
            lives,
            next_agent_id: 0,
            tick_index: 0,
        }
    }

    fn is_playing(&self) -> bool {
        !self.level.outcome.is_resolved()
    }

    fn load_level(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let Some(plan) = self.campaign.plan(index) else {
            return;
        };
        self.level = Level::load(index, plan);
        info!(
            level = index,
            name = %self.level.name,
            lives = self.lives,
            "level started"
        );
        out_events.push(Event::LevelStarted { level_index: index });
    }

    fn run_tick(&mut self, out_events: &mut Vec<Event>) {
        self.spawn_agent(out_events);
        self.level.step_agents(out_events);
        self.level.apply_hazards(out_events);
        self.level.collect_exits(out_events);
        self.level.remove_departed(out_events);
        self.evaluate(out_events);
    }

    fn spawn_agent(&mut self, out_events: &mut Vec<Event>) {
        if !self.level.spawner.advance() {
            return;
        }
        let id = AgentId::new(self.next_agent_id);
        self.next_agent_id = self.next_agent_id.wrapping_add(1);
        let position = self.level.entrance;
        self.level.agents.push(Agent::spawn(id, position));
        debug!(
            agent = id.get(),
            remaining = self.level.spawner.remaining(),
            "agent released"
        );
        out_events.push(Event::AgentSpawned {
            agent: id,
            position,
        });
    }

    fn elapse_second(&mut self, out_events: &mut Vec<Event>) {
        if self.level.time_remaining == 0 {
            return;
        }
        self.level.time_remaining -= 1;
        out_events.push(Event::TimeRemainingChanged {
            seconds: self.level.time_remaining,
        });
        if self.level.time_remaining > 0 {
            return;
        }

        info!(level = self.level.index, "time expired");
        out_events.push(Event::TimeExpired);
        self.level.spawner.halt();
        for agent in &mut self.level.agents {
            agent.kill(DeathCause::TimeUp, out_events);
        }
        self.evaluate(out_events);
    }

    fn assign_skill(&mut self, target: Point, skill: Skill, out_events: &mut Vec<Event>) {
        let level = &mut self.level;
        let Some(index) = level.agent_at(target) else {
            debug!(?target, ?skill, "no agent under the cursor");
            return;
        };
        let Some(agent) = level.agents.get_mut(index) else {
            return;
        };
        if !agent.accepts(skill) {
            debug!(agent = agent.id().get(), ?skill, state = ?agent.state(), "assignment rejected");
            return;
        }
        if !level.inventory.consume(skill) {
            debug!(agent = agent.id().get(), ?skill, "no charges left");
            return;
        }

        out_events.push(Event::SkillAssigned {
            agent: agent.id(),
            skill,
            remaining: level.inventory.remaining(skill),
        });
        agent.take_skill(skill, out_events);
    }

    fn evaluate(&mut self, out_events: &mut Vec<Event>) {
        if !self.level.ready_to_resolve() {
            return;
        }
        let level = &mut self.level;
        let outcome = if level.saved >= level.required {
            if level.index + 1 >= self.campaign.len() {
                LevelOutcome::Won
            } else {
                LevelOutcome::Success
            }
        } else {
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                LevelOutcome::GameOver
            } else {
                LevelOutcome::Failure
            }
        };
        level.outcome = outcome;

        info!(
            level = level.index,
            ?outcome,
            saved = level.saved,
            required = level.required,
            lives = self.lives,
            "level resolved"
        );
        out_events.push(Event::LevelResolved {
            outcome,
            saved: level.saved,
            required: level.required,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced {
                tick: world.tick_index,
            });
            if world.is_playing() {
                world.run_tick(out_events);
            }
        }
        Command::ElapseSecond => {
            if world.is_playing() {
                world.elapse_second(out_events);
            }
        }
        Command::AssignSkill { target, skill } => {
            if world.is_playing() {
                world.assign_skill(target, skill, out_events);
            }
        }
        Command::AdvanceLevel => {
            if world.level.outcome == LevelOutcome::Success {
                let next = world.level.index + 1;
                world.load_level(next, out_events);
            }
        }
        Command::RetryLevel => {
            if world.level.outcome == LevelOutcome::Failure {
                let current = world.level.index;
                world.load_level(current, out_events);
            }
        }
        Command::RestartCampaign => {
            if matches!(
                world.level.outcome,
                LevelOutcome::GameOver | LevelOutcome::Won
            ) {
                world.lives = world.starting_lives;
                world.load_level(0, out_events);
            }
        }
    }
}

/// Read-only capture of everything a renderer needs for one frame.
#[derive(Clone, Debug)]
pub struct Snapshot<'a> {
    /// Solidity of the active level.
    pub terrain: TerrainView<'a>,
    /// Active agents sorted by identifier.
    pub agents: tikmings_core::AgentView,
    /// Level progress counters.
    pub counters: tikmings_core::LevelCounters,
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tikmings_core::{
        AgentId, AgentView, LevelCounters, LevelOutcome, Point, TerrainRect, TerrainView,
    };

    use super::{SkillInventory, Snapshot, World};

    /// Captures a read-only view of the active level's terrain.
    #[must_use]
    pub fn terrain(world: &World) -> TerrainView<'_> {
        world.level.terrain.view()
    }

    /// Reports whether a terrain pixel is solid.
    #[must_use]
    pub fn is_solid(world: &World, x: i32, y: i32) -> bool {
        world.level.terrain.is_solid(x, y)
    }

    /// Captures a read-only view of every active agent.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        AgentView::from_snapshots(world.level.agents.iter().map(|agent| agent.snapshot()).collect())
    }

    /// Collects the progress counters of the active level.
    #[must_use]
    pub fn counters(world: &World) -> LevelCounters {
        let level = &world.level;
        LevelCounters {
            level_index: level.index,
            level_count: world.campaign.len(),
            saved: level.saved,
            required: level.required,
            to_spawn: level.spawner.remaining(),
            lives: world.lives,
            time_remaining: level.time_remaining,
            outcome: level.outcome,
            tick: world.tick_index,
        }
    }

    /// Remaining skill charges of the active level.
    #[must_use]
    pub fn inventory(world: &World) -> &SkillInventory {
        &world.level.inventory
    }

    /// Hazard rectangles of the active level in declaration order.
    #[must_use]
    pub fn hazards(world: &World) -> &[TerrainRect] {
        &world.level.hazards
    }

    /// Point where agents are released.
    #[must_use]
    pub fn entrance(world: &World) -> Point {
        world.level.entrance
    }

    /// Point agents must reach to be saved.
    #[must_use]
    pub fn exit(world: &World) -> Point {
        world.level.exit
    }

    /// Outcome of the active level.
    #[must_use]
    pub fn outcome(world: &World) -> LevelOutcome {
        world.level.outcome
    }

    /// Title of the active level.
    #[must_use]
    pub fn level_name(world: &World) -> &str {
        &world.level.name
    }

    /// Identifier of the agent an assignment at `point` would target.
    #[must_use]
    pub fn agent_at(world: &World, point: Point) -> Option<AgentId> {
        let level = &world.level;
        level
            .agent_at(point)
            .and_then(|index| level.agents.get(index))
            .map(|agent| agent.id())
    }

    /// Captures terrain, agents and counters in one call.
    #[must_use]
    pub fn snapshot(world: &World) -> Snapshot<'_> {
        Snapshot {
            terrain: terrain(world),
            agents: agent_view(world),
            counters: counters(world),
        }
    }
}
