//! Per-agent finite-state machine.
//!
//! Each [`Agent`] advances exactly once per tick through [`Agent::step`],
//! reading and carving the shared [`TerrainField`] handed in through a
//! [`StepContext`]. Agents are stepped sequentially, so a carve performed by
//! one agent is visible to every agent stepped after it within the same tick.

use tikmings_core::{
    AgentId, AgentSnapshot, AgentState, DeathCause, Event, Facing, Point, Skill, TICKS_PER_SECOND,
};

use crate::terrain::{pixel, TerrainField};

const GRAVITY: f32 = 0.2;
const WALK_SPEED: f32 = 0.8;
const SPLAT_DISTANCE: f32 = 180.0;
const FLOATER_OPEN_DISTANCE: f32 = 30.0;
const FLOATER_SPEED: f32 = 1.2;
const MAX_STEP_UP: i32 = 6;
const MAX_STEP_DOWN: i32 = 4;
const MAX_LANDING_SNAP: i32 = 15;

const DIG_CADENCE: u32 = 15;
const DIG_RADIUS: f32 = 12.0;
const DIG_DEPTH: f32 = 8.0;
const DIG_DESCENT: f32 = 4.0;

const BASH_CADENCE: u32 = 8;
const BASH_RADIUS: f32 = 12.0;
const BASH_REACH: f32 = 14.0;
const BASH_LIFT: f32 = 14.0;
const BASH_PROBE_LIFT: f32 = 10.0;
const BASH_ADVANCE: f32 = 1.5;

const MINE_CADENCE: u32 = 12;
const MINE_RADIUS: f32 = 12.0;
const MINE_REACH: f32 = 8.0;
const MINE_DEPTH: f32 = 4.0;
const MINE_ADVANCE_X: f32 = 3.0;
const MINE_ADVANCE_Y: f32 = 2.5;

const BUILD_CADENCE: u32 = 40;
const BUILD_STEP_WIDTH: u32 = 10;
const BUILD_STEP_HEIGHT: u32 = 3;
const BUILD_ADVANCE: f32 = 6.0;
const BUILD_RISE: f32 = 2.0;
const BUILD_MAX_STEPS: u32 = 12;

const SPLAT_TICKS: u32 = 60;
const DYING_TICKS: u32 = 40;

const FUSE_TICKS: u32 = 5 * TICKS_PER_SECOND;
const EXPLOSION_RADIUS: f32 = 25.0;

const BLOCKER_REACH: f32 = 6.0;
const BLOCKER_HEIGHT: f32 = 10.0;

const BODY_LIFT: f32 = 10.0;
const HIT_HALF_WIDTH: f32 = 8.0;
const HIT_HALF_HEIGHT: f32 = 12.0;

/// Mutable simulation context handed to every agent update.
#[derive(Debug)]
pub(crate) struct StepContext<'a> {
    /// Terrain shared by every agent in the level.
    pub(crate) terrain: &'a mut TerrainField,
    /// Every other agent of the level, in stepping order.
    pub(crate) neighbours: Neighbours<'a>,
}

/// The agents stepped before and after the current one.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Neighbours<'a> {
    before: &'a [Agent],
    after: &'a [Agent],
}

impl<'a> Neighbours<'a> {
    pub(crate) fn new(before: &'a [Agent], after: &'a [Agent]) -> Self {
        Self { before, after }
    }

    fn blocker_ahead(&self, x: f32, y: f32, facing: Facing) -> bool {
        self.before
            .iter()
            .chain(self.after.iter())
            .filter(|other| other.is_active() && other.state == AgentState::Blocker)
            .any(|other| {
                let gap = (other.x - x) * facing.sign();
                gap > 0.0 && gap <= BLOCKER_REACH && (other.y - y).abs() < BLOCKER_HEIGHT
            })
    }
}

/// A single autonomous unit.
#[derive(Clone, Debug)]
pub(crate) struct Agent {
    id: AgentId,
    x: f32,
    y: f32,
    vy: f32,
    facing: Facing,
    state: AgentState,
    skill: Skill,
    fall_distance: f32,
    animation_timer: u32,
    construction_timer: u32,
    steps_built: u32,
    fuse: Option<u32>,
    alive: bool,
    exited: bool,
}

impl Agent {
    /// Creates a falling agent at the entrance.
    pub(crate) fn spawn(id: AgentId, entrance: Point) -> Self {
        Self {
            id,
            x: entrance.x,
            y: entrance.y,
            vy: 0.0,
            facing: Facing::Right,
            state: AgentState::Faller,
            skill: Skill::Walker,
            fall_distance: 0.0,
            animation_timer: 0,
            construction_timer: 0,
            steps_built: 0,
            fuse: None,
            alive: true,
            exited: false,
        }
    }

    pub(crate) fn id(&self) -> AgentId {
        self.id
    }

    pub(crate) fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub(crate) fn state(&self) -> AgentState {
        self.state
    }

    /// Still part of the simulation.
    pub(crate) fn is_active(&self) -> bool {
        self.alive && !self.exited
    }

    /// Active and not already on the way out through a death animation.
    pub(crate) fn is_live(&self) -> bool {
        self.is_active() && !self.state.is_doomed()
    }

    pub(crate) fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            position: self.position(),
            state: self.state,
            skill: self.skill,
            facing: self.facing,
            fuse_ticks: self.fuse,
        }
    }

    /// Distance from `point` to the body centre when the point lies inside
    /// the agent's hit box.
    pub(crate) fn hit_distance(&self, point: Point) -> Option<f32> {
        let centre = Point::new(self.x, self.y - BODY_LIFT);
        let inside = (point.x - centre.x).abs() <= HIT_HALF_WIDTH
            && (point.y - centre.y).abs() <= HIT_HALF_HEIGHT;
        inside.then(|| point.distance(centre))
    }

    /// Checks the assignment protocol without mutating anything.
    pub(crate) fn accepts(&self, skill: Skill) -> bool {
        if !self.is_live() || skill == Skill::Walker {
            return false;
        }
        skill.stacks() || (self.skill == Skill::Walker && self.state == AgentState::Walker)
    }

    /// Applies an accepted skill. Callers check [`Agent::accepts`] and draw
    /// from the inventory first.
    pub(crate) fn take_skill(&mut self, skill: Skill, out_events: &mut Vec<Event>) {
        match skill {
            Skill::Walker => {}
            Skill::Bomber => self.fuse = Some(FUSE_TICKS),
            Skill::Floater => {
                self.skill = Skill::Floater;
                if self.state == AgentState::Faller {
                    self.enter(AgentState::Floater, out_events);
                }
            }
            Skill::Blocker => {
                self.skill = Skill::Blocker;
                self.enter(AgentState::Blocker, out_events);
            }
            Skill::Builder | Skill::Basher | Skill::Miner | Skill::Digger => {
                self.skill = skill;
                self.construction_timer = 0;
                self.steps_built = 0;
                self.enter(working_state(skill), out_events);
            }
        }
    }

    /// Sends the agent into the dying animation unless it is already dying.
    pub(crate) fn kill(&mut self, cause: DeathCause, out_events: &mut Vec<Event>) {
        if !self.is_active() || self.state == AgentState::Dying {
            return;
        }
        if self.state != AgentState::Splatting {
            out_events.push(Event::AgentKilled {
                agent: self.id,
                cause,
            });
        }
        self.fuse = None;
        self.animation_timer = 0;
        self.enter(AgentState::Dying, out_events);
    }

    /// Marks the agent as having reached the exit.
    pub(crate) fn mark_exited(&mut self) {
        self.exited = true;
    }

    /// Advances the agent by one tick.
    pub(crate) fn step(&mut self, context: &mut StepContext<'_>, out_events: &mut Vec<Event>) {
        if !self.is_active() {
            return;
        }
        if self.burn_fuse(context.terrain, out_events) {
            return;
        }

        match self.state {
            AgentState::Faller => self.fall(context.terrain, out_events),
            AgentState::Floater => self.float(context.terrain, out_events),
            AgentState::Walker => self.walk(context, out_events),
            AgentState::Digger => self.dig(context.terrain, out_events),
            AgentState::Basher => self.bash(context.terrain, out_events),
            AgentState::Miner => self.mine(context.terrain, out_events),
            AgentState::Builder => self.build(context.terrain, out_events),
            AgentState::Blocker => self.block(context.terrain, out_events),
            AgentState::Splatting => self.splat(out_events),
            AgentState::Dying => self.die(),
        }
    }

    fn burn_fuse(&mut self, terrain: &mut TerrainField, out_events: &mut Vec<Event>) -> bool {
        if self.state.is_doomed() {
            return false;
        }
        let Some(remaining) = self.fuse else {
            return false;
        };
        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.fuse = Some(remaining);
            return false;
        }

        self.fuse = None;
        terrain.remove_circle(self.x, self.y, EXPLOSION_RADIUS);
        out_events.push(Event::BomberExploded {
            agent: self.id,
            at: self.position(),
        });
        out_events.push(Event::AgentKilled {
            agent: self.id,
            cause: DeathCause::Explosion,
        });
        self.alive = false;
        self.exited = true;
        true
    }

    fn fall(&mut self, terrain: &TerrainField, out_events: &mut Vec<Event>) {
        self.vy += GRAVITY;
        if let Some(row) = self.descend(terrain, self.vy) {
            self.land(terrain, row, out_events);
            return;
        }
        if self.fell_out(terrain, out_events) {
            return;
        }
        if self.skill == Skill::Floater && self.fall_distance > FLOATER_OPEN_DISTANCE {
            self.enter(AgentState::Floater, out_events);
        }
    }

    fn float(&mut self, terrain: &TerrainField, out_events: &mut Vec<Event>) {
        self.vy = FLOATER_SPEED;
        if let Some(row) = self.descend(terrain, FLOATER_SPEED) {
            self.land(terrain, row, out_events);
            return;
        }
        let _ = self.fell_out(terrain, out_events);
    }

    /// Moves the agent down by `dy`, stopping at the first solid row crossed
    /// in its column. Returns that row when the agent touched ground.
    fn descend(&mut self, terrain: &TerrainField, dy: f32) -> Option<i32> {
        let column = pixel(self.x);
        let from = self.y;
        let target = self.y + dy;
        let landing = (pixel(from)..=pixel(target)).find(|row| terrain.is_solid(column, *row));

        match landing {
            Some(row) => {
                self.fall_distance += (row as f32 - from).max(0.0);
                Some(row)
            }
            None => {
                self.fall_distance += dy;
                self.y = target;
                None
            }
        }
    }

    fn fell_out(&mut self, terrain: &TerrainField, out_events: &mut Vec<Event>) -> bool {
        if self.y < terrain.height() as f32 {
            return false;
        }
        out_events.push(Event::AgentKilled {
            agent: self.id,
            cause: DeathCause::OutOfBounds,
        });
        self.alive = false;
        self.exited = true;
        true
    }

    fn land(&mut self, terrain: &TerrainField, row: i32, out_events: &mut Vec<Event>) {
        let lethal = self.fall_distance > SPLAT_DISTANCE
            && self.skill != Skill::Floater
            && self.state != AgentState::Floater;

        let column = pixel(self.x);
        let mut feet = row;
        let mut popped = 0;
        while popped < MAX_LANDING_SNAP && terrain.is_solid(column, feet) {
            feet -= 1;
            popped += 1;
        }
        self.y = feet as f32;
        self.vy = 0.0;
        self.fall_distance = 0.0;

        if lethal {
            self.animation_timer = 0;
            self.fuse = None;
            out_events.push(Event::AgentKilled {
                agent: self.id,
                cause: DeathCause::Splat,
            });
            self.enter(AgentState::Splatting, out_events);
        } else if self.skill == Skill::Blocker {
            self.enter(AgentState::Blocker, out_events);
        } else {
            self.enter(AgentState::Walker, out_events);
        }
    }

    fn walk(&mut self, context: &mut StepContext<'_>, out_events: &mut Vec<Event>) {
        let terrain = &*context.terrain;
        let next_x = self.x + WALK_SPEED * self.facing.sign();
        if next_x < 0.0 || next_x >= terrain.width() as f32 {
            self.facing = self.facing.reversed();
            return;
        }
        if context.neighbours.blocker_ahead(self.x, self.y, self.facing) {
            self.facing = self.facing.reversed();
            return;
        }

        let column = pixel(next_x);
        let feet = pixel(self.y);
        let Some(rise) = (0..=MAX_STEP_UP).find(|rise| !terrain.is_solid(column, feet - rise)) else {
            self.facing = self.facing.reversed();
            return;
        };

        self.x = next_x;
        if rise > 0 {
            self.y = (feet - rise) as f32;
            return;
        }

        match (0..=MAX_STEP_DOWN).find(|drop| terrain.is_solid(column, feet + drop + 1)) {
            Some(drop) => self.y = (feet + drop) as f32,
            None => {
                self.fall_distance = 0.0;
                self.vy = 0.0;
                self.enter(AgentState::Faller, out_events);
            }
        }
    }

    fn dig(&mut self, terrain: &mut TerrainField, out_events: &mut Vec<Event>) {
        let dig_y = self.y + DIG_DEPTH;
        if !terrain.column_has_solid(self.x, self.y, dig_y + DIG_RADIUS) {
            self.finish(Skill::Digger, AgentState::Faller, out_events);
            return;
        }
        if self.construction_timer % DIG_CADENCE == 0 {
            terrain.remove_circle(self.x, dig_y, DIG_RADIUS);
            self.y += DIG_DESCENT;
        }
        self.construction_timer += 1;
    }

    fn bash(&mut self, terrain: &mut TerrainField, out_events: &mut Vec<Event>) {
        if !terrain.solid_at(self.x, self.y + 1.0) {
            self.finish(Skill::Basher, AgentState::Faller, out_events);
            return;
        }
        if self.construction_timer % BASH_CADENCE == 0 {
            let direction = self.facing.sign();
            let reach = self.x + BASH_REACH * direction;
            let probe_end = reach + BASH_RADIUS * direction;
            if !terrain.row_has_solid(self.y - BASH_PROBE_LIFT, reach, probe_end) {
                self.finish(Skill::Basher, AgentState::Walker, out_events);
                return;
            }
            terrain.remove_circle(reach, self.y - BASH_LIFT, BASH_RADIUS);
            self.x += BASH_ADVANCE * direction;
        }
        self.construction_timer += 1;
    }

    fn mine(&mut self, terrain: &mut TerrainField, out_events: &mut Vec<Event>) {
        let direction = self.facing.sign();
        let mine_x = self.x + MINE_REACH * direction;
        let mine_y = self.y + MINE_DEPTH;
        if !terrain.column_has_solid(mine_x, self.y, mine_y + MINE_RADIUS) {
            self.finish(Skill::Miner, AgentState::Faller, out_events);
            return;
        }
        if self.construction_timer % MINE_CADENCE == 0 {
            terrain.remove_circle(mine_x, mine_y, MINE_RADIUS);
            self.x += MINE_ADVANCE_X * direction;
            self.y += MINE_ADVANCE_Y;
        }
        self.construction_timer += 1;
    }

    fn build(&mut self, terrain: &mut TerrainField, out_events: &mut Vec<Event>) {
        if !terrain.solid_at(self.x, self.y + 1.0) {
            self.finish(Skill::Builder, AgentState::Faller, out_events);
            return;
        }
        if self.construction_timer % BUILD_CADENCE == 0 {
            let direction = self.facing.sign();
            let next_x = self.x + BUILD_ADVANCE * direction;
            let next_feet = self.y - BUILD_RISE;
            if terrain.column_has_solid(next_x, next_feet - MAX_STEP_UP as f32, next_feet) {
                self.finish(Skill::Builder, AgentState::Walker, out_events);
                return;
            }

            let column = pixel(self.x);
            let left = match self.facing {
                Facing::Right => column,
                Facing::Left => column - (BUILD_STEP_WIDTH as i32 - 1),
            };
            terrain.add_rect(left, pixel(self.y) - 1, BUILD_STEP_WIDTH, BUILD_STEP_HEIGHT);
            self.x = next_x;
            self.y = next_feet;
            self.steps_built += 1;
            if self.steps_built >= BUILD_MAX_STEPS {
                self.finish(Skill::Builder, AgentState::Walker, out_events);
                return;
            }
        }
        self.construction_timer += 1;
    }

    fn block(&mut self, terrain: &TerrainField, out_events: &mut Vec<Event>) {
        if !terrain.solid_at(self.x, self.y + 1.0) {
            self.fall_distance = 0.0;
            self.vy = 0.0;
            self.enter(AgentState::Faller, out_events);
        }
    }

    fn splat(&mut self, out_events: &mut Vec<Event>) {
        self.animation_timer += 1;
        if self.animation_timer >= SPLAT_TICKS {
            self.animation_timer = 0;
            self.enter(AgentState::Dying, out_events);
        }
    }

    fn die(&mut self) {
        self.animation_timer += 1;
        if self.animation_timer >= DYING_TICKS {
            self.alive = false;
            self.exited = true;
        }
    }

    /// Leaves a working state. The skill resets to walker unless another
    /// skill (a stacked floater) replaced it in the meantime.
    fn finish(&mut self, skill: Skill, next: AgentState, out_events: &mut Vec<Event>) {
        if self.skill == skill {
            self.skill = Skill::Walker;
        }
        self.construction_timer = 0;
        self.steps_built = 0;
        self.fall_distance = 0.0;
        self.vy = 0.0;
        self.enter(next, out_events);
    }

    fn enter(&mut self, next: AgentState, out_events: &mut Vec<Event>) {
        if self.state == next {
            return;
        }
        out_events.push(Event::AgentStateChanged {
            agent: self.id,
            from: self.state,
            to: next,
        });
        self.state = next;
    }
}

fn working_state(skill: Skill) -> AgentState {
    match skill {
        Skill::Builder => AgentState::Builder,
        Skill::Basher => AgentState::Basher,
        Skill::Miner => AgentState::Miner,
        Skill::Digger => AgentState::Digger,
        Skill::Blocker => AgentState::Blocker,
        Skill::Floater => AgentState::Floater,
        Skill::Walker | Skill::Bomber => AgentState::Walker,
    }
}
