#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tikmings engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that systems react to deterministically. Read-only views such as
//! [`TerrainView`] and [`AgentView`] expose snapshots without granting
//! mutable access to the world.

use serde::{Deserialize, Serialize};

/// Number of simulation ticks that make up one second of game time.
///
/// Tick-counted timers (the bomber fuse, spawn cadence) are derived from this
/// value rather than from wall-clock time.
pub const TICKS_PER_SECOND: u32 = 30;

/// Width of the terrain field used when a level omits explicit dimensions.
pub const DEFAULT_FIELD_WIDTH: u32 = 800;

/// Height of the terrain field used when a level omits explicit dimensions.
pub const DEFAULT_FIELD_HEIGHT: u32 = 600;

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation by one discrete step.
    Tick,
    /// Signals that one second of wall-clock time elapsed for the level timer.
    ElapseSecond,
    /// Requests that a skill be assigned to the agent nearest to the target.
    AssignSkill {
        /// Point in field coordinates the player selected.
        target: Point,
        /// Skill drawn from the level inventory.
        skill: Skill,
    },
    /// Loads the next level after the current one resolved successfully.
    AdvanceLevel,
    /// Reloads the current level after it was failed.
    RetryLevel,
    /// Restores the starting lives and reloads the first level.
    RestartCampaign,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the global tick counter advanced.
    TimeAdvanced {
        /// Index of the tick that just completed.
        tick: u64,
    },
    /// Announces that a level was (re)loaded and play started.
    LevelStarted {
        /// Zero-based position of the level within the campaign.
        level_index: usize,
    },
    /// Confirms that an agent emerged from the entrance.
    AgentSpawned {
        /// Identifier allocated to the agent.
        agent: AgentId,
        /// Position the agent occupies after spawning.
        position: Point,
    },
    /// Reports that an agent's state machine switched state.
    AgentStateChanged {
        /// Identifier of the agent.
        agent: AgentId,
        /// State the agent left.
        from: AgentState,
        /// State the agent entered.
        to: AgentState,
    },
    /// Confirms that a skill assignment was accepted.
    SkillAssigned {
        /// Identifier of the agent receiving the skill.
        agent: AgentId,
        /// Skill that was assigned.
        skill: Skill,
        /// Inventory count left for the skill after the assignment.
        remaining: u32,
    },
    /// Reports that an agent received a lethal outcome.
    AgentKilled {
        /// Identifier of the agent.
        agent: AgentId,
        /// What killed the agent.
        cause: DeathCause,
    },
    /// Reports that an agent reached the exit and counts as saved.
    AgentSaved {
        /// Identifier of the saved agent.
        agent: AgentId,
    },
    /// Reports that an agent left the active set.
    AgentRemoved {
        /// Identifier of the removed agent.
        agent: AgentId,
    },
    /// Reports that a bomber fuse expired and carved the terrain.
    BomberExploded {
        /// Identifier of the exploding agent.
        agent: AgentId,
        /// Centre of the explosion crater.
        at: Point,
    },
    /// Reports the level timer after a heartbeat.
    TimeRemainingChanged {
        /// Seconds left before the level times out.
        seconds: u32,
    },
    /// Reports that the level timer reached zero.
    TimeExpired,
    /// Announces that the level finished and reports the outcome.
    LevelResolved {
        /// Outcome reached by the level.
        outcome: LevelOutcome,
        /// Number of agents that reached the exit.
        saved: u32,
        /// Number of agents the level required.
        required: u32,
    },
}

/// Point in continuous field coordinates measured in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate, growing to the right.
    pub x: f32,
    /// Vertical coordinate, growing downwards.
    pub y: f32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Horizontal facing of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Moving toward decreasing x.
    Left,
    /// Moving toward increasing x.
    Right,
}

impl Facing {
    /// Returns `-1.0` for [`Facing::Left`] and `1.0` for [`Facing::Right`].
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// Returns the opposite facing.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Behaviour an agent carries. `Walker` means no skill has been assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    /// Default behaviour, never drawn from an inventory.
    Walker,
    /// Opens an umbrella so falls are never lethal.
    Floater,
    /// Lights a fuse that blows a crater after five seconds.
    Bomber,
    /// Stands still and turns other walkers around.
    Blocker,
    /// Lays a staircase of up to twelve steps.
    Builder,
    /// Tunnels horizontally through terrain.
    Basher,
    /// Tunnels diagonally downwards.
    Miner,
    /// Digs vertically downwards.
    Digger,
}

impl Skill {
    /// Skills that can be drawn from a level inventory, in panel order.
    pub const ASSIGNABLE: [Skill; 7] = [
        Skill::Floater,
        Skill::Bomber,
        Skill::Blocker,
        Skill::Builder,
        Skill::Basher,
        Skill::Miner,
        Skill::Digger,
    ];

    /// Reports whether the skill may be layered onto an agent that already
    /// carries another skill.
    #[must_use]
    pub const fn stacks(self) -> bool {
        matches!(self, Self::Floater | Self::Bomber)
    }

    /// Lower-case name used by level packs and scripts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Walker => "walker",
            Self::Floater => "floater",
            Self::Bomber => "bomber",
            Self::Blocker => "blocker",
            Self::Builder => "builder",
            Self::Basher => "basher",
            Self::Miner => "miner",
            Self::Digger => "digger",
        }
    }
}

/// States of the per-agent finite-state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Accelerating downwards under gravity.
    Faller,
    /// Walking along the terrain surface.
    Walker,
    /// Descending slowly under an umbrella.
    Floater,
    /// Digging straight down.
    Digger,
    /// Tunnelling horizontally.
    Basher,
    /// Tunnelling diagonally downwards.
    Miner,
    /// Laying staircase steps.
    Builder,
    /// Standing still as an obstacle.
    Blocker,
    /// Playing the splat animation after a lethal fall.
    Splatting,
    /// Playing the death animation before removal.
    Dying,
}

impl AgentState {
    /// Reports whether the agent is already past the point of rescue.
    #[must_use]
    pub const fn is_doomed(self) -> bool {
        matches!(self, Self::Splatting | Self::Dying)
    }
}

/// Reasons an agent can die.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Landed after falling too far.
    Splat,
    /// Touched water or a pit.
    Hazard,
    /// A bomber fuse expired.
    Explosion,
    /// The level timer ran out.
    TimeUp,
    /// Fell past the bottom edge of the field.
    OutOfBounds,
}

/// Outcome state machine of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelOutcome {
    /// The level is still running.
    Playing,
    /// Enough agents were saved and another level follows.
    Success,
    /// Too few agents were saved; a life was consumed.
    Failure,
    /// Too few agents were saved and no lives remain.
    GameOver,
    /// The final level was completed.
    Won,
}

impl LevelOutcome {
    /// Reports whether the level has finished.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

/// Material types accepted in level geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    /// Diggable ground.
    Earth,
    /// Solid ledge.
    Platform,
    /// Solid ground.
    Floor,
    /// Lethal water.
    Water,
    /// Lethal pit.
    Pit,
    /// Lethal pit drawn without a fill.
    PitEmpty,
}

impl TerrainKind {
    /// Reports whether the material contributes to the solidity grid.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Earth | Self::Platform | Self::Floor)
    }

    /// Reports whether the material is a lethal hazard zone.
    #[must_use]
    pub const fn is_hazard(self) -> bool {
        !self.is_solid()
    }
}

/// Typed axis-aligned rectangle describing level geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainRect {
    /// Left edge in pixels.
    pub x: i32,
    /// Top edge in pixels.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Material of the rectangle.
    #[serde(rename = "type")]
    pub kind: TerrainKind,
}

impl TerrainRect {
    /// Creates a new typed rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32, kind: TerrainKind) -> Self {
        Self {
            x,
            y,
            width,
            height,
            kind,
        }
    }

    /// Reports whether the point lies inside the rectangle (right and bottom
    /// edges excluded).
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        let left = self.x as f32;
        let top = self.y as f32;
        point.x >= left
            && point.x < left + self.width as f32
            && point.y >= top
            && point.y < top + self.height as f32
    }
}

/// Remaining skill counts declared by a level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillCounts {
    /// Floater charges.
    pub floater: u32,
    /// Bomber charges.
    pub bomber: u32,
    /// Blocker charges.
    pub blocker: u32,
    /// Builder charges.
    pub builder: u32,
    /// Basher charges.
    pub basher: u32,
    /// Miner charges.
    pub miner: u32,
    /// Digger charges.
    pub digger: u32,
}

impl SkillCounts {
    /// Count declared for the skill. `Walker` always reports zero.
    #[must_use]
    pub const fn get(&self, skill: Skill) -> u32 {
        match skill {
            Skill::Walker => 0,
            Skill::Floater => self.floater,
            Skill::Bomber => self.bomber,
            Skill::Blocker => self.blocker,
            Skill::Builder => self.builder,
            Skill::Basher => self.basher,
            Skill::Miner => self.miner,
            Skill::Digger => self.digger,
        }
    }
}

/// Complete description of a single level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    /// Human readable level title.
    pub name: String,
    /// Width of the terrain field in pixels.
    #[serde(default = "default_field_width")]
    pub width: u32,
    /// Height of the terrain field in pixels.
    #[serde(default = "default_field_height")]
    pub height: u32,
    /// Entrance where agents spawn.
    #[serde(default)]
    pub start: Option<Point>,
    /// Exit agents must reach.
    #[serde(default)]
    pub exit: Option<Point>,
    /// Seconds available before every agent is killed.
    pub time_limit_seconds: u32,
    /// Number of agents released by the entrance.
    pub total_agents: u32,
    /// Number of agents that must be saved.
    pub required_to_save: u32,
    /// Skill inventory available for the level.
    #[serde(default)]
    pub skills: SkillCounts,
    /// Typed rectangles composing terrain and hazards.
    #[serde(default)]
    pub geometry: Vec<TerrainRect>,
}

const fn default_field_width() -> u32 {
    DEFAULT_FIELD_WIDTH
}

const fn default_field_height() -> u32 {
    DEFAULT_FIELD_HEIGHT
}

/// Immutable representation of a single agent's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Feet position of the agent.
    pub position: Point,
    /// Current state of the agent's state machine.
    pub state: AgentState,
    /// Skill the agent carries.
    pub skill: Skill,
    /// Direction the agent faces.
    pub facing: Facing,
    /// Ticks left on a lit bomber fuse.
    pub fuse_ticks: Option<u32>,
}

/// Read-only snapshot describing all active agents.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured agent snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no agents were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Looks up the snapshot of a specific agent.
    #[must_use]
    pub fn get(&self, agent: AgentId) -> Option<&AgentSnapshot> {
        self.snapshots
            .binary_search_by_key(&agent, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AgentSnapshot> {
        self.snapshots
    }
}

/// Read-only view into a packed solidity bitset.
///
/// Bits are stored row-major; each row starts on a fresh `u64` word so rows
/// can be scanned independently.
#[derive(Clone, Copy, Debug)]
pub struct TerrainView<'a> {
    words: &'a [u64],
    width: u32,
    height: u32,
}

impl<'a> TerrainView<'a> {
    /// Captures a new terrain view backed by the provided words.
    #[must_use]
    pub fn new(words: &'a [u64], width: u32, height: u32) -> Self {
        Self {
            words,
            width,
            height,
        }
    }

    /// Number of `u64` words used to store a single row of the given width.
    #[must_use]
    pub const fn words_per_row(width: u32) -> usize {
        (width as usize + 63) / 64
    }

    /// Resolves the word index and bit mask that store `(x, y)`.
    ///
    /// Returns `None` for coordinates outside `[0, width) × [0, height)`.
    #[must_use]
    pub fn locate(width: u32, height: u32, x: i32, y: i32) -> Option<(usize, u64)> {
        let column = u32::try_from(x).ok()?;
        let row = u32::try_from(y).ok()?;
        if column >= width || row >= height {
            return None;
        }
        let stride = Self::words_per_row(width);
        let index = row as usize * stride + column as usize / 64;
        Some((index, 1_u64 << (column % 64)))
    }

    /// Reports whether the cell is solid. Out-of-bounds cells are never solid.
    #[must_use]
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        Self::locate(self.width, self.height, x, y).map_or(false, |(index, mask)| {
            self.words.get(index).map_or(false, |word| word & mask != 0)
        })
    }

    /// Provides the dimensions of the underlying field.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Counts solid cells across the whole field.
    #[must_use]
    pub fn solid_count(&self) -> u64 {
        self.words
            .iter()
            .map(|word| u64::from(word.count_ones()))
            .sum()
    }

    /// Iterates over the cells of a single row, left to right.
    pub fn row(&self, y: u32) -> impl Iterator<Item = bool> + '_ {
        let row = i32::try_from(y).unwrap_or(i32::MAX);
        (0..self.width).map(move |x| self.is_solid(x as i32, row))
    }
}

/// Counters describing the progress of the active level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LevelCounters {
    /// Zero-based index of the active level.
    pub level_index: usize,
    /// Number of levels in the campaign.
    pub level_count: usize,
    /// Agents that reached the exit.
    pub saved: u32,
    /// Agents the level requires.
    pub required: u32,
    /// Agents still waiting behind the entrance.
    pub to_spawn: u32,
    /// Lives left in the campaign.
    pub lives: u32,
    /// Seconds left on the level timer.
    pub time_remaining: u32,
    /// Current outcome of the level.
    pub outcome: LevelOutcome,
    /// Global tick index.
    pub tick: u64,
}
