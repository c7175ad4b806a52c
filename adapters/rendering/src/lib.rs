#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Tikmings adapters.
//!
//! Adapters translate world snapshots into a [`Scene`] and hand it to a
//! [`RenderingBackend`]. Nothing in this crate mutates simulation state.

use anyhow::Result as AnyResult;
use glam::Vec2;
use tikmings_core::{
    AgentId, AgentSnapshot, AgentState, Facing, LevelCounters, LevelOutcome, Skill, TerrainKind,
    TerrainRect, TerrainView, TICKS_PER_SECOND,
};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Body color used for an agent in the given state.
#[must_use]
pub const fn agent_color(state: AgentState) -> Color {
    match state {
        AgentState::Walker => Color::from_rgb_u8(0x3c, 0xb3, 0x71),
        AgentState::Faller => Color::from_rgb_u8(0x6f, 0xa8, 0xdc),
        AgentState::Floater => Color::from_rgb_u8(0x9f, 0xd8, 0xef),
        AgentState::Digger => Color::from_rgb_u8(0x8b, 0x5a, 0x2b),
        AgentState::Basher => Color::from_rgb_u8(0xe6, 0x7e, 0x22),
        AgentState::Miner => Color::from_rgb_u8(0xc6, 0x9c, 0x6d),
        AgentState::Builder => Color::from_rgb_u8(0xf1, 0xc4, 0x0f),
        AgentState::Blocker => Color::from_rgb_u8(0xc0, 0x39, 0x2b),
        AgentState::Splatting => Color::from_rgb_u8(0x7b, 0x24, 0x1c),
        AgentState::Dying => Color::from_rgb_u8(0x80, 0x80, 0x80),
    }
}

/// Fill color used for terrain and hazard rectangles.
#[must_use]
pub const fn terrain_color(kind: TerrainKind) -> Color {
    match kind {
        TerrainKind::Earth => Color::from_rgb_u8(0x8d, 0x6e, 0x4c),
        TerrainKind::Platform => Color::from_rgb_u8(0x95, 0xa5, 0xa6),
        TerrainKind::Floor => Color::from_rgb_u8(0x5d, 0x4a, 0x36),
        TerrainKind::Water => Color::from_rgb_u8(0x29, 0x80, 0xb9),
        TerrainKind::Pit => Color::from_rgb_u8(0x2c, 0x2c, 0x2c),
        TerrainKind::PitEmpty => Color::from_rgb_u8(0x11, 0x11, 0x11),
    }
}

/// Owned copy of the terrain solidity taken when the scene was captured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainRaster {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl TerrainRaster {
    /// Copies the solidity described by a terrain view.
    #[must_use]
    pub fn from_view(view: TerrainView<'_>) -> Self {
        let (width, height) = view.dimensions();
        let cells = (0..height).flat_map(|row| view.row(row)).collect();
        Self {
            width,
            height,
            cells,
        }
    }

    /// Width of the raster in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the raster in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the pixel is solid. Out-of-bounds pixels are open.
    #[must_use]
    pub fn is_solid(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.cells.get(index).copied().unwrap_or(false)
    }

    /// Fraction of solid pixels inside the block starting at `(x, y)`.
    ///
    /// The block is clipped to the raster; an empty block reports 0.
    #[must_use]
    pub fn coverage(&self, x: u32, y: u32, block_width: u32, block_height: u32) -> f32 {
        let right = x.saturating_add(block_width).min(self.width);
        let bottom = y.saturating_add(block_height).min(self.height);
        if right <= x || bottom <= y {
            return 0.0;
        }
        let total = (right - x) * (bottom - y);
        let solid = (y..bottom)
            .flat_map(|row| (x..right).map(move |column| (column, row)))
            .filter(|(column, row)| self.is_solid(*column, *row))
            .count();
        solid as f32 / total as f32
    }
}

/// Hazard rectangle drawn on top of the terrain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HazardPresentation {
    /// Top-left corner in world pixels.
    pub origin: Vec2,
    /// Extent in world pixels.
    pub size: Vec2,
    /// Material of the hazard.
    pub kind: TerrainKind,
    /// Fill color.
    pub color: Color,
}

impl HazardPresentation {
    /// Builds the presentation of a hazard rectangle.
    #[must_use]
    pub fn from_rect(rect: &TerrainRect) -> Self {
        Self {
            origin: Vec2::new(rect.x as f32, rect.y as f32),
            size: Vec2::new(rect.width as f32, rect.height as f32),
            kind: rect.kind,
            color: terrain_color(rect.kind),
        }
    }

    /// Reports whether the point lies inside the drawn rectangle.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let end = self.origin + self.size;
        point.x >= self.origin.x && point.y >= self.origin.y && point.x < end.x && point.y < end.y
    }
}

/// Single agent as seen by a renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneAgent {
    /// Identifier allocated by the world.
    pub id: AgentId,
    /// Feet position in world pixels.
    pub position: Vec2,
    /// Current state of the agent.
    pub state: AgentState,
    /// Skill the agent carries.
    pub skill: Skill,
    /// Direction the agent faces.
    pub facing: Facing,
    /// Whole seconds left on a lit bomber fuse, rounded up.
    pub fuse_seconds: Option<u32>,
    /// Body color.
    pub color: Color,
}

impl SceneAgent {
    /// Converts a world snapshot into its presentation.
    #[must_use]
    pub fn from_snapshot(snapshot: &AgentSnapshot) -> Self {
        Self {
            id: snapshot.id,
            position: Vec2::new(snapshot.position.x, snapshot.position.y),
            state: snapshot.state,
            skill: snapshot.skill,
            facing: snapshot.facing,
            fuse_seconds: snapshot
                .fuse_ticks
                .map(|ticks| (ticks + TICKS_PER_SECOND - 1) / TICKS_PER_SECOND),
            color: agent_color(snapshot.state),
        }
    }
}

/// Heads-up display counters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HudPresentation {
    /// Title of the active level.
    pub level_name: String,
    /// One-based number of the active level.
    pub level_number: usize,
    /// Levels in the campaign.
    pub level_count: usize,
    /// Agents saved so far.
    pub saved: u32,
    /// Agents the level requires.
    pub required: u32,
    /// Agents still behind the entrance.
    pub to_spawn: u32,
    /// Lives left in the campaign.
    pub lives: u32,
    /// Seconds left on the level timer.
    pub time_remaining: u32,
    /// Remaining charges per assignable skill.
    pub inventory: Vec<(Skill, u32)>,
}

impl HudPresentation {
    /// Assembles the HUD from level counters and inventory charges.
    #[must_use]
    pub fn new<T>(level_name: T, counters: &LevelCounters, inventory: Vec<(Skill, u32)>) -> Self
    where
        T: Into<String>,
    {
        Self {
            level_name: level_name.into(),
            level_number: counters.level_index + 1,
            level_count: counters.level_count,
            saved: counters.saved,
            required: counters.required,
            to_spawn: counters.to_spawn,
            lives: counters.lives,
            time_remaining: counters.time_remaining,
            inventory,
        }
    }

    /// Timer formatted as `m:ss`.
    #[must_use]
    pub fn clock_label(&self) -> String {
        format!("{}:{:02}", self.time_remaining / 60, self.time_remaining % 60)
    }
}

/// Banner shown once a level resolves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutcomeOverlay {
    /// Outcome being announced.
    pub outcome: LevelOutcome,
    /// Message shown to the player.
    pub message: String,
}

impl OutcomeOverlay {
    /// Overlay for a resolved outcome; `None` while the level is playing.
    #[must_use]
    pub fn for_outcome(outcome: LevelOutcome, saved: u32, required: u32) -> Option<Self> {
        let message = match outcome {
            LevelOutcome::Playing => return None,
            LevelOutcome::Success => format!("Level complete: saved {saved} of {required}"),
            LevelOutcome::Failure => format!("Not enough saved: {saved} of {required}"),
            LevelOutcome::GameOver => "Game over".to_owned(),
            LevelOutcome::Won => "Campaign complete".to_owned(),
        };
        Some(Self { outcome, message })
    }
}

/// Scene description combining terrain, doors, hazards and inhabitants.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Solidity of the level.
    pub terrain: TerrainRaster,
    /// Hazard rectangles in declaration order.
    pub hazards: Vec<HazardPresentation>,
    /// Entrance marker.
    pub entrance: Vec2,
    /// Exit marker.
    pub exit: Vec2,
    /// Agents sorted by identifier.
    pub agents: Vec<SceneAgent>,
    /// Heads-up display.
    pub hud: HudPresentation,
    /// Outcome banner, present once the level resolved.
    pub overlay: Option<OutcomeOverlay>,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(
        terrain: TerrainRaster,
        hazards: Vec<HazardPresentation>,
        entrance: Vec2,
        exit: Vec2,
        agents: Vec<SceneAgent>,
        hud: HudPresentation,
        overlay: Option<OutcomeOverlay>,
    ) -> Self {
        Self {
            terrain,
            hazards,
            entrance,
            exit,
            agents,
            hud,
            overlay,
        }
    }

    /// Size of the playfield in world pixels.
    #[must_use]
    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.terrain.width() as f32, self.terrain.height() as f32)
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title shown by the backend.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Tikmings scenes.
pub trait RenderingBackend {
    /// Draws a single frame.
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tikmings_core::Point;

    fn counters() -> LevelCounters {
        LevelCounters {
            level_index: 1,
            level_count: 4,
            saved: 2,
            required: 5,
            to_spawn: 3,
            lives: 2,
            time_remaining: 125,
            outcome: LevelOutcome::Playing,
            tick: 900,
        }
    }

    #[test]
    fn raster_copies_the_terrain_view() {
        let words = [0b0110_u64, 0, 1];
        let view = TerrainView::new(&words, 8, 3);
        let raster = TerrainRaster::from_view(view);

        assert_eq!((raster.width(), raster.height()), (8, 3));
        assert!(raster.is_solid(1, 0));
        assert!(raster.is_solid(2, 0));
        assert!(!raster.is_solid(3, 0));
        assert!(raster.is_solid(0, 2));
        assert!(!raster.is_solid(9, 0));
    }

    #[test]
    fn coverage_clips_blocks_to_the_raster() {
        let words = [0b0011_u64, 0b0001];
        let raster = TerrainRaster::from_view(TerrainView::new(&words, 4, 2));

        assert_eq!(raster.coverage(0, 0, 2, 2), 0.75);
        assert_eq!(raster.coverage(2, 0, 8, 8), 0.0);
        assert_eq!(raster.coverage(10, 10, 2, 2), 0.0);
    }

    #[test]
    fn fuse_seconds_round_up() {
        let snapshot = AgentSnapshot {
            id: AgentId::new(4),
            position: Point::new(10.0, 20.0),
            state: AgentState::Walker,
            skill: Skill::Walker,
            facing: Facing::Left,
            fuse_ticks: Some(TICKS_PER_SECOND * 4 + 1),
        };
        let agent = SceneAgent::from_snapshot(&snapshot);

        assert_eq!(agent.fuse_seconds, Some(5));
        assert_eq!(agent.position, Vec2::new(10.0, 20.0));
        assert_eq!(agent.color, agent_color(AgentState::Walker));
    }

    #[test]
    fn hud_reports_one_based_levels_and_clock() {
        let hud = HudPresentation::new("Dig deep", &counters(), vec![(Skill::Digger, 3)]);
        assert_eq!(hud.level_number, 2);
        assert_eq!(hud.clock_label(), "2:05");
        assert_eq!(hud.inventory, vec![(Skill::Digger, 3)]);
    }

    #[test]
    fn overlays_only_exist_for_resolved_levels() {
        assert!(OutcomeOverlay::for_outcome(LevelOutcome::Playing, 0, 1).is_none());
        let overlay = OutcomeOverlay::for_outcome(LevelOutcome::Failure, 1, 3).expect("resolved");
        assert_eq!(overlay.message, "Not enough saved: 1 of 3");
    }

    #[test]
    fn hazards_keep_their_rectangle() {
        let hazard = HazardPresentation::from_rect(&TerrainRect::new(5, 6, 10, 4, TerrainKind::Water));
        assert!(hazard.contains(Vec2::new(5.0, 6.0)));
        assert!(!hazard.contains(Vec2::new(15.0, 6.0)));
        assert_eq!(hazard.color, terrain_color(TerrainKind::Water));
    }
}
