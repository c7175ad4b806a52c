//! Plain-text rendering backend used by the headless runner.

use std::io::Write;

use anyhow::{Context, Result};
use glam::Vec2;
use tikmings_core::{AgentState, Facing};
use tikmings_rendering::{Presentation, RenderingBackend, Scene, SceneAgent};

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: u32 = 2;

/// Renders presentations as character grids into any writer.
#[derive(Debug)]
pub(crate) struct TextBackend<W> {
    out: W,
    columns: u32,
}

impl<W: Write> TextBackend<W> {
    /// Creates a backend drawing the playfield `columns` characters wide.
    pub(crate) fn new(out: W, columns: u32) -> Self {
        Self {
            out,
            columns: columns.max(1),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

#[derive(Clone, Copy, Debug)]
struct Grid {
    cell_width: u32,
    cell_height: u32,
    columns: u32,
    rows: u32,
}

impl Grid {
    fn fit(scene: &Scene, columns: u32) -> Self {
        let width = scene.terrain.width().max(1);
        let height = scene.terrain.height().max(1);
        let cell_width = width.div_ceil(columns).max(1);
        let cell_height = cell_width * CELL_ASPECT;
        Self {
            cell_width,
            cell_height,
            columns: width.div_ceil(cell_width),
            rows: height.div_ceil(cell_height),
        }
    }

    fn cell_of(&self, point: Vec2) -> Option<(usize, usize)> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let column = point.x as u32 / self.cell_width;
        let row = point.y as u32 / self.cell_height;
        (column < self.columns && row < self.rows).then_some((column as usize, row as usize))
    }

    fn centre(&self, column: u32, row: u32) -> Vec2 {
        Vec2::new(
            (column * self.cell_width) as f32 + self.cell_width as f32 / 2.0,
            (row * self.cell_height) as f32 + self.cell_height as f32 / 2.0,
        )
    }
}

fn glyph(agent: &SceneAgent) -> char {
    if let Some(seconds) = agent.fuse_seconds {
        return char::from_digit(seconds.min(9), 10).unwrap_or('!');
    }
    match agent.state {
        AgentState::Walker => match agent.facing {
            Facing::Left => '<',
            Facing::Right => '>',
        },
        AgentState::Faller => 'v',
        AgentState::Floater => 'Y',
        AgentState::Digger => 'D',
        AgentState::Basher => 'B',
        AgentState::Miner => 'M',
        AgentState::Builder => match agent.facing {
            Facing::Left => '\\',
            Facing::Right => '/',
        },
        AgentState::Blocker => 'T',
        AgentState::Splatting => '*',
        AgentState::Dying => '+',
    }
}

fn draw(scene: &Scene, columns: u32) -> Vec<String> {
    let grid = Grid::fit(scene, columns);
    let mut cells: Vec<Vec<char>> = (0..grid.rows)
        .map(|row| {
            (0..grid.columns)
                .map(|column| {
                    let centre = grid.centre(column, row);
                    if scene.hazards.iter().any(|hazard| hazard.contains(centre)) {
                        '~'
                    } else if scene.terrain.coverage(
                        column * grid.cell_width,
                        row * grid.cell_height,
                        grid.cell_width,
                        grid.cell_height,
                    ) >= 0.5
                    {
                        '#'
                    } else {
                        ' '
                    }
                })
                .collect()
        })
        .collect();

    let mut plot = |point: Vec2, symbol: char| {
        if let Some((column, row)) = grid.cell_of(point) {
            cells[row][column] = symbol;
        }
    };
    plot(scene.entrance, 'E');
    plot(scene.exit - Vec2::Y, 'X');
    for agent in &scene.agents {
        plot(agent.position - Vec2::Y, glyph(agent));
    }

    cells.into_iter().map(|row| row.into_iter().collect()).collect()
}

fn hud_line(scene: &Scene) -> String {
    let hud = &scene.hud;
    let inventory = hud
        .inventory
        .iter()
        .map(|(skill, count)| format!("{}:{count}", skill.name()))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "level {}/{} {} | saved {}/{} | out {} | lives {} | {} | {}",
        hud.level_number,
        hud.level_count,
        hud.level_name,
        hud.saved,
        hud.required,
        hud.to_spawn,
        hud.lives,
        hud.clock_label(),
        inventory
    )
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn present(&mut self, presentation: &Presentation) -> Result<()> {
        let scene = &presentation.scene;
        let mut frame = String::new();
        frame.push_str(&presentation.window_title);
        frame.push('\n');
        for line in draw(scene, self.columns) {
            frame.push('|');
            frame.push_str(&line);
            frame.push_str("|\n");
        }
        frame.push_str(&hud_line(scene));
        frame.push('\n');
        if let Some(overlay) = &scene.overlay {
            frame.push_str(">> ");
            frame.push_str(&overlay.message);
            frame.push('\n');
        }
        self.out
            .write_all(frame.as_bytes())
            .context("failed to write text frame")?;
        self.out.flush().context("failed to flush text frame")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tikmings_core::{
        AgentId, AgentSnapshot, LevelCounters, LevelOutcome, Point, Skill, TerrainKind,
        TerrainRect, TerrainView,
    };
    use tikmings_rendering::{
        Color, HazardPresentation, HudPresentation, OutcomeOverlay, TerrainRaster,
    };

    fn scene(agents: Vec<SceneAgent>, outcome: LevelOutcome) -> Scene {
        // 8x8 field with the bottom half solid.
        let words = [0_u64, 0, 0, 0, 0xff, 0xff, 0xff, 0xff];
        let terrain = TerrainRaster::from_view(TerrainView::new(&words, 8, 8));
        let counters = LevelCounters {
            level_index: 0,
            level_count: 2,
            saved: 1,
            required: 3,
            to_spawn: 4,
            lives: 2,
            time_remaining: 75,
            outcome,
            tick: 10,
        };
        let hud = HudPresentation::new("flat", &counters, vec![(Skill::Digger, 2)]);
        Scene::new(
            terrain,
            vec![HazardPresentation::from_rect(&TerrainRect::new(
                6,
                4,
                2,
                4,
                TerrainKind::Water,
            ))],
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 4.0),
            agents,
            hud,
            OutcomeOverlay::for_outcome(outcome, 1, 3),
        )
    }

    fn walker(x: f32, y: f32, facing: Facing) -> SceneAgent {
        SceneAgent::from_snapshot(&AgentSnapshot {
            id: AgentId::new(0),
            position: Point::new(x, y),
            state: AgentState::Walker,
            skill: Skill::Walker,
            facing,
            fuse_ticks: None,
        })
    }

    #[test]
    fn draws_terrain_hazards_doors_and_agents() {
        let scene = scene(vec![walker(2.0, 4.0, Facing::Left)], LevelOutcome::Playing);
        // Eight columns over eight pixels: one pixel wide, two pixels tall.
        let lines = draw(&scene, 8);
        assert_eq!(lines, vec!["E       ", "  <  X  ", "######~~", "######~~"]);
    }

    #[test]
    fn lit_fuses_replace_the_glyph() {
        let mut agent = walker(2.0, 4.0, Facing::Right);
        assert_eq!(glyph(&agent), '>');
        agent.fuse_seconds = Some(4);
        assert_eq!(glyph(&agent), '4');
    }

    #[test]
    fn present_writes_title_grid_hud_and_overlay() {
        let presentation = Presentation::new(
            "Tikmings",
            Color::from_rgb_u8(0, 0, 0),
            scene(Vec::new(), LevelOutcome::Failure),
        );
        let mut backend = TextBackend::new(Vec::new(), 4);
        backend.present(&presentation).expect("write to memory");
        let text = String::from_utf8(backend.into_inner()).expect("utf8 output");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Tikmings");
        assert_eq!(lines[1], "|E X |");
        assert_eq!(lines[2], "|###~|");
        assert_eq!(
            lines[3],
            "level 1/2 flat | saved 1/3 | out 4 | lives 2 | 1:15 | digger:2"
        );
        assert_eq!(lines[4], ">> Not enough saved: 1 of 3");
    }
}
