//! Scripted skill assignments replayed by the headless runner.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use tikmings_core::{Command, Point, Skill};

/// One assignment, issued after the given tick of the given level.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub(crate) struct ScheduledAssignment {
    /// Zero-based campaign level the assignment belongs to.
    #[serde(default)]
    pub(crate) level: usize,
    /// Tick within the level, counted from the level start.
    pub(crate) tick: u64,
    /// Horizontal cursor position.
    pub(crate) x: f32,
    /// Vertical cursor position.
    pub(crate) y: f32,
    /// Skill to assign.
    pub(crate) skill: Skill,
}

/// Ordered plan of assignments, replayed on every attempt of a level.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub(crate) struct AssignmentScript {
    #[serde(default)]
    assign: Vec<ScheduledAssignment>,
}

impl AssignmentScript {
    /// Commands scheduled for `tick` of `level`, in file order.
    pub(crate) fn due(&self, level: usize, tick: u64) -> impl Iterator<Item = Command> + '_ {
        self.assign
            .iter()
            .filter(move |entry| entry.level == level && entry.tick == tick)
            .map(|entry| Command::AssignSkill {
                target: Point::new(entry.x, entry.y),
                skill: entry.skill,
            })
    }

    /// Number of scheduled assignments.
    pub(crate) fn len(&self) -> usize {
        self.assign.len()
    }
}

/// Reads an assignment script from disk.
pub(crate) fn load(path: &Path) -> Result<AssignmentScript> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read assignment script at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid assignment script {}", path.display()))
}

fn parse(contents: &str) -> Result<AssignmentScript> {
    toml::from_str(contents).context("failed to parse assignment script toml contents")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
        [[assign]]
        tick = 130
        x = 120.0
        y = 290.0
        skill = "digger"

        [[assign]]
        level = 2
        tick = 130
        x = 360.0
        y = 549.0
        skill = "builder"

        [[assign]]
        tick = 130
        x = 10.0
        y = 10.0
        skill = "blocker"
    "#;

    #[test]
    fn due_filters_by_level_and_tick_in_file_order() {
        let script = parse(SCRIPT).expect("valid script");
        assert_eq!(script.len(), 3);

        let due: Vec<_> = script.due(0, 130).collect();
        assert_eq!(
            due,
            vec![
                Command::AssignSkill {
                    target: Point::new(120.0, 290.0),
                    skill: Skill::Digger,
                },
                Command::AssignSkill {
                    target: Point::new(10.0, 10.0),
                    skill: Skill::Blocker,
                },
            ]
        );
        assert_eq!(script.due(2, 130).count(), 1);
        assert_eq!(script.due(0, 131).count(), 0);
    }

    #[test]
    fn empty_files_are_empty_scripts() {
        assert_eq!(parse("").expect("empty script"), AssignmentScript::default());
    }

    #[test]
    fn rejects_unknown_skills() {
        let error = parse("[[assign]]\ntick = 1\nx = 0.0\ny = 0.0\nskill = \"climber\"")
            .expect_err("unknown skill");
        assert!(format!("{error:#}").contains("climber"));
    }
}
