//! Level pack loading.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tikmings_core::LevelSpec;

/// Campaign shipped with the binary.
const BUNDLED_PACK: &str = include_str!("../levels/default.toml");

#[derive(Debug, Deserialize)]
struct LevelPack {
    #[serde(default)]
    levels: Vec<LevelSpec>,
}

/// Loads the pack at `path`, or the bundled campaign when no path is given.
pub(crate) fn load(path: Option<&Path>) -> Result<Vec<LevelSpec>> {
    let Some(path) = path else {
        return parse(BUNDLED_PACK).context("bundled level pack is malformed");
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level pack at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid level pack {}", path.display()))
}

fn parse(contents: &str) -> Result<Vec<LevelSpec>> {
    let pack: LevelPack =
        toml::from_str(contents).context("failed to parse level pack toml contents")?;
    if pack.levels.is_empty() {
        bail!("level pack declares no [[levels]]");
    }
    Ok(pack.levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tikmings_core::{Point, TerrainKind, DEFAULT_FIELD_WIDTH};
    use tikmings_world::Campaign;

    #[test]
    fn bundled_pack_is_a_valid_campaign() {
        let levels = load(None).expect("bundled pack parses");
        assert_eq!(levels.len(), 3);
        assert!(levels.iter().all(|level| level.width == DEFAULT_FIELD_WIDTH));
        let campaign = Campaign::new(levels).expect("bundled pack validates");
        assert_eq!(campaign.len(), 3);
    }

    #[test]
    fn parses_doors_skills_and_geometry() {
        let levels = parse(
            r#"
            [[levels]]
            name = "tiny"
            width = 64
            height = 48
            time_limit_seconds = 30
            total_agents = 2
            required_to_save = 1
            start = { x = 4.0, y = 4.0 }
            exit = { x = 60.0, y = 39.0 }
            skills = { digger = 2 }
            geometry = [
                { x = 0, y = 40, width = 64, height = 8, type = "floor" },
                { x = 20, y = 30, width = 5, height = 10, type = "pit_empty" },
            ]
            "#,
        )
        .expect("valid pack");

        let level = &levels[0];
        assert_eq!(level.exit, Some(Point::new(60.0, 39.0)));
        assert_eq!(level.skills.digger, 2);
        assert_eq!(level.skills.builder, 0);
        assert_eq!(level.geometry[1].kind, TerrainKind::PitEmpty);
    }

    #[test]
    fn rejects_packs_without_levels() {
        let error = parse("title = \"nothing\"").expect_err("empty pack");
        assert!(error.to_string().contains("no [[levels]]"));
    }

    #[test]
    fn rejects_unknown_materials() {
        let error = parse(
            r#"
            [[levels]]
            name = "lava"
            time_limit_seconds = 30
            total_agents = 1
            required_to_save = 1
            geometry = [{ x = 0, y = 0, width = 1, height = 1, type = "lava" }]
            "#,
        )
        .expect_err("unknown material");
        assert!(format!("{error:#}").contains("lava"));
    }

    #[test]
    fn missing_files_name_the_path() {
        let error = load(Some(Path::new("/nonexistent/pack.toml"))).expect_err("missing file");
        assert!(error.to_string().contains("/nonexistent/pack.toml"));
    }
}
