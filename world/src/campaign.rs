//! Level validation and the ordered campaign of playable levels.

use thiserror::Error;
use tikmings_core::{LevelSpec, Point, TerrainView};

/// Largest terrain bitset a level may allocate, in 64-pixel words.
pub const MAX_FIELD_WORDS: usize = 1 << 20;

/// Reasons a level description cannot be played.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    /// The campaign contains no levels at all.
    #[error("campaign contains no levels")]
    EmptyCampaign,
    /// The level does not declare where agents enter.
    #[error("level {index} ({name}) has no entrance")]
    MissingEntrance {
        /// Zero-based position of the level in the campaign.
        index: usize,
        /// Title of the offending level.
        name: String,
    },
    /// The level does not declare where agents leave.
    #[error("level {index} ({name}) has no exit")]
    MissingExit {
        /// Zero-based position of the level in the campaign.
        index: usize,
        /// Title of the offending level.
        name: String,
    },
    /// The level releases no agents.
    #[error("level {index} ({name}) releases no agents")]
    NoAgents {
        /// Zero-based position of the level in the campaign.
        index: usize,
        /// Title of the offending level.
        name: String,
    },
    /// The terrain field has a zero dimension.
    #[error("level {index} ({name}) has an empty terrain field")]
    EmptyField {
        /// Zero-based position of the level in the campaign.
        index: usize,
        /// Title of the offending level.
        name: String,
    },
    /// The terrain field would not fit in [`MAX_FIELD_WORDS`].
    #[error("level {index} ({name}) declares a {width}x{height} terrain field, which is too large")]
    FieldTooLarge {
        /// Zero-based position of the level in the campaign.
        index: usize,
        /// Title of the offending level.
        name: String,
        /// Declared width in pixels.
        width: u32,
        /// Declared height in pixels.
        height: u32,
    },
    /// More agents must be saved than the level releases.
    #[error("level {index} ({name}) requires {required} saved agents but releases only {total}")]
    QuotaExceedsAgents {
        /// Zero-based position of the level in the campaign.
        index: usize,
        /// Title of the offending level.
        name: String,
        /// Agents the level requires.
        required: u32,
        /// Agents the level releases.
        total: u32,
    },
}

/// A validated level with its doors resolved.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LevelPlan {
    pub(crate) spec: LevelSpec,
    pub(crate) entrance: Point,
    pub(crate) exit: Point,
}

impl LevelPlan {
    fn validate(index: usize, spec: LevelSpec) -> Result<Self, LevelError> {
        let name = spec.name.clone();
        if spec.width == 0 || spec.height == 0 {
            return Err(LevelError::EmptyField { index, name });
        }
        let words = TerrainView::words_per_row(spec.width).checked_mul(spec.height as usize);
        if words.map_or(true, |words| words > MAX_FIELD_WORDS) {
            return Err(LevelError::FieldTooLarge {
                index,
                name,
                width: spec.width,
                height: spec.height,
            });
        }
        let Some(entrance) = spec.start else {
            return Err(LevelError::MissingEntrance { index, name });
        };
        let Some(exit) = spec.exit else {
            return Err(LevelError::MissingExit { index, name });
        };
        if spec.total_agents == 0 {
            return Err(LevelError::NoAgents { index, name });
        }
        if spec.required_to_save > spec.total_agents {
            return Err(LevelError::QuotaExceedsAgents {
                index,
                name,
                required: spec.required_to_save,
                total: spec.total_agents,
            });
        }
        Ok(Self {
            spec,
            entrance,
            exit,
        })
    }
}

/// Ordered list of validated levels.
#[derive(Clone, Debug, PartialEq)]
pub struct Campaign {
    opening: LevelPlan,
    rest: Vec<LevelPlan>,
}

impl Campaign {
    /// Validates every level up front so play can never fail later.
    pub fn new(levels: Vec<LevelSpec>) -> Result<Self, LevelError> {
        let mut plans = levels
            .into_iter()
            .enumerate()
            .map(|(index, spec)| LevelPlan::validate(index, spec))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();
        let Some(opening) = plans.next() else {
            return Err(LevelError::EmptyCampaign);
        };
        Ok(Self {
            opening,
            rest: plans.collect(),
        })
    }

    /// Builds a campaign holding a single level.
    pub fn single(level: LevelSpec) -> Result<Self, LevelError> {
        Self::new(vec![level])
    }

    /// Number of levels in the campaign.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    /// Titles of every level in campaign order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(&self.opening)
            .chain(&self.rest)
            .map(|plan| plan.spec.name.as_str())
    }

    pub(crate) fn plan(&self, index: usize) -> Option<&LevelPlan> {
        match index.checked_sub(1) {
            None => Some(&self.opening),
            Some(later) => self.rest.get(later),
        }
    }

    pub(crate) fn first(&self) -> &LevelPlan {
        &self.opening
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tikmings_core::SkillCounts;

    fn level(name: &str) -> LevelSpec {
        LevelSpec {
            name: name.to_owned(),
            width: 320,
            height: 200,
            start: Some(Point::new(20.0, 20.0)),
            exit: Some(Point::new(300.0, 150.0)),
            time_limit_seconds: 60,
            total_agents: 5,
            required_to_save: 3,
            skills: SkillCounts::default(),
            geometry: Vec::new(),
        }
    }

    #[test]
    fn accepts_well_formed_levels() {
        let campaign = Campaign::new(vec![level("one"), level("two")]).expect("valid campaign");
        assert_eq!(campaign.len(), 2);
        assert_eq!(campaign.names().collect::<Vec<_>>(), vec!["one", "two"]);
        let plan = campaign.plan(1).expect("second level");
        assert_eq!(plan.exit, Point::new(300.0, 150.0));
        assert!(campaign.plan(2).is_none());
    }

    #[test]
    fn rejects_empty_campaigns() {
        assert_eq!(Campaign::new(Vec::new()), Err(LevelError::EmptyCampaign));
    }

    #[test]
    fn names_the_offending_level() {
        let mut broken = level("doorless");
        broken.exit = None;
        let error = Campaign::new(vec![level("fine"), broken]).expect_err("missing exit");
        assert_eq!(
            error,
            LevelError::MissingExit {
                index: 1,
                name: "doorless".to_owned(),
            }
        );
        assert_eq!(error.to_string(), "level 1 (doorless) has no exit");
    }

    #[test]
    fn rejects_each_malformed_field() {
        let mut no_entrance = level("a");
        no_entrance.start = None;
        assert!(matches!(
            Campaign::single(no_entrance),
            Err(LevelError::MissingEntrance { index: 0, .. })
        ));

        let mut no_agents = level("b");
        no_agents.total_agents = 0;
        no_agents.required_to_save = 0;
        assert!(matches!(
            Campaign::single(no_agents),
            Err(LevelError::NoAgents { .. })
        ));

        let mut flat = level("c");
        flat.height = 0;
        assert!(matches!(
            Campaign::single(flat),
            Err(LevelError::EmptyField { .. })
        ));

        let mut greedy = level("d");
        greedy.required_to_save = 6;
        let mut huge = level("e");
        huge.width = u32::MAX;
        huge.height = u32::MAX;
        assert_eq!(
            Campaign::single(huge),
            Err(LevelError::FieldTooLarge {
                index: 0,
                name: "e".to_owned(),
                width: u32::MAX,
                height: u32::MAX,
            })
        );

        let mut tall = level("f");
        tall.width = 64;
        tall.height = MAX_FIELD_WORDS as u32 + 1;
        assert!(matches!(
            Campaign::single(tall),
            Err(LevelError::FieldTooLarge { .. })
        ));
        let mut largest = level("g");
        largest.width = 64;
        largest.height = MAX_FIELD_WORDS as u32;
        assert!(Campaign::single(largest).is_ok());

        assert!(matches!(
            Campaign::single(greedy),
            Err(LevelError::QuotaExceedsAgents {
                required: 6,
                total: 5,
                ..
            })
        ));
    }
}
