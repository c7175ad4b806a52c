//! Per-level skill bookkeeping.

use std::collections::BTreeMap;

use tikmings_core::{Skill, SkillCounts};

/// Remaining charges for each assignable skill.
///
/// Counts only ever decrease while a level runs; a fresh inventory is built
/// whenever the level is (re)loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillInventory {
    remaining: BTreeMap<Skill, u32>,
}

impl SkillInventory {
    /// Creates an inventory seeded from level metadata.
    #[must_use]
    pub fn from_counts(counts: &SkillCounts) -> Self {
        let remaining = Skill::ASSIGNABLE
            .iter()
            .map(|skill| (*skill, counts.get(*skill)))
            .collect();
        Self { remaining }
    }

    /// Charges left for the skill. `Skill::Walker` is never stocked.
    #[must_use]
    pub fn remaining(&self, skill: Skill) -> u32 {
        self.remaining.get(&skill).copied().unwrap_or(0)
    }

    /// Draws one charge of the skill.
    ///
    /// Returns `false` without touching the inventory when no charge is left.
    #[must_use]
    pub fn consume(&mut self, skill: Skill) -> bool {
        match self.remaining.get_mut(&skill) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Iterates over every assignable skill and its remaining charges.
    pub fn iter(&self) -> impl Iterator<Item = (Skill, u32)> + '_ {
        self.remaining.iter().map(|(skill, count)| (*skill, *count))
    }
}
