//! Entrance release cadence.

/// Ticks between consecutive releases from the entrance.
pub(crate) const SPAWN_INTERVAL_TICKS: u32 = 100;

/// Tick-counted countdown deciding when the entrance releases the next agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SpawnSchedule {
    interval: u32,
    elapsed: u32,
    remaining: u32,
}

impl SpawnSchedule {
    pub(crate) fn new(interval: u32, total: u32) -> Self {
        Self {
            interval,
            elapsed: 0,
            remaining: total,
        }
    }

    /// Advances the countdown by one tick and reports whether an agent is
    /// released on this tick.
    pub(crate) fn advance(&mut self) -> bool {
        if self.remaining == 0 || self.interval == 0 {
            return false;
        }
        self.elapsed += 1;
        if self.elapsed < self.interval {
            return false;
        }
        self.elapsed = 0;
        self.remaining -= 1;
        true
    }

    /// Agents still waiting behind the entrance.
    pub(crate) fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Cancels every pending release.
    pub(crate) fn halt(&mut self) {
        self.remaining = 0;
        self.elapsed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release_ticks(schedule: &mut SpawnSchedule, ticks: u32) -> Vec<u32> {
        (1..=ticks).filter(|_| schedule.advance()).collect()
    }

    #[test]
    fn releases_on_every_interval() {
        let mut schedule = SpawnSchedule::new(SPAWN_INTERVAL_TICKS, 3);
        assert_eq!(release_ticks(&mut schedule, 1000), vec![100, 200, 300]);
        assert_eq!(schedule.remaining(), 0);
    }

    #[test]
    fn halted_schedule_never_releases() {
        let mut schedule = SpawnSchedule::new(10, 5);
        assert_eq!(release_ticks(&mut schedule, 15), vec![10]);
        schedule.halt();
        assert!(release_ticks(&mut schedule, 100).is_empty());
        assert_eq!(schedule.remaining(), 0);
    }

    #[test]
    fn zero_interval_is_inert() {
        let mut schedule = SpawnSchedule::new(0, 2);
        assert!(release_ticks(&mut schedule, 10).is_empty());
        assert_eq!(schedule.remaining(), 2);
    }
}
