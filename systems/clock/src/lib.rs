#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame pacing system that turns rendered frames into simulation ticks and
//! wall-clock seconds.
//!
//! Ticks are counted in frames, never in elapsed time, so slow frames cannot
//! make agents move faster. The one-second heartbeat is accumulated from frame
//! deltas independently and never touches tick counters.

use std::time::Duration;

use tikmings_core::{Command, Event};

const DEFAULT_FRAMES_PER_TICK: u32 = 2;
const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(1);

/// Configuration parameters required to construct the clock system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockConfig {
    frames_per_tick: u32,
    heartbeat: Duration,
}

impl ClockConfig {
    /// Creates a new configuration using the provided frame cadence and
    /// heartbeat period.
    #[must_use]
    pub const fn new(frames_per_tick: u32, heartbeat: Duration) -> Self {
        Self {
            frames_per_tick,
            heartbeat,
        }
    }

    /// Rendered frames per simulation tick.
    #[must_use]
    pub const fn frames_per_tick(&self) -> u32 {
        self.frames_per_tick
    }

    /// Wall-clock period between level timer decrements.
    #[must_use]
    pub const fn heartbeat(&self) -> Duration {
        self.heartbeat
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FRAMES_PER_TICK, DEFAULT_HEARTBEAT)
    }
}

/// Pure system emitting `Tick` and `ElapseSecond` commands.
#[derive(Debug)]
pub struct Clock {
    frames_per_tick: u32,
    heartbeat: Duration,
    frames: u32,
    accumulator: Duration,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

impl Clock {
    /// Creates a new clock using the supplied configuration.
    #[must_use]
    pub fn new(config: ClockConfig) -> Self {
        Self {
            frames_per_tick: config.frames_per_tick,
            heartbeat: config.heartbeat,
            frames: 0,
            accumulator: Duration::ZERO,
        }
    }

    /// Records one rendered frame lasting `frame_dt` and emits the commands it
    /// triggers. A tick always precedes a heartbeat within the same frame.
    pub fn advance(&mut self, frame_dt: Duration, out: &mut Vec<Command>) {
        if self.frames_per_tick > 0 {
            self.frames += 1;
            if self.frames >= self.frames_per_tick {
                self.frames = 0;
                out.push(Command::Tick);
            }
        }

        if self.heartbeat.is_zero() {
            return;
        }
        self.accumulator = self.accumulator.saturating_add(frame_dt);
        while self.accumulator >= self.heartbeat {
            self.accumulator -= self.heartbeat;
            out.push(Command::ElapseSecond);
        }
    }

    /// Consumes world events. A freshly started level gets a full first
    /// second on its timer.
    pub fn handle(&mut self, events: &[Event]) {
        if events
            .iter()
            .any(|event| matches!(event, Event::LevelStarted { .. }))
        {
            self.accumulator = Duration::ZERO;
        }
    }

    /// Time accumulated towards the next heartbeat.
    #[must_use]
    pub const fn pending(&self) -> Duration {
        self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_frames_per_tick_never_ticks() {
        let mut clock = Clock::new(ClockConfig::new(0, Duration::ZERO));
        let mut commands = Vec::new();
        for _ in 0..10 {
            clock.advance(Duration::from_millis(16), &mut commands);
        }
        assert!(commands.is_empty());
    }
}
