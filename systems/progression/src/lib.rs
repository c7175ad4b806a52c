#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that moves the campaign forward once a level resolves.
//!
//! After a `LevelResolved` event the outcome overlay stays up for a fixed
//! number of simulation ticks; when it runs out the system issues the matching
//! follow-up command.

use tikmings_core::{Command, Event, LevelOutcome, TICKS_PER_SECOND};
use tracing::debug;

/// Ticks the outcome overlay stays visible by default.
pub const DEFAULT_OVERLAY_TICKS: u32 = 2 * TICKS_PER_SECOND;

/// Countdown started by a resolved level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pending {
    outcome: LevelOutcome,
    remaining: u32,
}

/// Progression system translating level outcomes into campaign commands.
#[derive(Debug, Clone)]
pub struct Progression {
    overlay_ticks: u32,
    auto_restart: bool,
    pending: Option<Pending>,
}

impl Default for Progression {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAY_TICKS)
    }
}

impl Progression {
    /// Creates a progression system holding the overlay for `overlay_ticks`.
    ///
    /// Campaign-ending outcomes wait for the player unless
    /// [`Progression::with_auto_restart`] is enabled.
    #[must_use]
    pub const fn new(overlay_ticks: u32) -> Self {
        Self {
            overlay_ticks,
            auto_restart: false,
            pending: None,
        }
    }

    /// Restarts the campaign automatically after `GameOver` and `Won`.
    #[must_use]
    pub const fn with_auto_restart(mut self, auto_restart: bool) -> Self {
        self.auto_restart = auto_restart;
        self
    }

    /// Reports whether campaign-ending outcomes restart on their own.
    #[must_use]
    pub const fn auto_restart(&self) -> bool {
        self.auto_restart
    }

    /// Outcome currently shown on the overlay, if any.
    #[must_use]
    pub fn overlay(&self) -> Option<LevelOutcome> {
        self.pending.map(|pending| pending.outcome)
    }

    /// Consumes world events and emits follow-up commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::LevelResolved { outcome, .. } => {
                    self.pending = Some(Pending {
                        outcome: *outcome,
                        remaining: self.overlay_ticks,
                    });
                    if self.overlay_ticks == 0 {
                        self.fire(out);
                    }
                }
                Event::TimeAdvanced { .. } => {
                    let expired = match self.pending.as_mut() {
                        Some(pending) => {
                            pending.remaining = pending.remaining.saturating_sub(1);
                            pending.remaining == 0
                        }
                        None => false,
                    };
                    if expired {
                        self.fire(out);
                    }
                }
                Event::LevelStarted { .. } => self.pending = None,
                _ => {}
            }
        }
    }

    fn fire(&mut self, out: &mut Vec<Command>) {
        let Some(pending) = self.pending else {
            return;
        };
        let command = match pending.outcome {
            LevelOutcome::Success => Some(Command::AdvanceLevel),
            LevelOutcome::Failure => Some(Command::RetryLevel),
            LevelOutcome::GameOver | LevelOutcome::Won if self.auto_restart => {
                Some(Command::RestartCampaign)
            }
            LevelOutcome::GameOver | LevelOutcome::Won | LevelOutcome::Playing => None,
        };
        match command {
            Some(command) => {
                debug!(?command, outcome = ?pending.outcome, "overlay elapsed");
                self.pending = None;
                out.push(command);
            }
            None => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.remaining = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_system_ignores_time() {
        let mut progression = Progression::new(3);
        let mut commands = Vec::new();
        progression.handle(&[Event::TimeAdvanced { tick: 1 }], &mut commands);
        assert!(commands.is_empty());
        assert_eq!(progression.overlay(), None);
    }
}
