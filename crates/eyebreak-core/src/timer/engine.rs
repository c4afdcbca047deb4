//! Timer state machine.
//!
//! The engine is a tick-driven state machine. It does not own a clock or
//! any threads - the caller delivers one `tick()` per elapsed second and
//! the engine decrements its countdown by exactly one unit per call.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running -> Resting -> Stopped (or Running, with auto-start)
//!               ^  \
//!               |   v
//!             Paused
//! ```
//!
//! Every operation is a total function over the state space: calls that are
//! not legal in the current phase are no-ops that leave the state untouched.
//! Commands return the events the transition produced; the caller is
//! responsible for delivering them and for the daily counter increment on
//! `RestComplete` (see [`super::controller::TimerController`]).

use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::storage::Settings;

/// The mutually-exclusive mode the timer is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Stopped,
    Running,
    Paused,
    Resting,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Phase::Stopped => "Stopped",
            Phase::Running => "Running",
            Phase::Paused => "Paused",
            Phase::Resting => "Resting",
        };
        write!(f, "{label}")
    }
}

/// Immutable snapshot for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateInfo {
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub work_duration_seconds: u64,
    pub rest_duration_seconds: u64,
}

/// Core timer state machine.
///
/// Holds the current phase, the remaining seconds, and the duration
/// snapshot taken from [`Settings`] at cycle start. Settings changes made
/// mid-phase never rescale the in-flight countdown; they are observed at
/// the next cycle boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEngine {
    phase: Phase,
    remaining_seconds: u64,
    work_duration_seconds: u64,
    rest_duration_seconds: u64,
}

impl TimerEngine {
    /// Create a new engine in the `Stopped` phase with the work duration
    /// from the given settings.
    pub fn new(settings: &Settings) -> Self {
        let work = settings.work_duration_seconds();
        Self {
            phase: Phase::Stopped,
            remaining_seconds: work,
            work_duration_seconds: work,
            rest_duration_seconds: settings.rest_duration_seconds(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    /// Duration of the active phase: rest while `Resting`, work otherwise.
    pub fn active_duration(&self) -> u64 {
        match self.phase {
            Phase::Resting => self.rest_duration_seconds,
            _ => self.work_duration_seconds,
        }
    }

    pub fn snapshot(&self) -> StateInfo {
        StateInfo {
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            work_duration_seconds: self.work_duration_seconds,
            rest_duration_seconds: self.rest_duration_seconds,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a work phase. No-op unless `Stopped`, which prevents
    /// double-starting a second countdown.
    pub fn start(&mut self, settings: &Settings) -> Option<Event> {
        if self.phase != Phase::Stopped {
            return None;
        }
        self.snapshot_settings(settings);
        self.phase = Phase::Running;
        self.remaining_seconds = self.work_duration_seconds;
        Some(Event::state_changed(Phase::Running))
    }

    /// Freeze the countdown. No-op unless `Running`.
    pub fn pause(&mut self) -> Option<Event> {
        if self.phase != Phase::Running {
            return None;
        }
        self.phase = Phase::Paused;
        Some(Event::state_changed(Phase::Paused))
    }

    /// Continue from the frozen value. No-op unless `Paused`.
    pub fn resume(&mut self) -> Option<Event> {
        if self.phase != Phase::Paused {
            return None;
        }
        self.phase = Phase::Running;
        Some(Event::state_changed(Phase::Running))
    }

    /// Advance the countdown by one second.
    ///
    /// `Stopped` and `Paused` ignore ticks, as does a tick delivered while
    /// the countdown already sits at zero. Reaching zero while `Running`
    /// moves to `Resting`; reaching zero while `Resting` finishes the rest
    /// (see [`Self::skip_rest`] for the identical skip path).
    pub fn tick(&mut self, settings: &Settings) -> Vec<Event> {
        match self.phase {
            Phase::Stopped | Phase::Paused => Vec::new(),
            Phase::Running => {
                if self.remaining_seconds == 0 {
                    return Vec::new();
                }
                self.remaining_seconds -= 1;
                let mut events = vec![Event::tick(self.remaining_seconds)];
                if self.remaining_seconds == 0 {
                    self.phase = Phase::Resting;
                    self.remaining_seconds = self.rest_duration_seconds;
                    events.push(Event::work_complete());
                    events.push(Event::state_changed(Phase::Resting));
                }
                events
            }
            Phase::Resting => {
                if self.remaining_seconds == 0 {
                    return Vec::new();
                }
                self.remaining_seconds -= 1;
                let mut events = vec![Event::tick(self.remaining_seconds)];
                if self.remaining_seconds == 0 {
                    events.push(Event::rest_complete());
                    events.extend(self.finish_rest(settings));
                }
                events
            }
        }
    }

    /// Force the rest to its end, as if the countdown reached zero.
    /// No-op unless `Resting`.
    pub fn skip_rest(&mut self, settings: &Settings) -> Vec<Event> {
        if self.phase != Phase::Resting {
            return Vec::new();
        }
        let mut events = vec![Event::rest_complete()];
        events.extend(self.finish_rest(settings));
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Shared tail of natural rest completion and skip. Leaves `Resting`
    /// exactly once per rest, which is what makes the caller's counter
    /// increment exactly-once.
    fn finish_rest(&mut self, settings: &Settings) -> Vec<Event> {
        self.snapshot_settings(settings);
        self.remaining_seconds = self.work_duration_seconds;
        if settings.auto_start {
            self.phase = Phase::Running;
            vec![Event::state_changed(Phase::Running)]
        } else {
            self.phase = Phase::Stopped;
            vec![Event::state_changed(Phase::Stopped)]
        }
    }

    fn snapshot_settings(&mut self, settings: &Settings) {
        self.work_duration_seconds = settings.work_duration_seconds();
        self.rest_duration_seconds = settings.rest_duration_seconds();
    }
}
