//! Session controller.
//!
//! Owns the [`TimerEngine`] together with the two external stores and the
//! presentation sink, and applies the recovery policies around them:
//!
//! - the in-memory transition is the source of truth - a store or sink
//!   failure is logged and never reverses it;
//! - the daily counter is incremented exactly once per `RestComplete`,
//!   whether the rest finished naturally or was skipped;
//! - a `WorkComplete` the sink cannot display means the rest overlay will
//!   never appear, so the rest is skipped instead of leaving the machine
//!   waiting on an acknowledgment that cannot come.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::error::{DatabaseError, Result};
use crate::events::{Event, EventSink};
use crate::storage::{Database, Settings, SettingsStore};

use super::engine::{StateInfo, TimerEngine};

/// Drives one timer session: commands in, events out.
///
/// All mutating operations take `&mut self`, so concurrent mutation is
/// ruled out structurally; a host that receives clock pulses and user
/// commands from different contexts must funnel them through one owner.
pub struct TimerController<S: EventSink> {
    engine: TimerEngine,
    settings: Settings,
    db: Database,
    settings_store: SettingsStore,
    sink: S,
}

impl<S: EventSink> TimerController<S> {
    pub fn new(
        engine: TimerEngine,
        settings: Settings,
        db: Database,
        settings_store: SettingsStore,
        sink: S,
    ) -> Self {
        Self {
            engine,
            settings,
            db,
            settings_store,
            sink,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn snapshot(&self) -> StateInfo {
        self.engine.snapshot()
    }

    /// Number of rest cycles completed today.
    ///
    /// # Errors
    /// Returns an error if the stats record cannot be read.
    pub fn today_completed(&self) -> Result<u32, DatabaseError> {
        Ok(self.db.daily_stats()?.count)
    }

    // ── User commands ────────────────────────────────────────────────

    pub fn start(&mut self) {
        let events = self.engine.start(&self.settings);
        self.dispatch(events.into_iter().collect());
    }

    pub fn pause(&mut self) {
        let events = self.engine.pause();
        self.dispatch(events.into_iter().collect());
    }

    pub fn resume(&mut self) {
        let events = self.engine.resume();
        self.dispatch(events.into_iter().collect());
    }

    pub fn skip_rest(&mut self) {
        let events = self.engine.skip_rest(&self.settings);
        self.dispatch(events);
    }

    /// Deliver one clock pulse.
    pub fn tick(&mut self) {
        let events = self.engine.tick(&self.settings);
        self.dispatch(events);
    }

    /// Replace the settings after validation.
    ///
    /// The new record becomes effective at the next cycle boundary; an
    /// in-flight countdown keeps its snapshot. A persistence failure is
    /// logged and the in-memory value is kept, so the session continues
    /// with what the user asked for.
    ///
    /// # Errors
    /// Returns a validation error for non-positive durations; the previous
    /// last-known-good settings stay in effect.
    pub fn update_settings(&mut self, settings: Settings) -> Result<()> {
        settings.validate()?;
        if let Err(err) = self.settings_store.save(&settings) {
            warn!("settings not persisted: {err}");
        }
        self.settings = settings;
        Ok(())
    }

    /// Re-read settings from the store.
    ///
    /// For hosts whose settings file can be changed by another process
    /// mid-session. A record that cannot be read or fails validation is
    /// ignored and the current settings stay in effect; either way an
    /// in-flight countdown is never rescaled.
    pub fn reload_settings(&mut self) {
        if let Ok(settings) = self.settings_store.load() {
            if settings.validate().is_ok() {
                self.settings = settings;
            }
        }
    }

    /// Replace the engine with an externally persisted snapshot.
    ///
    /// For hosts that share one persisted engine across processes: the
    /// clock loop adopts the stored record before ticking, so commands
    /// applied by other invocations are observed rather than overwritten.
    pub fn replace_engine(&mut self, engine: TimerEngine) {
        self.engine = engine;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn dispatch(&mut self, events: Vec<Event>) {
        let mut queue: VecDeque<Event> = events.into();

        while let Some(event) = queue.pop_front() {
            if let Event::RestComplete { .. } = event {
                match self.db.increment_today() {
                    Ok(stats) => debug!("daily count is now {}", stats.count),
                    Err(err) => warn!("daily count not persisted: {err}"),
                }
            }

            if let Err(err) = self.sink.deliver(&event) {
                warn!("event delivery failed: {err}");
                if let Event::WorkComplete { .. } = event {
                    // The rest overlay cannot be shown. Treat the rest as
                    // already acknowledged and move on to the next work
                    // cycle instead of stalling in Resting.
                    queue.extend(self.engine.skip_rest(&self.settings));
                }
            }
        }
    }
}
