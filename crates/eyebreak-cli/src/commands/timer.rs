use std::time::Duration;

use clap::Subcommand;
use eyebreak_core::error::PresentationError;
use eyebreak_core::storage::{Database, Settings, SettingsStore};
use eyebreak_core::timer::{TimerController, TimerEngine};
use eyebreak_core::{Event, EventSink};
use log::warn;

const ENGINE_KEY: &str = "timer_engine";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Begin a work phase
    Start,
    /// Pause the running countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Skip the current rest phase
    Skip,
    /// Deliver one-second clock ticks
    Tick {
        /// Number of ticks to deliver
        #[arg(long, default_value = "1")]
        count: u32,
    },
    /// Run the clock loop in the foreground, one tick per second
    Run,
    /// Print the current timer state as JSON
    Status,
}

/// Prints each event as a JSON line for the host shell to consume.
struct JsonSink;

impl EventSink for JsonSink {
    fn deliver(&mut self, event: &Event) -> Result<(), PresentationError> {
        let line = serde_json::to_string(event)
            .map_err(|e| PresentationError::Unavailable(e.to_string()))?;
        println!("{line}");
        Ok(())
    }
}

fn load_engine(db: &Database, settings: &Settings) -> TimerEngine {
    if let Ok(Some(json)) = db.kv_get(ENGINE_KEY) {
        if let Ok(engine) = serde_json::from_str::<TimerEngine>(&json) {
            return engine;
        }
    }
    TimerEngine::new(settings)
}

fn save_engine(db: &Database, engine: &TimerEngine) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(engine)?;
    db.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

// One JSON document per line; the snapshot is always the last line, after
// any event lines the command produced.
fn print_snapshot(controller: &TimerController<JsonSink>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(&controller.snapshot())?);
    Ok(())
}

/// One pass of the foreground clock loop.
///
/// While the loop runs, user commands arrive as one-shot invocations from
/// other processes that load, mutate and save the shared engine record.
/// The persisted record therefore wins over the in-memory one: the loop
/// adopts it before ticking, so a skip or pause applied elsewhere is
/// observed instead of being overwritten on the next save. When the record
/// cannot be read the in-memory engine keeps ticking, and a failed save is
/// logged without stopping the clock.
fn run_pass<S: EventSink>(controller: &mut TimerController<S>) {
    if let Ok(Some(json)) = controller.db().kv_get(ENGINE_KEY) {
        if let Ok(engine) = serde_json::from_str::<TimerEngine>(&json) {
            controller.replace_engine(engine);
        }
    }
    controller.reload_settings();
    controller.tick();
    if let Err(err) = save_engine(controller.db(), controller.engine()) {
        warn!("timer state not persisted: {err}");
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let store = SettingsStore::open()?;
    let settings = store.load_or_default();
    let engine = load_engine(&db, &settings);
    let mut controller = TimerController::new(engine, settings, db, store, JsonSink);

    match action {
        TimerAction::Start => {
            controller.start();
            print_snapshot(&controller)?;
        }
        TimerAction::Pause => {
            controller.pause();
            print_snapshot(&controller)?;
        }
        TimerAction::Resume => {
            controller.resume();
            print_snapshot(&controller)?;
        }
        TimerAction::Skip => {
            controller.skip_rest();
            print_snapshot(&controller)?;
        }
        TimerAction::Tick { count } => {
            for _ in 0..count {
                controller.tick();
            }
        }
        TimerAction::Run => loop {
            std::thread::sleep(Duration::from_secs(1));
            run_pass(&mut controller);
        },
        TimerAction::Status => {
            print_snapshot(&controller)?;
        }
    }

    save_engine(controller.db(), controller.engine())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyebreak_core::Phase;
    use std::path::Path;

    struct DiscardSink;

    impl EventSink for DiscardSink {
        fn deliver(&mut self, _event: &Event) -> Result<(), PresentationError> {
            Ok(())
        }
    }

    /// Builds a controller the way `run()` does, but rooted in `dir` so
    /// several of them can share one database file like separate
    /// invocations would.
    fn controller_at(dir: &Path, settings: Settings) -> TimerController<DiscardSink> {
        let db = Database::at(dir.join("eyebreak.db")).unwrap();
        let store = SettingsStore::at(dir.join("config.toml"));
        store.save(&settings).unwrap();
        let engine = load_engine(&db, &settings);
        TimerController::new(engine, settings, db, store, DiscardSink)
    }

    fn short_settings(auto_start: bool) -> Settings {
        Settings {
            work_minutes: 1,
            rest_seconds: 5,
            auto_start,
            theme: "light".to_string(),
        }
    }

    #[test]
    fn run_pass_observes_a_skip_applied_by_another_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = controller_at(dir.path(), short_settings(false));
        runner.start();
        for _ in 0..60 {
            runner.tick();
        }
        assert_eq!(runner.snapshot().phase, Phase::Resting);
        save_engine(runner.db(), runner.engine()).unwrap();

        // A one-shot invocation loads the shared state, skips the rest
        // and saves the result.
        let mut oneshot = controller_at(dir.path(), short_settings(false));
        assert_eq!(oneshot.snapshot().phase, Phase::Resting);
        oneshot.skip_rest();
        assert_eq!(oneshot.today_completed().unwrap(), 1);
        save_engine(oneshot.db(), oneshot.engine()).unwrap();

        // The loop adopts the saved skip; the already-finished rest is
        // not completed a second time and the count stays at one.
        for _ in 0..10 {
            run_pass(&mut runner);
        }
        assert_eq!(runner.snapshot().phase, Phase::Stopped);
        assert_eq!(runner.today_completed().unwrap(), 1);
    }

    #[test]
    fn run_pass_keeps_ticking_when_persistence_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = controller_at(dir.path(), Settings::default());
        controller.start();
        run_pass(&mut controller);
        let remaining = controller.snapshot().remaining_seconds;

        // Both loading and saving the engine record now fail; the
        // in-memory engine stays the source of truth and the clock
        // keeps going.
        controller
            .db()
            .conn()
            .execute("DROP TABLE kv", [])
            .unwrap();
        run_pass(&mut controller);
        run_pass(&mut controller);
        assert_eq!(controller.snapshot().remaining_seconds, remaining - 2);
        assert_eq!(controller.snapshot().phase, Phase::Running);
    }

    #[test]
    fn run_pass_observes_settings_changes_at_the_cycle_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            work_minutes: 1,
            rest_seconds: 1,
            auto_start: true,
            theme: "light".to_string(),
        };
        let mut controller = controller_at(dir.path(), settings.clone());
        controller.start();
        for _ in 0..30 {
            run_pass(&mut controller);
        }
        assert_eq!(controller.snapshot().remaining_seconds, 30);

        // `config set` from another invocation while the loop runs.
        let store = SettingsStore::at(dir.path().join("config.toml"));
        let mut updated = settings;
        updated.set("work_minutes", "2").unwrap();
        store.save(&updated).unwrap();

        // The in-flight countdown is never rescaled.
        for _ in 0..30 {
            run_pass(&mut controller);
        }
        assert_eq!(controller.snapshot().phase, Phase::Resting);

        // Observed at the next cycle start.
        run_pass(&mut controller);
        assert_eq!(controller.snapshot().phase, Phase::Running);
        assert_eq!(controller.snapshot().remaining_seconds, 120);
    }
}
