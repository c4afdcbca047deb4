//! # eyebreak core library
//!
//! Core business logic for eyebreak, a desktop break reminder that runs a
//! repeating work/rest cycle, announces when work time elapses, counts
//! down the rest, and tracks how many rest cycles were completed today.
//!
//! ## Architecture
//!
//! - **Timer**: a tick-driven state machine that requires the caller to
//!   deliver one `tick()` per elapsed second, wrapped by a controller that
//!   applies the persistence and presentation recovery policies
//! - **Storage**: SQLite-based daily stats and TOML-based settings
//! - **Events**: every observable change produces an [`Event`]; the
//!   presentation layer consumes them through the [`EventSink`] seam
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: the timer state machine
//! - [`TimerController`]: session wiring of engine, stores and sink
//! - [`Database`]: daily counter and key-value persistence
//! - [`SettingsStore`]: settings persistence

pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use error::{
    ConfigError, CoreError, DatabaseError, PresentationError, ValidationError,
};
pub use events::{Event, EventSink};
pub use storage::{DailyStats, Database, Settings, SettingsStore};
pub use timer::{Phase, StateInfo, TimerController, TimerEngine};
