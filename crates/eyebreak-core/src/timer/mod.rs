mod controller;
mod engine;

pub use controller::TimerController;
pub use engine::{Phase, StateInfo, TimerEngine};
