use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PresentationError;
use crate::timer::Phase;

/// Every observable change in the timer produces an Event.
///
/// Ordering is part of the contract: a `StateChanged` is never emitted
/// before the `Tick` that caused it. The presentation layer is expected to
/// re-fetch a full [`crate::timer::StateInfo`] after a `StateChanged`
/// rather than infer state from the payload alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Tick {
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    StateChanged {
        phase: Phase,
        at: DateTime<Utc>,
    },
    WorkComplete {
        at: DateTime<Utc>,
    },
    RestComplete {
        at: DateTime<Utc>,
    },
}

impl Event {
    pub(crate) fn tick(remaining_seconds: u64) -> Self {
        Event::Tick {
            remaining_seconds,
            at: Utc::now(),
        }
    }

    pub(crate) fn state_changed(phase: Phase) -> Self {
        Event::StateChanged {
            phase,
            at: Utc::now(),
        }
    }

    pub(crate) fn work_complete() -> Self {
        Event::WorkComplete { at: Utc::now() }
    }

    pub(crate) fn rest_complete() -> Self {
        Event::RestComplete { at: Utc::now() }
    }
}

/// Boundary to the presentation layer.
///
/// Delivery is fire-and-forget from the timer's perspective: a failed
/// delivery never blocks or reverses a state transition. The one policy
/// exception is a failed [`Event::WorkComplete`], which the controller
/// treats as "the rest overlay cannot be shown" and answers by skipping
/// the rest phase.
pub trait EventSink {
    fn deliver(&mut self, event: &Event) -> Result<(), PresentationError>;
}
