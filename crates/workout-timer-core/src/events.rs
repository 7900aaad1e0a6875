use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::{Phase, PhaseKind};
use crate::timer::{SessionState, SessionSummary};

/// Every observable change of the session runner produces an Event.
/// The UI renders them; the sound player reacts to `PhaseEntered` and
/// `Finished`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PhaseEntered {
        index: usize,
        phase: Phase,
        at: DateTime<Utc>,
    },
    Tick {
        index: usize,
        remaining_secs: u64,
    },
    Paused {
        index: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Resumed {
        index: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Stopped {
        index: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Reset {
        at: DateTime<Utc>,
    },
    Finished {
        summary: SessionSummary,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionState,
        index: Option<usize>,
        phase_kind: Option<PhaseKind>,
        phase_label: Option<String>,
        remaining_secs: u64,
        phase_count: usize,
        session_progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Kind whose sound should play for this event, if any.
    pub fn sound_cue(&self) -> Option<PhaseKind> {
        match self {
            Event::PhaseEntered { phase, .. } => Some(phase.kind),
            Event::Finished { .. } => Some(PhaseKind::Finish),
            _ => None,
        }
    }
}
