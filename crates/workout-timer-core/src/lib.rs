//! # Workout Timer Core Library
//!
//! This library provides the core logic for the Workout Timer interval timer.
//! Front ends (the bundled CLI, or a GUI) collect a protocol configuration,
//! hand it to the core and render the events that come back.
//!
//! ## Architecture
//!
//! - **Protocols**: pure builders that expand a Tabata, Boxing or Custom
//!   configuration into an ordered list of phases
//! - **Session Runner**: a tick-driven state machine that requires the caller
//!   to invoke `tick()` once per second
//! - **Sound**: per-phase-kind sound selection with a terminal-bell fallback
//! - **Storage**: TOML settings and a JSON session history
//!
//! ## Key Components
//!
//! - [`ProtocolConfig`]: the three interval protocols
//! - [`SessionRunner`]: countdown state machine
//! - [`Event`]: everything the runner reports
//! - [`Settings`]: user preferences and protocol defaults

pub mod console;
pub mod error;
pub mod events;
pub mod protocol;
pub mod sound;
pub mod storage;
pub mod timer;

pub use error::{
    ConfigError, CoreError, HistoryError, PlaybackError, StateError, ValidationError,
};
pub use events::Event;
pub use protocol::{
    parse_duration, BoxingConfig, CustomIntervals, Interval, Phase, PhaseKind, ProtocolConfig,
    SessionPlan, TabataConfig,
};
pub use storage::{History, HistoryRecord, Settings};
pub use timer::{SessionRunner, SessionState, SessionSummary};
