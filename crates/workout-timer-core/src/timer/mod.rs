mod runner;
mod summary;

pub use runner::{SessionRunner, SessionState, TickToken};
pub use summary::{summarize_phases, SessionSummary};
