mod builder;
mod config;
mod duration;
mod phase;

pub use builder::{build_boxing, build_custom, build_tabata};
pub use config::{
    BoxingConfig, CustomIntervals, Interval, ProtocolConfig, SessionPlan, TabataConfig,
};
pub use duration::{format_seconds, parse_count, parse_duration};
pub use phase::{count_kind, total_duration, Phase, PhaseKind};
