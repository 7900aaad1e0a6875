//! Protocol selection shared by `run` and `plan`.
//!
//! Every flag is optional and falls back to the protocol defaults stored in
//! the settings file. Durations accept `90`, `1:30`, `2m` or `45s`.

use clap::Subcommand;
use std::path::PathBuf;
use workout_timer_core::protocol::{
    parse_count, parse_duration, BoxingConfig, CustomIntervals, ProtocolConfig, TabataConfig,
};
use workout_timer_core::storage::ProtocolDefaults;

#[derive(Subcommand, Debug, Clone)]
pub enum ProtocolArgs {
    /// Prepare, then rounds of work/rest, optionally repeated in cycles
    Tabata {
        /// Preparation before the first round (0 to skip)
        #[arg(long)]
        prep: Option<String>,
        /// Work duration per round
        #[arg(long)]
        work: Option<String>,
        /// Rest between rounds
        #[arg(long)]
        rest: Option<String>,
        /// Rounds per cycle
        #[arg(long)]
        rounds: Option<String>,
        /// Number of cycles
        #[arg(long)]
        cycles: Option<String>,
        /// Cooldown after the last round (0 to skip)
        #[arg(long)]
        cooldown: Option<String>,
    },
    /// Fixed-length rounds separated by rest
    Boxing {
        /// Round duration
        #[arg(long)]
        work: Option<String>,
        /// Rest between rounds
        #[arg(long)]
        rest: Option<String>,
        /// Number of rounds
        #[arg(long)]
        rounds: Option<String>,
    },
    /// Free-form list of work/rest intervals
    Custom {
        /// One interval as "work, rest" or "work" (repeatable)
        #[arg(short, long = "interval", value_name = "WORK[, REST]")]
        intervals: Vec<String>,
        /// File with one interval per line
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn duration_flag(flag: &str, value: Option<&str>, default: u64) -> Result<u64, String> {
    match value {
        None => Ok(default),
        Some(v) => parse_duration(v).map_err(|e| format!("--{flag}: {e}")),
    }
}

fn count_flag(flag: &str, value: Option<&str>, default: u32) -> Result<u32, String> {
    match value {
        None => Ok(default),
        Some(v) => parse_count(flag, v).map_err(|e| format!("--{flag}: {e}")),
    }
}

impl ProtocolArgs {
    /// Merge the flags over `defaults` and validate the result.
    pub fn resolve(
        &self,
        defaults: &ProtocolDefaults,
    ) -> Result<ProtocolConfig, Box<dyn std::error::Error>> {
        let config = match self {
            ProtocolArgs::Tabata {
                prep,
                work,
                rest,
                rounds,
                cycles,
                cooldown,
            } => {
                let d = &defaults.tabata;
                ProtocolConfig::from(TabataConfig {
                    preparation: duration_flag("prep", prep.as_deref(), d.preparation)?,
                    work: duration_flag("work", work.as_deref(), d.work)?,
                    rest: duration_flag("rest", rest.as_deref(), d.rest)?,
                    rounds: count_flag("rounds", rounds.as_deref(), d.rounds)?,
                    cycles: count_flag("cycles", cycles.as_deref(), d.cycles)?,
                    cooldown: duration_flag("cooldown", cooldown.as_deref(), d.cooldown)?,
                })
            }
            ProtocolArgs::Boxing { work, rest, rounds } => {
                let d = &defaults.boxing;
                ProtocolConfig::from(BoxingConfig {
                    work: duration_flag("work", work.as_deref(), d.work)?,
                    rest: duration_flag("rest", rest.as_deref(), d.rest)?,
                    rounds: count_flag("rounds", rounds.as_deref(), d.rounds)?,
                })
            }
            ProtocolArgs::Custom { intervals, file } => {
                if intervals.is_empty() && file.is_none() {
                    ProtocolConfig::from(defaults.custom.clone())
                } else {
                    let mut text = match file {
                        Some(path) => std::fs::read_to_string(path)
                            .map_err(|e| format!("--file {}: {e}", path.display()))?,
                        None => String::new(),
                    };
                    for interval in intervals {
                        if !text.is_empty() && !text.ends_with('\n') {
                            text.push('\n');
                        }
                        text.push_str(interval);
                    }
                    ProtocolConfig::from(CustomIntervals::parse(&text)?)
                }
            }
        };
        config.validate()?;
        Ok(config)
    }
}
