//! Protocol builders: configuration in, ordered phase list out.
//!
//! A rest phase is only ever emitted between two work phases. The last work
//! phase of a session is followed directly by the cooldown (if any).

use super::config::{BoxingConfig, CustomIntervals, TabataConfig};
use super::phase::{Phase, PhaseKind};
use crate::error::ValidationError;

pub fn build_tabata(config: &TabataConfig) -> Result<Vec<Phase>, ValidationError> {
    config.validate()?;

    let mut phases = Vec::new();
    if config.preparation > 0 {
        phases.push(Phase::new("Prepare", config.preparation, PhaseKind::Prep));
    }

    for cycle in 1..=config.cycles {
        for round in 1..=config.rounds {
            let label = if config.cycles > 1 {
                format!(
                    "Cycle {cycle}/{} - Round {round}/{}",
                    config.cycles, config.rounds
                )
            } else {
                format!("Round {round}/{}", config.rounds)
            };
            phases.push(Phase::new(label, config.work, PhaseKind::Work));

            let is_last = cycle == config.cycles && round == config.rounds;
            if config.rest > 0 && !is_last {
                phases.push(Phase::new("Rest", config.rest, PhaseKind::Rest));
            }
        }
    }

    if config.cooldown > 0 {
        phases.push(Phase::new("Cooldown", config.cooldown, PhaseKind::Cooldown));
    }
    Ok(phases)
}

pub fn build_boxing(config: &BoxingConfig) -> Result<Vec<Phase>, ValidationError> {
    config.validate()?;

    let mut phases = Vec::new();
    for round in 1..=config.rounds {
        phases.push(Phase::new(
            format!("Round {round}/{}", config.rounds),
            config.work,
            PhaseKind::Work,
        ));
        if config.rest > 0 && round < config.rounds {
            phases.push(Phase::new("Rest", config.rest, PhaseKind::Rest));
        }
    }
    Ok(phases)
}

pub fn build_custom(config: &CustomIntervals) -> Result<Vec<Phase>, ValidationError> {
    config.validate()?;

    let count = config.intervals.len();
    let mut phases = Vec::with_capacity(count * 2);
    for (idx, interval) in config.intervals.iter().enumerate() {
        phases.push(Phase::new(
            format!("Interval {}/{count}", idx + 1),
            interval.work,
            PhaseKind::Work,
        ));
        if interval.rest > 0 && idx + 1 < count {
            phases.push(Phase::new("Rest", interval.rest, PhaseKind::Rest));
        }
    }
    Ok(phases)
}
