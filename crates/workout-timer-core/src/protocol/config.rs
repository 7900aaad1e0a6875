//! Protocol configurations.
//!
//! Each configuration has a validating constructor. The builders re-run the
//! same validation because the fields are public and may have been filled in
//! directly (for example when deserialized from the settings file).

use serde::{Deserialize, Serialize};

use super::builder::{build_boxing, build_custom, build_tabata};
use super::duration::parse_duration;
use super::phase::{total_duration, Phase, PhaseKind};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabataConfig {
    pub preparation: u64,
    pub work: u64,
    pub rest: u64,
    pub rounds: u32,
    pub cycles: u32,
    pub cooldown: u64,
}

impl TabataConfig {
    pub fn new(
        preparation: u64,
        work: u64,
        rest: u64,
        rounds: u32,
        cycles: u32,
        cooldown: u64,
    ) -> Result<Self, ValidationError> {
        let config = Self {
            preparation,
            work,
            rest,
            rounds,
            cycles,
            cooldown,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        positive("Tabata", "work", self.work)?;
        positive("Tabata", "rounds", u64::from(self.rounds))?;
        positive("Tabata", "cycles", u64::from(self.cycles))?;
        Ok(())
    }

    /// Work intervals across all cycles.
    pub fn total_rounds(&self) -> u64 {
        u64::from(self.rounds) * u64::from(self.cycles)
    }
}

impl Default for TabataConfig {
    fn default() -> Self {
        Self {
            preparation: 10,
            work: 20,
            rest: 10,
            rounds: 8,
            cycles: 1,
            cooldown: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxingConfig {
    pub work: u64,
    pub rest: u64,
    pub rounds: u32,
}

impl BoxingConfig {
    pub fn new(work: u64, rest: u64, rounds: u32) -> Result<Self, ValidationError> {
        let config = Self { work, rest, rounds };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        positive("Boxing", "work", self.work)?;
        positive("Boxing", "rounds", u64::from(self.rounds))?;
        Ok(())
    }
}

impl Default for BoxingConfig {
    fn default() -> Self {
        Self {
            work: 180,
            rest: 60,
            rounds: 3,
        }
    }
}

/// One work/rest pair of a custom session, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub work: u64,
    #[serde(default)]
    pub rest: u64,
}

impl Interval {
    pub fn new(work: u64, rest: u64) -> Self {
        Self { work, rest }
    }
}

impl From<(u64, u64)> for Interval {
    fn from((work, rest): (u64, u64)) -> Self {
        Self { work, rest }
    }
}

/// Free-form list of work/rest pairs. Never empty once validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomIntervals {
    pub intervals: Vec<Interval>,
}

impl CustomIntervals {
    pub fn new<I, T>(intervals: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Interval>,
    {
        let config = Self {
            intervals: intervals.into_iter().map(Into::into).collect(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.intervals.is_empty() {
            return Err(ValidationError::NoIntervals);
        }
        for (idx, interval) in self.intervals.iter().enumerate() {
            positive("Custom", "work", interval.work).map_err(|source| ValidationError::Line {
                line: idx + 1,
                source: Box::new(source),
            })?;
        }
        Ok(())
    }

    /// Parse a multi-line interval list.
    ///
    /// Each non-blank line is `work, rest`, `work rest` or just `work`.
    /// Values use the [`parse_duration`] syntax.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ValidationError::NoIntervals);
        }

        let mut intervals = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let stripped = line.trim();
            if stripped.is_empty() {
                continue;
            }

            let (work_str, rest_str) = if let Some((work, rest)) = stripped.split_once(',') {
                (work.trim(), rest.trim())
            } else {
                let parts: Vec<&str> = stripped.split_whitespace().collect();
                match parts.as_slice() {
                    [work] => (*work, ""),
                    [work, rest] => (*work, *rest),
                    _ => return Err(ValidationError::MalformedLine { line: line_no }),
                }
            };

            let at_line = |source: ValidationError| ValidationError::Line {
                line: line_no,
                source: Box::new(source),
            };
            let work = parse_duration(work_str).map_err(at_line)?;
            let rest = if rest_str.is_empty() {
                0
            } else {
                parse_duration(rest_str).map_err(at_line)?
            };
            if work == 0 {
                return Err(at_line(ValidationError::InvalidValue {
                    protocol: "Custom",
                    field: "work",
                    message: "must be > 0",
                }));
            }
            intervals.push(Interval::new(work, rest));
        }

        Self::new(intervals)
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Render back to the one-interval-per-line text form.
    pub fn to_text(&self) -> String {
        self.intervals
            .iter()
            .map(|i| format!("{}, {}", i.work, i.rest))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for CustomIntervals {
    fn default() -> Self {
        Self {
            intervals: vec![
                Interval::new(60, 30),
                Interval::new(45, 15),
                Interval::new(60, 0),
            ],
        }
    }
}

/// Any of the supported interval protocols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum ProtocolConfig {
    Tabata(TabataConfig),
    Boxing(BoxingConfig),
    Custom(CustomIntervals),
}

impl ProtocolConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolConfig::Tabata(_) => "tabata",
            ProtocolConfig::Boxing(_) => "boxing",
            ProtocolConfig::Custom(_) => "custom",
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ProtocolConfig::Tabata(c) => c.validate(),
            ProtocolConfig::Boxing(c) => c.validate(),
            ProtocolConfig::Custom(c) => c.validate(),
        }
    }

    pub fn build(&self) -> Result<Vec<Phase>, ValidationError> {
        match self {
            ProtocolConfig::Tabata(c) => build_tabata(c),
            ProtocolConfig::Boxing(c) => build_boxing(c),
            ProtocolConfig::Custom(c) => build_custom(c),
        }
    }

    /// Rounds reported in the session summary.
    pub fn rounds(&self) -> u64 {
        match self {
            ProtocolConfig::Tabata(c) => c.total_rounds(),
            ProtocolConfig::Boxing(c) => u64::from(c.rounds),
            ProtocolConfig::Custom(c) => c.len() as u64,
        }
    }

    /// Session length computed directly from the configuration.
    pub fn total_seconds(&self) -> u64 {
        match self {
            ProtocolConfig::Tabata(c) => {
                let n = c.total_rounds();
                let rests = if c.rest > 0 { n.saturating_sub(1) } else { 0 };
                c.preparation
                    .saturating_add(c.work.saturating_mul(n))
                    .saturating_add(c.rest.saturating_mul(rests))
                    .saturating_add(c.cooldown)
            }
            ProtocolConfig::Boxing(c) => {
                let n = u64::from(c.rounds);
                c.work
                    .saturating_mul(n)
                    .saturating_add(c.rest.saturating_mul(n.saturating_sub(1)))
            }
            ProtocolConfig::Custom(c) => {
                let last = c.intervals.len().saturating_sub(1);
                c.intervals
                    .iter()
                    .enumerate()
                    .fold(0u64, |acc, (idx, i)| {
                        let rest = if idx < last { i.rest } else { 0 };
                        acc.saturating_add(i.work).saturating_add(rest)
                    })
            }
        }
    }

    /// Build the phases and pair them with the rounds count.
    pub fn plan(&self) -> Result<SessionPlan, ValidationError> {
        Ok(SessionPlan {
            protocol: self.name().to_string(),
            phases: self.build()?,
            rounds: self.rounds(),
        })
    }
}

impl From<TabataConfig> for ProtocolConfig {
    fn from(c: TabataConfig) -> Self {
        ProtocolConfig::Tabata(c)
    }
}

impl From<BoxingConfig> for ProtocolConfig {
    fn from(c: BoxingConfig) -> Self {
        ProtocolConfig::Boxing(c)
    }
}

impl From<CustomIntervals> for ProtocolConfig {
    fn from(c: CustomIntervals) -> Self {
        ProtocolConfig::Custom(c)
    }
}

/// What a session runner is started with.
///
/// `rounds` is fixed when the plan is made, so the summary never has to
/// reverse-engineer it from the phase list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPlan {
    pub protocol: String,
    pub phases: Vec<Phase>,
    pub rounds: u64,
}

impl SessionPlan {
    /// Plan for an ad-hoc phase list. Each work phase counts as a round.
    pub fn from_phases(phases: Vec<Phase>) -> Self {
        let rounds = phases.iter().filter(|p| p.kind == PhaseKind::Work).count() as u64;
        Self {
            protocol: "custom".to_string(),
            phases,
            rounds,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        total_duration(&self.phases)
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

impl From<Vec<Phase>> for SessionPlan {
    fn from(phases: Vec<Phase>) -> Self {
        Self::from_phases(phases)
    }
}

fn positive(
    protocol: &'static str,
    field: &'static str,
    value: u64,
) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::InvalidValue {
            protocol,
            field,
            message: "must be > 0",
        });
    }
    Ok(())
}
