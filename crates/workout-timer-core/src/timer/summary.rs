use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::protocol::{Phase, PhaseKind, SessionPlan};

/// End-of-session report.
///
/// Always describes the whole planned session, not only the part that was
/// traversed before a stop.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub protocol: String,
    /// Seconds per phase kind.
    pub totals: BTreeMap<PhaseKind, u64>,
    pub rounds: u64,
    pub total: u64,
}

impl SessionSummary {
    pub fn from_plan(plan: &SessionPlan) -> Self {
        let totals = summarize_phases(&plan.phases);
        let total = totals.values().fold(0u64, |acc, v| acc.saturating_add(*v));
        Self {
            protocol: plan.protocol.clone(),
            totals,
            rounds: plan.rounds,
            total,
        }
    }

    pub fn seconds(&self, kind: PhaseKind) -> u64 {
        self.totals.get(&kind).copied().unwrap_or(0)
    }

    pub fn work(&self) -> u64 {
        self.seconds(PhaseKind::Work)
    }

    /// Preparation, rest and cooldown combined.
    pub fn recovery(&self) -> u64 {
        self.totals
            .iter()
            .filter(|(kind, _)| kind.is_recovery())
            .fold(0u64, |acc, (_, v)| acc.saturating_add(*v))
    }
}

/// Seconds per kind. Prep, work, rest, cooldown and other are always present
/// so reports can show zeros; finish only appears if a phase used it.
pub fn summarize_phases(phases: &[Phase]) -> BTreeMap<PhaseKind, u64> {
    let mut totals: BTreeMap<PhaseKind, u64> = [
        PhaseKind::Prep,
        PhaseKind::Work,
        PhaseKind::Rest,
        PhaseKind::Cooldown,
        PhaseKind::Other,
    ]
    .into_iter()
    .map(|kind| (kind, 0))
    .collect();

    for phase in phases {
        let slot = totals.entry(phase.kind).or_insert(0);
        *slot = slot.saturating_add(phase.duration);
    }
    totals
}
