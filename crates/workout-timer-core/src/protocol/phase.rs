use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a phase. Selects the sound played when the phase begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Prep,
    Work,
    Rest,
    Cooldown,
    Finish,
    Other,
}

impl PhaseKind {
    pub const ALL: [PhaseKind; 6] = [
        PhaseKind::Prep,
        PhaseKind::Work,
        PhaseKind::Rest,
        PhaseKind::Cooldown,
        PhaseKind::Finish,
        PhaseKind::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseKind::Prep => "prep",
            PhaseKind::Work => "work",
            PhaseKind::Rest => "rest",
            PhaseKind::Cooldown => "cooldown",
            PhaseKind::Finish => "finish",
            PhaseKind::Other => "other",
        }
    }

    /// Counted as recovery time in session summaries.
    pub fn is_recovery(self) -> bool {
        matches!(self, PhaseKind::Prep | PhaseKind::Rest | PhaseKind::Cooldown)
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One labeled, timed segment of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub label: String,
    /// Duration in seconds.
    pub duration: u64,
    pub kind: PhaseKind,
}

impl Phase {
    pub fn new(label: impl Into<String>, duration: u64, kind: PhaseKind) -> Self {
        Self {
            label: label.into(),
            duration,
            kind,
        }
    }
}

/// Sum of all phase durations in seconds.
///
/// Uses saturating arithmetic so absurd configurations cannot wrap.
pub fn total_duration(phases: &[Phase]) -> u64 {
    phases
        .iter()
        .fold(0u64, |acc, p| acc.saturating_add(p.duration))
}

/// Number of phases of the given kind.
pub fn count_kind(phases: &[Phase], kind: PhaseKind) -> usize {
    phases.iter().filter(|p| p.kind == kind).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&PhaseKind::Cooldown).unwrap();
        assert_eq!(json, "\"cooldown\"");
        let kind: PhaseKind = serde_json::from_str("\"prep\"").unwrap();
        assert_eq!(kind, PhaseKind::Prep);
    }

    #[test]
    fn recovery_kinds() {
        assert!(PhaseKind::Prep.is_recovery());
        assert!(PhaseKind::Rest.is_recovery());
        assert!(PhaseKind::Cooldown.is_recovery());
        assert!(!PhaseKind::Work.is_recovery());
        assert!(!PhaseKind::Finish.is_recovery());
    }

    #[test]
    fn total_and_count() {
        let phases = vec![
            Phase::new("Work", 20, PhaseKind::Work),
            Phase::new("Rest", 10, PhaseKind::Rest),
            Phase::new("Work", 20, PhaseKind::Work),
        ];
        assert_eq!(total_duration(&phases), 50);
        assert_eq!(count_kind(&phases, PhaseKind::Work), 2);
        assert_eq!(count_kind(&phases, PhaseKind::Prep), 0);
    }
}
