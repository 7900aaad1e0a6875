//! Session runner implementation.
//!
//! The runner is a tick-driven state machine. It does not use internal
//! threads or read the clock - the caller is responsible for calling `tick()`
//! once per second while the session is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |           |
//!            v           v
//!        Finished      Idle (stop/reset)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut runner = SessionRunner::new();
//! let entered = runner.start(config.plan()?)?;
//! // Once per second:
//! for event in runner.tick()? { /* render, play sounds */ }
//! ```

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::summary::SessionSummary;
use crate::error::StateError;
use crate::events::Event;
use crate::protocol::{total_duration, Phase, SessionPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Paused,
    Finished,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Finished => "finished",
        })
    }
}

/// Handle for one scheduled tick.
///
/// Obtained from [`SessionRunner::arm`] before scheduling a wake-up and
/// handed back to [`SessionRunner::fire`] when it elapses. Any pause, stop,
/// reset or restart in between invalidates the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickToken {
    generation: u64,
}

/// Countdown over a planned phase sequence.
#[derive(Debug, Clone, Default)]
pub struct SessionRunner {
    phases: Vec<Phase>,
    state: SessionState,
    current_index: Option<usize>,
    remaining_secs: u64,
    summary: Option<SessionSummary>,
    generation: u64,
}

impl SessionRunner {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state() == SessionState::Paused
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        self.current_index.and_then(|i| self.phases.get(i))
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Summary of the planned session, available from start until reset.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// 0.0 .. 100.0 progress across the whole session.
    pub fn session_progress_pct(&self) -> f64 {
        if self.state() == SessionState::Finished {
            return 100.0;
        }
        let total = total_duration(&self.phases);
        let Some(index) = self.current_index else {
            return 0.0;
        };
        if total == 0 {
            return 0.0;
        }
        let done_before = total_duration(&self.phases[..index]);
        let current = self.phases.get(index).map(|p| p.duration).unwrap_or(0);
        let elapsed_in_current = current.saturating_sub(self.remaining_secs);
        (done_before.saturating_add(elapsed_in_current) as f64 / total as f64 * 100.0).min(100.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let phase = self.current_phase();
        Event::StateSnapshot {
            state: self.state(),
            index: self.current_index,
            phase_kind: phase.map(|p| p.kind),
            phase_label: phase.map(|p| p.label.clone()),
            remaining_secs: self.remaining_secs,
            phase_count: self.phases.len(),
            session_progress_pct: self.session_progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session. Returns the `PhaseEntered` event for phase 0.
    pub fn start(&mut self, plan: impl Into<SessionPlan>) -> Result<Event, StateError> {
        let plan = plan.into();
        match self.state() {
            SessionState::Idle | SessionState::Finished => {}
            state => {
                return Err(StateError::InvalidTransition {
                    operation: "start",
                    state,
                })
            }
        }
        if plan.is_empty() {
            return Err(StateError::NothingToRun);
        }

        self.summary = Some(SessionSummary::from_plan(&plan));
        self.phases = plan.phases;
        self.generation = self.generation.wrapping_add(1);
        self.state = SessionState::Running;
        tracing::debug!(
            protocol = %plan.protocol,
            phases = self.phases.len(),
            rounds = plan.rounds,
            "session started"
        );
        Ok(self.enter(0))
    }

    /// Advance one second.
    ///
    /// Always yields a `Tick`; the tick that reaches zero additionally yields
    /// either `PhaseEntered` for the next phase or `Finished`.
    pub fn tick(&mut self) -> Result<Vec<Event>, StateError> {
        self.require(SessionState::Running, "tick")?;
        let index = self.current_index.ok_or(StateError::NothingToRun)?;

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        let mut events = vec![Event::Tick {
            index,
            remaining_secs: self.remaining_secs,
        }];
        if self.remaining_secs > 0 {
            return Ok(events);
        }

        let next = index + 1;
        if next < self.phases.len() {
            events.push(self.enter(next));
        } else {
            events.push(self.finish());
        }
        Ok(events)
    }

    pub fn pause(&mut self) -> Result<Event, StateError> {
        self.require(SessionState::Running, "pause")?;
        self.state = SessionState::Paused;
        self.generation = self.generation.wrapping_add(1);
        tracing::debug!(remaining = self.remaining_secs, "session paused");
        Ok(Event::Paused {
            index: self.current_index.unwrap_or(0),
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Result<Event, StateError> {
        self.require(SessionState::Paused, "resume")?;
        if self.phases.is_empty() {
            return Err(StateError::NothingToRun);
        }
        self.state = SessionState::Running;
        tracing::debug!(remaining = self.remaining_secs, "session resumed");
        Ok(Event::Resumed {
            index: self.current_index.unwrap_or(0),
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Abandon a running or paused session.
    pub fn stop(&mut self) -> Result<Event, StateError> {
        let state = self.state();
        if !matches!(state, SessionState::Running | SessionState::Paused) {
            return Err(StateError::InvalidTransition {
                operation: "stop",
                state,
            });
        }
        let event = Event::Stopped {
            index: self.current_index.unwrap_or(0),
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        };
        tracing::debug!(index = ?self.current_index, "session stopped");
        self.clear();
        Ok(event)
    }

    /// Return to `Idle` from any state. Idempotent.
    pub fn reset(&mut self) -> Event {
        self.clear();
        self.summary = None;
        Event::Reset { at: Utc::now() }
    }

    // ── Scheduling ───────────────────────────────────────────────────

    /// Token for the next scheduled tick, or `None` when not running.
    pub fn arm(&self) -> Option<TickToken> {
        self.is_running().then_some(TickToken {
            generation: self.generation,
        })
    }

    /// Deliver a previously armed tick.
    ///
    /// A token armed before a pause, stop, reset or restart is stale and is
    /// dropped without touching the countdown.
    pub fn fire(&mut self, token: TickToken) -> Result<Vec<Event>, StateError> {
        if token.generation != self.generation {
            tracing::debug!(
                token = token.generation,
                current = self.generation,
                "dropping stale tick"
            );
            return Ok(Vec::new());
        }
        self.tick()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn require(&self, expected: SessionState, operation: &'static str) -> Result<(), StateError> {
        let state = self.state();
        if state != expected {
            return Err(StateError::InvalidTransition { operation, state });
        }
        Ok(())
    }

    fn enter(&mut self, index: usize) -> Event {
        let phase = self.phases[index].clone();
        self.current_index = Some(index);
        self.remaining_secs = phase.duration;
        tracing::debug!(index, kind = %phase.kind, label = %phase.label, "phase entered");
        Event::PhaseEntered {
            index,
            phase,
            at: Utc::now(),
        }
    }

    fn finish(&mut self) -> Event {
        let summary = self.summary.clone().unwrap_or_default();
        self.phases.clear();
        self.current_index = None;
        self.remaining_secs = 0;
        self.state = SessionState::Finished;
        self.generation = self.generation.wrapping_add(1);
        tracing::debug!(total = summary.total, rounds = summary.rounds, "session finished");
        Event::Finished {
            summary,
            at: Utc::now(),
        }
    }

    fn clear(&mut self) {
        self.phases.clear();
        self.current_index = None;
        self.remaining_secs = 0;
        self.state = SessionState::Idle;
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PhaseKind;

    fn work(secs: u64) -> Phase {
        Phase::new("Work", secs, PhaseKind::Work)
    }

    #[test]
    fn start_with_nothing_fails() {
        let mut runner = SessionRunner::new();
        assert_eq!(runner.start(Vec::new()), Err(StateError::NothingToRun));
        assert_eq!(runner.state(), SessionState::Idle);
    }

    #[test]
    fn start_enters_first_phase() {
        let mut runner = SessionRunner::new();
        let event = runner.start(vec![work(3)]).unwrap();
        assert!(matches!(event, Event::PhaseEntered { index: 0, .. }));
        assert_eq!(runner.state(), SessionState::Running);
        assert_eq!(runner.remaining_secs(), 3);
        assert_eq!(runner.current_index(), Some(0));
    }

    #[test]
    fn three_ticks_finish_a_three_second_phase() {
        let mut runner = SessionRunner::new();
        runner.start(vec![work(3)]).unwrap();

        let mut remaining = Vec::new();
        let mut finished = false;
        for _ in 0..3 {
            for event in runner.tick().unwrap() {
                match event {
                    Event::Tick { remaining_secs, .. } => remaining.push(remaining_secs),
                    Event::Finished { .. } => finished = true,
                    other => panic!("unexpected event {other:?}"),
                }
            }
        }
        assert_eq!(remaining, vec![2, 1, 0]);
        assert!(finished);
        assert_eq!(runner.state(), SessionState::Finished);
        assert!(runner.phases().is_empty());
    }

    #[test]
    fn tick_advances_to_next_phase() {
        let mut runner = SessionRunner::new();
        runner
            .start(vec![work(1), Phase::new("Rest", 2, PhaseKind::Rest)])
            .unwrap();
        let events = runner.tick().unwrap();
        assert_eq!(events.len(), 2);
        match &events[1] {
            Event::PhaseEntered { index, phase, .. } => {
                assert_eq!(*index, 1);
                assert_eq!(phase.kind, PhaseKind::Rest);
            }
            other => panic!("expected PhaseEntered, got {other:?}"),
        }
        assert_eq!(runner.remaining_secs(), 2);
    }

    #[test]
    fn zero_length_phase_lasts_one_tick() {
        let mut runner = SessionRunner::new();
        runner
            .start(vec![Phase::new("Blink", 0, PhaseKind::Other), work(1)])
            .unwrap();
        let events = runner.tick().unwrap();
        assert!(matches!(events[0], Event::Tick { remaining_secs: 0, .. }));
        assert!(matches!(events[1], Event::PhaseEntered { index: 1, .. }));
    }

    #[test]
    fn tick_while_idle_is_a_state_error() {
        let mut runner = SessionRunner::new();
        assert_eq!(
            runner.tick(),
            Err(StateError::InvalidTransition {
                operation: "tick",
                state: SessionState::Idle
            })
        );
    }

    #[test]
    fn pause_and_resume_preserve_position() {
        let mut runner = SessionRunner::new();
        runner.start(vec![work(5)]).unwrap();
        runner.tick().unwrap();
        runner.pause().unwrap();
        assert!(runner.is_paused());
        assert!(runner.tick().is_err());
        assert_eq!(runner.remaining_secs(), 4);

        runner.resume().unwrap();
        assert!(runner.is_running());
        let events = runner.tick().unwrap();
        assert!(matches!(events[0], Event::Tick { remaining_secs: 3, .. }));
    }

    #[test]
    fn resume_while_running_is_rejected() {
        let mut runner = SessionRunner::new();
        runner.start(vec![work(5)]).unwrap();
        assert!(matches!(
            runner.resume(),
            Err(StateError::InvalidTransition {
                operation: "resume",
                state: SessionState::Running
            })
        ));
    }

    #[test]
    fn start_while_running_is_rejected() {
        let mut runner = SessionRunner::new();
        runner.start(vec![work(5)]).unwrap();
        assert!(runner.start(vec![work(1)]).is_err());
        assert_eq!(runner.remaining_secs(), 5);
    }

    #[test]
    fn restart_after_finish() {
        let mut runner = SessionRunner::new();
        runner.start(vec![work(1)]).unwrap();
        runner.tick().unwrap();
        assert_eq!(runner.state(), SessionState::Finished);
        assert!(runner.start(vec![work(2)]).is_ok());
        assert_eq!(runner.remaining_secs(), 2);
    }

    #[test]
    fn stop_clears_the_session() {
        let mut runner = SessionRunner::new();
        runner.start(vec![work(5)]).unwrap();
        assert!(matches!(runner.stop(), Ok(Event::Stopped { .. })));
        assert_eq!(runner.state(), SessionState::Idle);
        assert!(runner.phases().is_empty());
        assert!(runner.stop().is_err());
    }

    #[test]
    fn reset_twice_is_a_no_op() {
        let mut runner = SessionRunner::new();
        runner.start(vec![work(5), work(5)]).unwrap();
        runner.tick().unwrap();

        runner.reset();
        let after_first = (
            runner.state(),
            runner.current_index(),
            runner.remaining_secs(),
            runner.phases().len(),
        );
        runner.reset();
        let after_second = (
            runner.state(),
            runner.current_index(),
            runner.remaining_secs(),
            runner.phases().len(),
        );
        assert_eq!(after_first, (SessionState::Idle, None, 0, 0));
        assert_eq!(after_first, after_second);
        assert!(runner.summary().is_none());
    }

    #[test]
    fn stale_token_is_ignored_after_pause() {
        let mut runner = SessionRunner::new();
        runner.start(vec![work(5)]).unwrap();
        let token = runner.arm().unwrap();
        runner.pause().unwrap();
        runner.resume().unwrap();

        assert_eq!(runner.fire(token), Ok(Vec::new()));
        assert_eq!(runner.remaining_secs(), 5);

        let fresh = runner.arm().unwrap();
        assert_eq!(runner.fire(fresh).unwrap().len(), 1);
        assert_eq!(runner.remaining_secs(), 4);
    }

    #[test]
    fn arm_requires_running() {
        let mut runner = SessionRunner::new();
        assert!(runner.arm().is_none());
        runner.start(vec![work(5)]).unwrap();
        runner.pause().unwrap();
        assert!(runner.arm().is_none());
    }

    #[test]
    fn summary_covers_the_whole_plan_even_when_stopped() {
        let mut runner = SessionRunner::new();
        runner
            .start(vec![work(10), Phase::new("Rest", 5, PhaseKind::Rest), work(10)])
            .unwrap();
        runner.tick().unwrap();
        runner.stop().unwrap();
        let summary = runner.summary().unwrap();
        assert_eq!(summary.total, 25);
        assert_eq!(summary.rounds, 2);
    }

    #[test]
    fn progress_tracks_elapsed_time() {
        let mut runner = SessionRunner::new();
        runner.start(vec![work(2), work(2)]).unwrap();
        assert_eq!(runner.session_progress_pct(), 0.0);
        runner.tick().unwrap();
        runner.tick().unwrap();
        assert_eq!(runner.session_progress_pct(), 50.0);
        runner.tick().unwrap();
        runner.tick().unwrap();
        assert_eq!(runner.session_progress_pct(), 100.0);
    }

    #[test]
    fn snapshot_reports_current_phase() {
        let mut runner = SessionRunner::new();
        runner.start(vec![work(4)]).unwrap();
        match runner.snapshot() {
            Event::StateSnapshot {
                state,
                index,
                phase_kind,
                remaining_secs,
                ..
            } => {
                assert_eq!(state, SessionState::Running);
                assert_eq!(index, Some(0));
                assert_eq!(phase_kind, Some(PhaseKind::Work));
                assert_eq!(remaining_secs, 4);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn progress_saturates_on_huge_phases() {
        let mut runner = SessionRunner::new();
        runner.start(vec![work(u64::MAX), work(u64::MAX)]).unwrap();
        // Position at the very end of the second phase.
        runner.current_index = Some(1);
        runner.remaining_secs = 0;

        assert_eq!(runner.session_progress_pct(), 100.0);
        assert!(matches!(
            runner.snapshot(),
            Event::StateSnapshot { session_progress_pct, .. } if session_progress_pct == 100.0
        ));
    }
}
